use serde::Serialize;
use std::fmt;

/// Per-characteristic status codes reported back to controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapStatus {
    Success,
    ReadOnly,
    WriteOnly,
    NotFound,
    InvalidValue,
}

impl HapStatus {
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ReadOnly => -70404,
            Self::WriteOnly => -70405,
            Self::NotFound => -70409,
            Self::InvalidValue => -70410,
        }
    }
}

impl Serialize for HapStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl fmt::Display for HapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::ReadOnly => "write to read-only characteristic",
            Self::WriteOnly => "read from write-only characteristic",
            Self::NotFound => "resource does not exist",
            Self::InvalidValue => "invalid value",
        };
        write!(f, "{} ({})", text, self.code())
    }
}
