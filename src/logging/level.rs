use crate::error::{BridgeError, Result};
use tracing::Level;

pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(BridgeError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

/// Effective level once the debug flag is taken into account
pub fn effective_level(level_str: &str, debug: bool) -> Result<Level> {
    let level = parse_log_level(level_str)?;
    if debug && level < Level::DEBUG {
        return Ok(Level::DEBUG);
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn debug_flag_raises_verbosity_only() {
        assert_eq!(effective_level("INFO", true).unwrap(), Level::DEBUG);
        assert_eq!(effective_level("TRACE", true).unwrap(), Level::TRACE);
        assert_eq!(effective_level("WARN", false).unwrap(), Level::WARN);
    }
}
