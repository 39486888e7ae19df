use leaf_bridge::config::LoggingConfig;
use leaf_bridge::logging::{LogContext, effective_level, get_logger_with_context, init_logging};
use tracing::Level;

#[test]
fn debug_flag_raises_quiet_levels_only() {
    assert_eq!(effective_level("INFO", true).unwrap(), Level::DEBUG);
    assert_eq!(effective_level("TRACE", true).unwrap(), Level::TRACE);
    assert_eq!(effective_level("WARNING", false).unwrap(), Level::WARN);
    assert!(effective_level("LOUD", false).is_err());
}

#[test]
fn init_writes_to_log_directory_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        level: "INFO".to_string(),
        file: Some(dir.path().to_string_lossy().to_string()),
        backup_count: 2,
        console_output: false,
        json_format: true,
    };

    init_logging(&config, false).unwrap();
    init_logging(&config, true).unwrap();

    let logger = get_logger_with_context(LogContext::new("bridge").with_vin("VIN1"));
    logger.info("logging initialised");
}
