use sense_bridge::logging::{LogContext, get_logger, get_logger_with_context, parse_log_level};
use tracing::Level;

#[test]
fn level_names_accept_aliases() {
    assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("CRITICAL").unwrap(), Level::ERROR);
    assert!(parse_log_level("loud").is_err());
}

#[test]
fn loggers_accept_messages_without_a_subscriber() {
    let logger = get_logger("test");
    logger.info("info line");
    logger.debug("debug line");

    let device = get_logger_with_context(
        LogContext::new("device")
            .with_address("ab1234")
            .with_field("name", "Fridge".to_string()),
    );
    device.warn("warn line");
}
