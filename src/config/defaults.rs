use super::*;

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            short_poll_secs: 60,
            long_poll_secs: 240,
        }
    }
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.sense.com/apiservice/api/v1".to_string(),
            realtime_url: "wss://clientrt.sense.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: None,
            console_output: true,
            json_format: false,
            backup_count: 5,
        }
    }
}
