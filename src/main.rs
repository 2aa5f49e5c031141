use anyhow::Result;
use sense_bridge::hub::LocalHub;
use sense_bridge::sense::SenseConnector;
use sense_bridge::{App, Config};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    sense_bridge::logging::init_logging(&config.logging)?;
    info!("Sense bridge starting up");
    if config.poll_cadence_inverted() {
        warn!(
            "short poll ({}s) is not shorter than long poll ({}s)",
            config.poll.short_poll_secs, config.poll.long_poll_secs
        );
    }

    let connector = SenseConnector::new(&config.sense)
        .map_err(|e| anyhow::anyhow!("Failed to create Sense client: {}", e))?;
    let hub = Arc::new(LocalHub::new());
    let mut app = App::new(config, hub, Arc::new(connector))?;

    match app.run().await {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Bridge failed with error: {}", e);
            Err(anyhow::anyhow!("Bridge error: {}", e))
        }
    }
}
