//! Event delivery
//!
//! [`App`] turns hub lifecycle events into controller calls. [`App::run`] is
//! the scheduler the binary uses: it feeds the startup events, then both poll
//! cadences and any queued hub commands through one task, so events are
//! always handled one at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use crate::config::Config;
use crate::controller::AccountController;
use crate::error::Result;
use crate::hub::{HubEvent, NodeRegistry, PollKind};
use crate::logging::{StructuredLogger, get_logger};
use crate::monitor::MonitorConnector;

pub struct App {
    config: Config,
    controller: AccountController,
    registry: Arc<dyn NodeRegistry>,
    events_tx: mpsc::UnboundedSender<HubEvent>,
    events_rx: mpsc::UnboundedReceiver<HubEvent>,
    logger: StructuredLogger,
}

impl App {
    pub fn new(
        config: Config,
        registry: Arc<dyn NodeRegistry>,
        connector: Arc<dyn MonitorConnector>,
    ) -> Result<Self> {
        let controller = AccountController::new(registry.clone(), connector)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            config,
            controller,
            registry,
            events_tx,
            events_rx,
            logger: get_logger("runtime"),
        })
    }

    pub fn controller(&self) -> &AccountController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AccountController {
        &mut self.controller
    }

    pub fn registry(&self) -> &Arc<dyn NodeRegistry> {
        &self.registry
    }

    /// Sender for events that should be handled by the running loop, such as
    /// commands arriving from the hub
    pub fn events(&self) -> mpsc::UnboundedSender<HubEvent> {
        self.events_tx.clone()
    }

    /// Handle one lifecycle event
    pub async fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Start => {
                self.logger
                    .info(&format!("Started Sense NodeServer {}", env!("APP_VERSION")));
            }
            HubEvent::CustomParams(params) => {
                if self.controller.apply_credentials(&params).await {
                    self.logger.info("Credentials accepted");
                }
            }
            HubEvent::Poll(PollKind::Short) => self.controller.refresh_fast().await,
            HubEvent::Poll(PollKind::Long) => self.controller.refresh_slow().await,
            HubEvent::Command { address, command } => {
                self.controller.handle_command(&address, command);
            }
            HubEvent::Stop => {
                self.logger.info("NodeServer stopping");
                if let Some(task) = self.controller.take_discovery()
                    && task.is_running()
                {
                    self.logger.info("Waiting for discovery to finish");
                    // Scan errors are logged by the task itself
                    if let Ok(added) = task.join().await {
                        self.logger
                            .info(&format!("Discovery finished, {} new nodes", added));
                    }
                }
                self.logger.info("NodeServer stopped");
            }
        }
    }

    /// Deliver the startup events, then poll until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.handle_event(HubEvent::Start).await;
        let params = self.config.custom_params.clone().into_iter().collect();
        self.handle_event(HubEvent::CustomParams(params)).await;

        let short = Duration::from_secs(self.config.poll.short_poll_secs);
        let long = Duration::from_secs(self.config.poll.long_poll_secs);
        // First ticks fire one period after startup
        let mut short_poll = interval_at(Instant::now() + short, short);
        let mut long_poll = interval_at(Instant::now() + long, long);
        short_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        long_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = short_poll.tick() => {
                    self.handle_event(HubEvent::Poll(PollKind::Short)).await;
                }
                _ = long_poll.tick() => {
                    self.handle_event(HubEvent::Poll(PollKind::Long)).await;
                }
                Some(event) = self.events_rx.recv() => {
                    let stop = event == HubEvent::Stop;
                    self.handle_event(event).await;
                    if stop {
                        return Ok(());
                    }
                }
                res = &mut shutdown => {
                    if let Err(e) = res {
                        self.logger.error(&format!("Signal handler failed: {}", e));
                    } else {
                        self.logger.info("Shutdown signal received");
                    }
                    break;
                }
            }
        }

        self.handle_event(HubEvent::Stop).await;
        Ok(())
    }
}
