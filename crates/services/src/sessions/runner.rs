use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::controller::{SessionController, SessionSnapshot};

/// How often the countdowns advance.
pub const TICK: Duration = Duration::from_secs(1);

/// Input from the test view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Select { ordinal: u32, index: Option<usize> },
    Submit { ordinal: u32 },
}

/// The view's side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Selects `index` on the question numbered `ordinal`. `None` clears the choice.
    pub fn select(&self, ordinal: u32, index: Option<usize>) {
        self.send(SessionCommand::Select { ordinal, index });
    }

    pub fn submit(&self, ordinal: u32) {
        self.send(SessionCommand::Submit { ordinal });
    }

    #[must_use]
    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!(?command, "session already finished");
        }
    }
}

/// Owns a controller and serializes ticks and view commands onto it.
pub struct SessionRunner {
    controller: SessionController,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionRunner {
    #[must_use]
    pub fn new(controller: SessionController) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let snapshots = controller.subscribe();
        (
            Self {
                controller,
                commands: command_rx,
            },
            SessionHandle {
                commands: command_tx,
                snapshots,
            },
        )
    }

    /// Runs the session until it reaches a terminal phase or every handle is dropped.
    ///
    /// Returns the controller so callers can inspect what was dispatched.
    pub async fn run(mut self) -> SessionController {
        self.controller.enter().await;

        let guard = self.controller.guard();
        let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        while !self.controller.phase().is_terminal() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.controller.tick().await;
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Select { ordinal, index }) => {
                        if let Err(err) = self.controller.select(ordinal, index) {
                            debug!(error = %err, "ignoring invalid selection");
                        }
                    }
                    Some(SessionCommand::Submit { ordinal }) => {
                        if guard.is_claimed(ordinal) {
                            debug!(ordinal, "question already submitted");
                        } else {
                            self.controller.submit(ordinal).await;
                        }
                    }
                    None => break,
                },
            }
        }

        self.controller
    }
}
