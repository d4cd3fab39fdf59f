//! Controller worker task
//!
//! Each controller owns a task and a bounded mailbox. The scheduler only
//! enqueues, so a slow upstream call for one camera never holds up polling
//! or timeout checks for the others.

use super::PrivacyController;
use crate::button_input::PressEvent;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const MAILBOX_CAPACITY: usize = 16;

/// Wall-clock time advanced by the monotonic (tokio) clock
#[derive(Debug, Clone, Copy)]
struct Clock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Clock {
    fn start() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.mono.elapsed()).unwrap_or(chrono::Duration::zero());
        self.wall + elapsed
    }
}

#[derive(Debug)]
enum Command {
    Press(PressEvent),
    CheckTimeout,
}

/// Scheduler-side handle to a running controller
pub struct ControllerHandle {
    name: String,
    tx: mpsc::Sender<Command>,
    timeout_pending: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn spawn(controller: PrivacyController) -> Self {
        let name = controller.camera().name.clone();
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let timeout_pending = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run(controller, rx, timeout_pending.clone()));
        Self {
            name,
            tx,
            timeout_pending,
            task,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a press; dropped with a warning when the mailbox is full
    pub fn press(&self, event: PressEvent) -> bool {
        match self.tx.try_send(Command::Press(event)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(camera = %self.name, error = %e, "Press dropped");
                false
            }
        }
    }

    /// Queue a timeout evaluation unless one is already waiting
    pub fn check_timeout(&self) {
        if self.timeout_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.tx.try_send(Command::CheckTimeout).is_err() {
            self.timeout_pending.store(false, Ordering::Release);
        }
    }

    /// Close the mailbox and wait for the final state write
    pub async fn shutdown(self, grace: Duration) {
        let Self { name, tx, mut task, .. } = self;
        drop(tx);
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(camera = %name, error = %e, "Controller task failed");
            }
            Err(_) => {
                tracing::warn!(camera = %name, grace_ms = grace.as_millis() as u64, "Controller did not stop in time, aborting");
                task.abort();
            }
        }
    }
}

async fn run(
    mut controller: PrivacyController,
    mut rx: mpsc::Receiver<Command>,
    timeout_pending: Arc<AtomicBool>,
) {
    let clock = Clock::start();
    while let Some(command) = rx.recv().await {
        match command {
            Command::Press(event) => {
                tracing::info!(
                    camera = %controller.camera().name,
                    source = ?event.source,
                    "Button pressed"
                );
                if let Err(e) = controller.handle_press(clock.now()).await {
                    tracing::error!(camera = %controller.camera().name, error = %e, "Privacy toggle failed");
                }
            }
            Command::CheckTimeout => {
                timeout_pending.store(false, Ordering::Release);
                if let Err(e) = controller.check_timeout(clock.now()).await {
                    tracing::error!(camera = %controller.camera().name, error = %e, "Timeout disable failed");
                }
            }
        }
    }

    controller.persist().await;
    tracing::debug!(camera = %controller.camera().name, "Controller stopped");
}
