//! Outward status stream for front ends.

use std::sync::mpsc::Sender;

/// Update pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// One line of the append-only installation log.
    Log(String),
    StepStarted { index: usize, name: &'static str },
    /// Overall progress, 0-100.
    Progress(u8),
    Completed,
    Failed { step_index: usize, detail: String },
}

/// Mirrors every event into the `log` facade and, when connected, a channel.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<Sender<InstallEvent>>,
}

impl EventSink {
    pub fn new(tx: Sender<InstallEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sink that only writes to the log.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn send(&self, event: InstallEvent) {
        match &event {
            InstallEvent::Log(line) => log::info!("{}", line),
            InstallEvent::StepStarted { index, name } => {
                log::info!("📍 Step {}: {}", index, name)
            }
            InstallEvent::Progress(pct) => log::info!("Progress: {}%", pct),
            InstallEvent::Completed => log::info!("✅ Installation completed"),
            InstallEvent::Failed { step_index, detail } => {
                log::error!("❌ Step {} failed: {}", step_index, detail)
            }
        }
        if let Some(ref tx) = self.tx {
            // The receiver going away only means nobody is watching any more.
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, line: impl Into<String>) {
        self.send(InstallEvent::Log(line.into()));
    }
}
