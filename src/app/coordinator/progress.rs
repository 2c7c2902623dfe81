//! Progress events emitted while a run is executing
//!
//! The coordinator only sends events; rendering them (progress bars, logs)
//! is up to whoever holds the receiving end.

use std::fmt;

use tokio::sync::mpsc;

/// The two pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Process,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Fetch => f.write_str("fetch"),
            Phase::Process => f.write_str("process"),
        }
    }
}

/// Progress update from a running pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    PhaseStarted { phase: Phase, total: usize },
    /// One item finished; `outcome` is the outcome label
    ItemFinished { phase: Phase, outcome: &'static str },
    PhaseFinished { phase: Phase },
}

/// Optional sender that silently ignores a closed or absent receiver
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event).await;
        }
    }

    pub async fn item_finished(&self, phase: Phase, outcome: &'static str) {
        self.send(ProgressEvent::ItemFinished { phase, outcome })
            .await;
    }
}
