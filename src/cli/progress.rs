//! Progress display for pipeline runs
//!
//! Renders the coordinator's [`ProgressEvent`]s as one indicatif bar per
//! phase. When stderr is not a terminal, or in quiet mode, the bars are
//! hidden and only the log output remains.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::coordinator::{Phase, ProgressEvent};

const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix:>7} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar manager fed from a progress channel
#[derive(Debug)]
pub struct ProgressDisplay {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Create a display; bars are only drawn on an interactive stderr
    pub fn new(quiet: bool) -> Self {
        Self::with_enabled(!quiet && atty::is(atty::Stream::Stderr))
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consume events until the sending side is dropped
    pub fn spawn(mut self, mut events: mpsc::Receiver<ProgressEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.handle(event);
            }
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
        })
    }

    /// Apply one event to the current bar
    pub fn handle(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted { phase, total } => {
                if let Some(previous) = self.bar.take() {
                    previous.finish_and_clear();
                }
                self.bar = Some(self.new_bar(phase, total));
            }
            ProgressEvent::ItemFinished { phase, outcome } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.set_message(format!("last {}: {}", phase, outcome));
                }
            }
            ProgressEvent::PhaseFinished { phase } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!("{} done", phase));
                }
            }
        }
    }

    /// Position of the current bar, if a phase has started
    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(|bar| bar.position())
    }

    fn new_bar(&self, phase: Phase, total: usize) -> ProgressBar {
        let bar = if self.enabled {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_length(total as u64);

        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix(phase.to_string());
        bar
    }
}
