//! Run timing and progress display.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent iterations the ETA is averaged over.
pub const ETA_WINDOW: usize = 50;

/// Wall clock for a bounded run of iterations.
#[derive(Debug)]
pub struct IterationClock {
    started: Instant,
    total: u32,
    completed: u32,
    recent: VecDeque<Duration>,
}

impl IterationClock {
    pub fn start(total: u32) -> Self {
        Self {
            started: Instant::now(),
            total,
            completed: 0,
            recent: VecDeque::with_capacity(ETA_WINDOW),
        }
    }

    /// Record how long the latest iteration took.
    pub fn record(&mut self, duration: Duration) {
        if self.recent.len() == ETA_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(duration);
        self.completed += 1;
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Mean of the recent window, or `None` before the first iteration.
    pub fn average(&self) -> Option<Duration> {
        if self.recent.is_empty() {
            return None;
        }
        let sum: Duration = self.recent.iter().sum();
        Some(sum / self.recent.len() as u32)
    }

    /// Estimated time until all iterations finish.
    pub fn eta(&self) -> Option<Duration> {
        let remaining = self.total.saturating_sub(self.completed);
        self.average().map(|avg| avg * remaining)
    }
}

/// Progress bar for the run, shown only when stderr is a TTY.
pub fn progress_bar(total: u32) -> Option<ProgressBar> {
    if !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        return None;
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} iterations ({eta}) {msg}")
            .ok()?
            .progress_chars("#>-"),
    );
    Some(pb)
}

/// `1h02m03s`-style rendering for log lines.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
