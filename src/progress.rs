//! Progress reporting and cancellation, polled once per slice.

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives bake progress.
///
/// `update` is called with `i / n` before slice `i` is rendered and with
/// `1.0` once every slice is done, so fractions never decrease.
pub trait ProgressSink {
    /// Called once before the first slice with the slice count.
    fn begin(&mut self, _total: usize) {}

    /// Current progress in `[0, 1]`.
    fn update(&mut self, fraction: f32);

    /// Called once when rendering stops, whether it finished or not.
    fn end(&mut self) {}
}

impl<F: FnMut(f32)> ProgressSink for F {
    fn update(&mut self, fraction: f32) {
        self(fraction)
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _fraction: f32) {}
}

/// Logs progress at `info` level every `step` percent.
#[derive(Debug, Clone)]
pub struct LogProgress {
    step: u32,
    next: u32,
}

impl LogProgress {
    pub fn new(step: u32) -> Self {
        Self {
            step: step.max(1),
            next: 0,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressSink for LogProgress {
    fn begin(&mut self, total: usize) {
        self.next = 0;
        info!("Rendering {} slices", total);
    }

    fn update(&mut self, fraction: f32) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
        if percent >= self.next {
            info!("{}%", percent);
            self.next = (percent / self.step + 1) * self.step;
        }
    }
}

/// A shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next slice starts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |f: f32| seen.push(f);
            sink.begin(2);
            sink.update(0.0);
            sink.update(0.5);
            sink.end();
        }
        assert_eq!(seen, vec![0.0, 0.5]);
    }

    #[test]
    fn test_log_progress_steps() {
        let mut progress = LogProgress::new(25);
        progress.update(0.0);
        assert_eq!(progress.next, 25);
        progress.update(0.1);
        assert_eq!(progress.next, 25);
        progress.update(0.6);
        assert_eq!(progress.next, 75);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
    }
}
