use tracing::info;

/// Receives advisory progress updates: a completion fraction in `0.0..=1.0`
/// and a human readable phase label.
pub trait Progress {
    fn report(&mut self, fraction: f32, label: &str);
}

impl<F> Progress for F
where
    F: FnMut(f32, &str),
{
    fn report(&mut self, fraction: f32, label: &str) {
        self(fraction, label)
    }
}

/// Emits progress as tracing events. Fractions never move backwards.
#[derive(Debug, Default)]
pub struct TracingProgress {
    last: f32,
}

impl Progress for TracingProgress {
    fn report(&mut self, fraction: f32, label: &str) {
        self.last = self.last.max(fraction.clamp(0.0, 1.0));
        info!(percent = (self.last * 100.0).round() as u32, "{label}");
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn report(&mut self, _fraction: f32, _label: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_progress_is_monotonic() {
        let mut progress = TracingProgress::default();
        progress.report(0.5, "half");
        progress.report(0.2, "late update");
        assert_eq!(progress.last, 0.5);
        progress.report(2.0, "overflow");
        assert_eq!(progress.last, 1.0);
    }

    #[test]
    fn closures_receive_updates() {
        let mut seen = Vec::new();
        {
            let mut sink = |fraction: f32, label: &str| seen.push((fraction, label.to_string()));
            sink.report(0.9, "Connecting");
        }
        assert_eq!(seen, vec![(0.9, "Connecting".to_string())]);
    }
}
