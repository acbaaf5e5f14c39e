use std::sync::atomic::{AtomicUsize, Ordering};

use fitday_core::notify::{Level, Notice, Notifier};

/// Prints notices to stderr. Successes are suppressed in `--json` mode so
/// scripted callers only see failures.
pub struct TerminalNotifier {
    json: bool,
    failures: AtomicUsize,
}

impl TerminalNotifier {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => {
                if !self.json {
                    eprintln!("✓ {}", notice.message);
                }
            }
            Level::Failure => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                if self.json {
                    eprintln!("{}", serde_json::json!({ "notice": notice }));
                } else {
                    eprintln!("✗ {}", notice.message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitday_core::notify::Operation;

    #[test]
    fn test_counts_failures_only() {
        let n = TerminalNotifier::new(true);
        n.notify(Notice::failure(Operation::AddMeal));
        n.notify(Notice::success(Operation::AddMeal).unwrap());
        n.notify(Notice::failure(Operation::Fetch));
        assert_eq!(n.failure_count(), 2);
    }
}
