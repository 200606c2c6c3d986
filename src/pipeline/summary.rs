use std::fmt;

use super::SourceOutcome;

/// Counters for one run, printed at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: usize,
    pub sources_failed: usize,
    pub new_items: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SourceOutcome) {
        match *outcome {
            SourceOutcome::NoNewItems => {}
            SourceOutcome::DryRun { items } => self.new_items += items,
            SourceOutcome::Delivered { items, .. } | SourceOutcome::PickupTimedOut { items } => {
                self.new_items += items;
                self.delivered += items;
            }
            SourceOutcome::DeliveryFailed { items, accepted } => {
                self.new_items += items;
                self.delivered += accepted;
                self.failed += items.saturating_sub(accepted);
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run complete: {} sources ({} failed), {} new items, {} delivered, {} failed",
            self.sources, self.sources_failed, self.new_items, self.delivered, self.failed
        )
    }
}
