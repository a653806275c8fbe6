use chrono::{Duration, Utc};

use super::{
    validate_quantity, CountDiscrepancy, CountValidation, CountingProgress, CountingState,
    CountingSummary, IgnoredReason, SessionPhase, Transition,
};
use crate::{
    log_debug, log_info, log_warn,
    models::{CountItem, SectorCount},
    settings::CountingSettings,
};

const ENABLE_LOGS: bool = true;

/// Drives one worker through the items of one sector count.
///
/// Owned by whoever presents the session; there is no process-wide instance.
/// Every operation is total: requests that cannot apply are logged and ignored.
#[derive(Debug, Clone)]
pub struct CountingSessionManager {
    state: CountingState,
    large_difference_ratio: f64,
}

impl Default for CountingSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CountingSessionManager {
    pub fn new() -> Self {
        Self::with_settings(&CountingSettings::default())
    }

    pub fn with_settings(settings: &CountingSettings) -> Self {
        Self {
            state: CountingState::new(),
            large_difference_ratio: settings.large_difference_ratio,
        }
    }

    /// Read-only snapshot for rendering.
    pub fn state(&self) -> &CountingState {
        &self.state
    }

    pub fn initialize(&mut self, sector_count: SectorCount, items: Vec<CountItem>) {
        let session_id = sector_count.id.clone();
        let total = items.len();
        self.state.begin_session(sector_count, items, Utc::now());
        log_info!("Counting session {} initialised with {} items", session_id, total);
    }

    pub fn current_item(&self) -> Option<&CountItem> {
        self.state.current_item()
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn progress(&self) -> &CountingProgress {
        &self.state.progress
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// `quantity` is trusted; run [`CountingSessionManager::validate_quantity`] first.
    pub fn count_item(
        &mut self,
        product_id: &str,
        quantity: f64,
        observations: Option<String>,
    ) -> Transition {
        let transition = self
            .state
            .count_item(product_id, quantity, observations, Utc::now());
        self.log_transition("count", &transition);
        transition
    }

    pub fn skip_item(&mut self, reason: &str) -> Transition {
        let transition = self.state.skip_current(reason);
        self.log_transition("skip", &transition);
        transition
    }

    pub fn mark_not_found(&mut self, reason: &str) -> Transition {
        let transition = self.state.mark_current_not_found(reason);
        self.log_transition("not-found", &transition);
        transition
    }

    pub fn go_to_index(&mut self, index: usize) -> bool {
        let moved = self.state.go_to(index);
        if !moved {
            log_debug!(
                "Ignoring navigation to {} (total {})",
                index,
                self.state.total_items()
            );
        }
        moved
    }

    pub fn go_next(&mut self) -> bool {
        self.can_go_next() && self.go_to_index(self.state.current_index + 1)
    }

    pub fn go_previous(&mut self) -> bool {
        self.can_go_previous() && self.go_to_index(self.state.current_index - 1)
    }

    pub fn can_go_next(&self) -> bool {
        self.state.can_go_next()
    }

    pub fn can_go_previous(&self) -> bool {
        self.state.can_go_previous()
    }

    pub fn pause(&mut self) {
        if self.state.pause() {
            log_info!("Counting session paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state.resume() {
            log_info!("Counting session resumed");
        }
    }

    /// Completing twice keeps the first summary; with no session this does nothing.
    pub fn complete(&mut self) -> Option<&CountingSummary> {
        if self.state.is_completed() {
            log_warn!("Counting session already completed");
            return self.state.summary.as_ref();
        }

        let summary = self.state.complete(Utc::now())?;
        log_info!(
            "Counting session completed: {}/{} counted, {} skipped, {} discrepancies",
            summary.counted_products,
            summary.total_products,
            summary.skipped_products,
            summary.discrepancies.len()
        );
        Some(summary)
    }

    pub fn summary(&self) -> Option<&CountingSummary> {
        self.state.summary.as_ref()
    }

    pub fn discrepancies(&self) -> Vec<CountDiscrepancy> {
        self.state.discrepancies()
    }

    pub fn has_discrepancies(&self) -> bool {
        self.state
            .items()
            .iter()
            .any(|item| CountDiscrepancy::from_item(item).is_some())
    }

    pub fn large_discrepancies(&self) -> Vec<CountDiscrepancy> {
        self.discrepancies()
            .into_iter()
            .filter(|d| d.is_large(self.large_difference_ratio))
            .collect()
    }

    /// Checks raw input against the item under the cursor.
    pub fn validate_quantity(&self, input: &str) -> CountValidation {
        let expected = self
            .current_item()
            .map(|item| item.expected_quantity)
            .unwrap_or(0.0);
        validate_quantity(input, expected, self.large_difference_ratio)
    }

    pub fn estimated_time_remaining(&self) -> Option<Duration> {
        self.state.estimated_time_remaining(Utc::now())
    }

    pub fn reset(&mut self) {
        self.state.reset();
        log_debug!("Counting session state reset");
    }

    fn log_transition(&self, action: &str, transition: &Transition) {
        match transition {
            Transition::Applied { index, previous } => {
                log_debug!(
                    "{} applied to item {} (was {:?}); progress {:.1}%",
                    action,
                    index,
                    previous,
                    self.state.progress.percentage
                );
            }
            Transition::Kept { index } => {
                log_warn!("{} ignored for item {}: already counted", action, index);
            }
            Transition::Ignored(reason) => {
                let why = match reason {
                    IgnoredReason::NoSession => "no session bound",
                    IgnoredReason::Completed => "session completed",
                    IgnoredReason::NoCurrentItem => "no current item",
                    IgnoredReason::UnknownProduct => "product not in session",
                    IgnoredReason::ItemMismatch => "items and classifications out of step",
                };
                log_warn!("{} ignored: {}", action, why);
            }
        }
    }
}
