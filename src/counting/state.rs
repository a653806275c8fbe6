use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{collect_discrepancies, CountDiscrepancy, CountingSummary};
use crate::models::{CountItem, SectorCount, SectorCountStatus};

/// Classification recorded for one item of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ItemStatus {
    #[default]
    Pending,
    Counted,
    Skipped {
        reason: String,
    },
    NotFound {
        reason: String,
    },
}

/// Session-level view derived from the state; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CountingProgress {
    pub total: usize,
    pub counted: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub percentage: f64,
}

impl CountingProgress {
    pub fn for_total(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Items holding any classification other than pending.
    pub fn classified(&self) -> usize {
        self.counted + self.skipped + self.not_found
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.classified())
    }

    fn release(&mut self, status: &ItemStatus) {
        match status {
            ItemStatus::Pending => {}
            ItemStatus::Counted => self.counted = self.counted.saturating_sub(1),
            ItemStatus::Skipped { .. } => self.skipped = self.skipped.saturating_sub(1),
            ItemStatus::NotFound { .. } => self.not_found = self.not_found.saturating_sub(1),
        }
    }

    fn claim(&mut self, status: &ItemStatus) {
        match status {
            ItemStatus::Pending => {}
            ItemStatus::Counted => self.counted += 1,
            ItemStatus::Skipped { .. } => self.skipped += 1,
            ItemStatus::NotFound { .. } => self.not_found += 1,
        }
    }

    fn recompute_percentage(&mut self) {
        self.percentage = if self.total == 0 {
            0.0
        } else {
            self.classified() as f64 / self.total as f64 * 100.0
        };
    }
}

/// Why a classification request left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    NoSession,
    Completed,
    NoCurrentItem,
    UnknownProduct,
    /// Items and their classifications are out of step, e.g. a hand-edited snapshot.
    ItemMismatch,
}

/// Result of a classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The item at `index` took the requested classification.
    Applied { index: usize, previous: ItemStatus },
    /// The item at `index` is already counted and keeps that; the cursor still advanced.
    Kept { index: usize },
    Ignored(IgnoredReason),
}

/// In-memory state of one sector-count session. Every mutation takes the
/// wall-clock instant from the caller so the transitions stay deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CountingState {
    pub sector_count: Option<SectorCount>,
    pub current_index: usize,
    pub item_statuses: Vec<ItemStatus>,
    pub progress: CountingProgress,
    pub is_active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub summary: Option<CountingSummary>,
}

impl CountingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(
        &mut self,
        mut sector_count: SectorCount,
        items: Vec<CountItem>,
        start_at: DateTime<Utc>,
    ) {
        let total = items.len();
        sector_count.count_items = items;
        sector_count.total_products = total;
        sector_count.counted_products = 0;
        sector_count.status = SectorCountStatus::InProgress;
        sector_count.started_at = Some(start_at);
        sector_count.completed_at = None;

        *self = Self {
            sector_count: Some(sector_count),
            current_index: 0,
            item_statuses: vec![ItemStatus::Pending; total],
            progress: CountingProgress::for_total(total),
            is_active: true,
            start_time: Some(start_at),
            end_time: None,
            summary: None,
        };
    }

    pub fn items(&self) -> &[CountItem] {
        self.sector_count
            .as_ref()
            .map(|sc| sc.count_items.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_items(&self) -> usize {
        self.items().len()
    }

    pub fn current_item(&self) -> Option<&CountItem> {
        self.items().get(self.current_index)
    }

    pub fn item_status(&self, index: usize) -> Option<&ItemStatus> {
        self.item_statuses.get(index)
    }

    pub fn is_completed(&self) -> bool {
        self.sector_count
            .as_ref()
            .is_some_and(|sc| sc.status == SectorCountStatus::Completed)
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.sector_count {
            None => SessionPhase::Uninitialized,
            Some(_) if self.is_completed() => SessionPhase::Completed,
            Some(_) if self.is_active => SessionPhase::Active,
            Some(_) => SessionPhase::Paused,
        }
    }

    pub fn can_go_next(&self) -> bool {
        self.current_index + 1 < self.total_items()
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_index > 0
    }

    /// Out-of-range targets leave the cursor where it is.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.total_items() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    pub fn count_item(
        &mut self,
        product_id: &str,
        quantity: f64,
        observations: Option<String>,
        now: DateTime<Utc>,
    ) -> Transition {
        if let Err(reason) = self.ensure_mutable() {
            return Transition::Ignored(reason);
        }

        let Some(index) = self.locate_product(product_id) else {
            return Transition::Ignored(IgnoredReason::UnknownProduct);
        };
        if index >= self.item_statuses.len() {
            return Transition::Ignored(IgnoredReason::ItemMismatch);
        }

        if let Some(item) = self.item_mut(index) {
            item.record_count(quantity, observations, now);
        }

        let Some(previous) = self.reclassify(index, ItemStatus::Counted) else {
            return Transition::Ignored(IgnoredReason::ItemMismatch);
        };
        self.advance_from(index);
        Transition::Applied { index, previous }
    }

    pub fn skip_current(&mut self, reason: &str) -> Transition {
        let transition = self.classify_current(ItemStatus::Skipped {
            reason: reason.to_string(),
        });

        // A not-found reason stamped on the item no longer describes it.
        if let Transition::Applied {
            index,
            previous: ItemStatus::NotFound { reason: stale },
        } = &transition
        {
            if let Some(item) = self.item_mut(*index) {
                if item.observations.as_deref() == Some(stale.as_str()) {
                    item.observations = None;
                }
            }
        }

        transition
    }

    pub fn mark_current_not_found(&mut self, reason: &str) -> Transition {
        let transition = self.classify_current(ItemStatus::NotFound {
            reason: reason.to_string(),
        });

        if let Transition::Applied { index, .. } = transition {
            if let Some(item) = self.item_mut(index) {
                item.observations = Some(reason.to_string());
            }
        }

        transition
    }

    pub fn pause(&mut self) -> bool {
        self.set_active(false)
    }

    pub fn resume(&mut self) -> bool {
        self.set_active(true)
    }

    pub fn discrepancies(&self) -> Vec<CountDiscrepancy> {
        collect_discrepancies(self.items())
    }

    /// Finalizes the session and returns the summary, or `None` when nothing is
    /// bound or the session was already completed.
    pub fn complete(&mut self, end_at: DateTime<Utc>) -> Option<&CountingSummary> {
        if self.is_completed() {
            return None;
        }
        let start_time = self.start_time.unwrap_or(end_at);
        let sector_count = self.sector_count.as_mut()?;

        sector_count.status = SectorCountStatus::Completed;
        sector_count.completed_at = Some(end_at);

        let summary = CountingSummary::build(sector_count, &self.progress, start_time, end_at);

        self.end_time = Some(end_at);
        self.is_active = false;
        self.summary = Some(summary);
        self.summary.as_ref()
    }

    /// Average time per classified item so far, projected over what is left.
    pub fn estimated_time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.start_time?;
        let classified = self.progress.classified();
        if classified == 0 || self.is_completed() {
            return None;
        }
        let elapsed = now.signed_duration_since(start);
        let per_item = elapsed / classified as i32;
        Some(per_item * self.progress.remaining() as i32)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ensure_mutable(&self) -> Result<(), IgnoredReason> {
        if self.sector_count.is_none() {
            Err(IgnoredReason::NoSession)
        } else if self.is_completed() {
            Err(IgnoredReason::Completed)
        } else {
            Ok(())
        }
    }

    /// Cursor item first, so duplicated products resolve to what the worker sees.
    fn locate_product(&self, product_id: &str) -> Option<usize> {
        let items = self.items();
        match items.get(self.current_index) {
            Some(item) if item.product_id == product_id => Some(self.current_index),
            _ => items.iter().position(|item| item.product_id == product_id),
        }
    }

    fn classify_current(&mut self, status: ItemStatus) -> Transition {
        if let Err(reason) = self.ensure_mutable() {
            return Transition::Ignored(reason);
        }

        let index = self.current_index;
        if self.current_item().is_none() {
            return Transition::Ignored(IgnoredReason::NoCurrentItem);
        }
        let Some(current) = self.item_statuses.get(index) else {
            return Transition::Ignored(IgnoredReason::ItemMismatch);
        };

        if *current == ItemStatus::Counted {
            self.advance_from(index);
            return Transition::Kept { index };
        }

        let Some(previous) = self.reclassify(index, status) else {
            return Transition::Ignored(IgnoredReason::ItemMismatch);
        };
        self.advance_from(index);
        Transition::Applied { index, previous }
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut CountItem> {
        self.sector_count.as_mut()?.count_items.get_mut(index)
    }

    fn reclassify(&mut self, index: usize, status: ItemStatus) -> Option<ItemStatus> {
        let slot = self.item_statuses.get_mut(index)?;
        self.progress.claim(&status);
        let previous = std::mem::replace(slot, status);
        self.progress.release(&previous);
        self.progress.recompute_percentage();

        if let Some(sector_count) = self.sector_count.as_mut() {
            sector_count.counted_products = self.progress.counted;
        }

        Some(previous)
    }

    /// No wraparound: the cursor stays put after the last item.
    fn advance_from(&mut self, index: usize) {
        let next = index + 1;
        if next < self.total_items() {
            self.current_index = next;
        }
    }

    fn set_active(&mut self, active: bool) -> bool {
        if self.ensure_mutable().is_err() {
            return false;
        }
        self.is_active = active;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::test_support::{items, sector_count};
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, minute, 0).unwrap()
    }

    #[test]
    fn count_stamps_item_with_supplied_instant() {
        let mut state = CountingState::new();
        state.begin_session(sector_count(), items(&[8.0, 9.0]), at(0));

        state.count_item("p0", 7.0, Some("one broken".into()), at(3));
        let item = &state.items()[0];
        assert_eq!(item.counted_at, Some(at(3)));
        assert_eq!(item.difference, Some(-1.0));
        assert_eq!(state.sector_count.as_ref().unwrap().counted_products, 1);
    }

    #[test]
    fn estimate_projects_average_pace_over_remaining_items() {
        let mut state = CountingState::new();
        state.begin_session(sector_count(), items(&[1.0, 1.0, 1.0, 1.0]), at(0));
        state.count_item("p0", 1.0, None, at(2));
        state.skip_current("later");

        // Two items in four minutes, two left.
        assert_eq!(state.estimated_time_remaining(at(4)), Some(Duration::minutes(4)));
    }

    #[test]
    fn snapshot_with_missing_classifications_is_ignored_not_fatal() {
        let mut state = CountingState::new();
        state.begin_session(sector_count(), items(&[5.0, 6.0]), at(0));

        let mut json = serde_json::to_value(&state).unwrap();
        json["itemStatuses"] = serde_json::json!([]);
        let mut restored: CountingState = serde_json::from_value(json).unwrap();

        assert_eq!(
            restored.count_item("p0", 5.0, None, at(1)),
            Transition::Ignored(IgnoredReason::ItemMismatch)
        );
        assert_eq!(
            restored.skip_current("later"),
            Transition::Ignored(IgnoredReason::ItemMismatch)
        );
        assert_eq!(
            restored.mark_current_not_found("gone"),
            Transition::Ignored(IgnoredReason::ItemMismatch)
        );
        assert_eq!(restored.progress.classified(), 0);
        assert!(!restored.items()[0].is_counted);
    }

    #[test]
    fn skipping_a_not_found_item_drops_its_stale_reason() {
        let mut state = CountingState::new();
        state.begin_session(sector_count(), items(&[5.0, 6.0]), at(0));
        state.mark_current_not_found("out of stock");
        state.go_to(0);
        state.skip_current("later");

        assert_eq!(
            state.item_status(0),
            Some(&ItemStatus::Skipped {
                reason: "later".into()
            })
        );
        assert_eq!(state.items()[0].observations, None);

        let summary = state.complete(at(5)).unwrap();
        assert!(summary.observations.is_empty());
        assert_eq!(summary.not_found_products, 0);
        assert_eq!(summary.skipped_products, 1);
    }

    #[test]
    fn completion_records_end_time_and_status() {
        let mut state = CountingState::new();
        state.begin_session(sector_count(), items(&[1.0]), at(0));

        let summary = state.complete(at(10)).unwrap().clone();
        assert_eq!(summary.start_time, at(0));
        assert_eq!(summary.end_time, at(10));
        assert_eq!(summary.duration(), Duration::minutes(10));

        let sector_count = state.sector_count.as_ref().unwrap();
        assert_eq!(sector_count.status, SectorCountStatus::Completed);
        assert_eq!(sector_count.completed_at, Some(at(10)));
        assert_eq!(state.phase(), SessionPhase::Completed);
        assert!(state.complete(at(11)).is_none());
        assert_eq!(state.estimated_time_remaining(at(11)), None);
    }
}
