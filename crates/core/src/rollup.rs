//! Course-level progress aggregation.
//!
//! Pure math over per-item snapshots: the services layer assembles the
//! snapshots from storage and catalog data, this module derives display
//! statuses and the course completion percentage.

/// Display status for one course item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// An earlier item in the course is not completed yet.
    Locked,
    Unstarted,
    InProgress,
    Completed,
}

impl ItemStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unstarted => "unstarted",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// Progress snapshot for one course item, in course order.
///
/// `required_secs` is set only for timed lessons. `started` means a progress
/// record exists for the learner, whatever its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub required_secs: Option<u32>,
    pub saved_secs: Option<u32>,
    pub started: bool,
    pub completed: bool,
}

impl ItemSnapshot {
    /// Snapshot for an item the learner has no record for.
    #[must_use]
    pub fn untracked(required_secs: Option<u32>) -> Self {
        Self {
            required_secs,
            saved_secs: None,
            started: false,
            completed: false,
        }
    }
}

/// Derive display statuses for items in course order.
///
/// An item is locked while any earlier item is incomplete, except that a
/// completed item always shows as completed; support tooling can complete
/// items out of order and those must not render as locked.
#[must_use]
pub fn item_statuses(items: &[ItemSnapshot]) -> Vec<ItemStatus> {
    let mut unlocked = true;
    let mut statuses = Vec::with_capacity(items.len());

    for item in items {
        let status = if item.completed {
            ItemStatus::Completed
        } else if !unlocked {
            ItemStatus::Locked
        } else if item.started {
            ItemStatus::InProgress
        } else {
            ItemStatus::Unstarted
        };
        statuses.push(status);
        unlocked = unlocked && item.completed;
    }

    statuses
}

/// Course completion percentage, rounded up to the next whole percent.
///
/// Courses with at least one timed lesson aggregate by watch time: accrued
/// seconds over required seconds across the timed items, with completed items
/// credited in full. Courses with no timed items aggregate by completed item
/// count. Rounding is always upward so any nonzero progress shows at least
/// one percent.
#[must_use]
pub fn percent_complete(items: &[ItemSnapshot]) -> u8 {
    if items.is_empty() {
        return 0;
    }

    let timed: Vec<&ItemSnapshot> = items.iter().filter(|i| i.required_secs.is_some()).collect();

    let (accrued, total) = if timed.is_empty() {
        let completed = items.iter().filter(|i| i.completed).count() as u64;
        (completed, items.len() as u64)
    } else {
        let mut accrued: u64 = 0;
        let mut total: u64 = 0;
        for item in &timed {
            let required = u64::from(item.required_secs.unwrap_or(0));
            let saved = u64::from(item.saved_secs.unwrap_or(0));
            accrued += if item.completed {
                required
            } else {
                saved.min(required)
            };
            total += required;
        }
        (accrued, total)
    };

    if total == 0 {
        return 0;
    }

    u8::try_from((accrued * 100).div_ceil(total)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> ItemSnapshot {
        ItemSnapshot {
            required_secs: None,
            saved_secs: None,
            started: true,
            completed: true,
        }
    }

    fn untouched() -> ItemSnapshot {
        ItemSnapshot::untracked(None)
    }

    #[test]
    fn items_after_an_incomplete_one_are_locked() {
        let statuses = item_statuses(&[untouched(), untouched(), untouched()]);
        assert_eq!(
            statuses,
            vec![ItemStatus::Unstarted, ItemStatus::Locked, ItemStatus::Locked]
        );
    }

    #[test]
    fn completing_items_unlocks_the_next() {
        let statuses = item_statuses(&[completed(), untouched(), untouched()]);
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Completed,
                ItemStatus::Unstarted,
                ItemStatus::Locked
            ]
        );
    }

    #[test]
    fn started_item_shows_in_progress() {
        let started = ItemSnapshot {
            required_secs: Some(120),
            saved_secs: Some(30),
            started: true,
            completed: false,
        };
        let statuses = item_statuses(&[completed(), started]);
        assert_eq!(statuses[1], ItemStatus::InProgress);
    }

    #[test]
    fn completed_item_never_renders_locked() {
        // second item completed out of order by support tooling
        let statuses = item_statuses(&[untouched(), completed()]);
        assert_eq!(statuses, vec![ItemStatus::Unstarted, ItemStatus::Completed]);
    }

    #[test]
    fn count_mode_rounds_up() {
        let items = [completed(), untouched(), untouched()];
        assert_eq!(percent_complete(&items), 34);
    }

    #[test]
    fn count_mode_full_completion_is_exactly_hundred() {
        let items = [completed(), completed(), completed()];
        assert_eq!(percent_complete(&items), 100);
    }

    #[test]
    fn timed_mode_weights_by_watch_time() {
        let items = [
            ItemSnapshot {
                required_secs: Some(100),
                saved_secs: Some(100),
                started: true,
                completed: true,
            },
            ItemSnapshot {
                required_secs: Some(300),
                saved_secs: Some(30),
                started: true,
                completed: false,
            },
        ];
        // 130 of 400 seconds, rounded up
        assert_eq!(percent_complete(&items), 33);
    }

    #[test]
    fn timed_mode_credits_completed_items_in_full() {
        let items = [
            ItemSnapshot {
                required_secs: Some(100),
                saved_secs: None,
                started: true,
                completed: true,
            },
            ItemSnapshot {
                required_secs: Some(100),
                saved_secs: None,
                started: false,
                completed: false,
            },
        ];
        assert_eq!(percent_complete(&items), 50);
    }

    #[test]
    fn empty_course_is_zero_percent() {
        assert_eq!(percent_complete(&[]), 0);
    }
}
