use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Submissions that may have become fully graded.
///
/// Node-local and shared between the workers (which add to it) and the poller
/// (which drains it every cycle).
#[derive(Clone, Default)]
pub struct CandidateSet {
    inner: Arc<Mutex<HashSet<i64>>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` if the submission was already a candidate.
    pub fn insert(&self, submission_id: i64) -> bool {
        self.lock().insert(submission_id)
    }

    pub fn extend<I: IntoIterator<Item = i64>>(&self, ids: I) {
        self.lock().extend(ids);
    }

    pub fn contains(&self, submission_id: i64) -> bool {
        self.lock().contains(&submission_id)
    }

    /// Removes and returns every candidate, lowest id first.
    pub fn drain(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.lock().drain().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_set_in_order() {
        let set = CandidateSet::new();
        assert!(set.insert(9));
        assert!(!set.insert(9));
        set.extend([3, 5]);

        assert_eq!(set.drain(), vec![3, 5, 9]);
        assert!(set.drain().is_empty());
    }

    #[test]
    fn clones_share_state() {
        let set = CandidateSet::new();
        let worker_view = set.clone();
        worker_view.insert(1);
        assert!(set.contains(1));
        assert_eq!(set.drain(), vec![1]);
    }
}
