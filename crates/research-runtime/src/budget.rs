//! Step budget shared by an orchestrator and the agents it invokes

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A structural cap on the number of invocations in one run
///
/// Clones share the same counter, so a budget handed to several agents is
/// consumed jointly.
#[derive(Debug, Clone)]
pub struct StepBudget {
    limit: usize,
    used: Arc<AtomicUsize>,
}

impl StepBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A budget that never runs out
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Take one step; returns false once the limit has been reached
    pub fn try_consume(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_stops_at_limit() {
        let budget = StepBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.used(), 2);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_clones_share_counter() {
        let budget = StepBudget::new(3);
        let other = budget.clone();
        assert!(other.try_consume());
        assert_eq!(budget.remaining(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_consumers_never_overdraw() {
        let budget = StepBudget::new(5);
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let b = budget.clone();
                tokio::spawn(async move { b.try_consume() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
        assert_eq!(budget.used(), 5);
    }
}
