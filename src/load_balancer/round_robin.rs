//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Keeps one cursor per service name so unrelated services never disturb each other.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursors: DashMap<String, AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the current cursor value and advance it. Wraps at `usize::MAX`.
    fn advance(&self, service: &str) -> usize {
        if let Some(cursor) = self.cursors.get(service) {
            return cursor.fetch_add(1, Ordering::Relaxed);
        }
        self.cursors
            .entry(service.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl LoadBalancer for RoundRobin {
    fn pick(&self, service: &str, healthy_count: usize) -> Option<usize> {
        if healthy_count == 0 {
            return None;
        }
        Some(self.advance(service) % healthy_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        assert_eq!(lb.pick("svc", 2), Some(0));
        assert_eq!(lb.pick("svc", 2), Some(1));
        assert_eq!(lb.pick("svc", 2), Some(0));
        assert_eq!(lb.pick("svc", 0), None);
    }

    #[test]
    fn test_cursors_are_per_service() {
        let lb = RoundRobin::new();
        assert_eq!(lb.pick("a", 3), Some(0));
        assert_eq!(lb.pick("b", 3), Some(0));
        assert_eq!(lb.pick("a", 3), Some(1));
        assert_eq!(lb.pick("b", 3), Some(1));
        assert_eq!(lb.pick("a", 3), Some(2));
    }

    #[test]
    fn test_index_stays_in_range_when_count_shrinks() {
        let lb = RoundRobin::new();
        for _ in 0..7 {
            lb.pick("svc", 5);
        }
        assert_eq!(lb.pick("svc", 2), Some(7 % 2));
    }

    #[test]
    fn test_concurrent_picks_cover_evenly() {
        let lb = Arc::new(RoundRobin::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lb = lb.clone();
                std::thread::spawn(move || {
                    let mut counts = [0usize; 4];
                    for _ in 0..1000 {
                        let idx = lb.pick("svc", 4).unwrap();
                        counts[idx] += 1;
                    }
                    counts
                })
            })
            .collect();

        let mut totals = [0usize; 4];
        for handle in handles {
            for (total, count) in totals.iter_mut().zip(handle.join().unwrap()) {
                *total += count;
            }
        }
        // 8000 atomic increments modulo 4: exactly 2000 each.
        assert_eq!(totals, [2000; 4]);
    }
}
