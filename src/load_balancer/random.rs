//! Uniform random load balancing strategy.

use rand::Rng;

use crate::load_balancer::LoadBalancer;

#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for Random {
    fn pick(&self, _service: &str, healthy_count: usize) -> Option<usize> {
        if healthy_count == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..healthy_count))
    }
}
