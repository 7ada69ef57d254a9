use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Experience;
use crate::error::AgentError;

/// Fixed-capacity ring buffer of training samples. Once full, each push
/// overwrites the oldest sample.
pub struct ExperienceBuffer<T = Experience> {
    buffer: Vec<T>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl<T> ExperienceBuffer<T> {
    /// A zero `capacity` is a configuration error.
    pub fn new(capacity: usize) -> Result<Self, AgentError> {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// Buffer whose batch sampling is reproducible.
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self, AgentError> {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Result<Self, AgentError> {
        if capacity == 0 {
            return Err(AgentError::Config(
                "experience buffer capacity must be > 0".into(),
            ));
        }
        Ok(ExperienceBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng,
        })
    }

    /// Add a sample. Overwrites the oldest when full.
    pub fn push(&mut self, sample: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(sample);
        } else {
            self.buffer[self.position] = sample;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw up to `batch_size` distinct samples uniformly at random. Returns
    /// every resident sample when fewer than `batch_size` are stored.
    pub fn sample_batch(&mut self, batch_size: usize) -> Vec<&T> {
        let amount = batch_size.min(self.buffer.len());
        let indices = index::sample(&mut self.rng, self.buffer.len(), amount);
        indices.iter().map(|i| &self.buffer[i]).collect()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    /// Fraction of capacity in use, in `[0, 1]`.
    pub fn usage(&self) -> f32 {
        self.buffer.len() as f32 / self.capacity as f32
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_push_and_len() {
        let mut buf = ExperienceBuffer::with_seed(10, 0).unwrap();
        assert!(buf.is_empty());

        buf.push(0u32);
        assert_eq!(buf.len(), 1);

        for i in 1..10 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.usage(), 1.0);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let capacity = 5;
        let extra = 3;
        let mut buf = ExperienceBuffer::with_seed(capacity, 0).unwrap();
        for tag in 0..(capacity + extra) as u32 {
            buf.push(tag);
        }
        assert_eq!(buf.len(), capacity);

        let resident: Vec<u32> = buf.iter().copied().collect();
        assert_eq!(resident, vec![3, 4, 5, 6, 7]);
        for evicted in 0..extra as u32 {
            assert!(!resident.contains(&evicted));
        }
    }

    #[test]
    fn test_iter_before_wraparound() {
        let mut buf = ExperienceBuffer::with_seed(4, 0).unwrap();
        buf.push('a');
        buf.push('b');
        assert_eq!(buf.iter().collect::<String>(), "ab");
    }

    #[test]
    fn test_sample_without_duplicates() {
        let mut buf = ExperienceBuffer::with_seed(100, 1).unwrap();
        for tag in 0..50u32 {
            buf.push(tag);
        }
        for _ in 0..20 {
            let batch = buf.sample_batch(10);
            assert_eq!(batch.len(), 10);
            let unique: HashSet<u32> = batch.iter().map(|&&t| t).collect();
            assert_eq!(unique.len(), 10);
        }
    }

    #[test]
    fn test_sample_underfilled_returns_everything() {
        let mut buf = ExperienceBuffer::with_seed(10, 2).unwrap();
        for tag in 0..3u32 {
            buf.push(tag);
        }
        let batch = buf.sample_batch(5);
        assert_eq!(batch.len(), 3);
        let unique: HashSet<u32> = batch.into_iter().copied().collect();
        assert_eq!(unique, HashSet::from([0, 1, 2]));

        let mut empty: ExperienceBuffer<u32> = ExperienceBuffer::with_seed(4, 0).unwrap();
        assert!(empty.sample_batch(2).is_empty());
    }

    #[test]
    fn test_usage_fraction() {
        let mut buf = ExperienceBuffer::with_seed(8, 0).unwrap();
        assert_eq!(buf.usage(), 0.0);
        buf.push(1u8);
        buf.push(2u8);
        assert!((buf.usage() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            ExperienceBuffer::<u8>::new(0),
            Err(AgentError::Config(_))
        ));
        assert!(ExperienceBuffer::<u8>::with_seed(0, 1).is_err());
    }
}
