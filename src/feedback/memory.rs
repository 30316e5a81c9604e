//! Success-Chain Memory - Chains that preceded a positive outcome
//!
//! Bounded ring buffer: once full, the oldest chain is evicted first.

use rand::Rng;
use std::collections::VecDeque;

use crate::mutation::Chain;

/// Store of historically successful chains
#[derive(Debug, Clone)]
pub struct SuccessChainMemory {
    chains: VecDeque<Chain>,
    capacity: usize,
    evicted: u64,
}

impl SuccessChainMemory {
    /// Create a memory holding at most `capacity` chains (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chains: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    pub fn remember(&mut self, chain: Chain) {
        if self.chains.len() == self.capacity {
            self.chains.pop_front();
            self.evicted += 1;
        }
        self.chains.push_back(chain);
    }

    /// Uniformly random remembered chain
    pub fn pick(&self, rng: &mut impl Rng) -> Option<&Chain> {
        if self.chains.is_empty() {
            return None;
        }
        self.chains.get(rng.gen_range(0..self.chains.len()))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Chains dropped to respect the capacity
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter()
    }

    pub fn last(&self) -> Option<&Chain> {
        self.chains.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationOperator;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn chain(op: MutationOperator) -> Chain {
        Chain::from(vec![op])
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut memory = SuccessChainMemory::new(2);
        memory.remember(chain(MutationOperator::Reverse));
        memory.remember(chain(MutationOperator::Homoglyph));
        memory.remember(chain(MutationOperator::ZeroWidth));

        assert_eq!(memory.len(), 2);
        assert_eq!(memory.evicted(), 1);
        let kept: Vec<_> = memory.iter().cloned().collect();
        assert_eq!(
            kept,
            vec![
                chain(MutationOperator::Homoglyph),
                chain(MutationOperator::ZeroWidth)
            ]
        );
    }

    #[test]
    fn pick_from_empty() {
        let memory = SuccessChainMemory::new(4);
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(memory.pick(&mut rng).is_none());
    }

    #[test]
    fn pick_returns_remembered_chain() {
        let mut memory = SuccessChainMemory::new(4);
        memory.remember(chain(MutationOperator::LogicWrap));
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(memory.pick(&mut rng), Some(&chain(MutationOperator::LogicWrap)));
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(SuccessChainMemory::new(0).capacity(), 1);
    }
}
