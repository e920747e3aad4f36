//! 7-bag randomizer for piece generation
//!
//! Every cycle deals each of the 7 pieces exactly once before any repeats.
//! The first cycle of a round is one short: the piece already on the board
//! was picked up front and is left out of it.

use crate::tetromino::{TetrominoType, TETROMINO_COUNT};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    /// Types not yet dealt in the current cycle
    remaining: Vec<TetrominoType>,
    rng: ChaCha8Rng,
}

impl Bag {
    /// Create a bag whose whole sequence (first piece included) is fixed by `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self {
            remaining: TetrominoType::all().to_vec(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Choose the opening piece of a round and start the first cycle without it
    pub fn pick_first(&mut self) -> TetrominoType {
        let all = TetrominoType::all();
        let first = all[self.rng.gen_range(0..TETROMINO_COUNT)];
        self.reset(first);
        first
    }

    /// Start a new round around an already chosen first piece
    pub fn reset(&mut self, first: TetrominoType) {
        self.remaining = TetrominoType::all()
            .into_iter()
            .filter(|&kind| kind != first)
            .collect();
    }

    /// Deal the next piece
    pub fn draw(&mut self) -> TetrominoType {
        if self.remaining.len() <= 1 {
            let last = self.remaining.pop();
            self.remaining = TetrominoType::all().to_vec();
            if let Some(kind) = last {
                return kind;
            }
        }
        let index = self.rng.gen_range(0..self.remaining.len());
        self.remaining.swap_remove(index)
    }

    /// Types still to be dealt before the next refill
    pub fn remaining(&self) -> &[TetrominoType] {
        &self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_cycle_excludes_first_piece() {
        let mut bag = Bag::with_seed(7);
        let first = bag.pick_first();
        assert_eq!(bag.remaining().len(), 6);

        let dealt: HashSet<_> = (0..6).map(|_| bag.draw()).collect();
        assert_eq!(dealt.len(), 6);
        assert!(!dealt.contains(&first));
        // Last draw of the cycle refilled the bag
        assert_eq!(bag.remaining().len(), TETROMINO_COUNT);
    }

    #[test]
    fn test_reset_with_fixed_first_piece() {
        let mut bag = Bag::with_seed(1);
        bag.reset(TetrominoType::I);
        assert!(!bag.remaining().contains(&TetrominoType::I));
        assert_eq!(bag.remaining().len(), 6);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Bag::with_seed(42);
        let mut b = Bag::with_seed(42);
        assert_eq!(a.pick_first(), b.pick_first());
        for _ in 0..50 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_many_pieces() {
        let mut bag = Bag::with_seed(3);
        bag.pick_first();
        for _ in 0..100 {
            let _ = bag.draw();
            assert!(!bag.remaining().is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_every_window_deals_each_type_once(seed in any::<u64>(), cycles in 1usize..6) {
            let mut bag = Bag::with_seed(seed);
            let first = bag.pick_first();

            let opening: HashSet<_> = (0..TETROMINO_COUNT - 1).map(|_| bag.draw()).collect();
            prop_assert_eq!(opening.len(), TETROMINO_COUNT - 1);
            prop_assert!(!opening.contains(&first));

            for _ in 0..cycles {
                let window: HashSet<_> = (0..TETROMINO_COUNT).map(|_| bag.draw()).collect();
                prop_assert_eq!(window.len(), TETROMINO_COUNT);
            }
        }
    }
}
