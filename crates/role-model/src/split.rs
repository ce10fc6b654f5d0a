use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with a seeded RNG and takes the first `ceil(n * test_ratio)`
/// indices as the test partition, the rest as training.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ModelError::Training(format!(
            "test ratio must be in (0, 1), got {test_ratio}"
        )));
    }
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelError::Training(format!(
            "cannot split {n} rows with test ratio {test_ratio}: a partition would be empty"
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: permutation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_round_test_up() {
        let split = train_test_split(20, 0.35, 42).unwrap();
        assert_eq!(split.test.len(), 7);
        assert_eq!(split.train.len(), 13);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_test_split(50, 0.35, 1).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        assert_eq!(
            train_test_split(40, 0.35, 42).unwrap(),
            train_test_split(40, 0.35, 42).unwrap()
        );
        assert_ne!(
            train_test_split(40, 0.35, 42).unwrap(),
            train_test_split(40, 0.35, 43).unwrap()
        );
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        assert!(train_test_split(1, 0.35, 42).is_err());
        assert!(train_test_split(10, 0.0, 42).is_err());
        assert!(train_test_split(10, 1.0, 42).is_err());
    }
}
