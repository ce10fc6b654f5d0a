use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maps a variable token set to a fixed-width 0/1 indicator vector.
///
/// The vocabulary is sorted and frozen at fit time; tokens outside it are
/// dropped so the output width never changes after training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLabelEncoder {
    vocabulary: Vec<String>,
}

impl MultiLabelEncoder {
    pub fn fit<'a, I>(token_sets: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut vocabulary: Vec<String> = token_sets
            .into_iter()
            .flat_map(|set| set.iter().cloned())
            .collect();
        vocabulary.sort();
        vocabulary.dedup();
        Self { vocabulary }
    }

    /// Indicator vector of width [`Self::width`].
    pub fn encode(&self, field: &str, tokens: &[String]) -> Vec<f64> {
        let mut indicators = vec![0.0; self.vocabulary.len()];
        self.encode_into(field, tokens, &mut indicators);
        indicators
    }

    /// Writes indicators into `out`, which must be exactly `width()` long.
    pub(crate) fn encode_into(&self, field: &str, tokens: &[String], out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.vocabulary.len());
        for token in tokens {
            match self.vocabulary.binary_search(token) {
                Ok(position) => out[position] = 1.0,
                Err(_) => debug!(field, token = %token, "dropping token outside vocabulary"),
            }
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }
}
