use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::title_case;

/// Index every unseen or empty category resolves to.
pub const FALLBACK_INDEX: usize = 0;

/// Maps a frozen vocabulary of category strings to stable integer indices.
///
/// Indices follow the sorted order of the distinct normalized values seen at
/// fit time. The class list is kept sorted so lookups are binary searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    classes: Vec<String>,
}

impl CategoricalEncoder {
    /// Fits on raw values; each is trimmed and title-cased first.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::fit_normalized(values.into_iter().map(|v| title_case(v.as_ref())))
    }

    /// Fits on values that are already normalized (e.g. job-role labels, which
    /// keep their original casing).
    pub fn fit_normalized<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut classes: Vec<String> = values.into_iter().collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Index of an exact class, if known.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Encodes a normalized value, falling back to [`FALLBACK_INDEX`] when
    /// the value is empty or was never seen during fitting.
    pub fn encode(&self, field: &str, value: &str) -> usize {
        if value.is_empty() {
            return FALLBACK_INDEX;
        }
        match self.index_of(value) {
            Some(index) => index,
            None => {
                warn!(field, value, "unseen category, using fallback index");
                FALLBACK_INDEX
            }
        }
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_and_dedups_normalized_values() {
        let enc = CategoricalEncoder::fit(["mtech", "BTech", " btech ", "Mba"]);
        assert_eq!(enc.classes(), &["Btech", "Mba", "Mtech"]);
    }

    #[test]
    fn test_encode_known_value() {
        let enc = CategoricalEncoder::fit(["Yes", "No"]);
        assert_eq!(enc.encode("employed", "No"), 0);
        assert_eq!(enc.encode("employed", "Yes"), 1);
    }

    #[test]
    fn test_unseen_value_falls_back_to_zero() {
        let enc = CategoricalEncoder::fit(["Finance", "Software"]);
        assert_eq!(enc.encode("industry_preference", "Aerospace"), FALLBACK_INDEX);
        assert_eq!(enc.encode("industry_preference", ""), FALLBACK_INDEX);
    }

    #[test]
    fn test_fit_normalized_keeps_casing() {
        let enc = CategoricalEncoder::fit_normalized(vec![
            "data Scientist".to_string(),
            "ML Engineer".to_string(),
        ]);
        assert_eq!(enc.decode(0), Some("ML Engineer"));
        assert_eq!(enc.decode(1), Some("data Scientist"));
        assert_eq!(enc.decode(2), None);
    }
}
