/// A fitted probabilistic classifier over fixed-width feature vectors.
///
/// Implementations are immutable after fitting and shared read-only between
/// request handlers.
pub trait Classifier: Send + Sync {
    fn n_classes(&self) -> usize;

    /// Input width the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// One confidence per class, in class-index order, summing to 1.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;

    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
