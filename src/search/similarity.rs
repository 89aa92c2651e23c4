//! Distance to similarity normalization

/// Squared distance that maps to similarity 0.
///
/// This is a calibration constant, not a property of Euclidean distance: it
/// assumes unit-normalized embeddings, where unrelated texts sit near squared
/// distance 2 and identical texts at 0. Retune it when switching to a provider
/// whose vectors are not normalized.
pub const DISTANCE_SCALE: f32 = 2.0;

/// `max(0, 1 - distance / DISTANCE_SCALE)`, clamped to [0, 1]
pub fn to_similarity(distance: f32) -> f32 {
    if distance.is_nan() {
        return 0.0;
    }
    (1.0 - distance / DISTANCE_SCALE).clamp(0.0, 1.0)
}

/// Round to 4 decimal places for presentation
pub fn round_score(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}
