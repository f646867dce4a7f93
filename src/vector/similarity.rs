use crate::error::{EngineError, EngineResult};

/// Cosine similarity between two stored vectors: 1 - cosine distance,
/// higher is more similar.
///
/// A zero-magnitude vector is legal in the standardized regime (a player
/// sitting exactly on the population mean) and compares as 0.0 to
/// everything rather than erroring.
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> EngineResult<f32> {
    if vec1.len() != vec2.len() {
        return Err(EngineError::SchemaMismatch(format!(
            "vector dimensions don't match: {} vs {}",
            vec1.len(),
            vec2.len()
        )));
    }

    let mag1: f32 = vec1.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag1 < 1e-6 || mag2 < 1e-6 {
        return Ok(0.0);
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    Ok(dot_product / (mag1 * mag2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![1.0, 2.0, -3.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn zero_magnitude_compares_as_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_schema_error() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(EngineError::SchemaMismatch(_))
        ));
    }
}
