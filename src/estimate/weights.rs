use crate::error::EstimatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightScheme {
    /// Entry `i` of `n` (oldest first) gets `decay^(n-1-i)` before
    /// normalisation, so the newest month weighs 1.
    Exponential { decay: f64 },
    Uniform,
}

impl WeightScheme {
    pub fn validate(&self) -> Result<(), EstimatorError> {
        match self {
            WeightScheme::Exponential { decay } if !(decay.is_finite() && *decay > 0.0 && *decay <= 1.0) => {
                Err(EstimatorError::InvalidInput(format!(
                    "decay must be in (0, 1], got {}",
                    decay
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightScheme::Exponential { .. } => "exp",
            WeightScheme::Uniform => "uniform",
        }
    }
}

impl Default for WeightScheme {
    fn default() -> Self {
        WeightScheme::Exponential { decay: 0.85 }
    }
}

/// Weights for `n` chronological entries, summing to 1.
pub fn normalized_weights(n: usize, scheme: WeightScheme) -> Result<Vec<f64>, EstimatorError> {
    if n == 0 {
        return Err(EstimatorError::InvalidInput(
            "cannot weight an empty series".to_string(),
        ));
    }
    scheme.validate()?;

    let raw: Vec<f64> = match scheme {
        WeightScheme::Exponential { decay } => (0..n)
            .map(|i| decay.powi((n - 1 - i) as i32))
            .collect(),
        WeightScheme::Uniform => vec![1.0; n],
    };
    let total: f64 = raw.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(EstimatorError::InvalidInput(format!(
            "weights sum to {}",
            total
        )));
    }
    Ok(raw.into_iter().map(|w| w / total).collect())
}

/// Weighted mean of chronological `values` under `scheme`.
pub fn weighted_mean(values: &[f64], scheme: WeightScheme) -> Result<f64, EstimatorError> {
    let weights = normalized_weights(values.len(), scheme)?;
    Ok(weights.iter().zip(values).map(|(w, v)| w * v).sum())
}
