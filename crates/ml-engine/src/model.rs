//! Reference [`PerformancePredictor`]: ridge regression on standardised features.
//!
//! Training follows a fixed recipe:
//! - deterministic shuffle (seeded) and hold-out split
//! - per-feature standardisation fitted on the training split
//! - closed-form ridge solve of `(XᵀX + λI) w = Xᵀ(y - ȳ)`
//!
//! Confidence is the held-out R², clamped to `[0, MAX_CONFIDENCE]`.

use campaign_core::config::MlConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::inference::{
    Dataset, FeatureVector, PerformancePredictor, Prediction, TrainingMetrics, FEATURE_COUNT,
    MAX_CONFIDENCE,
};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Linear regression predictor with L2 regularisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionPredictor {
    name: String,
    lambda: f64,
    test_fraction: f64,
    seed: u64,
    fit: Option<FittedModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedModel {
    scaler: StandardScaler,
    weights: Array1<f64>,
    intercept: f64,
    metrics: TrainingMetrics,
}

/// Per-feature mean/scale. Constant features get scale 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl RegressionPredictor {
    pub fn new(name: impl Into<String>, config: &MlConfig) -> Self {
        Self {
            name: name.into(),
            lambda: config.ridge_lambda,
            test_fraction: config.test_fraction,
            seed: config.seed,
            fit: None,
        }
    }

    /// Metrics from the last successful fit.
    pub fn metrics(&self) -> Option<TrainingMetrics> {
        self.fit.as_ref().map(|f| f.metrics)
    }

    /// Split row indices into (train, test) with a seeded shuffle.
    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let n_test = ((n as f64) * self.test_fraction).ceil() as usize;
        let n_test = n_test.clamp(1, n - 1);
        let train = indices.split_off(n_test);
        (train, indices)
    }
}

impl PerformancePredictor for RegressionPredictor {
    fn train(&mut self, dataset: &Dataset) -> CampaignResult<TrainingMetrics> {
        let n = dataset.len();
        if n < 2 {
            return Err(CampaignError::invalid(format!(
                "{}: need at least 2 samples to train, got {n}",
                self.name
            )));
        }
        let all_finite = dataset.rows().iter().flatten().all(|v| v.is_finite())
            && dataset.targets().iter().all(|v| v.is_finite());
        if !all_finite {
            return Err(CampaignError::invalid(format!(
                "{}: training data contains non-finite values",
                self.name
            )));
        }

        let (train_idx, test_idx) = self.split(n);
        let (x_train, y_train) = select(dataset, &train_idx);
        let (x_test, y_test) = select(dataset, &test_idx);

        let scaler = StandardScaler::fit(&x_train)?;
        let xs_train = scaler.transform(&x_train);
        let xs_test = scaler.transform(&x_test);

        let intercept = y_train.mean().unwrap_or(0.0);
        let centered = &y_train - intercept;

        let mut gram = xs_train.t().dot(&xs_train);
        for i in 0..FEATURE_COUNT {
            gram[[i, i]] += self.lambda;
        }
        let rhs = xs_train.t().dot(&centered);
        let weights = solve(gram, rhs).ok_or_else(|| {
            CampaignError::Internal(anyhow::anyhow!(
                "{}: normal equations are singular (ridge_lambda = {})",
                self.name,
                self.lambda
            ))
        })?;

        let train_pred = xs_train.dot(&weights) + intercept;
        let test_pred = xs_test.dot(&weights) + intercept;
        let metrics = TrainingMetrics {
            train_r2: r2_score(&y_train, &train_pred),
            test_r2: r2_score(&y_test, &test_pred),
            n_samples: train_idx.len(),
        };

        info!(
            model = %self.name,
            n_samples = metrics.n_samples,
            train_r2 = metrics.train_r2,
            test_r2 = metrics.test_r2,
            "Model trained"
        );

        self.fit = Some(FittedModel {
            scaler,
            weights,
            intercept,
            metrics,
        });
        Ok(metrics)
    }

    fn predict(&self, features: &FeatureVector) -> CampaignResult<Prediction> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| CampaignError::ModelNotTrained(self.name.clone()))?;

        let row = Array1::from(features.to_vec());
        let scaled = (&row - &fit.scaler.mean) / &fit.scaler.scale;
        let value = scaled.dot(&fit.weights) + fit.intercept;

        let confidence = if fit.metrics.test_r2.is_finite() {
            fit.metrics.test_r2.clamp(0.0, MAX_CONFIDENCE)
        } else {
            0.0
        };

        debug!(model = %self.name, value, confidence, "Prediction");
        Ok(Prediction { value, confidence })
    }

    fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl StandardScaler {
    fn fit(x: &Array2<f64>) -> CampaignResult<Self> {
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| CampaignError::invalid("cannot standardise an empty matrix"))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }
}

fn select(dataset: &Dataset, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::<f64>::zeros((indices.len(), FEATURE_COUNT));
    let mut y = Array1::<f64>::zeros(indices.len());
    for (row, &i) in indices.iter().enumerate() {
        for (col, &v) in dataset.rows()[i].iter().enumerate() {
            x[[row, col]] = v;
        }
        y[row] = dataset.targets()[i];
    }
    (x, y)
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Gaussian elimination with partial pivoting. `None` if `a` is singular.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::inference::{CampaignFeatures, TrainingSample};

    fn samples(n: usize) -> Vec<TrainingSample> {
        (0..n)
            .map(|i| {
                let budget = 20.0 + i as f64 * 5.0;
                let clicks = ((i * 37) % 23) as f64;
                TrainingSample {
                    features: CampaignFeatures {
                        daily_budget: budget,
                        bid_amount: 1.5,
                        clicks,
                        impressions: clicks * 40.0,
                        days_running: (i % 7) as f64,
                        ..Default::default()
                    },
                    roas: 0.05 * budget + 0.1 * clicks + 1.0,
                    conversions: clicks / 2.0,
                }
            })
            .collect()
    }

    fn predictor() -> RegressionPredictor {
        RegressionPredictor::new("roas", &MlConfig::default())
    }

    #[test]
    fn test_predict_before_train() {
        let err = predictor().predict(&[0.0; FEATURE_COUNT]).unwrap_err();
        assert!(matches!(err, CampaignError::ModelNotTrained(_)));
    }

    #[test]
    fn test_fits_linear_target() {
        let data = samples(40);
        let mut model = predictor();
        let metrics = model.train(&Dataset::from_samples(&data, |s| s.roas)).unwrap();

        assert_eq!(metrics.n_samples, 32);
        assert!(metrics.train_r2 > 0.999);
        assert!(metrics.test_r2 > 0.99);

        let probe = CampaignFeatures {
            daily_budget: 57.0,
            bid_amount: 1.5,
            clicks: 10.0,
            impressions: 400.0,
            days_running: 3.0,
            ..Default::default()
        };
        let p = model.predict(&probe.as_feature_vector()).unwrap();
        let expected = 0.05 * 57.0 + 0.1 * 10.0 + 1.0;
        assert!((p.value - expected).abs() < 0.05, "got {}", p.value);
        assert!(p.confidence <= MAX_CONFIDENCE);
        assert!(p.confidence > 0.9);
    }

    #[test]
    fn test_training_is_deterministic() {
        let data = Dataset::from_samples(&samples(25), |s| s.conversions);
        let mut a = predictor();
        let mut b = predictor();
        assert_eq!(a.train(&data).unwrap(), b.train(&data).unwrap());
    }

    #[test]
    fn test_rejects_tiny_dataset() {
        let data = Dataset::from_samples(&samples(1), |s| s.roas);
        let err = predictor().train(&data).unwrap_err();
        assert!(matches!(err, CampaignError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let mut data = samples(5);
        data[2].roas = f64::NAN;
        let err = predictor()
            .train(&Dataset::from_samples(&data, |s| s.roas))
            .unwrap_err();
        assert!(matches!(err, CampaignError::InvalidArgument(_)));
    }

    #[test]
    fn test_constant_target() {
        let data = Dataset::from_samples(&samples(10), |_| 2.0);
        let mut model = predictor();
        model.train(&data).unwrap();
        let p = model.predict(&[0.0; FEATURE_COUNT]).unwrap();
        assert!((p.value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_small_system() {
        let a = ndarray::arr2(&[[0.0, 2.0], [1.0, 1.0]]);
        let b = ndarray::arr1(&[4.0, 3.0]);
        let x = solve(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        let singular = ndarray::arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        assert!(solve(singular, ndarray::arr1(&[1.0, 2.0])).is_none());
    }

    #[test]
    fn test_split_sizes() {
        let model = predictor();
        let (train, test) = model.split(10);
        assert_eq!((train.len(), test.len()), (8, 2));
        let (train, test) = model.split(2);
        assert_eq!((train.len(), test.len()), (1, 1));
    }
}
