//! Sentiment probe: logistic regression on document vectors.

use serde::Serialize;
use tracing::{debug, warn};

use crate::corpus::SentimentDocument;
use crate::doc2vec::DocVectors;
use crate::error::{LexisError, Result};

const MAX_ITER: usize = 35;
const TOLERANCE: f64 = 1e-8;

/// Fitted binary logit. `params[0]` is the intercept.
#[derive(Debug, Clone, Serialize)]
pub struct LogisticModel {
    pub params: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticModel {
    /// Maximum-likelihood fit by Newton-Raphson. A constant column is
    /// prepended to every row of `regressors`.
    pub fn fit(targets: &[f64], regressors: &[Vec<f64>]) -> Result<Self> {
        if targets.is_empty() || targets.len() != regressors.len() {
            return Err(LexisError::ModelFit(format!(
                "{} targets for {} regressor rows",
                targets.len(),
                regressors.len()
            )));
        }
        let k = regressors[0].len() + 1;
        if regressors.iter().any(|row| row.len() + 1 != k) {
            return Err(LexisError::ModelFit("ragged regressor rows".to_string()));
        }

        let mut params = vec![0.0; k];
        let mut x = vec![0.0; k];
        for iteration in 1..=MAX_ITER {
            let mut gradient = vec![0.0; k];
            let mut hessian = vec![0.0; k * k];
            for (row, &y) in regressors.iter().zip(targets) {
                with_constant(row, &mut x);
                let p = sigmoid(dot(&params, &x));
                let w = p * (1.0 - p);
                for i in 0..k {
                    gradient[i] += (y - p) * x[i];
                    for j in 0..=i {
                        hessian[i * k + j] += w * x[i] * x[j];
                    }
                }
            }
            for i in 0..k {
                for j in 0..i {
                    hessian[j * k + i] = hessian[i * k + j];
                }
            }

            let step = match cholesky_solve(&hessian, &gradient, k) {
                Ok(step) => step,
                Err(err) if iteration == 1 => return Err(err),
                Err(_) => return Ok(Self::separated(params, iteration - 1)),
            };
            let previous = params.clone();
            let mut change: f64 = 0.0;
            for (param, delta) in params.iter_mut().zip(&step) {
                *param += delta;
                change = change.max(delta.abs());
            }
            if !params.iter().all(|p| p.is_finite()) {
                return Ok(Self::separated(previous, iteration - 1));
            }
            if change < TOLERANCE {
                debug!(iterations = iteration, "logit converged");
                return Ok(Self {
                    params,
                    iterations: iteration,
                    converged: true,
                });
            }
        }

        debug!(iterations = MAX_ITER, "logit hit the iteration limit");
        Ok(Self {
            params,
            iterations: MAX_ITER,
            converged: false,
        })
    }

    /// The Hessian degenerated mid-fit, which happens when the classes are
    /// perfectly separable. Keep the last finite estimate.
    fn separated(params: Vec<f64>, iterations: usize) -> Self {
        warn!(iterations, "perfect separation detected; results may be unreliable");
        Self {
            params,
            iterations,
            converged: false,
        }
    }

    /// Probability of the positive class for one row (no constant column).
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let linear = self.params[0]
            + self.params[1..]
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>();
        sigmoid(linear)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error_rate: f64,
    pub errors: usize,
    pub test_count: usize,
    pub predictor: LogisticModel,
}

/// Fit the probe on `train` vectors and count misclassified `test` documents.
pub fn error_rate_for_model<M: DocVectors + ?Sized>(
    model: &M,
    train: &[&SentimentDocument],
    test: &[&SentimentDocument],
) -> Result<ErrorReport> {
    if train.is_empty() || test.is_empty() {
        return Err(LexisError::Validation(format!(
            "need both train and test documents (got {} and {})",
            train.len(),
            test.len()
        )));
    }

    let train_targets = targets(train)?;
    let train_regressors = regressors(model, train)?;
    let predictor = LogisticModel::fit(&train_targets, &train_regressors)?;

    let test_targets = targets(test)?;
    let test_regressors = regressors(model, test)?;
    let errors = test_regressors
        .iter()
        .zip(&test_targets)
        .filter(|&(row, &y)| (predictor.predict(row).round_ties_even() - y).abs() > f64::EPSILON)
        .count();

    Ok(ErrorReport {
        error_rate: errors as f64 / test.len() as f64,
        errors,
        test_count: test.len(),
        predictor,
    })
}

fn targets(docs: &[&SentimentDocument]) -> Result<Vec<f64>> {
    docs.iter()
        .map(|doc| {
            doc.sentiment
                .ok_or_else(|| LexisError::Validation(format!("document {} has no sentiment", doc.tag)))
        })
        .collect()
}

fn regressors<M: DocVectors + ?Sized>(model: &M, docs: &[&SentimentDocument]) -> Result<Vec<Vec<f64>>> {
    docs.iter()
        .map(|doc| {
            model
                .doc_vector(doc.tag)
                .map(|v| v.into_iter().map(f64::from).collect())
                .ok_or_else(|| LexisError::NotFound(format!("no vector for document {}", doc.tag)))
        })
        .collect()
}

fn with_constant(row: &[f64], out: &mut [f64]) {
    out[0] = 1.0;
    out[1..].copy_from_slice(row);
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Solve `A x = b` for symmetric positive-definite `A` (row-major, n x n).
fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|m| l[i * n + m] * l[j * n + m]).sum();
            if i == j {
                let diag = a[i * n + i] - sum;
                if diag <= a[i * n + i].abs() * 1e-10 || !diag.is_finite() {
                    return Err(LexisError::ModelFit(
                        "singular Hessian; regressors may be collinear".to_string(),
                    ));
                }
                l[i * n + i] = diag.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|m| l[i * n + m] * y[m]).sum();
        y[i] = (b[i] - sum) / l[i * n + i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|m| l[m * n + i] * x[m]).sum();
        x[i] = (y[i] - sum) / l[i * n + i];
    }
    Ok(x)
}
