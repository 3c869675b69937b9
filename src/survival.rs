/*!

Post-diagnosis survival: `S(t) = c·e^(−k·t) / 100`, with `t` in years since diagnosis and the
fitted curve expressed in percent. The constants come either from configuration or from a
log-linear least-squares fit of a handful of cohort observations.

Both diagnosed branches (on ART and not on ART) share one curve.

*/

use crate::error::SimError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Cohort survival used when no observations are configured: percent alive at 0, 2, 4 and 6
/// years after diagnosis.
pub const DEFAULT_OBSERVATIONS: [(f64, f64); 4] =
    [(0.0, 100.0), (2.0, 48.0), (4.0, 26.0), (6.0, 18.0)];

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    c: f64,
    k: f64,
}

impl SurvivalCurve {
    /// Uses already-fitted constants.
    pub fn new(c: f64, k: f64) -> Result<Self, SimError> {
        if !c.is_finite() || c <= 0.0 {
            return Err(SimError::config(format!("survival constant c must be positive, got {c}")));
        }
        if !k.is_finite() {
            return Err(SimError::config(format!("survival constant k must be finite, got {k}")));
        }
        let curve = SurvivalCurve { c, k };
        curve.warn_on_anomalies();
        Ok(curve)
    }

    /// Fits `y = c·e^(−k·t)` to `(t, y)` pairs, `y` in percent, by regressing `ln y` on `t`.
    pub fn fit(observations: &[(f64, f64)]) -> Result<Self, SimError> {
        if observations.len() < 2 {
            return Err(SimError::config(format!(
                "survival fit needs at least two observations, got {}",
                observations.len()
            )));
        }
        if let Some((t, y)) = observations
            .iter()
            .find(|(t, y)| !t.is_finite() || !y.is_finite() || *y <= 0.0)
        {
            return Err(SimError::config(format!(
                "survival observation ({t}, {y}) must be finite with positive survival"
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let n = observations.len() as f64;
        let mean_t = observations.iter().map(|(t, _)| t).sum::<f64>() / n;
        let mean_log_y = observations.iter().map(|(_, y)| y.ln()).sum::<f64>() / n;

        let (covariance, variance) = observations
            .iter()
            .fold((0.0, 0.0), |(cov, var), (t, y)| {
                let dt = t - mean_t;
                (cov + dt * (y.ln() - mean_log_y), var + dt * dt)
            });
        if variance == 0.0 {
            return Err(SimError::config(
                "survival observations must span more than one time point",
            ));
        }

        let slope = covariance / variance;
        let intercept = mean_log_y - slope * mean_t;
        let curve = SurvivalCurve { c: intercept.exp(), k: -slope };
        debug!("fitted survival curve c = {:.4}, k = {:.4}", curve.c, curve.k);
        curve.warn_on_anomalies();
        Ok(curve)
    }

    fn warn_on_anomalies(&self) {
        if self.k <= 0.0 {
            warn!(
                "survival decay constant k = {} is not positive; survival will not decline",
                self.k
            );
        }
        if self.c > 100.0 {
            warn!(
                "survival constant c = {} exceeds 100%; early probabilities are clamped to 1",
                self.c
            );
        }
    }

    #[must_use]
    pub fn c(&self) -> f64 {
        self.c
    }

    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Probability of being alive `years` after diagnosis, clamped to `[0, 1]`. Only `t >= 0` is
    /// meaningful.
    #[must_use]
    #[inline]
    pub fn survival_probability(&self, years: f64) -> f64 {
        (self.c * (-self.k * years).exp() / 100.0).clamp(0.0, 1.0)
    }

    /// Probability that someone alive `years` after diagnosis dies within the next
    /// `interval` years. Everyone is alive at the moment of diagnosis, so the first interval
    /// also absorbs the curve's shortfall below 100% at `t = 0`.
    #[must_use]
    pub fn death_probability(&self, years: f64, interval: f64) -> f64 {
        let alive_now = if years <= 0.0 { 1.0 } else { self.survival_probability(years) };
        if alive_now <= 0.0 {
            return 1.0;
        }
        let alive_later = self.survival_probability(years + interval);
        (1.0 - alive_later / alive_now).clamp(0.0, 1.0)
    }
}

impl Default for SurvivalCurve {
    fn default() -> Self {
        // Closed-form fit of `DEFAULT_OBSERVATIONS`.
        SurvivalCurve { c: 91.82, k: 0.2879 }
    }
}
