//! Seasonal ARIMA with optional regression terms
//!
//! The model is `y_t = x_t' b + u_t` where the error `u_t` follows a
//! multiplicative seasonal ARIMA process. Parameters are estimated by
//! conditional sum of squares: pre-sample shocks are zero, the regression
//! coefficients are concentrated out by least squares on the filtered data
//! and the remaining ARMA coefficients are found with a Nelder-Mead search
//! from a fixed start, so a fit is fully reproducible.
//!
//! No stationarity or invertibility constraint is imposed on the estimates.

use super::{FittedModel, ForecastModel, ForecastPath};
use crate::error::{ForecastError, Result};
use forecast_math::polynomial;
use forecast_math::regression::least_squares;
use forecast_math::stats::two_sided_critical_value;
use forecast_math::{nelder_mead, NelderMeadConfig};
use std::fmt;
use tracing::{debug, warn};

/// Orders of a seasonal ARIMA `(p,d,q)x(P,D,Q)_s` model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    pub fn new(
        (p, d, q): (usize, usize, usize),
        (seasonal_p, seasonal_d, seasonal_q, period): (usize, usize, usize, usize),
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    /// `(1,1,1)x(0,1,1)_7`, the order used for daily commodity prices
    pub fn weekly() -> Self {
        Self::new((1, 1, 1), (0, 1, 1, 7))
    }

    /// Number of ARMA coefficients to estimate
    pub fn n_params(&self) -> usize {
        self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    fn seasonal_step(&self) -> usize {
        self.period.max(1)
    }

    /// Observations consumed by differencing and the AR filter before the
    /// first conditional residual
    pub fn burn_in(&self) -> usize {
        let step = self.seasonal_step();
        self.d + self.seasonal_d * step + self.p + self.seasonal_p * step
    }

    fn differencing(&self) -> Vec<f64> {
        polynomial::differencing(self.d, self.seasonal_d, self.seasonal_step())
    }
}

impl Default for SarimaOrder {
    fn default() -> Self {
        Self::weekly()
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})x({},{},{})_{}",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// Estimated ARMA coefficients
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SarimaParams {
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaParams {
    /// Unpack an optimizer vector laid out as `[ar, seasonal_ar, ma, seasonal_ma]`
    pub fn from_vector(order: &SarimaOrder, values: &[f64]) -> Self {
        let mut rest = values;
        let mut take = |n: usize| {
            let n = n.min(rest.len());
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        Self {
            ar: take(order.p),
            seasonal_ar: take(order.seasonal_p),
            ma: take(order.q),
            seasonal_ma: take(order.seasonal_q),
        }
    }

    pub fn to_vector(&self) -> Vec<f64> {
        self.ar
            .iter()
            .chain(&self.seasonal_ar)
            .chain(&self.ma)
            .chain(&self.seasonal_ma)
            .copied()
            .collect()
    }

    /// `phi(B) Phi(B^s)`
    pub fn ar_operator(&self, order: &SarimaOrder) -> Vec<f64> {
        polynomial::multiply(
            &polynomial::autoregressive(&self.ar, 1),
            &polynomial::autoregressive(&self.seasonal_ar, order.seasonal_step()),
        )
    }

    /// `theta(B) Theta(B^s)`
    pub fn ma_operator(&self, order: &SarimaOrder) -> Vec<f64> {
        polynomial::multiply(
            &polynomial::moving_average(&self.ma, 1),
            &polynomial::moving_average(&self.seasonal_ma, order.seasonal_step()),
        )
    }

    fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|v| v.is_finite())
    }
}

/// Conditional residuals of `ar(B) diff(B) y_t = ma(B) e_t` with zero
/// pre-sample shocks.
///
/// The result is shorter than `series` by the degrees of `differencing` and `ar`.
pub fn css_residuals(series: &[f64], differencing: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let stationary = polynomial::apply(differencing, series);
    let filtered = polynomial::apply(ar, &stationary);

    let mut shocks: Vec<f64> = Vec::with_capacity(filtered.len());
    for (t, &z) in filtered.iter().enumerate() {
        let mut value = z;
        for i in 1..ma.len().min(t + 1) {
            value -= ma[i] * shocks[t - i];
        }
        shocks.push(value);
    }
    shocks
}

/// Residuals and regression coefficients for fixed ARMA parameters
struct Concentrated {
    beta: Vec<f64>,
    residuals: Vec<f64>,
    sse: f64,
}

fn concentrate(
    order: &SarimaOrder,
    params: &SarimaParams,
    endog: &[f64],
    exog: &[Vec<f64>],
) -> Result<Concentrated> {
    let differencing = order.differencing();
    let ar = params.ar_operator(order);
    let ma = params.ma_operator(order);

    let target = css_residuals(endog, &differencing, &ar, &ma);
    let design: Vec<Vec<f64>> = exog
        .iter()
        .map(|column| css_residuals(column, &differencing, &ar, &ma))
        .collect();

    let beta = least_squares(&design, &target)?;
    let residuals: Vec<f64> = target
        .iter()
        .enumerate()
        .map(|(t, y)| y - design.iter().zip(&beta).map(|(x, b)| b * x[t]).sum::<f64>())
        .collect();
    let sse = residuals.iter().map(|e| e * e).sum();

    Ok(Concentrated {
        beta,
        residuals,
        sse,
    })
}

/// Seasonal ARIMA orders
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: SarimaOrder,
    optimizer: NelderMeadConfig,
}

impl SarimaModel {
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            name: order.to_string(),
            order,
            optimizer: NelderMeadConfig::default(),
        }
    }

    /// Replace the optimizer settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    /// Smallest sample the model can be fitted on with `n_exog` regressors
    pub fn min_observations(&self, n_exog: usize) -> usize {
        self.order.burn_in() + self.order.n_params() + n_exog + 1
    }

    fn validate(&self, endog: &[f64], exog: &[Vec<f64>]) -> Result<()> {
        let required = self.min_observations(exog.len());
        if endog.len() < required {
            return Err(ForecastError::ModelFit(format!(
                "{} needs at least {} observations, got {}",
                self.order,
                required,
                endog.len()
            )));
        }
        if endog.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Series contains non-finite values".to_string(),
            ));
        }
        for (k, column) in exog.iter().enumerate() {
            if column.len() != endog.len() {
                return Err(ForecastError::DataError(format!(
                    "Regressor {} has {} rows, expected {}",
                    k,
                    column.len(),
                    endog.len()
                )));
            }
            if column.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Regressor {} contains non-finite values",
                    k
                )));
            }
        }
        Ok(())
    }
}

impl Default for SarimaModel {
    fn default() -> Self {
        Self::new(SarimaOrder::weekly())
    }
}

impl ForecastModel for SarimaModel {
    type Fitted = FittedSarima;

    fn fit(&self, endog: &[f64], exog: Option<&[Vec<f64>]>) -> Result<FittedSarima> {
        let exog = exog.unwrap_or(&[]);
        self.validate(endog, exog)?;

        let order = self.order;
        let (params, iterations, converged) = if order.n_params() == 0 {
            (SarimaParams::default(), 0, true)
        } else {
            let objective = |values: &[f64]| {
                let params = SarimaParams::from_vector(&order, values);
                match concentrate(&order, &params, endog, exog) {
                    Ok(fit) => fit.sse,
                    Err(_) => f64::INFINITY,
                }
            };
            let start = vec![0.0; order.n_params()];
            let search = nelder_mead(objective, &start, &self.optimizer)
                .map_err(|e| ForecastError::ModelFit(e.to_string()))?;
            if !search.value.is_finite() {
                return Err(ForecastError::ModelFit(format!(
                    "No finite sum of squares found after {} iterations",
                    search.iterations
                )));
            }
            if !search.converged {
                // AR and MA roots that nearly cancel leave a flat ridge; the best vertex is kept
                warn!(
                    model = %order,
                    iterations = search.iterations,
                    css = search.value,
                    converged = false,
                    "optimizer stopped before the tolerance was met, using best point"
                );
            }
            (
                SarimaParams::from_vector(&order, &search.point),
                search.iterations,
                search.converged,
            )
        };

        let fit = concentrate(&order, &params, endog, exog)
            .map_err(|e| ForecastError::ModelFit(e.to_string()))?;
        let sigma2 = fit.sse / fit.residuals.len() as f64;
        if !params.is_finite() || !sigma2.is_finite() || fit.beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::ModelFit(
                "Estimation produced non-finite values".to_string(),
            ));
        }

        let errors: Vec<f64> = endog
            .iter()
            .enumerate()
            .map(|(t, y)| y - exog.iter().zip(&fit.beta).map(|(x, b)| b * x[t]).sum::<f64>())
            .collect();

        debug!(
            model = %order,
            params = ?params.to_vector(),
            beta = ?fit.beta,
            sigma2,
            iterations,
            converged,
            nobs = endog.len(),
            "fitted seasonal ARIMA"
        );

        Ok(FittedSarima {
            name: self.name.clone(),
            order,
            params,
            beta: fit.beta,
            sigma2,
            sse: fit.sse,
            errors,
            residuals: fit.residuals,
            iterations,
            converged,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Seasonal ARIMA fitted on a sample
#[derive(Debug, Clone)]
pub struct FittedSarima {
    name: String,
    order: SarimaOrder,
    params: SarimaParams,
    beta: Vec<f64>,
    sigma2: f64,
    sse: f64,
    /// Regression errors `y_t - x_t' b` over the whole sample
    errors: Vec<f64>,
    /// Conditional residuals, starting after the burn-in
    residuals: Vec<f64>,
    iterations: usize,
    converged: bool,
}

impl FittedSarima {
    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    pub fn params(&self) -> &SarimaParams {
        &self.params
    }

    /// Regression coefficients, one per regressor
    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    /// Innovation variance estimate `SSE / n`
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Conditional sum of squares at the optimum
    pub fn css(&self) -> f64 {
        self.sse
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn nobs(&self) -> usize {
        self.errors.len()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the optimizer met its tolerance before the iteration budget ran out
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn future_regression(&self, steps: usize, future_exog: Option<&[Vec<f64>]>) -> Result<Vec<f64>> {
        if self.beta.is_empty() {
            return Ok(vec![0.0; steps]);
        }

        let columns = future_exog.ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Model was fitted with {} regressors; future values are required",
                self.beta.len()
            ))
        })?;
        if columns.len() != self.beta.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Expected {} future regressors, got {}",
                self.beta.len(),
                columns.len()
            )));
        }
        if let Some(short) = columns.iter().position(|c| c.len() < steps) {
            return Err(ForecastError::InvalidParameter(format!(
                "Future regressor {} has {} rows, need {}",
                short,
                columns[short].len(),
                steps
            )));
        }

        let regression: Vec<f64> = (0..steps)
            .map(|h| columns.iter().zip(&self.beta).map(|(x, b)| b * x[h]).sum())
            .collect();
        if regression.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Future regressors contain non-finite values".to_string(),
            ));
        }
        Ok(regression)
    }
}

impl FittedModel for FittedSarima {
    fn forecast(&self, steps: usize, alpha: f64, future_exog: Option<&[Vec<f64>]>) -> Result<ForecastPath> {
        let z = two_sided_critical_value(alpha)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        let regression = self.future_regression(steps, future_exog)?;

        let ar = polynomial::multiply(&self.order.differencing(), &self.params.ar_operator(&self.order));
        let ma = self.params.ma_operator(&self.order);

        let n = self.errors.len();
        let burn_in = n - self.residuals.len();

        let mut errors = self.errors.clone();
        errors.reserve(steps);
        let mut shocks = vec![0.0; burn_in];
        shocks.extend_from_slice(&self.residuals);
        shocks.resize(n + steps, 0.0);

        for t in n..n + steps {
            let autoregressive: f64 = ar
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(i, _)| *i <= t)
                .map(|(i, c)| c * errors[t - i])
                .sum();
            let moving_average: f64 = ma
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(j, _)| *j <= t)
                .map(|(j, c)| c * shocks[t - j])
                .sum();
            errors.push(moving_average - autoregressive);
        }

        let mean: Vec<f64> = regression
            .iter()
            .zip(&errors[n..])
            .map(|(r, u)| r + u)
            .collect();

        let psi = polynomial::psi_weights(&ar, &ma, steps);
        let std_errors: Vec<f64> = psi
            .iter()
            .scan(0.0, |acc, w| {
                *acc += w * w;
                Some((self.sigma2 * *acc).sqrt())
            })
            .collect();

        if mean.iter().chain(&std_errors).any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(
                "Forecast produced non-finite values".to_string(),
            ));
        }

        ForecastPath::from_std_errors(mean, std_errors, z, alpha)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
