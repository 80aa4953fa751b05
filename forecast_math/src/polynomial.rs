//! Lag polynomial arithmetic
//!
//! A polynomial in the backshift operator `B` is stored as its coefficient
//! vector indexed by lag, so `[1.0, -0.5]` is `1 - 0.5B`. Every operator built
//! here has a leading coefficient of one.

/// Multiply two lag polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Autoregressive operator `1 - c1 B^s - c2 B^2s - ...`
pub fn autoregressive(coefficients: &[f64], step: usize) -> Vec<f64> {
    lag_operator(coefficients, step, -1.0)
}

/// Moving-average operator `1 + c1 B^s + c2 B^2s + ...`
pub fn moving_average(coefficients: &[f64], step: usize) -> Vec<f64> {
    lag_operator(coefficients, step, 1.0)
}

fn lag_operator(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    if coefficients.is_empty() || step == 0 {
        return vec![1.0];
    }

    let mut operator = vec![0.0; coefficients.len() * step + 1];
    operator[0] = 1.0;
    for (k, &c) in coefficients.iter().enumerate() {
        operator[(k + 1) * step] = sign * c;
    }
    operator
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`
pub fn differencing(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut operator = vec![1.0];
    for _ in 0..d {
        operator = multiply(&operator, &[1.0, -1.0]);
    }
    if period > 0 {
        let seasonal = autoregressive(&[1.0], period);
        for _ in 0..seasonal_d {
            operator = multiply(&operator, &seasonal);
        }
    }
    operator
}

/// Apply an operator to a series.
///
/// The first `operator.len() - 1` observations have no complete lag window
/// and are consumed, so the output is shorter than the input by the degree.
pub fn apply(operator: &[f64], series: &[f64]) -> Vec<f64> {
    let degree = operator.len().saturating_sub(1);
    if operator.is_empty() || series.len() <= degree {
        return Vec::new();
    }

    (degree..series.len())
        .map(|t| {
            operator
                .iter()
                .enumerate()
                .map(|(i, &c)| c * series[t - i])
                .sum()
        })
        .collect()
}

/// MA(infinity) weights of `ar(B) x_t = ma(B) e_t`.
///
/// `ar` may contain unit roots; the weights then simply stop decaying, which
/// is what widens integrated forecast intervals with the horizon.
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for i in 1..ar.len().min(j + 1) {
            value -= ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}
