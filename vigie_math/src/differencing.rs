//! Differencing and integration of series for integrated models

/// Apply `d` rounds of first differencing
///
/// Each round shortens the series by one value. A series that runs out of
/// values comes back empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values forecast past the end of `original`
///
/// `forecast` is on the `d`-times differenced scale; the returned values are
/// on the scale of `original`.
pub fn integrate(forecast: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = forecast.to_vec();

    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);
        let mut running = anchor;
        for value in result.iter_mut() {
            running += *value;
            *value = running;
        }
    }

    result
}

/// Coefficients of `(1 - B)^d` expanded as `1 - c1 B - c2 B^2 ...`
///
/// Returned as the `c` terms so they can be appended to AR coefficients.
pub fn differencing_polynomial(d: usize) -> Vec<f64> {
    // (1 - B)^d = sum_k (-1)^k C(d, k) B^k
    let mut poly = vec![1.0];
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly.iter().skip(1).map(|c| -c).collect()
}
