//! Descriptive statistics behind the plots

use ndarray::Array2;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

/// Pearson correlation; NaN when either side is constant
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - ma, y - mb);
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va == 0.0 || vb == 0.0 {
        return f64::NAN;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Pairwise Pearson correlation of the given columns
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Array2<f64> {
    let k = columns.len();
    let mut corr = Array2::from_elem((k, k), f64::NAN);
    for i in 0..k {
        for j in i..k {
            let r = if i == j && std_dev(&columns[i]) > 0.0 {
                1.0
            } else {
                pearson(&columns[i], &columns[j])
            };
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    corr
}

/// Counts of `values` in `bins` equal-width bins over [lo, hi]; the last
/// bin is closed on the right. Values outside the range are skipped.
pub fn histogram(values: &[f64], bins: usize, lo: f64, hi: f64) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if bins == 0 {
        return counts;
    }
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Gaussian kernel density estimate evaluated at `grid`, with Scott's rule
/// bandwidth `std * n^(-1/5)`. `None` when the sample is too small or
/// constant for a bandwidth to exist.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    let sd = std_dev(values);
    if n < 2 || sd == 0.0 {
        return None;
    }
    let h = sd * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * h * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|&g| {
                norm * values
                    .iter()
                    .map(|&v| (-0.5 * ((g - v) / h).powi(2)).exp())
                    .sum::<f64>()
            })
            .collect(),
    )
}
