//! Descriptive statistics, Student's t-test and least-squares fitting

/// Arithmetic mean, None for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance (n - 1 denominator), None with fewer than two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Result of a two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Independent two-sample Student's t-test with pooled variance, two-sided
///
/// Returns None when either sample has fewer than two values or both samples
/// have zero variance.
pub fn t_test_independent(a: &[f64], b: &[f64]) -> Option<TTest> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let var1 = sample_variance(a)?;
    let var2 = sample_variance(b)?;
    let df = n1 + n2 - 2.0;

    let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
    let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 || !se.is_finite() {
        return None;
    }

    let statistic = (mean(a)? - mean(b)?) / se;
    Some(TTest {
        statistic,
        p_value: student_t_two_sided_p(statistic, df),
        degrees_of_freedom: df,
    })
}

/// Two-sided tail probability P(|T| >= |t|) for Student's t with `df` degrees
/// of freedom
pub fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    regularized_incomplete_beta(0.5 * df, 0.5, x).clamp(0.0, 1.0)
}

/// Natural log of the gamma function (Lanczos, g = 7)
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + 7.5;
    let mut sum = COEFFS[0];
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized incomplete beta function I_x(a, b)
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges quickly only below this point
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Modified Lentz evaluation of the incomplete beta continued fraction
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Least-squares line y = slope * x + intercept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a straight line through the points, None with fewer than two distinct x
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_variance(&[1.0]), None);
        assert!(approx(sample_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 2.5, 1e-12));
    }

    #[test]
    fn test_ln_gamma() {
        // Gamma(5) = 24, Gamma(0.5) = sqrt(pi)
        assert!(approx(ln_gamma(5.0), 24f64.ln(), 1e-10));
        assert!(approx(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn test_incomplete_beta_integer_case() {
        // I_0.4(2, 3) = sum_{j=2}^{4} C(4, j) 0.4^j 0.6^(4-j)
        assert!(approx(regularized_incomplete_beta(2.0, 3.0, 0.4), 0.5248, 1e-10));
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 1.0), 1.0);
    }

    #[test]
    fn test_student_t_closed_forms() {
        // df = 1 is Cauchy: P(|T| >= 1) = 0.5
        assert!(approx(student_t_two_sided_p(1.0, 1.0), 0.5, 1e-9));
        // df = 2: p = 1 - t / sqrt(t^2 + 2)
        let expected = 1.0 - 2.0 / 6f64.sqrt();
        assert!(approx(student_t_two_sided_p(2.0, 2.0), expected, 1e-9));
        assert!(approx(student_t_two_sided_p(0.0, 10.0), 1.0, 1e-12));
    }

    #[test]
    fn test_t_test_independent() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let result = t_test_independent(&a, &b).unwrap();

        assert!(approx(result.statistic, -3.0 / 2.5f64.sqrt(), 1e-12));
        assert_eq!(result.degrees_of_freedom, 8.0);
        assert!(approx(result.p_value, 0.094_349_77, 1e-6));
    }

    #[test]
    fn test_t_test_degenerate() {
        assert!(t_test_independent(&[1.0], &[2.0, 3.0]).is_none());
        assert!(t_test_independent(&[1.0, 1.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_linear_fit() {
        let xs = [2008.0, 2009.0, 2010.0, 2011.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.5 * x - 4900.0).collect();
        let fit = linear_fit(&xs, &ys).unwrap();
        assert!(approx(fit.slope, 2.5, 1e-9));
        assert!(approx(fit.predict(2012.0), 2.5 * 2012.0 - 4900.0, 1e-6));

        assert!(linear_fit(&[1.0], &[1.0]).is_none());
        assert!(linear_fit(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }
}
