//! Decoupling ("beta") approximation for polydisperse or anisotropic particles.

/// `<F>² / <F²>`, taken as 1 where `<F²>` vanishes.
pub fn beta_ratio(f1: f64, f2: f64) -> f64 {
    if f2 == 0.0 { 1.0 } else { f1 * f1 / f2 }
}

/// `Seff = 1 + (F1²/F2)·(S − 1)`.
pub fn effective_structure_factor(f1: &[f64], f2: &[f64], s: &[f64]) -> Vec<f64> {
    scaled_effective_structure_factor(f1, f2, s, 1.0)
}

/// `Seff = 1 + scale·(F1²/F2)·(S − 1)`.
pub fn scaled_effective_structure_factor(
    f1: &[f64],
    f2: &[f64],
    s: &[f64],
    scale: f64,
) -> Vec<f64> {
    f1.iter()
        .zip(f2)
        .zip(s)
        .map(|((f1, f2), s)| 1.0 + scale * beta_ratio(*f1, *f2) * (s - 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{beta_ratio, effective_structure_factor, scaled_effective_structure_factor};

    #[test]
    fn fully_correlated_moments_leave_structure_factor_unchanged() {
        let f1 = [2.0, -3.0, 0.5];
        let f2: Vec<f64> = f1.iter().map(|value| value * value).collect();
        let s = [0.3, 1.2, 0.97];
        assert_eq!(effective_structure_factor(&f1, &f2, &s), s.to_vec());
    }

    #[test]
    fn decorrelated_moments_damp_structure_factor() {
        let seff = effective_structure_factor(&[1.0], &[4.0], &[0.2]);
        assert!((seff[0] - 0.8).abs() < 1.0e-15);
    }

    #[test]
    fn vanishing_second_moment_is_handled_without_nan() {
        assert_eq!(beta_ratio(0.0, 0.0), 1.0);
        let seff = effective_structure_factor(&[0.0], &[0.0], &[0.4]);
        assert_eq!(seff, vec![0.4]);
    }

    #[test]
    fn scale_multiplies_the_coupling_term() {
        let seff = scaled_effective_structure_factor(&[1.0], &[2.0], &[0.5], 4.0);
        assert!((seff[0] - 0.0).abs() < 1.0e-15);
    }
}
