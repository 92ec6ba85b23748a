//! Oscillatory shape kernels used inside form-factor integrals.
//!
//! Every kernel is continued to exactly 1 at the removable singularity `x = 0`.

use super::bessel::bessel_j1;

/// Below this magnitude `3·j1(x)/x` switches to its Taylor polynomial in `x²`.
pub const SPHERICAL_KERNEL_SERIES_CUTOFF: f64 = 0.25;

const SPHERICAL_KERNEL_C1: f64 = -1.0 / 10.0;
const SPHERICAL_KERNEL_C2: f64 = 1.0 / 280.0;
const SPHERICAL_KERNEL_C3: f64 = -1.0 / 15_120.0;
const SPHERICAL_KERNEL_C4: f64 = 1.0 / 1_330_560.0;
const SPHERICAL_KERNEL_C5: f64 = -1.0 / 172_972_800.0;

/// `sin(x)/x`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 { 1.0 } else { x.sin() / x }
}

/// `2·J1(x)/x`.
pub fn bessel_2j1x_x(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        2.0 * bessel_j1(x) / x
    }
}

/// `3·j1(x)/x = 3(sin x − x cos x)/x³`, the sphere amplitude kernel.
pub fn spherical_3j1x_x(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }

    if x.abs() < SPHERICAL_KERNEL_SERIES_CUTOFF {
        let y = x * x;
        return 1.0
            + y * (SPHERICAL_KERNEL_C1
                + y * (SPHERICAL_KERNEL_C2
                    + y * (SPHERICAL_KERNEL_C3
                        + y * (SPHERICAL_KERNEL_C4 + y * SPHERICAL_KERNEL_C5))));
    }

    3.0 * (x.sin() - x * x.cos()) / (x * x * x)
}

pub fn sas_sinx_x(x: &[f64]) -> Vec<f64> {
    x.iter().copied().map(sinc).collect()
}

pub fn sas_2j1x_x(x: &[f64]) -> Vec<f64> {
    x.iter().copied().map(bessel_2j1x_x).collect()
}

pub fn sas_3j1x_x(x: &[f64]) -> Vec<f64> {
    x.iter().copied().map(spherical_3j1x_x).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        SPHERICAL_KERNEL_SERIES_CUTOFF, bessel_2j1x_x, sas_2j1x_x, sas_3j1x_x, sas_sinx_x, sinc,
        spherical_3j1x_x,
    };

    fn closed_form_3j1x_x(x: f64) -> f64 {
        3.0 * (x.sin() - x * x.cos()) / (x * x * x)
    }

    #[test]
    fn kernels_are_exactly_one_at_origin() {
        let input = [0.0, 1.0, 0.0, -0.0];
        for values in [sas_sinx_x(&input), sas_2j1x_x(&input), sas_3j1x_x(&input)] {
            assert_eq!(values[0], 1.0);
            assert_eq!(values[2], 1.0);
            assert_eq!(values[3], 1.0);
            assert!(values.iter().all(|value| value.is_finite()));
        }
    }

    #[test]
    fn sinc_matches_definition_away_from_origin() {
        for x in [1.0e-6, 0.3, 2.0, 17.5, -4.0] {
            assert_eq!(sinc(x), x.sin() / x);
        }
    }

    #[test]
    fn bessel_kernel_matches_reference_values() {
        let cases = [
            (0.5, 0.969_073_830_699_495_546),
            (1.0, 0.880_101_171_489_867_032),
            (5.0, -0.131_031_655_036_586_089),
            (10.0, 0.008_694_549_233_772_287),
            (40.0, 0.006_301_915_901_879_250),
        ];

        for (x, expected) in cases {
            let actual = bessel_2j1x_x(x);
            assert!(
                (actual - expected).abs() <= 1.0e-10 * expected.abs(),
                "2J1(x)/x at {x}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn spherical_kernel_polynomial_matches_closed_form() {
        for x in [0.05, 0.1, 0.15, 0.2, 0.249] {
            let series = spherical_3j1x_x(x);
            let exact = closed_form_3j1x_x(x);
            assert!(
                ((series - exact) / exact).abs() < 1.0e-10,
                "x={x}: series {series}, closed form {exact}"
            );
        }
    }

    #[test]
    fn spherical_kernel_is_continuous_across_series_cutoff() {
        let below = spherical_3j1x_x(SPHERICAL_KERNEL_SERIES_CUTOFF * (1.0 - 1.0e-12));
        let above = spherical_3j1x_x(SPHERICAL_KERNEL_SERIES_CUTOFF);
        assert!((below - above).abs() < 1.0e-8);
    }

    #[test]
    fn spherical_kernel_is_even() {
        for x in [0.1, 0.3, 4.0] {
            assert_eq!(spherical_3j1x_x(-x), spherical_3j1x_x(x));
        }
    }
}
