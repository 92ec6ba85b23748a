use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
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
const REFLECTION_CUTOFF: f64 = 0.5;

/// Natural logarithm of `|Γ(x)|` via the Lanczos approximation (g = 7, n = 9).
///
/// Arguments below one half go through the reflection formula; poles at the non-positive
/// integers come back as `+∞`.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 && x.fract() == 0.0 {
        return f64::INFINITY;
    }

    if x < REFLECTION_CUTOFF {
        let sine = (PI * x).sin().abs();
        return (PI / sine).ln() - ln_gamma(1.0 - x);
    }

    let shifted = x - 1.0;
    let mut series = LANCZOS_COEFFICIENTS[0];
    for (index, coefficient) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        series += coefficient / (shifted + index as f64);
    }

    let t = shifted + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (shifted + 0.5) * t.ln() - t + series.ln()
}
