//! Scalar fields driving the animated surface.
//! None of these are numerical methods: the "zeta" landscape is a decorative
//! stand-in with a pole near Re = 0, the oscillator is a product of sinusoids.

/// Smallest denominator magnitude the amplitude will divide by.
pub const AMPLITUDE_FLOOR: f32 = 1e-4;

/// Fraction of the width left when the contraction is complete.
pub const CONTRACTED_WIDTH: f32 = 0.15;

/// Convert hue/saturation/lightness to linear RGB, all in [0, 1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Decorative "zeta amplitude" over the strip.
///
/// `1 / |re + im * 1e-3 * sin(im / 10)|`, with the denominator magnitude
/// floored at [`AMPLITUDE_FLOOR`], breathing slowly with `t`.
pub fn zeta_amplitude(re: f32, im: f32, t: f32) -> f32 {
    let eps = 1e-3;
    let scale = 1.0 + 0.2 * (t * 0.5).sin();
    let denom = re + im * eps * (im / 10.0).sin();
    let base = 1.0 / denom.abs().max(AMPLITUDE_FLOOR);
    base * scale
}

/// Standing-wave height field, bounded by ±1.4.
pub fn oscillator_height(x: f32, y: f32, t: f32) -> f32 {
    let kx = 0.3;
    let ky = 0.12;
    let n = 3.0;
    let m = 2.0;
    let phase = t * 0.6;

    let hx = (n * kx * x + phase).sin();
    let hy = (m * ky * y - phase * 0.7).cos();

    1.4 * hx * hy
}

/// How much of the surface width survives at contraction progress `t`.
/// 0 = untouched (1.0), 1 = fully squeezed ([`CONTRACTED_WIDTH`]).
pub fn contraction_factor(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - CONTRACTED_WIDTH) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOL: f32 = 1e-6;

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < TOL && red[1].abs() < TOL && red[2].abs() < TOL);

        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(green[0].abs() < TOL && (green[1] - 1.0).abs() < TOL && green[2].abs() < TOL);

        let blue = hsl_to_rgb(2.0 / 3.0, 1.0, 0.5);
        assert!(blue[0].abs() < 1e-5 && blue[1].abs() < 1e-5 && (blue[2] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_contraction_endpoints() {
        assert_eq!(contraction_factor(0.0), 1.0);
        assert!((contraction_factor(1.0) - 0.15).abs() < TOL);
        assert!((contraction_factor(0.5) - 0.575).abs() < TOL);
        assert_eq!(contraction_factor(-5.0), contraction_factor(0.0));
        assert_eq!(contraction_factor(5.0), contraction_factor(1.0));
    }

    #[test]
    fn test_amplitude_floor() {
        // re = 0, im = 0 is the pole: 1 / 1e-4 at t = 0
        let at_pole = zeta_amplitude(0.0, 0.0, 0.0);
        assert!((at_pole - 1.0 / AMPLITUDE_FLOOR).abs() < 1.0);
        assert!(at_pole.is_finite());

        // away from the pole it is just 1/|re|
        assert!((zeta_amplitude(0.5, 0.0, 0.0) - 2.0).abs() < TOL);
    }

    #[test]
    fn test_oscillator_peak() {
        // sin(pi/2) * cos(0) at t = 0
        let x = std::f32::consts::FRAC_PI_2 / 0.9;
        assert!((oscillator_height(x, 0.0, 0.0) - 1.4).abs() < 1e-5);
        assert_eq!(oscillator_height(0.0, 0.0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn test_achromatic_when_unsaturated(h in 0.0f32..=1.0, l in -10.0f32..10.0) {
            prop_assert_eq!(hsl_to_rgb(h, 0.0, l), [l, l, l]);
        }

        #[test]
        fn test_hsl_channels_in_unit_range(
            h in 0.0f32..=1.0,
            s in 0.0f32..=1.0,
            l in 0.0f32..=1.0,
        ) {
            for c in hsl_to_rgb(h, s, l) {
                prop_assert!((-TOL..=1.0 + TOL).contains(&c), "channel {} out of range", c);
            }
        }

        #[test]
        fn test_contraction_non_increasing(a in -2.0f32..3.0, b in -2.0f32..3.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(contraction_factor(hi) <= contraction_factor(lo));
            let f = contraction_factor(a);
            prop_assert!((CONTRACTED_WIDTH - TOL..=1.0).contains(&f));
        }

        #[test]
        fn test_amplitude_finite_non_negative(
            re in -1e6f32..1e6,
            im in -1e6f32..1e6,
            t in -1e4f32..1e4,
        ) {
            let a = zeta_amplitude(re, im, t);
            prop_assert!(a.is_finite());
            prop_assert!(a >= 0.0);
            prop_assert!(a <= 1.2 / AMPLITUDE_FLOOR + 1.0);
        }

        #[test]
        fn test_oscillator_bounded(
            x in -1e4f32..1e4,
            y in -1e4f32..1e4,
            t in -1e4f32..1e4,
        ) {
            let h = oscillator_height(x, y, t);
            prop_assert!((-1.4..=1.4).contains(&h));
        }
    }
}
