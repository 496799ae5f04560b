//! Mapping escape-time iteration counts to colors.

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];

pub trait Painter {
    /// Color of a pixel that escaped after `n` iterations, `n < max_iterations`.
    fn escaped_color(&self, n: u32, max_iterations: u32) -> Rgb;

    fn escape_color(&self, n: u32, max_iterations: u32) -> Rgb {
        if n >= max_iterations {
            BLACK
        } else {
            self.escaped_color(n, max_iterations)
        }
    }
}

/// Cycles through the hue wheel once every 360 iterations, at full saturation
/// and half lightness.
#[derive(Copy, Clone, Debug, Default)]
pub struct HueCycle;

impl Painter for HueCycle {
    fn escaped_color(&self, n: u32, _max_iterations: u32) -> Rgb {
        let hue = (n % 360) as f64 / 360.0;
        hue_to_rgb(hue, 1.0, 0.5)
    }
}

/// White for quickly escaping points, darkening towards the iteration cap.
/// Never reaches black, which is left to the interior.
#[derive(Copy, Clone, Debug, Default)]
pub struct Greyscale;

impl Painter for Greyscale {
    fn escaped_color(&self, n: u32, max_iterations: u32) -> Rgb {
        let frac = (n as f64 / max_iterations as f64).clamp(0.0, 1.0);
        let v = 255 - (frac * 254.0).round() as u8;
        [v, v, v]
    }
}

/// HSL to RGB. `hue` wraps modulo 1; channels are truncated, not rounded.
pub fn hue_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let (r, g, b) = if saturation == 0.0 {
        (lightness, lightness, lightness)
    } else {
        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        let hue = hue.rem_euclid(1.0);
        (
            hue_channel(p, q, hue + 1.0 / 3.0),
            hue_channel(p, q, hue),
            hue_channel(p, q, hue - 1.0 / 3.0),
        )
    };
    [channel(r), channel(g), channel(b)]
}

fn hue_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

// `as` saturates, so out-of-range lightness clamps to 0 or 255.
fn channel(v: f64) -> u8 {
    (v * 255.0) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(hue_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hue_to_rgb(1.0 / 3.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hue_to_rgb(2.0 / 3.0, 1.0, 0.5), [0, 0, 255]);
        // Falling ramp truncates just below full intensity.
        assert_eq!(hue_to_rgb(0.5, 1.0, 0.5), [0, 254, 255]);
    }

    #[test]
    fn test_achromatic() {
        assert_eq!(hue_to_rgb(0.3, 0.0, 0.5), [127, 127, 127]);
        assert_eq!(hue_to_rgb(0.9, 0.0, 1.0), [255, 255, 255]);
        assert_eq!(hue_to_rgb(0.0, 0.0, 0.0), BLACK);
    }

    #[test]
    fn test_light_and_dark() {
        assert_eq!(hue_to_rgb(0.0, 1.0, 0.75), [255, 127, 127]);
        assert_eq!(hue_to_rgb(0.0, 1.0, 0.25), [127, 0, 0]);
    }

    #[test]
    fn test_hue_wraps() {
        for h in [0.0, 0.125, 0.25, 0.375, 0.5, 0.8125] {
            let base = hue_to_rgb(h, 1.0, 0.5);
            for k in [-3.0, -1.0, 1.0, 2.0, 7.0] {
                assert_eq!(hue_to_rgb(h + k, 1.0, 0.5), base, "h={} k={}", h, k);
            }
        }
    }

    #[test]
    fn test_hue_cycle() {
        assert_eq!(HueCycle.escape_color(0, 50), [255, 0, 0]);
        assert_eq!(HueCycle.escape_color(360, 1000), [255, 0, 0]);
        assert_eq!(HueCycle.escape_color(120, 1000), [0, 255, 0]);
        assert_eq!(HueCycle.escape_color(50, 50), BLACK);
        assert_eq!(HueCycle.escape_color(0, 0), BLACK);
    }

    #[test]
    fn test_greyscale() {
        assert_eq!(Greyscale.escape_color(0, 100), [255, 255, 255]);
        assert_eq!(Greyscale.escape_color(50, 100), [128, 128, 128]);
        assert_eq!(Greyscale.escape_color(99, 100), [4, 4, 4]);
        assert_eq!(Greyscale.escape_color(100, 100), BLACK);
        assert!(Greyscale.escape_color(10, 20) > Greyscale.escape_color(11, 20));
    }

    #[test]
    fn test_escaped_is_never_black() {
        for max in [1, 2, 3, 7, 100, 255, 1000, 5000] {
            for n in 0..max {
                assert_ne!(HueCycle.escape_color(n, max), BLACK, "hue n={} max={}", n, max);
                assert_ne!(Greyscale.escape_color(n, max), BLACK, "grey n={} max={}", n, max);
            }
        }
        assert_ne!(Greyscale.escape_color(u32::MAX - 1, u32::MAX), BLACK);
    }
}
