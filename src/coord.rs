use std::fmt;
use std::str::FromStr;

use num::{traits::NumOps, Float, Num, One};
use thiserror::Error;

trait Two {
    fn two() -> Self;
}

impl<T> Two for T
where
    T: One + NumOps,
{
    fn two() -> Self {
        T::one() + T::one()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewportError {
    #[error("{axis} axis is inverted (min > max)")]
    Inverted { axis: char },
    #[error("{axis} axis is degenerate (min == max)")]
    Degenerate { axis: char },
    #[error("{axis} axis has a non-finite bound")]
    NotFinite { axis: char },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseViewportError {
    #[error("expected 4 comma-separated bounds, got {0}")]
    WrongCount(usize),
    #[error("could not parse bound {0:?}")]
    BadNumber(String),
    #[error(transparent)]
    Invalid(#[from] ViewportError),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: T,
    pub max: T,
}

impl<T> Axis<T>
where
    T: Num + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }

    pub fn center(&self) -> T {
        (self.max + self.min) / T::two()
    }

    /// Distance on this axis covered by one of `n` pixels.
    pub fn step(&self, n: T) -> T {
        self.length() / n
    }
}

impl<T> Axis<T>
where
    T: Float,
{
    fn check(&self, axis: char) -> Result<(), ViewportError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            Err(ViewportError::NotFinite { axis })
        } else if self.min > self.max {
            Err(ViewportError::Inverted { axis })
        } else if self.min == self.max {
            Err(ViewportError::Degenerate { axis })
        } else {
            Ok(())
        }
    }
}

/// Rectangle of the complex plane mapped onto the pixel grid.
///
/// `x` runs along the real axis and `y` along the imaginary axis. Row 0 of a
/// rendered image samples `y.min`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x: Axis<f64>,
    pub y: Axis<f64>,
}

impl Viewport {
    pub fn new(x: Axis<f64>, y: Axis<f64>) -> Self {
        Self { x, y }
    }

    pub fn from_nums(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self::new(Axis::new(x_min, x_max), Axis::new(y_min, y_max))
    }

    /// Like [`Viewport::from_nums`], but rejects inverted, degenerate and
    /// non-finite bounds.
    pub fn checked(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, ViewportError> {
        let viewport = Self::from_nums(x_min, x_max, y_min, y_max);
        viewport.validate()?;
        Ok(viewport)
    }

    pub fn from_box(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        let x1 = center_x - (width / f64::two());
        let x2 = center_x + (width / f64::two());
        let y1 = center_y - (height / f64::two());
        let y2 = center_y + (height / f64::two());
        Self::from_nums(x1, x2, y1, y2)
    }

    /// Viewport centered on `(center_x, center_y)` spanning `span` on the
    /// real axis, with the imaginary span matching the pixel aspect ratio.
    pub fn fit(center_x: f64, center_y: f64, span: f64, width: usize, height: usize) -> Self {
        let ratio = if width == 0 {
            1.0
        } else {
            height as f64 / width as f64
        };
        Self::from_box(center_x, center_y, span, span * ratio)
    }

    pub fn validate(&self) -> Result<(), ViewportError> {
        self.x.check('x')?;
        self.y.check('y')
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x.center(), self.y.center())
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.x.length() / self.y.length()
    }

    /// Per-pixel step along each axis for a `width`×`height` raster.
    pub fn scale(&self, width: usize, height: usize) -> (f64, f64) {
        (self.x.step(width as f64), self.y.step(height as f64))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_nums(-2.0, 1.0, -1.5, 1.5)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x.min, self.x.max, self.y.min, self.y.max)
    }
}

/// Parses `x_min,x_max,y_min,y_max`. Parsed viewports are always validated.
impl FromStr for Viewport {
    type Err = ParseViewportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ParseViewportError::WrongCount(parts.len()));
        }
        let mut bounds = [0.0; 4];
        for (bound, part) in bounds.iter_mut().zip(&parts) {
            *bound = part
                .parse()
                .map_err(|_| ParseViewportError::BadNumber(part.to_string()))?;
        }
        Ok(Self::checked(bounds[0], bounds[1], bounds[2], bounds[3])?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_axis() {
        let axis = Axis::new(-2.0, 1.0);
        assert_eq!(axis.length(), 3.0);
        assert_eq!(axis.center(), -0.5);
        assert_eq!(axis.step(4.0), 0.75);
    }

    #[test]
    fn test_viewport_scale() {
        let v = Viewport::default();
        assert_eq!(v.scale(4, 4), (0.75, 0.75));
        assert_eq!(v.scale(3, 6), (1.0, 0.5));
    }

    #[test]
    fn test_viewport_from_box() {
        let v = Viewport::from_box(-0.5, 0.0, 3.0, 2.0);
        assert_eq!(v, Viewport::from_nums(-2.0, 1.0, -1.0, 1.0));
        assert_eq!(v.center(), (-0.5, 0.0));
        assert_eq!(v.aspect_ratio(), 1.5);
    }

    #[test]
    fn test_viewport_fit() {
        let v = Viewport::fit(0.0, 0.0, 4.0, 200, 100);
        assert_eq!(v, Viewport::from_nums(-2.0, 2.0, -1.0, 1.0));
    }

    #[test]
    fn test_viewport_validate() {
        assert!(Viewport::default().validate().is_ok());
        assert_eq!(
            Viewport::checked(1.0, -2.0, -1.0, 1.0),
            Err(ViewportError::Inverted { axis: 'x' })
        );
        assert_eq!(
            Viewport::checked(-2.0, 1.0, 0.5, 0.5),
            Err(ViewportError::Degenerate { axis: 'y' })
        );
        assert_eq!(
            Viewport::checked(f64::NAN, 1.0, -1.0, 1.0),
            Err(ViewportError::NotFinite { axis: 'x' })
        );
    }

    #[test]
    fn test_viewport_parse() {
        let v: Viewport = "-2, 1, -1.5, 1.5".parse().unwrap();
        assert_eq!(v, Viewport::default());
        assert_eq!(v.to_string().parse::<Viewport>().unwrap(), v);
        assert_eq!(
            "1,2,3".parse::<Viewport>(),
            Err(ParseViewportError::WrongCount(3))
        );
        assert_eq!(
            "a,1,-1,1".parse::<Viewport>(),
            Err(ParseViewportError::BadNumber("a".to_string()))
        );
        assert_eq!(
            "1,-1,-1,1".parse::<Viewport>(),
            Err(ParseViewportError::Invalid(ViewportError::Inverted {
                axis: 'x'
            }))
        );
    }
}
