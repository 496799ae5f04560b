use log::{debug, trace, warn};

use crate::coord::Viewport;
use crate::painter::{HueCycle, Painter};
use crate::threads::{Band, Split, WorkerPool};

pub const BYTES_PER_PIXEL: usize = 4;

/// Bytes in a `width`×`height` RGBA image, or `None` if that overflows.
pub fn image_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(BYTES_PER_PIXEL)
}

/// Number of iterations before the orbit of `a0 + b0·i` leaves the radius-2
/// disk, or `max_iterations` if it never does.
#[inline]
pub fn escape_time(a0: f64, b0: f64, max_iterations: u32) -> u32 {
    let (mut a, mut b) = (a0, b0);
    let (mut aa, mut bb) = (a * a, b * b);
    let mut n = 0;
    while n < max_iterations && aa + bb <= 4.0 {
        b = 2.0 * a * b + b0;
        a = aa - bb + a0;
        aa = a * a;
        bb = b * b;
        n += 1;
    }
    n
}

/// Parallel escape-time renderer producing RGBA rows.
///
/// The rasterizer keeps its pixel buffer between calls. The buffer only grows;
/// each call recomputes the active size and exposes exactly that prefix.
pub struct Rasterizer<P = HueCycle> {
    painter: P,
    buffer: Vec<u8>,
    last: RenderStats,
}

impl Rasterizer<HueCycle> {
    pub fn new() -> Self {
        Self::with_painter(HueCycle)
    }
}

impl Default for Rasterizer<HueCycle> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Rasterizer<P>
where
    P: Painter + Sync,
{
    pub fn with_painter(painter: P) -> Self {
        Self {
            painter,
            buffer: vec![],
            last: RenderStats::default(),
        }
    }

    /// Bytes currently held by the persistent buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Renders `width`×`height` pixels of `viewport` using `workers` threads
    /// (at least one). Returns exactly `width * height * 4` bytes of RGBA,
    /// row 0 first.
    ///
    /// Bounds are not validated; an inverted viewport renders mirrored. A size
    /// whose byte count overflows `usize` renders nothing.
    pub fn render(
        &mut self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        max_iterations: u32,
        workers: usize,
    ) -> &[u8] {
        let size = match image_len(width, height) {
            Some(size) => size,
            None => {
                warn!("{}x{} image does not fit in memory", width, height);
                0
            }
        };
        self.last = RenderStats::default();
        if self.buffer.len() < size {
            trace!("growing buffer from {} to {} bytes", self.buffer.len(), size);
            self.buffer.resize(size, 0);
        }
        if size == 0 {
            return &self.buffer[..0];
        }

        let pool = WorkerPool::new(workers);
        let (x_scale, y_scale) = viewport.scale(width, height);
        let bands = self.buffer[..size].split_bands(width * BYTES_PER_PIXEL, pool.workers());
        let total = bands.len();
        debug!(
            "rendering {}x{} at {} in {} bands on {} workers",
            width,
            height,
            viewport,
            total,
            pool.workers()
        );

        let painter = &self.painter;
        let done = pool.run(bands, |band| {
            paint_band(band, width, viewport, x_scale, y_scale, max_iterations, painter)
        });
        debug_assert_eq!(done.tasks, total, "bands left unfinished");

        let rgba = &self.buffer[..size];
        self.last = RenderStats {
            bands: done.tasks,
            workers: done.workers,
            ..RenderStats::from_rgba(rgba)
        };
        rgba
    }

    /// Statistics of the most recent [`Rasterizer::render`] call.
    pub fn stats(&self) -> RenderStats {
        self.last
    }
}

fn paint_band<P: Painter>(
    band: Band,
    width: usize,
    viewport: &Viewport,
    x_scale: f64,
    y_scale: f64,
    max_iterations: u32,
    painter: &P,
) {
    let Band { rows, pixels } = band;
    trace!("begin band {:?}", rows);
    let row_len = width * BYTES_PER_PIXEL;
    for (y, row) in rows.clone().zip(pixels.chunks_exact_mut(row_len)) {
        let b0 = viewport.y.min + y as f64 * y_scale;
        for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let a0 = viewport.x.min + x as f64 * x_scale;
            let n = escape_time(a0, b0, max_iterations);
            let [r, g, b] = painter.escape_color(n, max_iterations);
            pixel.copy_from_slice(&[r, g, b, 255]);
        }
    }
    trace!("end band {:?}", rows);
}

/// One-shot render with a fresh [`Rasterizer`], returning an owned buffer.
pub fn render(
    width: usize,
    height: usize,
    viewport: &Viewport,
    max_iterations: u32,
    workers: usize,
) -> Vec<u8> {
    Rasterizer::new()
        .render(width, height, viewport, max_iterations, workers)
        .to_vec()
}

/// Summary of a finished RGBA buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub pixels: usize,
    /// Opaque black pixels, i.e. points that never escaped.
    pub interior: usize,
    /// Row bands the image was cut into; zero when counted from a bare buffer.
    pub bands: usize,
    /// Worker threads started; zero when counted from a bare buffer.
    pub workers: usize,
}

impl RenderStats {
    pub fn from_rgba(buffer: &[u8]) -> Self {
        let mut stats = Self::default();
        for pixel in buffer.chunks_exact(BYTES_PER_PIXEL) {
            stats.pixels += 1;
            if pixel == [0, 0, 0, 255] {
                stats.interior += 1;
            }
        }
        stats
    }

    pub fn interior_fraction(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.interior as f64 / self.pixels as f64
        }
    }
}
