//! Parallel escape-time renderer for the Mandelbrot set.
//!
//! An image is cut into bands of whole rows, the bands are pulled from a
//! shared queue by a fixed pool of worker threads, and every worker writes
//! RGBA pixels straight into the rows it owns.
//!
//! ```
//! use mandelband::{Rasterizer, Viewport};
//!
//! let mut rasterizer = Rasterizer::new();
//! let viewport = Viewport::from_nums(-2.0, 1.0, -1.5, 1.5);
//! let rgba = rasterizer.render(4, 4, &viewport, 50, 2);
//! assert_eq!(rgba.len(), 4 * 4 * 4);
//! ```

pub mod bench;
pub mod coord;
pub mod ffi;
pub mod painter;
pub mod rasterizer;
pub mod threads;

pub use coord::{Axis, Viewport};
pub use painter::{hue_to_rgb, Painter};
pub use rasterizer::{escape_time, render, Rasterizer, RenderStats};

/// Worker count used when the host does not pick one.
pub fn default_workers() -> usize {
    num_cpus::get()
}
