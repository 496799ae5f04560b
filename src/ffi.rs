//! C ABI for hosts embedding the renderer behind a foreign call boundary.
//!
//! Arguments are copied in, the finished pixels are copied out into memory
//! owned by the caller. Out-of-range numbers are clamped rather than rejected.

use std::ptr;

use log::warn;

use crate::coord::Viewport;
use crate::rasterizer::{image_len, Rasterizer};

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct MbViewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl From<MbViewport> for Viewport {
    fn from(v: MbViewport) -> Self {
        Viewport::from_nums(v.x_min, v.x_max, v.y_min, v.y_max)
    }
}

fn clamp_dim(n: i32) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Allocates a renderer. Release it with [`mandelband_free`].
#[no_mangle]
pub extern "C" fn mandelband_new() -> *mut Rasterizer {
    Box::into_raw(Box::new(Rasterizer::new()))
}

/// # Safety
///
/// `engine` must be null or a pointer returned by [`mandelband_new`] that has
/// not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn mandelband_free(engine: *mut Rasterizer) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Renders into `out` and returns the number of bytes the image needs
/// (`width * height * 4`). When `engine` or `out` is null, or `out_len` is
/// smaller than that, nothing is rendered or written. Returns 0 without
/// rendering when the byte count does not fit in `usize`.
///
/// # Safety
///
/// `engine` must come from [`mandelband_new`]; `viewport` must be null or
/// point to a valid [`MbViewport`]; `out` must be null or valid for writes of
/// `out_len` bytes and must not overlap the engine.
#[no_mangle]
pub unsafe extern "C" fn mandelband_render(
    engine: *mut Rasterizer,
    width: i32,
    height: i32,
    viewport: *const MbViewport,
    max_iterations: i32,
    workers: i32,
    out: *mut u8,
    out_len: usize,
) -> usize {
    let width = clamp_dim(width);
    let height = clamp_dim(height);
    let size = match image_len(width, height) {
        Some(size) => size,
        None => {
            warn!("{}x{} image does not fit in memory", width, height);
            return 0;
        }
    };

    let engine = match engine.as_mut() {
        Some(engine) => engine,
        None => return size,
    };
    let viewport = match viewport.as_ref() {
        Some(v) => Viewport::from(*v),
        None => return size,
    };
    if out.is_null() {
        return size;
    }
    if out_len < size {
        warn!("output region of {} bytes is too small for {}", out_len, size);
        return size;
    }

    let max_iterations = u32::try_from(max_iterations).unwrap_or(0);
    let workers = clamp_dim(workers).max(1);
    let pixels = engine.render(width, height, &viewport, max_iterations, workers);
    ptr::copy_nonoverlapping(pixels.as_ptr(), out, pixels.len());
    size
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rasterizer::render;

    const VIEW: MbViewport = MbViewport {
        x_min: -2.0,
        x_max: 1.0,
        y_min: -1.5,
        y_max: 1.5,
    };

    #[test]
    fn test_render_through_ffi() {
        let engine = mandelband_new();
        let mut out = vec![0u8; 64];
        let n = unsafe {
            mandelband_render(engine, 4, 4, &VIEW, 50, 2, out.as_mut_ptr(), out.len())
        };
        assert_eq!(n, 64);
        assert_eq!(out, render(4, 4, &Viewport::from(VIEW), 50, 2));
        unsafe { mandelband_free(engine) };
    }

    #[test]
    fn test_size_query() {
        let engine = mandelband_new();
        let n = unsafe { mandelband_render(engine, 3, 2, &VIEW, 50, 2, ptr::null_mut(), 0) };
        assert_eq!(n, 24);
        let mut out = vec![7u8; 10];
        let n = unsafe { mandelband_render(engine, 3, 2, &VIEW, 50, 2, out.as_mut_ptr(), 10) };
        assert_eq!(n, 24);
        assert!(out.iter().all(|&b| b == 7));
        unsafe { mandelband_free(engine) };
    }

    #[test]
    fn test_clamped_arguments() {
        let engine = mandelband_new();
        let mut out = vec![0u8; 4];
        let n = unsafe { mandelband_render(engine, -5, 3, &VIEW, 50, 1, out.as_mut_ptr(), 4) };
        assert_eq!(n, 0);
        let n = unsafe { mandelband_render(engine, 1, 1, &VIEW, -1, -8, out.as_mut_ptr(), 4) };
        assert_eq!(n, 4);
        assert_eq!(out, [0, 0, 0, 255]);
        unsafe {
            mandelband_free(engine);
            mandelband_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_largest_size_query() {
        let engine = mandelband_new();
        let n = unsafe {
            mandelband_render(engine, i32::MAX, i32::MAX, &VIEW, 50, 2, ptr::null_mut(), 0)
        };
        let side = i32::MAX as usize;
        match side.checked_mul(side).and_then(|n| n.checked_mul(4)) {
            Some(size) => assert_eq!(n, size),
            None => assert_eq!(n, 0),
        }
        #[cfg(target_pointer_width = "32")]
        assert_eq!(n, 0);
        unsafe { mandelband_free(engine) };
    }
}
