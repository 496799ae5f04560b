use std::io::{self, Write};
use std::time::Instant;

use log::{debug, info};
use structopt::StructOpt;
use thiserror::Error;

use mandelband::coord::{ParseViewportError, Viewport, ViewportError};
use mandelband::painter::{Greyscale, HueCycle, Painter};
use mandelband::rasterizer::{Rasterizer, BYTES_PER_PIXEL};

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid viewport: {0}")]
    Viewport(#[from] ViewportError),
    #[error("invalid viewport: {0}")]
    ParseViewport(#[from] ParseViewportError),
    #[error("unknown painter {0:?}, expected \"hue\" or \"grey\"")]
    Painter(String),
    #[error("image size must be positive, got {0}x{1}")]
    Size(usize, usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, StructOpt)]
#[structopt(name = "mandelband", about = "Parallel Mandelbrot renderer")]
struct Opt {
    /// Image width in pixels
    #[structopt(long, default_value = "800")]
    width: usize,

    /// Image height in pixels
    #[structopt(long, default_value = "600")]
    height: usize,

    /// Bounds as x_min,x_max,y_min,y_max
    #[structopt(short, long, allow_hyphen_values = true, conflicts_with = "center")]
    viewport: Option<Viewport>,

    /// Center point as re,im; used with --span
    #[structopt(short, long, allow_hyphen_values = true)]
    center: Option<String>,

    /// Width of the real axis shown around --center
    #[structopt(short, long, default_value = "3.0")]
    span: f64,

    /// Escape-time iteration cap
    #[structopt(short, long, default_value = "500")]
    iterations: u32,

    /// Worker threads (defaults to the number of logical CPUs)
    #[structopt(short = "t", long)]
    workers: Option<usize>,

    /// Colorization: hue or grey
    #[structopt(short, long, default_value = "hue")]
    painter: String,

    /// Render the frame this many times, reusing the buffer
    #[structopt(short, long, default_value = "1")]
    repeat: usize,

    /// Print a terminal preview this many columns wide
    #[structopt(long)]
    preview: Option<usize>,
}

impl Opt {
    fn viewport(&self) -> Result<Viewport, CliError> {
        if let Some(viewport) = self.viewport {
            return Ok(viewport);
        }
        let (re, im) = match &self.center {
            Some(c) => parse_center(c)?,
            None => Viewport::default().center(),
        };
        let viewport = Viewport::fit(re, im, self.span, self.width, self.height);
        viewport.validate()?;
        Ok(viewport)
    }
}

fn parse_center(s: &str) -> Result<(f64, f64), ParseViewportError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(ParseViewportError::WrongCount(parts.len()));
    }
    let num = |p: &str| {
        p.parse::<f64>()
            .map_err(|_| ParseViewportError::BadNumber(p.to_string()))
    };
    Ok((num(parts[0])?, num(parts[1])?))
}

/// Two image rows per terminal line using the upper half block, nearest
/// neighbour sampling.
fn preview(rgba: &[u8], width: usize, height: usize, columns: usize) -> String {
    let columns = columns.clamp(1, width.max(1));
    let lines = ((height * columns) / width.max(1) / 2).max(1);
    let px = |x: usize, y: usize| {
        let i = (y.min(height - 1) * width + x.min(width - 1)) * BYTES_PER_PIXEL;
        (rgba[i], rgba[i + 1], rgba[i + 2])
    };
    let mut out = String::new();
    for line in 0..lines {
        let top = line * 2 * height / (lines * 2);
        let bottom = (line * 2 + 1) * height / (lines * 2);
        for col in 0..columns {
            let x = col * width / columns;
            let (tr, tg, tb) = px(x, top);
            let (br, bg, bb) = px(x, bottom);
            out.push_str(&format!(
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                tr, tg, tb, br, bg, bb
            ));
        }
        out.push_str("\x1b[0m\n");
    }
    out
}

fn run<P: Painter + Sync>(opt: &Opt, viewport: &Viewport, painter: P) -> Result<(), CliError> {
    let workers = opt.workers.unwrap_or_else(mandelband::default_workers);
    let mut rasterizer = Rasterizer::with_painter(painter);
    info!(
        "{}x{} pixels, viewport {}, {} iterations, {} workers",
        opt.width, opt.height, viewport, opt.iterations, workers
    );

    let repeat = opt.repeat.max(1);
    for i in 1..repeat {
        let start = Instant::now();
        rasterizer.render(opt.width, opt.height, viewport, opt.iterations, workers);
        info!("render {} took {:.2?}", i, start.elapsed());
    }
    let start = Instant::now();
    let rgba = rasterizer.render(opt.width, opt.height, viewport, opt.iterations, workers);
    info!("render {} took {:.2?}", repeat, start.elapsed());

    let mut out = io::stdout().lock();
    if let Some(columns) = opt.preview {
        write!(out, "{}", preview(rgba, opt.width, opt.height, columns))?;
    }
    let stats = rasterizer.stats();
    writeln!(
        out,
        "{} pixels, {} interior ({:.1}%), {} bands on {} workers",
        stats.pixels,
        stats.interior,
        stats.interior_fraction() * 100.0,
        stats.bands,
        stats.workers
    )?;
    debug!("buffer capacity {} bytes", rasterizer.capacity());
    Ok(())
}

fn main() -> Result<(), CliError> {
    env_logger::init();
    let opt = Opt::from_args();
    if opt.width == 0 || opt.height == 0 {
        return Err(CliError::Size(opt.width, opt.height));
    }
    let viewport = opt.viewport()?;
    match opt.painter.as_str() {
        "hue" => run(&opt, &viewport, HueCycle),
        "grey" | "gray" => run(&opt, &viewport, Greyscale),
        other => Err(CliError::Painter(other.to_string())),
    }
}
