//! Minimal timing harness used by the `benches/` targets.

use std::cell::RefCell;
use std::fs;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::coord::Viewport;
use crate::rasterizer::Rasterizer;

/// A named closure run `repeats` times. The closure returns how many pixels
/// it produced so the report can show throughput.
#[derive(Clone)]
pub struct Benchmark {
    f: Rc<dyn Fn() -> usize>,
    name: String,
    repeats: usize,
}

pub enum Unit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
}

impl Unit {
    pub fn format(&self, d: &Duration, width: usize) -> String {
        let (symbol, value) = match self {
            Self::Nanosecond => ("ns", d.as_nanos()),
            Self::Microsecond => ("us", d.as_micros()),
            Self::Millisecond => ("ms", d.as_millis()),
            Self::Second => ("s", d.as_secs() as u128),
        };
        format!("{:>width$}{:<2}", value, symbol)
    }

    /// Largest unit in which `d` still counts below `threshold`.
    pub fn scaled(d: &Duration, threshold: u128) -> Self {
        if d.as_nanos() < threshold {
            Self::Nanosecond
        } else if d.as_micros() < threshold {
            Self::Microsecond
        } else if d.as_millis() < threshold {
            Self::Millisecond
        } else {
            Self::Second
        }
    }
}

impl Benchmark {
    pub fn iter<F: Fn() -> usize + 'static>(name: &str, repeats: usize, f: F) -> Self {
        Self {
            f: Rc::new(f),
            name: name.to_string(),
            repeats: repeats.max(1),
        }
    }

    /// Repeated renders of one frame, reusing a single rasterizer the way a
    /// host redrawing a canvas would.
    pub fn render(
        name: &str,
        repeats: usize,
        width: usize,
        height: usize,
        viewport: Viewport,
        max_iterations: u32,
        workers: usize,
    ) -> Self {
        let rasterizer = RefCell::new(Rasterizer::new());
        Self::iter(name, repeats, move || {
            rasterizer
                .borrow_mut()
                .render(width, height, &viewport, max_iterations, workers)
                .len()
                / 4
        })
    }

    fn run(&self) -> Sample {
        let start = Instant::now();
        let mut pixels = 0;
        for _ in 0..self.repeats {
            pixels += (self.f)();
        }
        Sample {
            name: self.name.clone(),
            repeats: self.repeats,
            pixels,
            elapsed: start.elapsed(),
        }
    }
}

pub struct Sample {
    pub name: String,
    pub repeats: usize,
    pub pixels: usize,
    pub elapsed: Duration,
}

impl Sample {
    pub fn per_call(&self) -> Duration {
        self.elapsed.div_f64(self.repeats as f64)
    }

    pub fn megapixels_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.pixels as f64 / secs / 1e6
        }
    }
}

pub struct BenchmarkReport {
    benches: Vec<Benchmark>,
    results: Vec<Sample>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self {
            benches: vec![],
            results: vec![],
        }
    }

    pub fn add_benches(&mut self, benches: &[Benchmark]) {
        self.benches.extend_from_slice(benches);
    }

    pub fn with_benches(benches: &[Benchmark]) -> Self {
        let mut this = Self::new();
        this.add_benches(benches);
        this
    }

    pub fn results(&self) -> &[Sample] {
        &self.results
    }

    pub fn run(&mut self) -> io::Result<()> {
        let mut out = stdout();
        for bench in &self.benches {
            self.results.push(bench.run());
            write!(out, ".")?;
            out.flush()?;
        }
        writeln!(out)
    }

    pub fn show(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        writeln!(
            out,
            "  {: <32} {: >8}   {: >8}   {: >8}",
            "benchmark", "total", "per_call", "Mpx/s"
        )?;
        for sample in &self.results {
            let per_call = sample.per_call();
            writeln!(
                out,
                "  {: <32} {}   {}   {:>8.2}",
                sample.name,
                Unit::scaled(&sample.elapsed, 100000).format(&sample.elapsed, 6),
                Unit::scaled(&per_call, 100000).format(&per_call, 6),
                sample.megapixels_per_sec(),
            )?;
        }
        out.flush()
    }

    pub fn to_csv(&self) -> String {
        let mut lines = vec!["benchmark,total_us,repeats,per_call_us,mpx_per_sec".to_string()];
        for sample in &self.results {
            lines.push(format!(
                "{},{},{},{},{:.3}",
                sample.name,
                sample.elapsed.as_micros(),
                sample.repeats,
                sample.per_call().as_micros(),
                sample.megapixels_per_sec(),
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    pub fn report(&mut self, name: &str) -> io::Result<()> {
        print!("Benchmark: {}", name);
        self.run()?;
        self.show()?;
        fs::write(format!("benchmark_{}.csv", name), self.to_csv())
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_scaling() {
        let d = Duration::from_micros(1500);
        assert!(matches!(Unit::scaled(&d, 1000), Unit::Millisecond));
        assert_eq!(Unit::Millisecond.format(&d, 4), "   1ms");
        assert!(matches!(
            Unit::scaled(&Duration::from_nanos(10), 1000),
            Unit::Nanosecond
        ));
    }

    #[test]
    fn test_render_benchmark_counts_pixels() {
        let bench = Benchmark::render("tiny", 3, 8, 4, Viewport::default(), 10, 2);
        let mut report = BenchmarkReport::with_benches(&[bench]);
        report.run().unwrap();
        let sample = &report.results()[0];
        assert_eq!(sample.repeats, 3);
        assert_eq!(sample.pixels, 3 * 8 * 4);
        let csv = report.to_csv();
        assert!(csv.starts_with("benchmark,total_us"));
        assert!(csv.lines().nth(1).unwrap().starts_with("tiny,"));
    }
}
