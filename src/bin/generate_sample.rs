//! Writes a synthetic `csv_data/` tree matching the built-in catalog:
//! Thorlabs and Semrock filter curves plus two laser spectra.
//!
//! Usage: `generate_sample [output_dir]` (default `csv_data`).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Smooth 0→1 step centred on `edge`.
fn logistic(x: f64, edge: f64, width: f64) -> f64 {
    1.0 / (1.0 + (-(x - edge) / width).exp())
}

/// Flat-topped passband of full width `fwhm`.
fn passband(x: f64, center: f64, fwhm: f64, edge_width: f64) -> f64 {
    logistic(x, center - fwhm / 2.0, edge_width) * (1.0 - logistic(x, center + fwhm / 2.0, edge_width))
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Filter curves
// ---------------------------------------------------------------------------

/// Peak transmission and out-of-band floor, as fractions.
const PEAK: f64 = 0.93;
const FLOOR: f64 = 1e-6;

fn shape(band: f64) -> f64 {
    FLOOR + (PEAK - FLOOR) * band
}

/// Sparse Thorlabs export: 1 nm steps, percent transmission, OD column.
fn write_thorlabs(path: &Path, band: impl Fn(f64) -> f64) -> Result<()> {
    let mut out = String::from("Wavelength (nm)\t% Transmission\tOptical Density\n");
    for nm in 300..=1200 {
        let x = nm as f64;
        let t = shape(band(x));
        writeln!(out, "{x:.1}\t{:.6}\t{:.6}", t * 100.0, (1.0 / t).log10())?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

/// Dense Semrock export: 4-line preamble (blank lines do not count), 0.2 nm grid, decimal transmission.
fn write_semrock(path: &Path, part: &str, band: impl Fn(f64) -> f64) -> Result<()> {
    let mut out = String::new();
    writeln!(out, "Semrock {part}")?;
    writeln!(out, "Synthetic spectrum")?;
    writeln!(out, "Measured at normal incidence")?;
    writeln!(out, "Angle of incidence 0")?;
    writeln!(out, "Wavelength (nm)\tTransmission")?;
    for i in 0..4500 {
        let x = 300.0 + i as f64 * 0.2;
        writeln!(out, "{x:.1}\t{:.8}", shape(band(x)))?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Laser spectra
// ---------------------------------------------------------------------------

/// Spectrometer pixels between 350 and 1000 nm.
fn spectrometer_axis() -> Vec<f64> {
    (0..2048).map(|i| 350.0 + i as f64 * 650.0 / 2047.0).collect()
}

fn laser_counts(axis: &[f64], line_nm: f64, rng: &mut SimpleRng) -> Vec<f64> {
    axis.iter()
        .map(|&x| gaussian(x, line_nm, 1.2, 42_000.0) + 300.0 + rng.gauss(0.0, 25.0))
        .collect()
}

fn write_laser_tsv(path: &Path, axis: &[f64], counts: &[f64]) -> Result<()> {
    let mut out = String::from("Wavelength\tCounts\n");
    for (x, c) in axis.iter().zip(counts) {
        writeln!(out, "{x:.4}\t{c:.2}")?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

fn write_laser_parquet(path: &Path, axis: Vec<f64>, counts: Vec<f64>) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Wavelength", DataType::Float64, false),
        Field::new("Counts", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(axis)),
            Arc::new(Float64Array::from(counts)),
        ],
    )?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("csv_data"));
    let thorlabs = root.join("thorlabs");
    let semrock = root.join("semrock");
    let laser = root.join("laser");
    for dir in [&thorlabs, &semrock, &laser] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    write_thorlabs(&thorlabs.join("FB450-10_Spectrum.csv"), |x| {
        passband(x, 450.0, 10.0, 0.8)
    })?;
    write_thorlabs(&thorlabs.join("FEL0450_Spectrum.csv"), |x| {
        logistic(x, 450.0, 1.5)
    })?;

    write_semrock(&semrock.join("FF01-468_SP_Spectrum.csv"), "FF01-468/SP", |x| {
        1.0 - logistic(x, 468.0, 1.0)
    })?;
    write_semrock(&semrock.join("FF01-460-14_Spectrum.csv"), "FF01-460/14", |x| {
        passband(x, 460.0, 14.0, 0.7)
    })?;
    write_semrock(&semrock.join("BLP01-442R_Spectrum.csv"), "BLP01-442R", |x| {
        logistic(x, 442.0, 0.8)
    })?;
    write_semrock(&semrock.join("FF01-430_LP_Spectrum.csv"), "FF01-430/LP", |x| {
        logistic(x, 430.0, 1.0)
    })?;

    let mut rng = SimpleRng::new(42);
    let axis = spectrometer_axis();
    let blue = laser_counts(&axis, 445.0, &mut rng);
    write_laser_tsv(&laser.join("no_filter_laser.csv"), &axis, &blue)?;
    let green = laser_counts(&axis, 540.0, &mut rng);
    write_laser_parquet(&laser.join("single_filter_laser.parquet"), axis, green)?;

    println!("Wrote sample filter curves and laser spectra to {}", root.display());
    Ok(())
}
