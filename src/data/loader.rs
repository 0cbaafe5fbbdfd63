use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::VendorFormat;
use crate::optics::curve::{RawCurve, RawRow};
use crate::optics::{OpticsError, SourceSpectrum};

/// A data-format problem, raised inside the anyhow chain so callers can
/// `downcast_ref::<OpticsError>()`.
fn format_error(msg: String) -> anyhow::Error {
    OpticsError::DataFormat(msg).into()
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Index of the first header cell whose lowercase text contains any of
/// `needles`, so "Wavelength (nm)" and "% Transmission" both match.
fn find_column(headers: &csv::StringRecord, needles: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_ascii_lowercase();
        needles.iter().any(|n| h.contains(n))
    })
}

fn parse_cell(record: &csv::StringRecord, idx: usize, row: usize, col: &str) -> Result<f64> {
    let cell = record.get(idx).unwrap_or("");
    cell.parse::<f64>()
        .map_err(|_| format_error(format!("row {row}, {col}: '{cell}' is not a number")))
}

// ---------------------------------------------------------------------------
// Vendor curve files
// ---------------------------------------------------------------------------

/// Read a vendor transmission file into raw rows ready for
/// [`SpectralCurve::build`](crate::optics::curve::SpectralCurve::build).
pub fn load_vendor_curve(path: &Path, format: VendorFormat) -> Result<RawCurve> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw = parse_vendor_curve(file, format)
        .with_context(|| format!("reading {format} curve {}", path.display()))?;
    info!(
        "loaded {} rows of {format} data from {}",
        raw.rows.len(),
        path.display()
    );
    Ok(raw)
}

/// Tab-separated layout:
///
/// ```text
/// <preamble lines, Semrock only>
/// Wavelength   Transmission   [OD]
/// 400.0        0.93           [0.03]
/// ```
///
/// Every data row must have as many cells as the header.
pub fn parse_vendor_curve<R: Read>(reader: R, format: VendorFormat) -> Result<RawCurve> {
    let mut reader = tsv_reader(reader);
    let mut records = reader.records();

    for line in 0..format.preamble_lines() {
        records
            .next()
            .transpose()
            .with_context(|| format!("reading preamble line {line}"))?
            .ok_or_else(|| format_error("file ends inside the preamble".into()))?;
    }

    let headers = records
        .next()
        .transpose()
        .context("reading header row")?
        .ok_or_else(|| format_error("missing header row".into()))?;

    let wl_idx = find_column(&headers, &["wavelength"])
        .ok_or_else(|| format_error("missing 'Wavelength' column".into()))?;
    let t_idx = find_column(&headers, &["transmission"])
        .ok_or_else(|| format_error("missing 'Transmission' column".into()))?;
    let od_idx = if format.keeps_od_column() {
        find_column(&headers, &["od", "optical density"]).filter(|&i| i != wl_idx && i != t_idx)
    } else {
        None
    };

    let mut rows = Vec::new();
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() != headers.len() {
            return Err(format_error(format!(
                "row {row_no}: {} columns but the header has {}",
                record.len(),
                headers.len()
            )));
        }
        rows.push(RawRow {
            wavelength: parse_cell(&record, wl_idx, row_no, "wavelength")?,
            transmission: parse_cell(&record, t_idx, row_no, "transmission")?,
            optical_density: od_idx
                .map(|i| parse_cell(&record, i, row_no, "optical density"))
                .transpose()?,
        });
    }

    debug!("parsed {} {format} rows (od column: {})", rows.len(), od_idx.is_some());

    Ok(RawCurve {
        layout: format.layout(),
        scale: format.scale(),
        rows,
    })
}

// ---------------------------------------------------------------------------
// Light-source spectra
// ---------------------------------------------------------------------------

/// Load measured light-source counts. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` / `.txt` – tab-separated `Wavelength` and `Counts` columns
/// * `.json`    – `{"wavelength": [...], "counts": [...]}` or records
///   `[{"Wavelength": 445.0, "Counts": 1200.0}, ...]`
/// * `.parquet` – flat numeric `Wavelength` and `Counts` columns
pub fn load_source_spectrum(path: &Path, name: &str) -> Result<SourceSpectrum> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (wavelengths, counts) = match ext.as_str() {
        "csv" | "tsv" | "txt" => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            parse_source_tsv(file)
        }
        "json" => load_source_json(path),
        "parquet" | "pq" => load_source_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("reading light source {}", path.display()))?;

    let source = SourceSpectrum::new(name, wavelengths, counts)?;
    info!(
        "loaded light source '{name}' ({} samples) from {}",
        source.wavelengths().len(),
        path.display()
    );
    Ok(source)
}

/// Tab-separated `Wavelength` / `Counts` table with a header row.
pub fn parse_source_tsv<R: Read>(reader: R) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut reader = tsv_reader(reader);
    let mut records = reader.records();

    let headers = records
        .next()
        .transpose()
        .context("reading header row")?
        .ok_or_else(|| format_error("missing header row".into()))?;
    let wl_idx = find_column(&headers, &["wavelength"])
        .ok_or_else(|| format_error("missing 'Wavelength' column".into()))?;
    let c_idx = find_column(&headers, &["counts", "intensity"])
        .ok_or_else(|| format_error("missing 'Counts' column".into()))?;

    let mut wavelengths = Vec::new();
    let mut counts = Vec::new();
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() != headers.len() {
            return Err(format_error(format!(
                "row {row_no}: {} columns but the header has {}",
                record.len(),
                headers.len()
            )));
        }
        wavelengths.push(parse_cell(&record, wl_idx, row_no, "wavelength")?);
        counts.push(parse_cell(&record, c_idx, row_no, "counts")?);
    }
    Ok((wavelengths, counts))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSource {
    Columns {
        #[serde(alias = "Wavelength")]
        wavelength: Vec<f64>,
        #[serde(alias = "Counts")]
        counts: Vec<f64>,
    },
    Records(Vec<JsonRecord>),
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(alias = "Wavelength")]
    wavelength: f64,
    #[serde(alias = "Counts")]
    counts: f64,
}

fn load_source_json(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_source_json(&text)
}

pub fn parse_source_json(text: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let parsed: JsonSource = serde_json::from_str(text)
        .context("expected {\"wavelength\": [...], \"counts\": [...]} or a records array")?;
    Ok(match parsed {
        JsonSource::Columns { wavelength, counts } => (wavelength, counts),
        JsonSource::Records(records) => records.iter().map(|r| (r.wavelength, r.counts)).unzip(),
    })
}

/// Flat `Wavelength` / `Counts` columns, any of Float64, Float32, Int64, Int32.
/// Works with files written by Pandas (`df.to_parquet()`) and Polars.
fn load_source_parquet(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut wavelengths = Vec::new();
    let mut counts = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let wl_idx = schema
            .index_of("Wavelength")
            .map_err(|_| format_error("parquet file missing 'Wavelength' column".into()))?;
        let c_idx = schema
            .index_of("Counts")
            .map_err(|_| format_error("parquet file missing 'Counts' column".into()))?;

        wavelengths.extend(extract_f64_column(batch.column(wl_idx)).context("'Wavelength'")?);
        counts.extend(extract_f64_column(batch.column(c_idx)).context("'Counts'")?);
    }

    Ok((wavelengths, counts))
}

/// Widen a numeric Arrow column to `f64`. Nulls are rejected.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if col.null_count() > 0 {
        return Err(format_error(format!("{} null values in column", col.null_count())));
    }
    let any = col.as_any();
    let values = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .values()
            .to_vec(),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        other => return Err(format_error(format!("expected a numeric column, got {other:?}"))),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::curve::{ElementKind, RawLayout, SpectralCurve, TransmissionScale};

    fn is_data_format(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<OpticsError>(),
            Some(OpticsError::DataFormat(_))
        )
    }

    const THORLABS: &str = "Wavelength\tTransmission\tod\n\
        400\t0.5\t2.3\n\
        425\t40.0\t0.4\n\
        450\t85.0\t0.07\n\
        475\t42.0\t0.38\n\
        500\t0.4\t2.4\n";

    const SEMROCK: &str = "Semrock FF01-460/14\n\
        Part number FF01-460/14-25\n\
        Data is typical\n\
        \n\
        Angle of incidence 0\n\
        Wavelength\tTransmission\n\
        455.0\t0.91\n\
        455.2\t0.92\n\
        455.4\t0.93\n";

    #[test]
    fn test_thorlabs_rows_are_sparse_percent() {
        let raw = parse_vendor_curve(THORLABS.as_bytes(), VendorFormat::Thorlabs).unwrap();
        assert_eq!(raw.layout, RawLayout::Sparse);
        assert_eq!(raw.scale, TransmissionScale::Percent);
        assert_eq!(raw.rows.len(), 5);
        assert_eq!(raw.rows[2].wavelength, 450.0);
        assert_eq!(raw.rows[2].transmission, 85.0);
        // OD is recomputed from the resampled transmission.
        assert_eq!(raw.rows[2].optical_density, None);

        let curve = SpectralCurve::build(ElementKind::Filter, Some(&raw)).unwrap();
        assert_eq!(curve.domain(), (400.0, 500.0));
        let peak = curve.window(449.99, 450.01);
        assert!((peak[0].transmission - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_semrock_skips_preamble() {
        let raw = parse_vendor_curve(SEMROCK.as_bytes(), VendorFormat::Semrock).unwrap();
        assert_eq!(raw.layout, RawLayout::Dense);
        assert_eq!(raw.scale, TransmissionScale::Fraction);
        assert_eq!(raw.rows.len(), 3);
        assert_eq!(raw.rows[0].wavelength, 455.0);
        assert_eq!(raw.rows[2].transmission, 0.93);
    }

    #[test]
    fn test_semrock_keeps_od_column() {
        let text = "a\nb\nc\nd\nWavelength\tTransmission\tOD\n500\t0.1\t1.0\n501\t0.01\t2.0\n";
        let raw = parse_vendor_curve(text.as_bytes(), VendorFormat::Semrock).unwrap();
        assert_eq!(raw.rows[1].optical_density, Some(2.0));
    }

    #[test]
    fn test_column_count_mismatch_is_data_format() {
        let text = "Wavelength\tTransmission\n400\t50\n410\n";
        let err = parse_vendor_curve(text.as_bytes(), VendorFormat::Thorlabs).unwrap_err();
        assert!(is_data_format(&err), "{err:#}");
    }

    #[test]
    fn test_bad_number_and_missing_column() {
        let text = "Wavelength\tTransmission\n400\tabc\n";
        let err = parse_vendor_curve(text.as_bytes(), VendorFormat::Thorlabs).unwrap_err();
        assert!(is_data_format(&err));

        let text = "Wavelength\tCounts\n400\t1\n";
        let err = parse_vendor_curve(text.as_bytes(), VendorFormat::Thorlabs).unwrap_err();
        assert!(is_data_format(&err));

        let err = parse_vendor_curve("x\ny\n".as_bytes(), VendorFormat::Semrock).unwrap_err();
        assert!(is_data_format(&err));
    }

    #[test]
    fn test_source_tsv() {
        let text = "Wavelength\tCounts\n440.0\t10\n445.0\t100\n450.0\t-3\n";
        let (w, c) = parse_source_tsv(text.as_bytes()).unwrap();
        assert_eq!(w, vec![440.0, 445.0, 450.0]);
        assert_eq!(c, vec![10.0, 100.0, -3.0]);
    }

    #[test]
    fn test_source_json_both_shapes() {
        let (w, c) = parse_source_json(r#"{"wavelength": [1.0, 2.0], "counts": [3.0, 4.0]}"#)
            .unwrap();
        assert_eq!((w, c), (vec![1.0, 2.0], vec![3.0, 4.0]));

        let (w, c) = parse_source_json(
            r#"[{"Wavelength": 540.0, "Counts": 7.0}, {"Wavelength": 541.0, "Counts": 9.0}]"#,
        )
        .unwrap();
        assert_eq!((w, c), (vec![540.0, 541.0], vec![7.0, 9.0]));

        assert!(parse_source_json(r#"{"x": [1.0]}"#).is_err());
    }

    #[test]
    fn test_load_source_spectrum_from_disk() {
        let dir = std::env::temp_dir().join(format!("optical-path-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("laser.tsv");
        std::fs::write(&path, "Wavelength\tCounts\n444\t50\n445\t150\n446\t-5\n").unwrap();

        let src = load_source_spectrum(&path, "445nm Blue").unwrap();
        assert_eq!(src.name, "445nm Blue");
        assert_eq!(src.counts(), &[50.0, 150.0, 0.0]);
        assert_eq!(src.sum_normalized().weights(), &[0.25, 0.75, 0.0]);

        let bad = dir.join("laser.xlsx");
        std::fs::write(&bad, "").unwrap();
        assert!(load_source_spectrum(&bad, "nope").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_source_parquet_widens_columns() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = std::env::temp_dir().join(format!("optical-path-parquet-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("green.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Wavelength", DataType::Float64, false),
            Field::new("Counts", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![539.0, 540.0, 541.0])),
                Arc::new(Int32Array::from(vec![10, 30, 10])),
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let src = load_source_spectrum(&path, "540nm Green").unwrap();
        assert_eq!(src.wavelengths(), &[539.0, 540.0, 541.0]);
        assert_eq!(src.max_normalized().weights()[1], 1.0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
