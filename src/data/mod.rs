/// Data layer: catalog types and file loaders.
///
/// Architecture:
/// ```text
///  vendor .csv (tab-separated)          light source .csv / .json / .parquet
///        │                                         │
///        ▼                                         ▼
///   ┌──────────────────┐                 ┌──────────────────────┐
///   │ load_vendor_curve │                 │ load_source_spectrum │
///   └──────────────────┘                 └──────────────────────┘
///        │ RawCurve                                │ SourceSpectrum
///        ▼                                         ▼
///   SpectralCurve::build                   Session::set_source
/// ```
///
/// The catalog (`model`) names what the loaders are pointed at.

pub mod loader;
pub mod model;
