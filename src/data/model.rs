use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::optics::curve::{ElementKind, RawLayout, TransmissionScale};

// ---------------------------------------------------------------------------
// VendorFormat – the two accepted curve-file shapes
// ---------------------------------------------------------------------------

/// Tab-separated transmission files as shipped by filter vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorFormat {
    /// Header row, then coarse rows in percent; an `od` column may follow.
    Thorlabs,
    /// Four preamble lines, header row, then dense decimal rows.
    Semrock,
}

impl VendorFormat {
    /// Lines before the header row.
    pub fn preamble_lines(self) -> usize {
        match self {
            VendorFormat::Thorlabs => 0,
            VendorFormat::Semrock => 4,
        }
    }

    pub fn layout(self) -> RawLayout {
        match self {
            VendorFormat::Thorlabs => RawLayout::Sparse,
            VendorFormat::Semrock => RawLayout::Dense,
        }
    }

    pub fn scale(self) -> TransmissionScale {
        match self {
            VendorFormat::Thorlabs => TransmissionScale::Percent,
            VendorFormat::Semrock => TransmissionScale::Fraction,
        }
    }

    /// Whether a vendor-supplied OD column is kept as is. Thorlabs OD is
    /// recomputed from the resampled transmission.
    pub fn keeps_od_column(self) -> bool {
        matches!(self, VendorFormat::Semrock)
    }
}

impl fmt::Display for VendorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorFormat::Thorlabs => write!(f, "Thorlabs"),
            VendorFormat::Semrock => write!(f, "Semrock"),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog – what can be added to the chain
// ---------------------------------------------------------------------------

/// Where an element's curve comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CatalogSource {
    /// The synthetic fiber; no file involved.
    Fiber,
    /// A vendor curve file.
    File { path: PathBuf, format: VendorFormat },
}

impl CatalogSource {
    pub fn kind(&self) -> ElementKind {
        match self {
            CatalogSource::Fiber => ElementKind::Fiber,
            CatalogSource::File { .. } => ElementKind::Filter,
        }
    }
}

/// One entry of the component picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(flatten)]
    pub source: CatalogSource,
}

impl CatalogEntry {
    pub fn fiber(name: &str) -> Self {
        CatalogEntry {
            name: name.to_string(),
            source: CatalogSource::Fiber,
        }
    }

    pub fn file(name: &str, path: &str, format: VendorFormat) -> Self {
        CatalogEntry {
            name: name.to_string(),
            source: CatalogSource::File {
                path: PathBuf::from(path),
                format,
            },
        }
    }
}

/// A selectable light source and the file holding its measured counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSourceEntry {
    pub name: String,
    pub path: PathBuf,
}

impl LightSourceEntry {
    pub fn new(name: &str, path: &str) -> Self {
        LightSourceEntry {
            name: name.to_string(),
            path: PathBuf::from(path),
        }
    }
}
