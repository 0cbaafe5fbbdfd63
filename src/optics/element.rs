use std::fmt;

use eframe::egui::Color32;

use super::curve::{ElementKind, SpectralCurve};

/// Identity of an element inside a chain; never reused within one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A filter or fiber placed on the optical axis.
#[derive(Debug, Clone)]
pub struct OpticalElement {
    pub(crate) id: ElementId,
    /// Catalog name, e.g. "Semrock 460/14".
    pub name: String,
    /// Position along the axis; only the path sketch reads it.
    pub position: f64,
    pub color: Color32,
    curve: SpectralCurve,
}

impl OpticalElement {
    /// A detached element; [`PropagationChain::insert`] assigns its id.
    ///
    /// [`PropagationChain::insert`]: super::chain::PropagationChain::insert
    pub fn new(name: impl Into<String>, position: f64, curve: SpectralCurve, color: Color32) -> Self {
        OpticalElement {
            id: ElementId(0),
            name: name.into(),
            position,
            color,
            curve,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.curve.kind()
    }

    pub fn curve(&self) -> &SpectralCurve {
        &self.curve
    }

    /// Label used in the component list, e.g. "Fiber #3".
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.id)
    }
}
