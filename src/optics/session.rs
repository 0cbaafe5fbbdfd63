use eframe::egui::Color32;
use log::{info, warn};

use super::chain::{self, Propagation, PropagationChain};
use super::curve::{ElementKind, RawCurve, SpectralCurve};
use super::element::{ElementId, OpticalElement};
use super::error::OpticsError;
use super::source::SourceSpectrum;

/// Default sample distance (mm).
pub const DEFAULT_DISTANCE: f64 = 1.0;

/// Everything a recompute depends on: the chain, the sample distance, the
/// selected light source, plus the display-only knob.
///
/// Every mutator either succeeds completely or leaves the session as it was.
#[derive(Debug, Clone)]
pub struct Session {
    chain: PropagationChain,
    distance: f64,
    knob: f64,
    source: Option<SourceSpectrum>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            chain: PropagationChain::default(),
            distance: DEFAULT_DISTANCE,
            knob: 0.0,
            source: None,
        }
    }
}

impl Session {
    pub fn new(fiber_length: f64, distance: f64) -> Result<Self, OpticsError> {
        chain::validate_distance(distance)?;
        Ok(Session {
            chain: PropagationChain::with_fiber_length(fiber_length)?,
            distance,
            knob: 0.0,
            source: None,
        })
    }

    pub fn chain(&self) -> &PropagationChain {
        &self.chain
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Display-only beam width; never enters the propagation math.
    pub fn knob(&self) -> f64 {
        self.knob
    }

    pub fn source(&self) -> Option<&SourceSpectrum> {
        self.source.as_ref()
    }

    pub fn set_distance(&mut self, distance: f64) -> Result<(), OpticsError> {
        chain::validate_distance(distance)?;
        info!("distance set to {distance}");
        self.distance = distance;
        Ok(())
    }

    /// Non-finite values are ignored.
    pub fn set_knob(&mut self, knob: f64) {
        if knob.is_finite() {
            self.knob = knob;
        } else {
            warn!("ignoring non-finite knob value {knob}");
        }
    }

    pub fn set_source(&mut self, source: SourceSpectrum) {
        info!(
            "light source changed to '{}' ({} samples)",
            source.name,
            source.wavelengths().len()
        );
        self.source = Some(source);
    }

    /// Build the element's curve and append it to the chain.
    ///
    /// The curve is built before the chain is touched, so a data error leaves
    /// the chain unchanged.
    pub fn add_element(
        &mut self,
        name: &str,
        kind: ElementKind,
        raw: Option<&RawCurve>,
        color: Color32,
    ) -> Result<ElementId, OpticsError> {
        let curve = SpectralCurve::build(kind, raw)?;
        let position = (self.chain.len() + 1) as f64;
        let id = self
            .chain
            .insert(OpticalElement::new(name, position, curve, color));
        info!("added {name} {id} ({kind})");
        Ok(id)
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<OpticalElement> {
        let removed = self.chain.remove(id);
        match &removed {
            Some(e) => info!("removed {}", e.label()),
            None => warn!("no element {id} in chain"),
        }
        removed
    }

    /// Spectrum and power at the sample plane, or `None` without a source.
    pub fn recompute(&self) -> Result<Option<Propagation>, OpticsError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        chain::recompute(&self.chain, &source.sum_normalized(), self.distance).map(Some)
    }
}
