use log::{debug, trace};

use super::element::{ElementId, OpticalElement};
use super::error::OpticsError;
use super::spectrum::Spectrum;

/// `h·c` in eV·nm: photon energy of a wavelength given in nm is `1.2398 / λ`.
pub const PHOTON_ENERGY_EV_NM: f64 = 1.2398;

/// Default fiber length multiplier.
pub const DEFAULT_FIBER_LENGTH: f64 = 1.0;

// ---------------------------------------------------------------------------
// PropagationChain
// ---------------------------------------------------------------------------

/// Membership state of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Empty,
    NonEmpty,
}

/// Ordered sequence of optical elements. Insertion order is propagation order.
#[derive(Debug, Clone)]
pub struct PropagationChain {
    elements: Vec<OpticalElement>,
    next_id: u64,
    fiber_length: f64,
}

impl Default for PropagationChain {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            next_id: 1,
            fiber_length: DEFAULT_FIBER_LENGTH,
        }
    }
}

impl PropagationChain {
    /// An empty chain whose fibers scale their OD by `fiber_length`.
    pub fn with_fiber_length(fiber_length: f64) -> Result<Self, OpticsError> {
        if !fiber_length.is_finite() || fiber_length <= 0.0 {
            return Err(OpticsError::invalid_parameter(format!(
                "fiber length must be positive, got {fiber_length}"
            )));
        }
        Ok(Self {
            fiber_length,
            ..Self::default()
        })
    }

    pub fn fiber_length(&self) -> f64 {
        self.fiber_length
    }

    /// Append `element` and return its newly assigned id.
    pub fn insert(&mut self, mut element: OpticalElement) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        element.id = id;
        debug!("chain: inserted {} at slot {}", element.label(), self.elements.len());
        self.elements.push(element);
        id
    }

    /// Remove the element with `id`. The others keep their relative order.
    pub fn remove(&mut self, id: ElementId) -> Option<OpticalElement> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        let removed = self.elements.remove(idx);
        debug!("chain: removed {} from slot {idx}", removed.label());
        Some(removed)
    }

    pub fn get(&self, id: ElementId) -> Option<&OpticalElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn elements(&self) -> &[OpticalElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn state(&self) -> ChainState {
        if self.elements.is_empty() {
            ChainState::Empty
        } else {
            ChainState::NonEmpty
        }
    }
}

// ---------------------------------------------------------------------------
// Propagation math
// ---------------------------------------------------------------------------

/// Pass `source` through `elements` in order.
///
/// Each element's curve is resampled onto the spectrum's wavelengths and the
/// weights are attenuated by `10^(-scale · OD)`, where `scale` is
/// `fiber_length` for fibers and 1 for filters. No elements: identity.
pub fn propagate(
    elements: &[OpticalElement],
    source: &Spectrum,
    fiber_length: f64,
) -> Result<Spectrum, OpticsError> {
    let mut current = source.clone();
    if current.is_empty() {
        return Ok(current);
    }
    for element in elements {
        let resampled = element.curve().resample(current.wavelengths())?;
        let scale = element.kind().od_scale(fiber_length);
        current = current.map_weights(|i, w| {
            w * 10f64.powf(-scale * resampled.optical_density[i])
        });
        trace!(
            "propagated through {}: total weight {:.6}",
            element.label(),
            current.total_weight()
        );
    }
    Ok(current)
}

/// Inverse-square falloff: every weight divided by `distance²`.
pub fn apply_distance_falloff(spectrum: &Spectrum, distance: f64) -> Result<Spectrum, OpticsError> {
    validate_distance(distance)?;
    let factor = 1.0 / (distance * distance);
    Ok(spectrum.map_weights(|_, w| w * factor))
}

/// Delivered power: `Σ (1.2398 / λ) · weight`.
///
/// Expects weights derived from a sum-normalized source.
pub fn compute_power(spectrum: &Spectrum) -> f64 {
    spectrum
        .iter()
        .map(|(wavelength, weight)| PHOTON_ENERGY_EV_NM / wavelength * weight)
        .sum()
}

/// Reject a sample distance that is not a positive finite number.
pub fn validate_distance(distance: f64) -> Result<(), OpticsError> {
    if distance.is_finite() && distance > 0.0 {
        Ok(())
    } else {
        Err(OpticsError::invalid_parameter(format!(
            "distance must be positive, got {distance}"
        )))
    }
}

/// Result of a full recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// Spectrum at the sample plane (after falloff).
    pub spectrum: Spectrum,
    pub power: f64,
}

/// Propagate `source` through `chain`, apply the distance falloff once, and
/// reduce to power. Pure; the caller invokes it after every mutation.
pub fn recompute(
    chain: &PropagationChain,
    source: &Spectrum,
    distance: f64,
) -> Result<Propagation, OpticsError> {
    validate_distance(distance)?;
    let through_chain = propagate(chain.elements(), source, chain.fiber_length())?;
    let spectrum = apply_distance_falloff(&through_chain, distance)?;
    let power = compute_power(&spectrum);
    debug!(
        "recompute: {} elements, {} wavelengths, d = {distance}, power = {power:.6}",
        chain.len(),
        spectrum.len()
    );
    Ok(Propagation { spectrum, power })
}

#[cfg(test)]
mod tests {
    use eframe::egui::Color32;

    use super::*;
    use crate::optics::curve::{
        ElementKind, RawCurve, RawRow, SpectralCurve, TransmissionScale,
    };

    fn flat_spectrum(from: f64, to: f64, step: f64, weight: f64) -> Spectrum {
        let n = ((to - from) / step).round() as usize + 1;
        let wavelengths: Vec<f64> = (0..n).map(|i| from + i as f64 * step).collect();
        let weights = vec![weight; n];
        Spectrum::new(wavelengths, weights).unwrap()
    }

    fn sum_normalized(s: &Spectrum) -> Spectrum {
        let total = s.total_weight();
        Spectrum::new(
            s.wavelengths().to_vec(),
            s.weights().iter().map(|w| w / total).collect(),
        )
        .unwrap()
    }

    fn flat_filter(name: &str, t: f64) -> OpticalElement {
        let rows = (0..=100)
            .map(|i| RawRow {
                wavelength: 300.0 + i as f64 * 10.0,
                transmission: t,
                optical_density: None,
            })
            .collect();
        let curve = SpectralCurve::build(
            ElementKind::Filter,
            Some(&RawCurve::dense(TransmissionScale::Fraction, rows)),
        )
        .unwrap();
        OpticalElement::new(name, 1.0, curve, Color32::RED)
    }

    /// Gaussian band-pass centred at `center` nm, sampled every nm.
    fn bandpass(name: &str, center: f64) -> OpticalElement {
        let rows = (0..=400)
            .map(|i| {
                let w = 300.0 + i as f64;
                let t = 1e-4 + 0.9 * (-(w - center).powi(2) / (2.0 * 15.0f64.powi(2))).exp();
                RawRow {
                    wavelength: w,
                    transmission: t,
                    optical_density: None,
                }
            })
            .collect();
        let curve = SpectralCurve::build(
            ElementKind::Filter,
            Some(&RawCurve::dense(TransmissionScale::Fraction, rows)),
        )
        .unwrap();
        OpticalElement::new(name, 1.0, curve, Color32::BLUE)
    }

    fn fiber() -> OpticalElement {
        OpticalElement::new("Fiber", 1.0, SpectralCurve::fiber(), Color32::GREEN)
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let s = flat_spectrum(400.0, 500.0, 0.5, 0.3);
        let out = propagate(&[], &s, 1.0).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_fiber_scales_by_098() {
        let s = flat_spectrum(400.0, 500.0, 1.0, 1.0);
        let out = propagate(&[fiber()], &s, 1.0).unwrap();
        for (w_in, w_out) in s.weights().iter().zip(out.weights()) {
            assert!((w_out - w_in * 0.98).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fiber_length_scales_od() {
        let s = flat_spectrum(400.0, 500.0, 1.0, 1.0);
        let out = propagate(&[fiber()], &s, 3.0).unwrap();
        let expected = 0.98f64.powi(3);
        for w in out.weights() {
            assert!((w - expected).abs() < 1e-12);
        }
        // A filter ignores the fiber length.
        let filtered = propagate(&[flat_filter("f", 0.5)], &s, 3.0).unwrap();
        for w in filtered.weights() {
            assert!((w - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_two_identical_filters_compose_to_square() {
        let s = flat_spectrum(400.0, 700.0, 0.5, 1.0);
        let t = 0.6;
        let out = propagate(&[flat_filter("a", t), flat_filter("b", t)], &s, 1.0).unwrap();
        for w in out.weights() {
            assert!((w - t * t).abs() < 1e-12);
        }
    }

    #[test]
    fn test_adding_an_element_never_increases_weights() {
        let s = flat_spectrum(350.0, 800.0, 0.5, 1.0);
        let before = propagate(&[bandpass("bp", 450.0)], &s, 1.0).unwrap();
        let after = propagate(
            &[bandpass("bp", 450.0), bandpass("bp2", 470.0)],
            &s,
            1.0,
        )
        .unwrap();
        for (b, a) in before.weights().iter().zip(after.weights()) {
            assert!(*a <= *b + 1e-15, "weight grew from {b} to {a}");
        }
    }

    #[test]
    fn test_source_wider_than_element_hits_zero_od_anchor() {
        // Element covers 300..=700 nm; source reaches 900 nm.
        let s = flat_spectrum(400.0, 900.0, 1.0, 1.0);
        let out = propagate(&[bandpass("bp", 450.0)], &s, 1.0).unwrap();
        // The anchor carries OD 0, so the weight there is untouched.
        assert_eq!(out.weights()[out.len() - 1], 1.0);
        // In band the filter attenuates as measured (peak T ≈ 0.9001).
        let i_450 = s.wavelengths().iter().position(|&w| w == 450.0).unwrap();
        assert!((out.weights()[i_450] - 0.9001).abs() < 1e-9);
        for w in out.weights() {
            assert!(*w <= 1.0);
        }
    }

    #[test]
    fn test_attenuation_commutes_on_a_fixed_grid() {
        let s = flat_spectrum(400.0, 600.0, 1.0, 1.0);
        let ab = propagate(&[bandpass("a", 450.0), bandpass("b", 500.0)], &s, 1.0).unwrap();
        let ba = propagate(&[bandpass("b", 500.0), bandpass("a", 450.0)], &s, 1.0).unwrap();
        for (x, y) in ab.weights().iter().zip(ba.weights()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inverse_square_law() {
        let s = sum_normalized(&flat_spectrum(400.0, 500.0, 0.5, 1.0));
        for d in [0.5, 1.0, 3.0, 7.5] {
            let p_d = compute_power(&apply_distance_falloff(&s, d).unwrap());
            let p_2d = compute_power(&apply_distance_falloff(&s, 2.0 * d).unwrap());
            assert!((p_2d - p_d / 4.0).abs() < 1e-12 * p_d.max(1.0));
        }
    }

    #[test]
    fn test_falloff_rejects_non_positive_distance() {
        let s = flat_spectrum(400.0, 500.0, 1.0, 1.0);
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                apply_distance_falloff(&s, d),
                Err(OpticsError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_power_of_single_line() {
        let s = Spectrum::new(vec![400.0], vec![1.0]).unwrap();
        assert!((compute_power(&s) - 1.2398 / 400.0).abs() < 1e-15);
        assert_eq!(compute_power(&Spectrum::new(Vec::new(), Vec::new()).unwrap()), 0.0);
    }

    #[test]
    fn test_empty_chain_recompute_matches_source_power() {
        let s = sum_normalized(&flat_spectrum(430.0, 460.0, 0.2, 2.0));
        let chain = PropagationChain::default();
        let result = recompute(&chain, &s, 1.0).unwrap();
        assert_eq!(result.spectrum, s);
        assert!((result.power - compute_power(&s)).abs() < 1e-15);
    }

    #[test]
    fn test_removing_restores_output() {
        let s = sum_normalized(&flat_spectrum(400.0, 600.0, 0.5, 1.0));
        let mut chain = PropagationChain::default();
        chain.insert(bandpass("a", 450.0));
        let baseline = recompute(&chain, &s, 2.0).unwrap();

        let id = chain.insert(flat_filter("b", 0.3));
        let with_b = recompute(&chain, &s, 2.0).unwrap();
        assert!(with_b.power < baseline.power);

        chain.remove(id).unwrap();
        let restored = recompute(&chain, &s, 2.0).unwrap();
        assert_eq!(restored, baseline);
    }

    #[test]
    fn test_chain_membership() {
        let mut chain = PropagationChain::default();
        assert_eq!(chain.state(), ChainState::Empty);

        let a = chain.insert(flat_filter("a", 0.5));
        let b = chain.insert(fiber());
        let c = chain.insert(flat_filter("c", 0.5));
        assert_eq!(chain.state(), ChainState::NonEmpty);
        assert_ne!(a, b);

        chain.remove(b).unwrap();
        let order: Vec<ElementId> = chain.elements().iter().map(|e| e.id()).collect();
        assert_eq!(order, vec![a, c]);
        assert!(chain.remove(b).is_none());
        assert!(chain.get(c).is_some());

        chain.remove(a);
        chain.remove(c);
        assert_eq!(chain.state(), ChainState::Empty);

        // Ids are not reused.
        let d = chain.insert(fiber());
        assert!(d > c);
    }

    #[test]
    fn test_fiber_length_validation() {
        assert!(PropagationChain::with_fiber_length(2.0).is_ok());
        assert!(PropagationChain::with_fiber_length(0.0).is_err());
        assert!(PropagationChain::with_fiber_length(f64::NAN).is_err());
    }
}
