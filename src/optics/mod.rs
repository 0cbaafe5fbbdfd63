//! Optics core: spectral curves, light propagation and power.
//!
//! ```text
//!   vendor rows ──► SpectralCurve::build ──► OpticalElement
//!                                                 │
//!   SourceSpectrum ─► sum_normalized ─► propagate (chain order)
//!                                                 │
//!                                   apply_distance_falloff (1/d²)
//!                                                 │
//!                                           compute_power
//! ```
//!
//! Nothing in here does I/O; loaders hand over parsed rows.

pub mod chain;
pub mod curve;
pub mod element;
pub mod error;
pub mod session;
pub mod source;
pub mod spectrum;
pub mod spline;

pub use chain::Propagation;
pub use curve::ElementKind;
pub use element::{ElementId, OpticalElement};
pub use error::OpticsError;
pub use session::Session;
pub use source::SourceSpectrum;
