use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};

use crate::color::ElementColors;
use crate::config::AppConfig;
use crate::data::loader::{load_source_spectrum, load_vendor_curve};
use crate::data::model::{CatalogSource, VendorFormat};
use crate::optics::curve::{CurveSample, ElementKind};
use crate::optics::{ElementId, OpticalElement, Propagation, Session};

/// Which curve quantity the element plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveView {
    #[default]
    Transmission,
    OpticalDensity,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Chain, distance, light source and knob.
    pub session: Session,

    /// Catalog entry currently shown in the component picker.
    pub picked_component: Option<String>,

    /// Name of the active light source.
    pub active_source: Option<String>,

    /// Elements highlighted in the component list (removal targets).
    pub selected_elements: BTreeSet<ElementId>,

    /// Wavelength window (nm) of the curve table.
    pub table_window: (f64, f64),

    pub curve_view: CurveView,

    /// Last recompute: spectrum and power at the sample plane.
    pub result: Option<Propagation>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Last successful action, shown as a one-line log.
    pub log_message: Option<String>,

    colors: ElementColors,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    /// Fresh state for `config`, with the first light source selected if it
    /// can be loaded.
    pub fn new(config: AppConfig) -> Self {
        let session = match Session::new(config.fiber_length, config.default_distance) {
            Ok(session) => session,
            Err(e) => {
                error!("{e}; falling back to default session parameters");
                Session::default()
            }
        };
        let mut state = Self {
            picked_component: config.components.first().map(|c| c.name.clone()),
            session,
            active_source: None,
            selected_elements: BTreeSet::new(),
            table_window: (300.0, 1200.0),
            curve_view: CurveView::default(),
            result: None,
            status_message: None,
            log_message: None,
            colors: ElementColors::default(),
            config,
        };
        if let Some(first) = state.config.light_sources.first().map(|s| s.name.clone()) {
            state.select_source(&first);
        }
        state
    }

    // -- Light source --

    /// Switch to a catalog light source.
    pub fn select_source(&mut self, name: &str) {
        let outcome = self.try_select_source(name);
        self.report(outcome.map(|_| format!("Laser changed to {name}")));
    }

    fn try_select_source(&mut self, name: &str) -> Result<()> {
        let entry = self
            .config
            .light_source(name)
            .with_context(|| format!("unknown light source '{name}'"))?;
        let source = load_source_spectrum(&entry.path, name)?;
        self.session.set_source(source);
        self.active_source = Some(name.to_string());
        self.recompute();
        Ok(())
    }

    /// Use a light-source file picked by the user.
    pub fn load_source_file(&mut self, path: &Path) {
        let name = file_label(path);
        let outcome = load_source_spectrum(path, &name).map(|source| {
            self.session.set_source(source);
            self.active_source = Some(name.clone());
            self.recompute();
            format!("Loaded light source {name}")
        });
        self.report(outcome);
    }

    // -- Chain membership --

    /// Add the catalog component `name` to the end of the chain.
    pub fn add_component(&mut self, name: &str) {
        let outcome = self.try_add_component(name);
        self.report(outcome.map(|id| format!("Added {name} {id}")));
    }

    fn try_add_component(&mut self, name: &str) -> Result<ElementId> {
        let entry = self
            .config
            .component(name)
            .with_context(|| format!("unknown component '{name}'"))?
            .clone();
        let raw = match &entry.source {
            CatalogSource::Fiber => None,
            CatalogSource::File { path, format } => Some(load_vendor_curve(path, *format)?),
        };
        let color = self.colors.next_color();
        let id = self
            .session
            .add_element(&entry.name, entry.source.kind(), raw.as_ref(), color)
            .with_context(|| format!("adding {name}"))?;
        self.recompute();
        Ok(id)
    }

    /// Add a filter from a vendor file picked by the user.
    pub fn add_curve_file(&mut self, path: &Path, format: VendorFormat) {
        let name = file_label(path);
        let outcome = load_vendor_curve(path, format).and_then(|raw| {
            let color = self.colors.next_color();
            let id = self
                .session
                .add_element(&name, ElementKind::Filter, Some(&raw), color)?;
            self.recompute();
            Ok(format!("Added {name} {id}"))
        });
        self.report(outcome);
    }

    /// Remove every selected element.
    pub fn remove_selected(&mut self) {
        if self.selected_elements.is_empty() {
            return;
        }
        let ids: Vec<ElementId> = std::mem::take(&mut self.selected_elements)
            .into_iter()
            .collect();
        let removed: Vec<String> = ids
            .into_iter()
            .filter_map(|id| self.session.remove_element(id))
            .map(|e| e.label())
            .collect();
        self.recompute();
        self.report(Ok(format!("Removed {}", removed.join(", "))));
    }

    pub fn toggle_selection(&mut self, id: ElementId) {
        if !self.selected_elements.remove(&id) {
            self.selected_elements.insert(id);
        }
    }

    // -- Controls --

    pub fn set_distance(&mut self, distance: f64) {
        let outcome = self
            .session
            .set_distance(distance)
            .map(|_| {
                self.recompute();
                format!("Distance set to {distance}")
            })
            .map_err(anyhow::Error::from);
        self.report(outcome);
    }

    /// Only the beam width in the path sketch follows the knob.
    pub fn set_knob(&mut self, knob: f64) {
        self.session.set_knob(knob);
        self.log_message = Some(format!("Knob value set to {knob:.1}"));
    }

    // -- Derived outputs --

    /// The element whose curve the table shows: the first selected one.
    pub fn table_element(&self) -> Option<&OpticalElement> {
        self.selected_elements
            .iter()
            .find_map(|&id| self.session.chain().get(id))
    }

    /// Rows of the curve table.
    pub fn table_rows(&self) -> &[CurveSample] {
        let (lo, hi) = self.table_window;
        self.table_element()
            .map(|e| e.curve().window(lo, hi))
            .unwrap_or(&[])
    }

    /// Power at the sample plane, zero before a source is loaded.
    pub fn power(&self) -> f64 {
        self.result.as_ref().map_or(0.0, |r| r.power)
    }

    /// Re-run the propagation after a mutation.
    pub fn recompute(&mut self) {
        match self.session.recompute() {
            Ok(result) => self.result = result,
            Err(e) => {
                error!("recompute failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.result = None;
            }
        }
    }

    fn report(&mut self, outcome: Result<String>) {
        match outcome {
            Ok(msg) => {
                info!("{msg}");
                self.status_message = None;
                self.log_message = Some(msg);
            }
            Err(e) => {
                error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Display name for a user-picked file: its stem.
fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("custom")
        .to_string()
}
