use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::VendorFormat;
use crate::optics::ElementId;
use crate::optics::chain::ChainState;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Light source");
    source_selector(ui, state);
    ui.separator();

    ui.heading("Components");
    component_picker(ui, state);
    ui.add_space(4.0);
    component_list(ui, state);
    ui.separator();

    controls(ui, state);
    ui.separator();

    if let Some(msg) = &state.log_message {
        ui.label(RichText::new(msg).weak());
    }
    ui.separator();

    curve_table(ui, state);
}

fn source_selector(ui: &mut Ui, state: &mut AppState) {
    let names: Vec<String> = state
        .config
        .light_sources
        .iter()
        .map(|s| s.name.clone())
        .collect();
    let mut picked = None;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for name in &names {
            let active = state.active_source.as_deref() == Some(name.as_str());
            if ui.radio(active, name.as_str()).clicked() && !active {
                picked = Some(name.clone());
            }
        }
    });
    if let Some(name) = picked {
        state.select_source(&name);
    }
    if let Some(source) = state.session.source() {
        let peak = source.counts().iter().copied().fold(0.0, f64::max);
        ui.label(
            RichText::new(format!(
                "{}: {} samples, peak {peak:.0} counts",
                source.name,
                source.wavelengths().len()
            ))
            .weak(),
        );
    }
}

fn component_picker(ui: &mut Ui, state: &mut AppState) {
    let names: Vec<String> = state
        .config
        .components
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let current = state.picked_component.clone().unwrap_or_default();

    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_id_salt("component_picker")
            .selected_text(current.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for name in &names {
                    if ui.selectable_label(current == *name, name.as_str()).clicked() {
                        state.picked_component = Some(name.clone());
                    }
                }
            });
        if ui.button("Add Component").clicked() {
            if let Some(name) = state.picked_component.clone() {
                state.add_component(&name);
            }
        }
    });
}

fn component_list(ui: &mut Ui, state: &mut AppState) {
    let entries: Vec<(ElementId, String, Color32)> = state
        .session
        .chain()
        .elements()
        .iter()
        .map(|e| (e.id(), e.label(), e.color))
        .collect();

    if state.session.chain().state() == ChainState::Empty {
        ui.label("No components in the path.");
        return;
    }

    ScrollArea::vertical()
        .id_salt("component_list")
        .max_height(140.0)
        .show(ui, |ui: &mut Ui| {
            for (id, label, color) in &entries {
                let selected = state.selected_elements.contains(id);
                let text = RichText::new(label.as_str()).color(*color);
                if ui.selectable_label(selected, text).clicked() {
                    state.toggle_selection(*id);
                }
            }
        });

    let n_selected = state.selected_elements.len();
    if ui
        .add_enabled(n_selected > 0, egui::Button::new("Remove Component"))
        .clicked()
    {
        state.remove_selected();
    }
}

fn controls(ui: &mut Ui, state: &mut AppState) {
    let mut distance = state.session.distance();
    let max = state.config.max_distance.max(1.0);
    let response = ui.add(
        egui::Slider::new(&mut distance, 1.0..=max)
            .step_by(1.0)
            .text("Distance (mm)"),
    );
    if response.changed() {
        state.set_distance(distance);
    }

    let mut knob = state.session.knob();
    let response = ui.add(
        egui::Slider::new(&mut knob, 0.0..=10.0)
            .step_by(0.1)
            .text("Knob value"),
    );
    if response.changed() {
        state.set_knob(knob);
    }
}

// ---------------------------------------------------------------------------
// Curve table for the selected component
// ---------------------------------------------------------------------------

fn curve_table(ui: &mut Ui, state: &mut AppState) {
    let Some(element) = state.table_element() else {
        ui.label("Select a component to see its curve.");
        return;
    };
    ui.strong(element.label());
    if element.kind().is_synthetic() {
        ui.label(RichText::new("Synthetic curve on the 0.2 nm reference grid").weak());
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("λ from");
        ui.add(
            egui::DragValue::new(&mut state.table_window.0)
                .speed(1.0)
                .range(0.0..=state.table_window.1),
        );
        ui.label("to");
        ui.add(
            egui::DragValue::new(&mut state.table_window.1)
                .speed(1.0)
                .range(state.table_window.0..=5000.0),
        );
    });

    let rows = state.table_rows();
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(250.0)
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Wavelength");
            });
            header.col(|ui| {
                ui.strong("Transmission");
            });
            header.col(|ui| {
                ui.strong("Optical Density");
            });
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let sample = rows[row.index()];
                row.col(|ui| {
                    ui.label(format!("{:.1}", sample.wavelength));
                });
                row.col(|ui| {
                    ui.label(format!("{:.5}", sample.transmission));
                });
                row.col(|ui| {
                    ui.label(format!("{:.4}", sample.optical_density));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open light source…").clicked() {
                open_source_dialog(state);
                ui.close_menu();
            }
            if ui.button("Add Thorlabs curve…").clicked() {
                open_curve_dialog(state, VendorFormat::Thorlabs);
                ui.close_menu();
            }
            if ui.button("Add Semrock curve…").clicked() {
                open_curve_dialog(state, VendorFormat::Semrock);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} components, sample at {} mm",
            state.session.chain().len(),
            state.session.distance()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_source_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open light source spectrum")
        .add_filter("Supported files", &["csv", "tsv", "txt", "json", "parquet", "pq"])
        .add_filter("Tab-separated", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_source_file(&path);
    }
}

pub fn open_curve_dialog(state: &mut AppState, format: VendorFormat) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open {format} transmission curve"))
        .add_filter("Tab-separated", &["csv", "tsv", "txt"])
        .pick_file();

    if let Some(path) = file {
        state.add_curve_file(&path, format);
    }
}
