use eframe::egui::{self, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::color::{SAMPLE_COLOR, SOURCE_COLOR};
use crate::optics::{ElementKind, OpticalElement};
use crate::state::{AppState, CurveView};

const PATH_PLOT_HEIGHT: f32 = 150.0;

// ---------------------------------------------------------------------------
// Central panel layout
// ---------------------------------------------------------------------------

/// Render the path sketch, the curve plot and the power plot.
pub fn central(ui: &mut Ui, state: &mut AppState) {
    path_plot(ui, state);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.curve_view, CurveView::Transmission, "Transmission");
        ui.selectable_value(&mut state.curve_view, CurveView::OpticalDensity, "Optical Density");
    });
    let half = (ui.available_height() / 2.0 - 20.0).max(120.0);
    curve_plot(ui, state, half);
    ui.separator();

    power_plot(ui, state);
}

// ---------------------------------------------------------------------------
// Path sketch
// ---------------------------------------------------------------------------

/// Schematic of the light path: source, elements in order, sample plane.
fn path_plot(ui: &mut Ui, state: &AppState) {
    let elements = state.session.chain().elements();
    let sample_x = sample_position(elements, state.session.distance());
    let beam_width = 1.0 + state.session.knob() as f32;

    Plot::new("path_plot")
        .height(PATH_PLOT_HEIGHT)
        .show_axes([true, false])
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .include_x(-1.0)
        .include_x(sample_x + 1.0)
        .include_y(-1.5)
        .include_y(1.5)
        .x_axis_label("Position (mm)")
        .show(ui, |plot_ui| {
            let source = Polygon::new(PlotPoints::new(vec![
                [-0.8, -0.4],
                [0.0, -0.4],
                [0.0, 0.4],
                [-0.8, 0.4],
            ]))
            .fill_color(SOURCE_COLOR.gamma_multiply(0.6))
            .name("Source");
            plot_ui.polygon(source);

            let beam = Line::new(PlotPoints::new(vec![[0.0, 0.0], [sample_x, 0.0]]))
                .color(SOURCE_COLOR.gamma_multiply(0.5))
                .width(beam_width);
            plot_ui.line(beam);

            for element in elements {
                draw_element(plot_ui, element);
            }

            let sample = Line::new(PlotPoints::new(vec![[sample_x, -1.0], [sample_x, 1.0]]))
                .color(SAMPLE_COLOR)
                .width(4.0)
                .name("Sample");
            plot_ui.line(sample);
            plot_ui.text(Text::new(PlotPoint::new(sample_x, 1.3), "Sample"));
        });
}

fn draw_element(plot_ui: &mut egui_plot::PlotUi, element: &OpticalElement) {
    let x = element.position;
    match element.kind() {
        ElementKind::Filter => {
            let line = Line::new(PlotPoints::new(vec![[x, -0.8], [x, 0.8]]))
                .color(element.color)
                .width(3.0)
                .name(element.label());
            plot_ui.line(line);
        }
        ElementKind::Fiber => {
            let coil: PlotPoints = (0..=48)
                .map(|i| {
                    let t = i as f64 / 48.0 * std::f64::consts::TAU;
                    [x + 0.3 * t.sin(), 0.45 + 0.45 * -t.cos()]
                })
                .collect();
            plot_ui.line(
                Line::new(coil)
                    .color(element.color)
                    .width(2.0)
                    .name(element.label()),
            );
        }
    }
    plot_ui.text(Text::new(PlotPoint::new(x, -1.1), element.label()).color(element.color));
}

/// The sample sits `distance` past the last element, or past the source.
fn sample_position(elements: &[OpticalElement], distance: f64) -> f64 {
    elements.last().map_or(0.0, |e| e.position) + distance
}

// ---------------------------------------------------------------------------
// Element curves
// ---------------------------------------------------------------------------

fn curve_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let elements = state.session.chain().elements();
    let source = state.session.source();

    if elements.is_empty() && source.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Pick a light source and add components");
        });
        return;
    }

    let y_label = match state.curve_view {
        CurveView::Transmission => "Transmission",
        CurveView::OpticalDensity => "Optical Density",
    };

    Plot::new("curve_plot")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Wavelength (nm)")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for element in elements {
                let samples = element.curve().samples();
                let points: PlotPoints = samples
                    .iter()
                    .map(|s| match state.curve_view {
                        CurveView::Transmission => [s.wavelength, s.transmission],
                        CurveView::OpticalDensity => [s.wavelength, s.optical_density],
                    })
                    .collect();
                let line = Line::new(points)
                    .name(element.label())
                    .color(element.color)
                    .style(LineStyle::dashed_loose())
                    .width(1.5);
                plot_ui.line(line);
            }

            if let (Some(source), CurveView::Transmission) = (source, state.curve_view) {
                let normalized = source.max_normalized();
                let points: PlotPoints = normalized.iter().map(|(w, v)| [w, v]).collect();
                let line = Line::new(points)
                    .name(&source.name)
                    .color(SOURCE_COLOR)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Power on sample
// ---------------------------------------------------------------------------

fn power_plot(ui: &mut Ui, state: &AppState) {
    let distance = state.session.distance();
    ui.label(
        egui::RichText::new(format!(
            "Power on sample at {distance} mm: {:.5} mW/mm²",
            state.power()
        ))
        .strong()
        .color(SAMPLE_COLOR),
    );

    let Some(result) = &state.result else {
        ui.label("No light source loaded.");
        return;
    };

    let points: PlotPoints = result.spectrum.iter().map(|(w, v)| [w, v]).collect();
    Plot::new("power_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength (nm)")
        .y_axis_label("Normalized intensity")
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            let line = Line::new(points)
                .name("At sample")
                .color(SAMPLE_COLOR)
                .fill(0.0)
                .width(1.5);
            plot_ui.line(line);
        });
}
