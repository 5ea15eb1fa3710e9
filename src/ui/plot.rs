use chrono::DateTime;
use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use crate::state::AppState;

const FLUX_COLOR: Color32 = Color32::LIGHT_BLUE;
const SPIKE_COLOR: Color32 = Color32::RED;
const UNCERTAINTY_COLOR: Color32 = Color32::GOLD;

// ---------------------------------------------------------------------------
// Flux chart with spike overlay (central panel)
// ---------------------------------------------------------------------------

/// Line chart of flux over the filtered range, with flagged samples drawn as
/// a scatter overlay.
pub fn flux_plot(ui: &mut Ui, state: &AppState) {
    let Some(series) = &state.series else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a .cdf file to view flux data  (File → Open…)");
        });
        return;
    };

    Plot::new("flux_plot")
        .legend(Legend::default())
        .height(320.0)
        .x_axis_label("Time (UTC)")
        .y_axis_label("Integrated flux")
        .x_axis_formatter(|mark, _range| format_time_tick(mark.value))
        .label_formatter(point_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let flux: PlotPoints = state
                .visible_indices
                .iter()
                .map(|&i| {
                    let s = &series.samples[i];
                    [timestamp_to_x(s.timestamp), s.flux]
                })
                .collect();
            plot_ui.line(Line::new(flux).name("Flux").color(FLUX_COLOR).width(1.5));

            let spikes: PlotPoints = state
                .spike_indices
                .iter()
                .map(|&i| {
                    let s = &series.samples[i];
                    [timestamp_to_x(s.timestamp), s.flux]
                })
                .collect();
            plot_ui.points(
                Points::new(spikes)
                    .name("CME spikes")
                    .color(SPIKE_COLOR)
                    .shape(MarkerShape::Circle)
                    .radius(4.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Uncertainty chart (toggled)
// ---------------------------------------------------------------------------

pub fn uncertainty_plot(ui: &mut Ui, state: &AppState) {
    let Some(series) = &state.series else {
        return;
    };

    Plot::new("uncertainty_plot")
        .legend(Legend::default())
        .height(220.0)
        .x_axis_label("Time (UTC)")
        .y_axis_label("Flux uncertainty")
        .x_axis_formatter(|mark, _range| format_time_tick(mark.value))
        .label_formatter(point_label)
        .show(ui, |plot_ui| {
            let points: PlotPoints = state
                .visible_indices
                .iter()
                .map(|&i| {
                    let s = &series.samples[i];
                    [timestamp_to_x(s.timestamp), s.uncertainty]
                })
                .collect();
            plot_ui.line(
                Line::new(points)
                    .name("Uncertainty")
                    .color(UNCERTAINTY_COLOR)
                    .width(1.5),
            );
        });
}

// -- axis helpers --

fn timestamp_to_x(t: chrono::DateTime<chrono::Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

fn format_time_tick(x: f64) -> String {
    match DateTime::from_timestamp(x as i64, 0) {
        Some(t) => t.format("%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

fn point_label(name: &str, point: &PlotPoint) -> String {
    let when = DateTime::from_timestamp(point.x as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    if name.is_empty() {
        format!("{when}\n{:.4}", point.y)
    } else {
        format!("{name}\n{when}\n{:.4}", point.y)
    }
}
