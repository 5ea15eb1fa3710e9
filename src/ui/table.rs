use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use cme_explorer::data::model::SampleSeries;

// ---------------------------------------------------------------------------
// Tabular views
// ---------------------------------------------------------------------------

/// Table of the samples selected by `indices`, in source order. Used for both
/// the always-visible spike table and the toggleable filtered table.
pub fn sample_table(ui: &mut Ui, id: &str, series: &SampleSeries, indices: &[usize]) {
    if indices.is_empty() {
        ui.label("No rows.");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(150.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Time (UTC)");
                });
                header.col(|ui| {
                    ui.strong("Flux");
                });
                header.col(|ui| {
                    ui.strong("Uncertainty");
                });
                header.col(|ui| {
                    ui.strong("Δt (s)");
                });
            })
            .body(|body| {
                body.rows(18.0, indices.len(), |mut row| {
                    let sample = &series.samples[indices[row.index()]];
                    row.col(|ui| {
                        ui.monospace(sample.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
                    });
                    row.col(|ui| {
                        ui.monospace(format!("{:.4}", sample.flux));
                    });
                    row.col(|ui| {
                        ui.monospace(format!("{:.4}", sample.uncertainty));
                    });
                    row.col(|ui| {
                        ui.monospace(format!("{:.1}", sample.time_delta_seconds));
                    });
                });
            });
    });
}

/// Raw energy-channel centers, shown when the toggle is on.
pub fn energy_list(ui: &mut Ui, energy: &[f64]) {
    if energy.is_empty() {
        ui.label("No energy axis in this file.");
        return;
    }
    let rendered = energy
        .iter()
        .map(|e| format!("{e:.1}"))
        .collect::<Vec<_>>()
        .join(", ");
    ui.monospace(format!("[{rendered}] eV"));
}
