use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use cme_explorer::data::export::{spike_csv_bytes, SPIKE_REPORT_FILENAME};
use cme_explorer::data::loader::{load_and_reduce, DataSource};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter and detection controls
// ---------------------------------------------------------------------------

/// Render the sidebar: date range, threshold slider, display toggles.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    if state.series.is_none() {
        // Upload-variant guard: without a file the pipeline never runs.
        ui.label("No file loaded.\n\nOpen a .cdf file to inspect flux data.");
        return;
    }
    let bounds = state.threshold_bounds();

    ui.strong("Date range");
    if let Some(range) = &mut state.range {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Start");
            ui.add(DatePickerButton::new(&mut range.start).id_salt("start_date"));
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("End");
            ui.add(DatePickerButton::new(&mut range.end).id_salt("end_date"));
        });
    }
    ui.separator();

    ui.strong("Flux threshold");
    match bounds {
        Some((min, max)) if min < max => {
            ui.add(
                egui::Slider::new(&mut state.threshold, min..=max)
                    .text("flux")
                    .min_decimals(2),
            );
        }
        _ => {
            ui.label("Flux is constant; nothing to threshold.");
        }
    }
    ui.separator();

    ui.strong("Display");
    ui.checkbox(&mut state.show_filtered_table, "Filtered data table");
    ui.checkbox(&mut state.show_uncertainty, "Uncertainty over time");
    ui.checkbox(&mut state.show_energy, "Energy channel centers");

    // Re-run filter + detection after any control change.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .add_enabled(state.series.is_some(), egui::Button::new("Export spikes…"))
            .clicked()
        {
            export_spike_report(state);
        }

        ui.separator();

        if let Some(series) = &state.series {
            let name = state.source_name.as_deref().unwrap_or("<memory>");
            ui.label(format!(
                "{name}: {} samples, {} in range, {} spikes",
                series.len(),
                state.visible_indices.len(),
                state.spike_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open instrument data")
        .add_filter("CDF files", &["cdf"])
        .pick_file();

    if let Some(path) = file {
        load_from_path(state, path);
    }
}

/// Run the full load → reduce pipeline for a path; used by the dialog and by
/// the startup argument.
pub fn load_from_path(state: &mut AppState, path: std::path::PathBuf) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match load_and_reduce(&DataSource::Path(path)) {
        Ok(series) => {
            state.set_series(series, name);
        }
        Err(e) => {
            log::error!("failed to load {name}: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

fn export_spike_report(state: &mut AppState) {
    let Some(series) = &state.series else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Save spike report")
        .set_file_name(SPIKE_REPORT_FILENAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    let Some(path) = file else {
        return;
    };

    let result = spike_csv_bytes(series, &state.spike_indices)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| std::fs::write(&path, bytes).map_err(anyhow::Error::from));

    match result {
        Ok(()) => {
            log::info!(
                "wrote {} spike rows to {}",
                state.spike_indices.len(),
                path.display()
            );
            state.status_message = None;
        }
        Err(e) => {
            log::error!("failed to write spike report: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
