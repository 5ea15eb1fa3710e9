use eframe::egui::{self, ScrollArea};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CmeExplorerApp {
    pub state: AppState,
}

impl CmeExplorerApp {
    /// Start empty, or preload a file given on the command line.
    pub fn new(initial_file: Option<std::path::PathBuf>) -> Self {
        let mut state = AppState::default();
        if let Some(path) = initial_file {
            panels::load_from_path(&mut state, path);
        }
        Self { state }
    }
}

impl eframe::App for CmeExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: date range / threshold / toggles ----
        egui::SidePanel::left("control_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts and tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.series.is_none() {
                plot::flux_plot(ui, &self.state);
                return;
            }

            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                ui.heading("Integrated flux over time");
                plot::flux_plot(ui, &self.state);

                if self.state.show_uncertainty {
                    ui.separator();
                    ui.heading("Uncertainty over time");
                    plot::uncertainty_plot(ui, &self.state);
                }

                if let Some(series) = &self.state.series {
                    ui.separator();
                    ui.heading("Possible CME spikes");
                    table::sample_table(ui, "spike_table", series, &self.state.spike_indices);

                    if self.state.show_filtered_table {
                        ui.separator();
                        ui.heading("Filtered data");
                        table::sample_table(
                            ui,
                            "filtered_table",
                            series,
                            &self.state.visible_indices,
                        );
                    }

                    if self.state.show_energy {
                        ui.separator();
                        ui.heading("Energy channel centers");
                        table::energy_list(ui, &series.energy);
                    }
                }
            });
        });
    }
}
