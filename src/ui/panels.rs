use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, MAX_COMPARISON_SPECIES};

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left panel: species pickers for each view plus the data summary.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Invasive Plant Species");
    ui.separator();

    if state.table.is_empty() {
        ui.label("The dataset has no observations.");
        return;
    }

    // Clone what we need so we can mutate state inside the loops.
    let species = state.table.species.clone();
    let n_total = species.len();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Distribution map ----
            let n_selected = state.selection.distribution_species.len();
            egui::CollapsingHeader::new(
                RichText::new(format!("Distribution Map  ({n_selected}/{n_total})")).strong(),
            )
            .id_salt("distribution_species")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all();
                    }
                    if ui.small_button("None").clicked() {
                        state.select_none();
                    }
                });

                for name in &species {
                    let mut checked = state.selection.distribution_species.contains(name);
                    let text = RichText::new(name).color(state.color_map.color_for(name));
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_distribution(name);
                    }
                }
            });
            ui.separator();

            // ---- Data summary ----
            ui.strong("Data Summary");
            let summary = state.dashboard.summary;
            ui.label(format!("Total species: {}", summary.distinct_species));
            ui.label(format!("Total locations: {}", summary.distinct_locations));
            ui.label(format!("Total records: {}", summary.total_records));
            ui.separator();

            // ---- Comparison map ----
            let n_compared = state.selection.comparison_species().len();
            egui::CollapsingHeader::new(
                RichText::new(format!(
                    "Comparison Map  ({n_compared}/{MAX_COMPARISON_SPECIES})"
                ))
                .strong(),
            )
            .id_salt("comparison_species")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for name in &species {
                    let mut checked = state.selection.comparison_species().contains(name);
                    // Once full, only deselection is possible.
                    let enabled = checked || !state.selection.comparison_full();
                    let text = RichText::new(name).color(state.color_map.color_for(name));
                    if ui
                        .add_enabled(enabled, egui::Checkbox::new(&mut checked, text))
                        .changed()
                    {
                        state.toggle_comparison(name);
                    }
                }
            });
            ui.separator();

            // ---- Density heatmap ----
            ui.strong("Density Heatmap");
            let current = state.selection.heatmap_species.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("heatmap_species")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for name in &species {
                        if ui.selectable_label(current == *name, name).clicked() {
                            state.set_heatmap_species(name);
                        }
                    }
                });

            let mut radius = state.options.heatmap_radius;
            if ui
                .add(egui::Slider::new(&mut radius, 2..=40).text("radius"))
                .changed()
            {
                state.set_heatmap_radius(radius);
            }
        });
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
            if ui.button("Export charts…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} observations loaded, {} visible",
            state.table.len(),
            state.visible_count()
        ));
        ui.label(RichText::new(state.source.display().to_string()).weak());

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open observations")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} observations of {} species from {}",
                    table.len(),
                    table.species.len(),
                    path.display()
                );
                state.set_table(table, &path);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export chart specifications")
        .add_filter("JSON", &["json"])
        .set_file_name("charts.json")
        .save_file();

    if let Some(path) = file {
        match crate::chart::export::write_charts(&path, &state.source, &state.dashboard) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export charts: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
