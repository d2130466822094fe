use std::collections::HashMap;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot, PlotPoint, PlotPoints, Points, Polygon};

use crate::chart::density::DensityGrid;
use crate::chart::{ChartKind, ChartSpec};
use crate::color::{ColorMap, heat_color};
use crate::data::model::Observation;
use crate::state::AppState;

const NOTICE_COLOR: Color32 = Color32::from_rgb(230, 170, 40);

// ---------------------------------------------------------------------------
// Central panel: every chart of the current dashboard
// ---------------------------------------------------------------------------

/// Render notices, then each chart that was built, then the data table.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Invasive Plant Species Distribution Dashboard");

            for notice in &state.dashboard.notices {
                ui.colored_label(NOTICE_COLOR, notice.to_string());
            }

            for chart in state.dashboard.charts() {
                ui.add_space(12.0);
                ui.heading(&chart.title);
                ui.label(RichText::new(format!("style: {}", chart.style)).weak().small());

                match chart.kind {
                    ChartKind::ScatterMap => scatter_map(ui, chart, &state.color_map),
                    ChartKind::DensityMap => {
                        if let Some(grid) = &state.heatmap_grid {
                            density_map(ui, chart, grid);
                        }
                    }
                    ChartKind::Bar => bar_chart(ui, chart, &state.color_map),
                }
            }

            if let Some(chart) = &state.dashboard.distribution {
                ui.add_space(12.0);
                observation_table(ui, chart.observations());
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter map: one point series per species
// ---------------------------------------------------------------------------

fn scatter_map(ui: &mut Ui, chart: &ChartSpec, colors: &ColorMap) {
    // Series in first-seen order so the legend matches the data.
    let mut series: Vec<(&str, Vec<[f64; 2]>)> = Vec::new();
    let mut common_names: HashMap<String, String> = HashMap::new();

    for obs in chart.observations().iter().filter(|o| o.has_coordinates()) {
        let point = [obs.longitude, obs.latitude];
        match series
            .iter()
            .position(|(name, _)| *name == obs.scientific_name)
        {
            Some(i) => series[i].1.push(point),
            None => {
                series.push((obs.scientific_name.as_str(), vec![point]));
                common_names.insert(obs.scientific_name.clone(), obs.common_name.clone());
            }
        }
    }

    Plot::new(chart.title.as_str())
        .height(chart.layout.height as f32)
        .data_aspect(1.0)
        .legend(Legend::default())
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .label_formatter(move |name: &str, value: &PlotPoint| {
            let coords = format!("lat {:.4}, lon {:.4}", value.y, value.x);
            match common_names.get(name) {
                Some(common) => format!("{common}\n{name}\n{coords}"),
                None => coords,
            }
        })
        .show(ui, |plot_ui| {
            for (name, points) in series {
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(name)
                        .color(colors.color_for(name))
                        .radius(3.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Density map: filled grid cells on a blue → red gradient
// ---------------------------------------------------------------------------

fn density_map(ui: &mut Ui, chart: &ChartSpec, grid: &DensityGrid) {
    let size = grid.cell_size;

    Plot::new(chart.title.as_str())
        .height(chart.layout.height as f32)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show(ui, |plot_ui| {
            for (west, south, intensity) in grid.occupied() {
                let cell = PlotPoints::from(vec![
                    [west, south],
                    [west + size, south],
                    [west + size, south + size],
                    [west, south + size],
                ]);
                plot_ui.polygon(
                    Polygon::new(cell)
                        .fill_color(heat_color(intensity))
                        .stroke(Stroke::NONE),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Bar chart: observations per species
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, chart: &ChartSpec, colors: &ColorMap) {
    let rows = chart.counts();
    let labels: Vec<String> = rows.iter().map(|r| r.scientific_name.clone()).collect();

    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Bar::new(i as f64, row.count as f64)
                .name(&row.scientific_name)
                .fill(colors.color_for(&row.scientific_name))
                .width(0.7)
        })
        .collect();

    Plot::new(chart.title.as_str())
        .height(chart.layout.height as f32 * 0.6)
        .x_axis_label("scientific_name")
        .y_axis_label("counts")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            let idx = mark.value.round();
            if idx < 0.0 || (mark.value - idx).abs() > 1e-6 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("counts"));
        });
}

// ---------------------------------------------------------------------------
// Raw rows behind the distribution map
// ---------------------------------------------------------------------------

fn observation_table(ui: &mut Ui, rows: &[Observation]) {
    egui::CollapsingHeader::new(format!("Observations ({})", rows.len()))
        .id_salt("observation_table")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(300.0)
                .column(Column::auto().at_least(180.0))
                .column(Column::auto().at_least(140.0))
                .column(Column::auto().at_least(80.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    for title in ["scientific_name", "common_name", "latitude", "longitude"] {
                        header.col(|ui: &mut Ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let obs = &rows[row.index()];
                        row.col(|ui: &mut Ui| {
                            ui.label(&obs.scientific_name);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(&obs.common_name);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{:.5}", obs.latitude));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{:.5}", obs.longitude));
                        });
                    });
                });
        });
}
