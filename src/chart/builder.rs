use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::{ChartData, ChartKind, ChartSpec, Encoding, Field, Layout, VisualStyle};
use crate::data::filter::{
    SpeciesCounts, SummaryStats, count_by_group, filter_by_exactly, filter_by_set, summary_stats,
};
use crate::data::model::{Observation, ObservationTable};
use crate::state::{MIN_COMPARISON_SPECIES, Selection};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Layout parameters shared by all charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartOptions {
    /// Chart height in pixels.
    pub height: u32,
    /// Initial map zoom level.
    pub zoom: u8,
    /// Heatmap kernel radius.
    pub heatmap_radius: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            height: 600,
            zoom: 5,
            heatmap_radius: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Single-chart builders. `None` means "no chart".
// ---------------------------------------------------------------------------

fn map_encoding() -> Encoding {
    Encoding {
        x: Some(Field::Longitude),
        y: Some(Field::Latitude),
        z: None,
        color: Some(Field::ScientificName),
        hover_name: Some(Field::CommonName),
        hover_fields: vec![Field::Latitude, Field::Longitude],
    }
}

fn scatter_map(
    subset: &[&Observation],
    title: &str,
    style: VisualStyle,
    options: &ChartOptions,
) -> Option<ChartSpec> {
    if subset.is_empty() {
        return None;
    }
    Some(ChartSpec {
        kind: ChartKind::ScatterMap,
        title: title.to_string(),
        data: ChartData::Observations(subset.iter().map(|&obs| obs.clone()).collect()),
        encoding: map_encoding(),
        style,
        layout: Layout {
            height: options.height,
            zoom: Some(options.zoom),
            radius: None,
        },
    })
}

/// Scatter map of the distribution-filtered subset.
pub fn distribution_chart(subset: &[&Observation], options: &ChartOptions) -> Option<ChartSpec> {
    scatter_map(
        subset,
        "Species Distribution Map",
        VisualStyle::OpenStreetMap,
        options,
    )
}

/// Scatter map of the comparison species, taken from the full table.
///
/// Needs at least two selected species; fewer is not an error, just no chart.
pub fn comparison_chart(
    table: &ObservationTable,
    comparison: &BTreeSet<String>,
    options: &ChartOptions,
) -> Option<ChartSpec> {
    if comparison.len() < MIN_COMPARISON_SPECIES {
        return None;
    }
    let subset = filter_by_set(&table.records, comparison);
    scatter_map(
        &subset,
        "Species Comparison Map",
        VisualStyle::CartoPositron,
        options,
    )
}

/// Density map of a single species' observations.
pub fn heatmap_chart(
    species: &str,
    subset: &[&Observation],
    radius: u32,
    style: VisualStyle,
    options: &ChartOptions,
) -> Option<ChartSpec> {
    if subset.is_empty() {
        return None;
    }
    Some(ChartSpec {
        kind: ChartKind::DensityMap,
        title: format!("{species} Density Heatmap"),
        data: ChartData::Observations(subset.iter().map(|&obs| obs.clone()).collect()),
        encoding: Encoding {
            x: Some(Field::Longitude),
            y: Some(Field::Latitude),
            z: Some(Field::Count),
            color: None,
            hover_name: None,
            hover_fields: vec![Field::Latitude, Field::Longitude],
        },
        style,
        layout: Layout {
            height: options.height,
            zoom: Some(options.zoom),
            radius: Some(radius),
        },
    })
}

/// Bar chart of observations per species.
pub fn species_count_chart(counts: &SpeciesCounts, options: &ChartOptions) -> Option<ChartSpec> {
    if counts.is_empty() {
        return None;
    }
    Some(ChartSpec {
        kind: ChartKind::Bar,
        title: "Species Count".to_string(),
        data: ChartData::Counts(counts.iter().cloned().collect()),
        encoding: Encoding {
            x: Some(Field::ScientificName),
            y: Some(Field::Count),
            z: None,
            color: Some(Field::ScientificName),
            hover_name: Some(Field::ScientificName),
            hover_fields: vec![Field::Count],
        },
        style: VisualStyle::Plain,
        layout: Layout {
            height: options.height,
            zoom: None,
            radius: None,
        },
    })
}

// ---------------------------------------------------------------------------
// Notices: "nothing to show" conditions surfaced to the user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The distribution selection matched no observations.
    NoDistributionData,
    /// Fewer than two species picked for comparison.
    ComparisonNeedsMore { selected: usize },
    /// The comparison species matched no observations.
    NoComparisonData,
    /// The heatmap species has no observations in the table.
    HeatmapSpeciesMissing(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoDistributionData => {
                write!(f, "No data available for the selected species.")
            }
            Notice::ComparisonNeedsMore { selected } => write!(
                f,
                "Select at least {MIN_COMPARISON_SPECIES} species to compare ({selected} selected)."
            ),
            Notice::NoComparisonData => {
                write!(f, "No data available for the species to compare.")
            }
            Notice::HeatmapSpeciesMissing(species) => {
                write!(f, "No observations of {species} for the density heatmap.")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard: one full interaction cycle
// ---------------------------------------------------------------------------

/// Everything the host needs to draw after one selection change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub summary: SummaryStats,
    pub distribution: Option<ChartSpec>,
    pub comparison: Option<ChartSpec>,
    pub heatmap: Option<ChartSpec>,
    pub species_counts: Option<ChartSpec>,
    pub notices: Vec<Notice>,
}

impl Dashboard {
    /// Derive every chart from `(table, selection)`.
    ///
    /// Each chart is decided on its own; a missing one never blocks the rest.
    pub fn build(table: &ObservationTable, selection: &Selection, options: &ChartOptions) -> Self {
        let mut notices = Vec::new();

        let distribution_subset = filter_by_set(&table.records, &selection.distribution_species);
        let distribution = distribution_chart(&distribution_subset, options);
        let counts = count_by_group(distribution_subset);
        let species_counts = species_count_chart(&counts, options);
        if distribution.is_none() {
            notices.push(Notice::NoDistributionData);
        }

        let comparison_species = selection.comparison_species();
        let comparison = comparison_chart(table, comparison_species, options);
        if comparison_species.len() < MIN_COMPARISON_SPECIES {
            notices.push(Notice::ComparisonNeedsMore {
                selected: comparison_species.len(),
            });
        } else if comparison.is_none() {
            notices.push(Notice::NoComparisonData);
        }

        let heatmap = selection.heatmap_species.as_deref().and_then(|species| {
            let subset = filter_by_exactly(&table.records, species);
            let chart = heatmap_chart(
                species,
                &subset,
                options.heatmap_radius,
                VisualStyle::StamenToner,
                options,
            );
            if chart.is_none() {
                notices.push(Notice::HeatmapSpeciesMissing(species.to_string()));
            }
            chart
        });

        log::debug!(
            "Distribution selection matched {} observations of {} species",
            counts.total(),
            counts.len()
        );

        let dashboard = Dashboard {
            summary: summary_stats(&table.records),
            distribution,
            comparison,
            heatmap,
            species_counts,
            notices,
        };
        log::debug!(
            "Dashboard rebuilt: {} charts, {} notices",
            dashboard.charts().count(),
            dashboard.notices.len()
        );
        dashboard
    }

    /// All charts that were built, in display order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        [
            &self.distribution,
            &self.comparison,
            &self.heatmap,
            &self.species_counts,
        ]
        .into_iter()
        .flatten()
    }
}
