/// Declarative chart descriptions handed to the rendering host.
///
/// ```text
///   Subset ──► builder ──► ChartSpec ──► ui::plot   (egui_plot)
///                              │
///                              └──────► export     (JSON file)
/// ```
///
/// Nothing in here draws; a `ChartSpec` only says what to draw.

pub mod builder;
pub mod density;
pub mod export;

use std::fmt;

use serde::Serialize;

use crate::data::filter::SpeciesCount;
use crate::data::model::Observation;

/// Geometry of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One marker per observation on a lat/lon plane.
    ScatterMap,
    /// Observation density on a lat/lon plane (z = density).
    DensityMap,
    /// One bar per species.
    Bar,
}

/// Columns a chart can bind to a visual channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ScientificName,
    CommonName,
    Latitude,
    Longitude,
    Count,
}

/// Map / visual style tag. Serialized with the names map renderers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualStyle {
    OpenStreetMap,
    CartoPositron,
    StamenToner,
    Plain,
}

impl fmt::Display for VisualStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            VisualStyle::OpenStreetMap => "open-street-map",
            VisualStyle::CartoPositron => "carto-positron",
            VisualStyle::StamenToner => "stamen-toner",
            VisualStyle::Plain => "plain",
        };
        f.write_str(tag)
    }
}

/// Field-to-channel mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Encoding {
    pub x: Option<Field>,
    pub y: Option<Field>,
    /// Density maps only: what the z axis measures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Field>,
    pub color: Option<Field>,
    pub hover_name: Option<Field>,
    pub hover_fields: Vec<Field>,
}

/// Rows behind a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "rows", rename_all = "snake_case")]
pub enum ChartData {
    Observations(Vec<Observation>),
    Counts(Vec<SpeciesCount>),
}

/// Size and zoom hints for the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
}

/// A complete, renderer-agnostic chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub data: ChartData,
    pub encoding: Encoding,
    pub style: VisualStyle,
    pub layout: Layout,
}

impl ChartSpec {
    /// Observation rows, for map charts.
    pub fn observations(&self) -> &[Observation] {
        match &self.data {
            ChartData::Observations(rows) => rows,
            ChartData::Counts(_) => &[],
        }
    }

    /// Count rows, for bar charts.
    pub fn counts(&self) -> &[SpeciesCount] {
        match &self.data {
            ChartData::Counts(rows) => rows,
            ChartData::Observations(_) => &[],
        }
    }
}
