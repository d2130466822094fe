use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::ChartSpec;
use super::builder::Dashboard;
use crate::data::filter::SummaryStats;

/// On-disk shape of an export.
#[derive(Debug, Serialize)]
struct ChartBundle<'a> {
    source: String,
    summary: SummaryStats,
    charts: Vec<&'a ChartSpec>,
}

/// Write every chart currently built into `path` as pretty-printed JSON.
pub fn write_charts(path: &Path, source: &Path, dashboard: &Dashboard) -> Result<()> {
    let bundle = ChartBundle {
        source: source.display().to_string(),
        summary: dashboard.summary,
        charts: dashboard.charts().collect(),
    };

    let file = File::create(path)
        .with_context(|| format!("creating export file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &bundle).context("writing chart JSON")?;
    writer.flush().context("flushing chart JSON")?;

    log::info!("Exported {} charts to {}", bundle.charts.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    use crate::chart::builder::ChartOptions;
    use crate::data::model::{Observation, ObservationTable};
    use crate::state::Selection;

    #[test]
    fn test_export_writes_all_charts() {
        let table = ObservationTable::from_records(vec![
            Observation::new("Mikania micrantha", "Mile-a-minute", 3.139, 101.687),
            Observation::new("Lantana camara", "Lantana", 5.414, 100.329),
        ]);
        let selection = Selection::for_table(&table);
        let dashboard = Dashboard::build(&table, &selection, &ChartOptions::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.json");
        write_charts(&path, Path::new("observations.csv"), &dashboard).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["source"], "observations.csv");
        assert_eq!(json["summary"]["total_records"], 2);

        let charts = json["charts"].as_array().unwrap();
        assert_eq!(charts.len(), 4);
        assert_eq!(charts[0]["kind"], "scatter_map");
        assert_eq!(charts[0]["style"], "open-street-map");
        assert_eq!(charts[0]["encoding"]["color"], "scientific_name");
        assert_eq!(charts[0]["data"]["type"], "observations");
        assert_eq!(charts[0]["data"]["rows"][1]["common_name"], "Lantana");
        assert_eq!(charts[1]["style"], "carto-positron");
        assert_eq!(charts[2]["kind"], "density_map");
        assert_eq!(charts[2]["layout"]["radius"], 10);
        assert_eq!(charts[3]["kind"], "bar");
        assert_eq!(charts[3]["data"]["rows"][0]["count"], 1);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("charts.json");
        let err = write_charts(&path, Path::new("x.csv"), &Dashboard::default()).unwrap_err();
        assert!(format!("{err:#}").contains("creating export file"));
    }
}
