mod app;
mod chart;
mod color;
mod data;
mod state;
mod ui;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use app::InvasiveAtlasApp;
use eframe::egui;
use state::AppState;

/// Environment variable consulted when no path is given on the command line.
const DATA_ENV: &str = "INVASIVE_ATLAS_DATA";
const DEFAULT_DATASET: &str = "observations.csv";

/// Command-line argument first, then the environment, then the default file.
fn resolve_dataset_path(arg: Option<OsString>, env: Option<OsString>) -> PathBuf {
    arg.or(env)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET))
}

fn main() -> Result<()> {
    env_logger::init();

    let path = resolve_dataset_path(std::env::args_os().nth(1), std::env::var_os(DATA_ENV));
    let table = data::loader::load_file(&path)
        .with_context(|| format!("loading observations from {}", path.display()))?;
    log::info!(
        "Loaded {} observations of {} species from {}",
        table.len(),
        table.species.len(),
        path.display()
    );

    let state = AppState::new(table, &path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Invasive Atlas – Plant Species Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(InvasiveAtlasApp::new(state)))),
    )
    .map_err(|e| anyhow!("dashboard window failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_path_precedence() {
        assert_eq!(
            resolve_dataset_path(Some("a.csv".into()), Some("b.csv".into())),
            PathBuf::from("a.csv")
        );
        assert_eq!(
            resolve_dataset_path(None, Some("b.parquet".into())),
            PathBuf::from("b.parquet")
        );
        assert_eq!(resolve_dataset_path(None, None), PathBuf::from(DEFAULT_DATASET));
    }
}
