use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::chart::builder::{ChartOptions, Dashboard};
use crate::chart::density::{DEFAULT_RESOLUTION, DensityGrid};
use crate::color::ColorMap;
use crate::data::model::ObservationTable;

/// Most species the comparison map accepts.
pub const MAX_COMPARISON_SPECIES: usize = 8;
/// Fewest species for which a comparison map is drawn.
pub const MIN_COMPARISON_SPECIES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("at most {} species can be compared; deselect one first", MAX_COMPARISON_SPECIES)]
    ComparisonFull,
}

// ---------------------------------------------------------------------------
// Selection: the user's filter choices
// ---------------------------------------------------------------------------

/// Three independent species selections, one per view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Species shown on the distribution map and bar chart.
    pub distribution_species: BTreeSet<String>,
    /// Species on the comparison map. Bounded by [`MAX_COMPARISON_SPECIES`].
    comparison_species: BTreeSet<String>,
    /// Species for the density heatmap (`None` only for an empty table).
    pub heatmap_species: Option<String>,
}

impl Selection {
    /// Defaults: every species for the distribution, the first two for
    /// comparison, the first one for the heatmap.
    pub fn for_table(table: &ObservationTable) -> Self {
        Self {
            distribution_species: table.species.iter().cloned().collect(),
            comparison_species: table
                .species
                .iter()
                .take(MIN_COMPARISON_SPECIES)
                .cloned()
                .collect(),
            heatmap_species: table.species.first().cloned(),
        }
    }

    pub fn toggle_distribution(&mut self, name: &str) {
        if !self.distribution_species.remove(name) {
            self.distribution_species.insert(name.to_string());
        }
    }

    pub fn select_all_distribution(&mut self, table: &ObservationTable) {
        self.distribution_species = table.species.iter().cloned().collect();
    }

    pub fn clear_distribution(&mut self) {
        self.distribution_species.clear();
    }

    pub fn comparison_species(&self) -> &BTreeSet<String> {
        &self.comparison_species
    }

    /// Whether another species can still be added for comparison.
    pub fn comparison_full(&self) -> bool {
        self.comparison_species.len() >= MAX_COMPARISON_SPECIES
    }

    /// Add a species to the comparison. Re-adding a selected one is a no-op.
    pub fn add_comparison(&mut self, name: &str) -> Result<(), SelectionError> {
        if self.comparison_species.contains(name) {
            return Ok(());
        }
        if self.comparison_full() {
            return Err(SelectionError::ComparisonFull);
        }
        self.comparison_species.insert(name.to_string());
        Ok(())
    }

    pub fn remove_comparison(&mut self, name: &str) {
        self.comparison_species.remove(name);
    }

    pub fn toggle_comparison(&mut self, name: &str) -> Result<(), SelectionError> {
        if self.comparison_species.contains(name) {
            self.remove_comparison(name);
            Ok(())
        } else {
            self.add_comparison(name)
        }
    }

    pub fn set_heatmap_species(&mut self, name: &str) {
        self.heatmap_species = Some(name.to_string());
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded observations.
    pub table: ObservationTable,

    /// Where `table` was loaded from.
    pub source: PathBuf,

    /// Current species selections.
    pub selection: Selection,

    /// Layout parameters for chart building.
    pub options: ChartOptions,

    /// Species → colour, shared by every chart.
    pub color_map: ColorMap,

    /// Charts derived from the current selection.
    pub dashboard: Dashboard,

    /// Binned heatmap cells for `dashboard.heatmap`.
    pub heatmap_grid: Option<DensityGrid>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(table: ObservationTable, source: &Path) -> Self {
        let selection = Selection::for_table(&table);
        let options = ChartOptions::default();
        let dashboard = Dashboard::build(&table, &selection, &options);
        Self {
            color_map: ColorMap::new(&table.species),
            heatmap_grid: heatmap_grid(&dashboard),
            table,
            source: source.to_path_buf(),
            selection,
            options,
            dashboard,
            status_message: None,
        }
    }

    /// Replace the dataset, reset selections to their defaults.
    pub fn set_table(&mut self, table: ObservationTable, source: &Path) {
        self.color_map = ColorMap::new(&table.species);
        self.selection = Selection::for_table(&table);
        self.table = table;
        self.source = source.to_path_buf();
        self.status_message = None;
        self.refresh();
    }

    /// Rebuild every chart after a selection or option change.
    ///
    /// The density grid depends only on the heatmap chart and is kept
    /// when that chart comes out unchanged.
    pub fn refresh(&mut self) {
        let dashboard = Dashboard::build(&self.table, &self.selection, &self.options);
        let previous = std::mem::replace(&mut self.dashboard, dashboard);
        if previous.heatmap != self.dashboard.heatmap {
            self.heatmap_grid = heatmap_grid(&self.dashboard);
        }
    }

    pub fn toggle_distribution(&mut self, name: &str) {
        self.selection.toggle_distribution(name);
        self.refresh();
    }

    /// Select every species for the distribution map.
    pub fn select_all(&mut self) {
        self.selection.select_all_distribution(&self.table);
        self.refresh();
    }

    /// Deselect every species for the distribution map.
    pub fn select_none(&mut self) {
        self.selection.clear_distribution();
        self.refresh();
    }

    pub fn toggle_comparison(&mut self, name: &str) {
        match self.selection.toggle_comparison(name) {
            Ok(()) => {
                // Only clear our own rejection; other statuses stay visible.
                let rejection = SelectionError::ComparisonFull.to_string();
                if self.status_message.as_deref() == Some(rejection.as_str()) {
                    self.status_message = None;
                }
            }
            Err(e) => {
                log::warn!("Rejected comparison species {name}: {e}");
                self.status_message = Some(e.to_string());
            }
        }
        self.refresh();
    }

    pub fn set_heatmap_species(&mut self, name: &str) {
        self.selection.set_heatmap_species(name);
        self.refresh();
    }

    pub fn set_heatmap_radius(&mut self, radius: u32) {
        if self.options.heatmap_radius != radius {
            self.options.heatmap_radius = radius;
            self.refresh();
        }
    }

    /// Number of observations on the distribution map.
    pub fn visible_count(&self) -> usize {
        self.dashboard
            .distribution
            .as_ref()
            .map_or(0, |chart| chart.observations().len())
    }
}

fn heatmap_grid(dashboard: &Dashboard) -> Option<DensityGrid> {
    let chart = dashboard.heatmap.as_ref()?;
    DensityGrid::compute(
        chart.observations(),
        DEFAULT_RESOLUTION,
        chart.layout.radius.unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::model::Observation;

    fn table_with(species: &[&str]) -> ObservationTable {
        ObservationTable::from_records(
            species
                .iter()
                .enumerate()
                .map(|(i, name)| Observation::new(*name, name.to_lowercase(), i as f64, i as f64))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let table = table_with(&["C", "A", "B", "A"]);
        let selection = Selection::for_table(&table);

        assert_eq!(selection.distribution_species.len(), 3);
        let comparison: Vec<&str> = selection
            .comparison_species()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(comparison, vec!["A", "C"]);
        assert_eq!(selection.heatmap_species.as_deref(), Some("C"));
    }

    #[test]
    fn test_defaults_for_single_species_and_empty_table() {
        let one = Selection::for_table(&table_with(&["A"]));
        assert_eq!(one.comparison_species().len(), 1);

        let none = Selection::for_table(&ObservationTable::default());
        assert!(none.distribution_species.is_empty());
        assert!(none.comparison_species().is_empty());
        assert!(none.heatmap_species.is_none());
    }

    #[test]
    fn test_comparison_bound() {
        let names: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
        let mut selection = Selection::default();

        for name in &names[..MAX_COMPARISON_SPECIES] {
            selection.add_comparison(name).unwrap();
        }
        assert!(selection.comparison_full());
        assert_eq!(
            selection.add_comparison(&names[8]),
            Err(SelectionError::ComparisonFull)
        );
        // Re-adding an existing entry is fine even when full.
        assert_eq!(selection.add_comparison(&names[0]), Ok(()));
        assert_eq!(selection.comparison_species().len(), MAX_COMPARISON_SPECIES);

        selection.toggle_comparison(&names[0]).unwrap();
        selection.toggle_comparison(&names[9]).unwrap();
        assert!(selection.comparison_species().contains(&names[9]));
        assert!(!selection.comparison_species().contains(&names[0]));
    }

    #[test]
    fn test_distribution_toggles() {
        let table = table_with(&["A", "B"]);
        let mut selection = Selection::for_table(&table);

        selection.toggle_distribution("A");
        assert!(!selection.distribution_species.contains("A"));
        selection.toggle_distribution("A");
        assert!(selection.distribution_species.contains("A"));

        selection.clear_distribution();
        assert!(selection.distribution_species.is_empty());
        selection.select_all_distribution(&table);
        assert_eq!(selection.distribution_species.len(), 2);
    }

    #[test]
    fn test_app_state_refreshes_on_change() {
        let table = table_with(&["A", "B", "A"]);
        let mut state = AppState::new(table, Path::new("obs.csv"));
        assert_eq!(state.visible_count(), 3);

        state.toggle_distribution("A");
        assert_eq!(state.visible_count(), 1);

        state.select_none();
        assert_eq!(state.visible_count(), 0);
        assert!(state.dashboard.species_counts.is_none());

        state.select_all();
        assert_eq!(state.visible_count(), 3);

        state.toggle_comparison("B");
        assert!(state.dashboard.comparison.is_none());

        state.set_heatmap_species("B");
        assert_eq!(
            state.dashboard.heatmap.as_ref().map(|c| c.title.as_str()),
            Some("B Density Heatmap")
        );

        assert!(state.heatmap_grid.is_some());

        state.set_heatmap_radius(25);
        assert_eq!(
            state.dashboard.heatmap.as_ref().and_then(|c| c.layout.radius),
            Some(25)
        );
    }

    #[test]
    fn test_rejected_comparison_sets_status() {
        let names: Vec<String> = (0..9).map(|i| format!("S{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = AppState::new(table_with(&refs), Path::new("obs.csv"));

        for name in &names[2..8] {
            state.toggle_comparison(name);
        }
        assert!(state.status_message.is_none());

        state.toggle_comparison("S8");
        assert!(state.status_message.is_some());
        assert_eq!(
            state.selection.comparison_species().len(),
            MAX_COMPARISON_SPECIES
        );
    }

    #[test]
    fn test_comparison_toggle_keeps_unrelated_status() {
        let names: Vec<String> = (0..9).map(|i| format!("S{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = AppState::new(table_with(&refs), Path::new("obs.csv"));

        state.status_message = Some("Export failed: disk full".to_string());
        state.toggle_comparison("S2");
        assert_eq!(
            state.status_message.as_deref(),
            Some("Export failed: disk full")
        );

        for name in &names[3..8] {
            state.toggle_comparison(name);
        }
        state.toggle_comparison("S8");
        assert_eq!(
            state.status_message,
            Some(SelectionError::ComparisonFull.to_string())
        );

        state.toggle_comparison("S0");
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_density_grid_kept_while_heatmap_unchanged() {
        let table = table_with(&["A", "B", "A"]);
        let mut state = AppState::new(table, Path::new("obs.csv"));
        let grid = state.heatmap_grid.as_mut().unwrap();
        grid.cells.clear();

        state.toggle_distribution("B");
        state.select_none();
        state.toggle_comparison("B");
        assert!(state.heatmap_grid.as_ref().unwrap().cells.is_empty());

        state.set_heatmap_radius(20);
        assert!(!state.heatmap_grid.as_ref().unwrap().cells.is_empty());

        state.set_heatmap_species("Z");
        assert!(state.heatmap_grid.is_none());
    }

    #[test]
    fn test_set_table_resets_selection() {
        let mut state = AppState::new(table_with(&["A", "B"]), Path::new("a.csv"));
        state.select_none();
        state.set_table(table_with(&["X"]), Path::new("b.csv"));

        assert_eq!(state.source, PathBuf::from("b.csv"));
        assert_eq!(state.selection.heatmap_species.as_deref(), Some("X"));
        assert_eq!(state.visible_count(), 1);
        assert!(state.dashboard.comparison.is_none());
    }
}
