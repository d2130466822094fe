use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use super::model::Observation;

// ---------------------------------------------------------------------------
// Subsets: borrowed, order-preserving views into the table
// ---------------------------------------------------------------------------

/// An ordered subsequence of observations borrowed from a table.
pub type Subset<'a> = Vec<&'a Observation>;

/// Return the observations whose `scientific_name` is in `names`.
///
/// Order is preserved. An empty `names` set yields an empty subset.
/// Accepts a table's records or a previously filtered subset.
pub fn filter_by_set<'a, I>(records: I, names: &BTreeSet<String>) -> Subset<'a>
where
    I: IntoIterator<Item = &'a Observation>,
{
    if names.is_empty() {
        return Vec::new();
    }
    records
        .into_iter()
        .filter(|obs| names.contains(&obs.scientific_name))
        .collect()
}

/// Return the observations whose `scientific_name` equals `name`.
pub fn filter_by_exactly<'a, I>(records: I, name: &str) -> Subset<'a>
where
    I: IntoIterator<Item = &'a Observation>,
{
    records
        .into_iter()
        .filter(|obs| obs.scientific_name == name)
        .collect()
}

// ---------------------------------------------------------------------------
// Group counts
// ---------------------------------------------------------------------------

/// One row of the species count summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCount {
    pub scientific_name: String,
    pub count: usize,
}

/// Observation counts per species, iterated in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesCounts {
    entries: Vec<SpeciesCount>,
}

impl SpeciesCounts {
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesCount> {
        self.entries.iter()
    }

    /// Number of species groups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all group counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

/// Group observations by `scientific_name` and count each group.
pub fn count_by_group<'a, I>(records: I) -> SpeciesCounts
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut entries: Vec<SpeciesCount> = Vec::new();

    for obs in records {
        let slot = *slots.entry(obs.scientific_name.as_str()).or_insert_with(|| {
            entries.push(SpeciesCount {
                scientific_name: obs.scientific_name.clone(),
                count: 0,
            });
            entries.len() - 1
        });
        entries[slot].count += 1;
    }

    SpeciesCounts { entries }
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Headline numbers shown in the data summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub distinct_species: usize,
    /// Unique (latitude, longitude) pairs, exact duplicates collapsed.
    pub distinct_locations: usize,
    pub total_records: usize,
}

pub fn summary_stats<'a, I>(records: I) -> SummaryStats
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut species: HashSet<&str> = HashSet::new();
    let mut locations: HashSet<(u64, u64)> = HashSet::new();
    let mut total_records = 0;

    for obs in records {
        species.insert(obs.scientific_name.as_str());
        locations.insert(obs.location_key());
        total_records += 1;
    }

    SummaryStats {
        distinct_species: species.len(),
        distinct_locations: locations.len(),
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn scenario_table() -> Vec<Observation> {
        vec![
            Observation::new("A", "a", 1.0, 1.0),
            Observation::new("A", "a", 1.0, 1.0),
            Observation::new("B", "b", 2.0, 2.0),
        ]
    }

    fn mixed_table() -> Vec<Observation> {
        vec![
            Observation::new("B", "b", 2.0, 2.0),
            Observation::new("A", "a", 1.0, 1.0),
            Observation::new("C", "c", 3.0, 3.0),
            Observation::new("B", "b", 2.5, 2.5),
            Observation::new("A", "a", 1.5, 1.5),
            Observation::new("C", "c", 3.5, 3.5),
        ]
    }

    #[test]
    fn test_summary_stats_scenario() {
        let table = scenario_table();
        let stats = summary_stats(&table);
        assert_eq!(stats.distinct_species, 2);
        assert_eq!(stats.distinct_locations, 2);
        assert_eq!(stats.total_records, 3);
    }

    #[test]
    fn test_filter_and_count_scenario() {
        let table = scenario_table();
        let subset = filter_by_set(&table, &names(&["A"]));
        assert_eq!(subset, vec![&table[0], &table[1]]);

        let counts = count_by_group(subset);
        assert_eq!(counts.len(), 1);
        let groups: Vec<(&str, usize)> = counts
            .iter()
            .map(|e| (e.scientific_name.as_str(), e.count))
            .collect();
        assert_eq!(groups, vec![("A", 2)]);
    }

    #[test]
    fn test_filter_by_set_preserves_order_and_membership() {
        let table = mixed_table();
        let wanted = names(&["A", "C"]);
        let subset = filter_by_set(&table, &wanted);

        assert!(subset.len() <= table.len());
        assert!(subset.iter().all(|obs| wanted.contains(&obs.scientific_name)));
        let lats: Vec<f64> = subset.iter().map(|obs| obs.latitude).collect();
        assert_eq!(lats, vec![1.0, 3.0, 1.5, 3.5]);
    }

    #[test]
    fn test_filter_by_empty_set_is_empty() {
        let table = mixed_table();
        assert!(filter_by_set(&table, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_filter_by_unknown_name_is_empty() {
        let table = mixed_table();
        assert!(filter_by_set(&table, &names(&["Z"])).is_empty());
        assert!(filter_by_exactly(&table, "Z").is_empty());
    }

    #[test]
    fn test_filter_by_set_is_idempotent() {
        let table = mixed_table();
        for wanted in [names(&["A"]), names(&["B", "C"]), names(&["A", "B", "C"])] {
            let once = filter_by_set(&table, &wanted);
            let twice = filter_by_set(once.iter().copied(), &wanted);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_filter_by_exactly() {
        let table = mixed_table();
        let subset = filter_by_exactly(&table, "B");
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|obs| obs.scientific_name == "B"));
        assert_eq!(subset[0].latitude, 2.0);
        assert_eq!(subset[1].latitude, 2.5);
    }

    #[test]
    fn test_counts_follow_first_occurrence_and_sum_to_len() {
        let table = mixed_table();
        let counts = count_by_group(&table);

        let order: Vec<&str> = counts.iter().map(|e| e.scientific_name.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(counts.total(), table.len());
        assert!(counts
            .iter()
            .all(|e| table.iter().any(|obs| obs.scientific_name == e.scientific_name)));
    }

    #[test]
    fn test_count_of_empty_subset() {
        let counts = count_by_group(Vec::<&Observation>::new());
        assert!(counts.is_empty());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_summary_total_matches_len() {
        let table = mixed_table();
        assert_eq!(summary_stats(&table).total_records, table.len());
        assert_eq!(summary_stats(&table).distinct_locations, 6);
        assert_eq!(summary_stats(Vec::<&Observation>::new()), SummaryStats::default());
    }

    #[test]
    fn test_missing_coordinates_collapse_into_one_location() {
        let table = vec![
            Observation::new("A", "a", f64::NAN, f64::NAN),
            Observation::new("A", "a", f64::NAN, f64::NAN),
            Observation::new("B", "b", f64::NAN, f64::NAN),
            Observation::new("B", "b", 2.0, 2.0),
        ];
        let stats = summary_stats(&table);
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.distinct_locations, 2);
    }
}
