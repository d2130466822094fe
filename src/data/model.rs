use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Observation – one row of the source table
// ---------------------------------------------------------------------------

/// A single recorded sighting of a species at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub scientific_name: String,
    pub common_name: String,
    /// NaN when the source left the cell blank.
    #[serde(deserialize_with = "nullable_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub longitude: f64,
}

/// JSON `null` (what a NaN coordinate is exported as) reads back as NaN.
fn nullable_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Observation {
    pub fn new(
        scientific_name: impl Into<String>,
        common_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            scientific_name: scientific_name.into(),
            common_name: common_name.into(),
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are present (not NaN).
    pub fn has_coordinates(&self) -> bool {
        !self.latitude.is_nan() && !self.longitude.is_nan()
    }

    /// Whether latitude ∈ [-90, 90] and longitude ∈ [-180, 180].
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Hashable key for the (latitude, longitude) pair.
    ///
    /// Exact duplicates map to the same key; `-0.0` is folded into `0.0`
    /// so the two compare equal like they do as floats. Every NaN maps to
    /// one key, so missing coordinates count as a single location.
    pub fn location_key(&self) -> (u64, u64) {
        fn bits(v: f64) -> u64 {
            if v == 0.0 {
                0.0f64.to_bits()
            } else if v.is_nan() {
                f64::NAN.to_bits()
            } else {
                v.to_bits()
            }
        }
        (bits(self.latitude), bits(self.longitude))
    }
}

// ---------------------------------------------------------------------------
// ObservationTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All loaded observations plus the distinct species in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    /// All observations (rows), in file order.
    pub records: Vec<Observation>,
    /// Distinct scientific names in order of first occurrence.
    pub species: Vec<String>,
}

impl ObservationTable {
    /// Build the species index from the loaded records.
    pub fn from_records(records: Vec<Observation>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut species = Vec::new();
        for obs in &records {
            if seen.insert(obs.scientific_name.as_str()) {
                species.push(obs.scientific_name.clone());
            }
        }
        ObservationTable { records, species }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no observations.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with both coordinates present but outside the
    /// valid ranges.
    pub fn out_of_range_count(&self) -> usize {
        self.records
            .iter()
            .filter(|obs| obs.has_coordinates() && !obs.has_valid_coordinates())
            .count()
    }

    /// Number of records missing a latitude or longitude.
    pub fn missing_coordinate_count(&self) -> usize {
        self.records.iter().filter(|obs| !obs.has_coordinates()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_in_first_occurrence_order() {
        let table = ObservationTable::from_records(vec![
            Observation::new("Mikania micrantha", "Mile-a-minute", 3.1, 101.7),
            Observation::new("Lantana camara", "Lantana", 5.4, 100.3),
            Observation::new("Mikania micrantha", "Mile-a-minute", 3.2, 101.6),
            Observation::new("Eichhornia crassipes", "Water hyacinth", 1.5, 103.7),
        ]);

        assert_eq!(table.len(), 4);
        assert_eq!(
            table.species,
            vec!["Mikania micrantha", "Lantana camara", "Eichhornia crassipes"]
        );
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Observation::new("A", "a", 90.0, -180.0).has_valid_coordinates());
        assert!(!Observation::new("A", "a", 90.5, 0.0).has_valid_coordinates());
        assert!(!Observation::new("A", "a", 0.0, 181.0).has_valid_coordinates());
        assert!(!Observation::new("A", "a", f64::NAN, 0.0).has_valid_coordinates());

        let table = ObservationTable::from_records(vec![
            Observation::new("A", "a", 1.0, 1.0),
            Observation::new("A", "a", 100.0, 1.0),
        ]);
        assert_eq!(table.out_of_range_count(), 1);
    }

    #[test]
    fn test_missing_coordinates_are_not_out_of_range() {
        let table = ObservationTable::from_records(vec![
            Observation::new("A", "a", 1.0, f64::NAN),
            Observation::new("A", "a", f64::NAN, f64::NAN),
            Observation::new("B", "b", 100.0, 1.0),
        ]);
        assert_eq!(table.missing_coordinate_count(), 2);
        assert_eq!(table.out_of_range_count(), 1);
    }

    #[test]
    fn test_location_key_collapses_nan() {
        let a = Observation::new("A", "a", f64::NAN, f64::NAN);
        let b = Observation::new("B", "b", -f64::NAN, f64::NAN);
        assert_eq!(a.location_key(), b.location_key());
        assert_ne!(a.location_key(), Observation::new("A", "a", 0.0, 0.0).location_key());
    }

    #[test]
    fn test_json_null_coordinate_reads_as_nan() {
        let obs: Observation = serde_json::from_str(
            r#"{"scientific_name": "A", "common_name": "a", "latitude": 1.5, "longitude": null}"#,
        )
        .unwrap();
        assert_eq!(obs.latitude, 1.5);
        assert!(obs.longitude.is_nan());
    }

    #[test]
    fn test_location_key_folds_negative_zero() {
        let a = Observation::new("A", "a", 0.0, 10.0);
        let b = Observation::new("B", "b", -0.0, 10.0);
        let c = Observation::new("B", "b", 0.5, 10.0);
        assert_eq!(a.location_key(), b.location_key());
        assert_ne!(a.location_key(), c.location_key());
    }

    #[test]
    fn test_empty_table() {
        let table = ObservationTable::from_records(Vec::new());
        assert!(table.is_empty());
        assert!(table.species.is_empty());
    }
}
