use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One CSV row. `observed_on` is an extra column the dashboard ignores.
#[derive(Serialize)]
struct Row {
    scientific_name: String,
    common_name: String,
    latitude: f64,
    longitude: f64,
    observed_on: String,
}

/// (scientific name, common name, observations to generate)
const SPECIES: [(&str, &str, usize); 8] = [
    ("Mikania micrantha", "Mile-a-minute", 180),
    ("Eichhornia crassipes", "Water hyacinth", 140),
    ("Lantana camara", "Lantana", 120),
    ("Chromolaena odorata", "Siam weed", 110),
    ("Clidemia hirta", "Koster's curse", 90),
    ("Mimosa pigra", "Giant sensitive plant", 60),
    ("Pistia stratiotes", "Water lettuce", 45),
    ("Acacia mangium", "Mangium", 30),
];

/// Survey hubs: (latitude, longitude, spread in degrees)
const HUBS: [(f64, f64, f64); 6] = [
    (3.139, 101.687, 0.35),  // Kuala Lumpur
    (5.414, 100.329, 0.25),  // George Town
    (1.4927, 103.7414, 0.3), // Johor Bahru
    (4.5975, 101.0901, 0.3), // Ipoh
    (5.9804, 116.0735, 0.4), // Kota Kinabalu
    (1.5535, 110.3593, 0.4), // Kuching
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let mut rows: Vec<Row> = Vec::new();

    for (s, &(scientific, common, n)) in SPECIES.iter().enumerate() {
        // Each species favours two hubs, with some stragglers elsewhere.
        let home = [s % HUBS.len(), (s * 3 + 1) % HUBS.len()];
        for i in 0..n {
            let hub = if rng.next_f64() < 0.85 {
                HUBS[home[i % 2]]
            } else {
                HUBS[rng.below(HUBS.len())]
            };
            let (lat, lon, spread) = hub;
            rows.push(Row {
                scientific_name: scientific.to_string(),
                common_name: common.to_string(),
                // Rounded like field GPS logs so some locations repeat.
                latitude: (rng.gauss(lat, spread) * 1000.0).round() / 1000.0,
                longitude: (rng.gauss(lon, spread) * 1000.0).round() / 1000.0,
                observed_on: format!("2023-{:02}-{:02}", 1 + rng.below(12), 1 + rng.below(28)),
            });
        }
    }

    // Interleave species the way a field log would be.
    for i in (1..rows.len()).rev() {
        let j = rng.below(i + 1);
        rows.swap(i, j);
    }

    // ---- CSV ----
    let csv_path = "observations.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    for row in &rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV output")?;

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("scientific_name", DataType::Utf8, false),
        Field::new("common_name", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("observed_on", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.scientific_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.common_name.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.observed_on.as_str()),
            )),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "observations.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} observations of {} species to {csv_path} and {parquet_path}",
        rows.len(),
        SPECIES.len()
    );
    Ok(())
}
