use crate::data::model::Observation;

/// Cells along the longer side of a heatmap grid.
pub const DEFAULT_RESOLUTION: usize = 120;

/// Smallest span (degrees) a grid covers, so a single location still has area.
const MIN_EXTENT: f64 = 0.1;

/// Observation density binned onto a square-cell lon/lat grid.
///
/// Intensities are normalized so the densest cell is `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    /// Longitude of the west edge of column 0.
    pub min_lon: f64,
    /// Latitude of the south edge of row 0.
    pub min_lat: f64,
    /// Side length of one cell in degrees.
    pub cell_size: f64,
    pub cols: usize,
    pub rows: usize,
    /// Row-major, `rows * cols` values in `[0, 1]`.
    pub cells: Vec<f32>,
}

impl DensityGrid {
    /// Bin `points` into a grid with `resolution` cells along the longer
    /// side, spreading each point over `radius` cells with a linear falloff.
    ///
    /// Returns `None` for an empty input.
    pub fn compute(points: &[Observation], resolution: usize, radius: u32) -> Option<Self> {
        if points.is_empty() || resolution == 0 {
            return None;
        }

        let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        for obs in points.iter().filter(|o| o.latitude.is_finite() && o.longitude.is_finite()) {
            min_lon = min_lon.min(obs.longitude);
            max_lon = max_lon.max(obs.longitude);
            min_lat = min_lat.min(obs.latitude);
            max_lat = max_lat.max(obs.latitude);
        }
        if !min_lon.is_finite() {
            return None;
        }

        let extent = (max_lon - min_lon).max(max_lat - min_lat).max(MIN_EXTENT);
        let cell_size = extent / resolution as f64;
        let radius = radius.max(1) as i64;

        // Pad by the kernel radius so spread near the edges is kept.
        let pad = radius as f64 * cell_size;
        let min_lon = min_lon - pad;
        let min_lat = min_lat - pad;
        let cols = ((max_lon + pad - min_lon) / cell_size).ceil() as usize + 1;
        let rows = ((max_lat + pad - min_lat) / cell_size).ceil() as usize + 1;

        let mut cells = vec![0.0f32; rows * cols];

        for obs in points.iter().filter(|o| o.latitude.is_finite() && o.longitude.is_finite()) {
            let cx = ((obs.longitude - min_lon) / cell_size) as i64;
            let cy = ((obs.latitude - min_lat) / cell_size) as i64;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (x, y) = (cx + dx, cy + dy);
                    if x < 0 || y < 0 || x >= cols as i64 || y >= rows as i64 {
                        continue;
                    }
                    let d = ((dx * dx + dy * dy) as f64).sqrt();
                    if d > radius as f64 {
                        continue;
                    }
                    let weight = 1.0 - d / (radius as f64 + 1.0);
                    cells[y as usize * cols + x as usize] += weight as f32;
                }
            }
        }

        let peak = cells.iter().cloned().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for c in &mut cells {
                *c /= peak;
            }
        }

        Some(DensityGrid {
            min_lon,
            min_lat,
            cell_size,
            cols,
            rows,
            cells,
        })
    }

    /// Non-empty cells as `(west, south, intensity)`.
    pub fn occupied(&self) -> impl Iterator<Item = (f64, f64, f32)> + '_ {
        self.cells.iter().enumerate().filter(|&(_, &v)| v > 0.0).map(|(i, &v)| {
            let col = i % self.cols;
            let row = i / self.cols;
            (
                self.min_lon + col as f64 * self.cell_size,
                self.min_lat + row as f64 * self.cell_size,
                v,
            )
        })
    }
}
