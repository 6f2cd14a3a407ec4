//! Terrain elevation field with slope and aspect derivation
//!
//! Holds a dense elevation raster matching the simulation grid and derives
//! the topographic quantities the fire physics needs: slope magnitude,
//! aspect (downslope direction), and an elevation-band vegetation class.

use crate::cell::VegetationType;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Elevation band boundaries for alpine vegetation zones (meters)
const DENSE_FOREST_LIMIT: f64 = 1000.0;
const SPARSE_FOREST_LIMIT: f64 = 1600.0;
const SHRUBLAND_LIMIT: f64 = 2100.0;
const GRASSLAND_LIMIT: f64 = 2600.0;

/// Elevation raster in row-major order, matching the grid dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    width: usize,
    height: usize,
    elevations: Vec<f64>,
    min_elevation: f64,
    max_elevation: f64,
}

impl Terrain {
    /// Create terrain from a dense `width * height` elevation array
    ///
    /// # Errors
    ///
    /// Rejects empty dimensions, size mismatches, and non-finite or
    /// negative elevations.
    pub fn new(width: usize, height: usize, elevations: Vec<f64>) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if elevations.len() != width * height {
            return Err(ConfigError::ElevationSizeMismatch {
                expected: width * height,
                actual: elevations.len(),
            });
        }
        if let Some(&bad) = elevations.iter().find(|e| !e.is_finite() || **e < 0.0) {
            return Err(ConfigError::InvalidElevation(bad));
        }

        let mut min_elevation = f64::MAX;
        let mut max_elevation = f64::MIN;
        for &e in &elevations {
            min_elevation = min_elevation.min(e);
            max_elevation = max_elevation.max(e);
        }

        Ok(Terrain {
            width,
            height,
            elevations,
            min_elevation,
            max_elevation,
        })
    }

    /// Flat terrain at a constant elevation
    pub fn flat(width: usize, height: usize, elevation: f64) -> Self {
        Terrain::new(width, height, vec![elevation; width * height])
            .unwrap_or_else(|_| unreachable!("constant elevation field is always valid"))
    }

    /// Linear west-to-east ramp from `base` to `base + rise`
    pub fn slope_ramp(width: usize, height: usize, base: f64, rise: f64) -> Self {
        let span = (width.saturating_sub(1)).max(1) as f64;
        let elevations = (0..width * height)
            .map(|i| base + rise * ((i % width) as f64 / span))
            .collect();
        Terrain::new(width, height, elevations)
            .unwrap_or_else(|_| unreachable!("ramp elevation field is always valid"))
    }

    /// Gaussian peak centered on the grid
    pub fn single_peak(
        width: usize,
        height: usize,
        base: f64,
        peak_height: f64,
        peak_radius: f64,
    ) -> Self {
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        let mut elevations = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                let d2 = dx * dx + dy * dy;
                elevations.push(base + peak_height * (-d2 / (peak_radius * peak_radius)).exp());
            }
        }
        Terrain::new(width, height, elevations)
            .unwrap_or_else(|_| unreachable!("peak elevation field is always valid"))
    }

    /// V-shaped valley running north-south through the grid center
    pub fn valley(width: usize, height: usize, floor: f64, rim_height: f64) -> Self {
        let cx = width as f64 / 2.0;
        let half = cx.max(1.0);
        let mut elevations = Vec::with_capacity(width * height);
        for _y in 0..height {
            for x in 0..width {
                let t = ((x as f64 - cx).abs() / half).min(1.0);
                elevations.push(floor + rim_height * t);
            }
        }
        Terrain::new(width, height, elevations)
            .unwrap_or_else(|_| unreachable!("valley elevation field is always valid"))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    /// Elevation at `(x, y)`, clamped to the nearest edge when out of range
    #[inline]
    pub fn elevation(&self, x: usize, y: usize) -> f64 {
        let cx = x.min(self.width - 1);
        let cy = y.min(self.height - 1);
        self.elevations[cy * self.width + cx]
    }

    /// Absolute gradient magnitude at `(x, y)`, in radians
    ///
    /// Central differences in the interior, one-sided at the edges. The
    /// per-axis difference is halved before the maximum is taken, matching
    /// a unit cell spacing.
    pub fn slope(&self, x: usize, y: usize) -> f64 {
        let (gx, gy) = self.gradient(x, y);
        gx.abs().max(gy.abs()).atan()
    }

    /// Downslope direction at `(x, y)`, radians counterclockwise from +x
    pub fn aspect(&self, x: usize, y: usize) -> f64 {
        let (gx, gy) = self.gradient(x, y);
        (-gy).atan2(-gx)
    }

    fn gradient(&self, x: usize, y: usize) -> (f64, f64) {
        let e = |x: usize, y: usize| self.elevation(x, y);

        let gx = if x == 0 {
            e(1.min(self.width - 1), y) - e(0, y)
        } else if x == self.width - 1 {
            e(x, y) - e(x - 1, y)
        } else {
            (e(x + 1, y) - e(x - 1, y)) / 2.0
        };

        let gy = if y == 0 {
            e(x, 1.min(self.height - 1)) - e(x, 0)
        } else if y == self.height - 1 {
            e(x, y) - e(x, y - 1)
        } else {
            (e(x, y + 1) - e(x, y - 1)) / 2.0
        };

        (gx, gy)
    }

    /// Vegetation class for an elevation, following alpine zonation bands
    pub fn vegetation_from_elevation(elevation: f64) -> VegetationType {
        if elevation < DENSE_FOREST_LIMIT {
            VegetationType::DenseForest
        } else if elevation < SPARSE_FOREST_LIMIT {
            VegetationType::SparseForest
        } else if elevation < SHRUBLAND_LIMIT {
            VegetationType::Shrubland
        } else if elevation < GRASSLAND_LIMIT {
            VegetationType::Grassland
        } else {
            VegetationType::Barren
        }
    }
}
