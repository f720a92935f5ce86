//! The slice of the nautical map the biology needs: cell identities, which cells are sea, and
//! Moore neighbourhoods.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, Result};

/// Grid coordinates of a map cell. Ordered by `x` then `y` so maps keyed by cell iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub x: usize,
    pub y: usize,
}

impl CellId {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Spatial queries the biology processes rely on.
pub trait Neighborhood {
    /// Sea cells within Chebyshev distance `radius` of `cell`, excluding `cell` itself.
    fn neighbors(&self, cell: CellId, radius: usize) -> Vec<CellId>;

    /// Every sea cell of the map.
    fn sea_cells(&self) -> Vec<CellId>;
}

/// Rectangular map with a land mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    width: usize,
    height: usize,
    land: Vec<bool>,
}

impl GridMap {
    /// An all-sea map.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            land: vec![false; width * height],
        }
    }

    pub fn with_land(mut self, cells: &[CellId]) -> Self {
        for cell in cells {
            if self.contains(*cell) {
                let index = self.index(*cell);
                self.land[index] = true;
            }
        }
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, cell: CellId) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn is_sea(&self, cell: CellId) -> bool {
        self.contains(cell) && !self.land[self.index(cell)]
    }

    fn index(&self, cell: CellId) -> usize {
        cell.y * self.width + cell.x
    }
}

impl Neighborhood for GridMap {
    fn neighbors(&self, cell: CellId, radius: usize) -> Vec<CellId> {
        let x_range = cell.x.saturating_sub(radius)..=(cell.x + radius).min(self.width.saturating_sub(1));
        let mut neighbors = Vec::new();
        for x in x_range {
            let y_range =
                cell.y.saturating_sub(radius)..=(cell.y + radius).min(self.height.saturating_sub(1));
            for y in y_range {
                let candidate = CellId::new(x, y);
                if candidate != cell && self.is_sea(candidate) {
                    neighbors.push(candidate);
                }
            }
        }
        neighbors
    }

    fn sea_cells(&self) -> Vec<CellId> {
        let mut cells = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let cell = CellId::new(x, y);
                if self.is_sea(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

/// Dense grid of reals with the same shape as a map. Rows are `y`, columns are `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleGrid {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl DoubleGrid {
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Builds a grid from rows (`rows[y][x]`).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(ConfigError::RaggedMatrix.into());
        }
        Ok(Self {
            width,
            height,
            values: rows.iter().flatten().copied().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at `cell`, zero outside the grid.
    pub fn get(&self, cell: CellId) -> f64 {
        if cell.x < self.width && cell.y < self.height {
            self.values[cell.y * self.width + cell.x]
        } else {
            0.0
        }
    }

    pub fn set(&mut self, cell: CellId, value: f64) {
        if cell.x < self.width && cell.y < self.height {
            self.values[cell.y * self.width + cell.x] = value;
        }
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Every cell of the grid with its value.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (CellId::new(i % self.width, i / self.width), v))
    }

    pub fn check_shape(&self, map: &GridMap) -> Result<()> {
        if self.width != map.width() || self.height != map.height() {
            return Err(ConfigError::GridShape {
                width: map.width(),
                height: map.height(),
                actual_width: self.width,
                actual_height: self.height,
            }
            .into());
        }
        Ok(())
    }
}
