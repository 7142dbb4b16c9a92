use serde::{Deserialize, Serialize};

use super::{ClaimError, MAX_GRID_CELLS};

/// One addressable grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Lookup key for this cell, `"row:col"`
    pub fn key(&self) -> String {
        format!("{}:{}", self.row, self.col)
    }
}

/// Fixed grid size, set once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: u32,
    pub cols: u32,
}

impl Dimensions {
    /// Create grid dimensions
    ///
    /// # Returns
    ///
    /// None if either side is zero or the grid exceeds `MAX_GRID_CELLS`
    pub fn new(rows: u32, cols: u32) -> Option<Self> {
        if rows == 0 || cols == 0 {
            return None;
        }

        let total = (rows as usize).checked_mul(cols as usize)?;
        if total > MAX_GRID_CELLS {
            return None;
        }

        Some(Self { rows, cols })
    }

    /// Total number of cells in the grid
    pub fn total(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Resolve a raw coordinate into an in-bounds cell
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate` if either component is outside `[0, rows)` / `[0, cols)`
    pub fn cell(&self, row: i64, col: i64) -> Result<Cell, ClaimError> {
        if row < 0 || row >= self.rows as i64 {
            return Err(ClaimError::InvalidCoordinate(format!(
                "row {} is outside 0..{}",
                row, self.rows
            )));
        }

        if col < 0 || col >= self.cols as i64 {
            return Err(ClaimError::InvalidCoordinate(format!(
                "col {} is outside 0..{}",
                col, self.cols
            )));
        }

        Ok(Cell::new(row as u32, col as u32))
    }

    /// Row-major slot index of an in-bounds cell
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if cell.row >= self.rows || cell.col >= self.cols {
            return None;
        }
        Some(cell.row as usize * self.cols as usize + cell.col as usize)
    }

    /// Inverse of [`Dimensions::index`]
    pub fn cell_at(&self, index: usize) -> Cell {
        let cols = self.cols as usize;
        Cell::new((index / cols) as u32, (index % cols) as u32)
    }
}
