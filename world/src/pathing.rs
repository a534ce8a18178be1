//! Coarse walkability grid consumed by pathfinding collaborators.

use emberfall_core::Rect;
use glam::Vec2;

/// Side length of a pathing cell in world units.
pub const PATHING_CELL_SIZE: f32 = 25.0;

/// Dense grid flagging the cells that contain a wall's upper-left corner.
///
/// Cells are stored in row-major order; the grid covers the far edges of the
/// world so every wall position maps to a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathingGrid {
    origin_x: i64,
    origin_y: i64,
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
}

impl PathingGrid {
    /// Creates an unobstructed grid covering `area`.
    #[must_use]
    pub fn new(area: &Rect) -> Self {
        let columns = (area.width().max(0.0) / PATHING_CELL_SIZE) as u32 + 1;
        let rows = (area.height().max(0.0) / PATHING_CELL_SIZE) as u32 + 1;
        Self {
            origin_x: area.x().floor() as i64,
            origin_y: area.y().floor() as i64,
            columns,
            rows,
            blocked: vec![false; columns as usize * rows as usize],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Cell containing `position`, if inside the grid.
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> Option<(u32, u32)> {
        let column = (position.x.floor() as i64 - self.origin_x).div_euclid(PATHING_CELL_SIZE as i64);
        let row = (position.y.floor() as i64 - self.origin_y).div_euclid(PATHING_CELL_SIZE as i64);
        let column = u32::try_from(column).ok().filter(|column| *column < self.columns)?;
        let row = u32::try_from(row).ok().filter(|row| *row < self.rows)?;
        Some((column, row))
    }

    /// Whether the cell at `column`, `row` holds a wall; cells outside the grid count as blocked.
    #[must_use]
    pub fn is_blocked(&self, column: u32, row: u32) -> bool {
        self.index(column, row)
            .map_or(true, |index| self.blocked[index])
    }

    /// Flags the cell containing `position`.
    pub fn block(&mut self, position: Vec2) {
        self.set(position, true);
    }

    /// Clears the cell containing `position`.
    pub fn unblock(&mut self, position: Vec2) {
        self.set(position, false);
    }

    /// Dense flags in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.blocked
    }

    fn set(&mut self, position: Vec2, blocked: bool) {
        if let Some(index) = self
            .cell_of(position)
            .and_then(|(column, row)| self.index(column, row))
        {
            self.blocked[index] = blocked;
        }
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_block_their_cell() {
        let mut grid = PathingGrid::new(&Rect::new(-50.0, 0.0, 100.0, 100.0));
        assert_eq!((grid.columns(), grid.rows()), (5, 5));

        grid.block(Vec2::new(-26.0, 60.0));

        assert!(grid.is_blocked(0, 2));
        assert!(!grid.is_blocked(1, 2));
        assert!(grid.is_blocked(9, 0));

        grid.unblock(Vec2::new(-49.0, 74.0));
        assert!(!grid.is_blocked(0, 2));
    }
}
