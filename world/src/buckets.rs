use emberfall_core::Rect;
use glam::Vec2;

use crate::WorldError;

/// Side length of a bucket in world units.
pub const BUCKET_SIZE: f32 = 100.0;

/// Uniform grid grouping immobile entities by the bucket containing their position.
///
/// Members are not re-bucketed when they move; callers must remove and re-add
/// an entry whenever its position changes.
#[derive(Clone, Debug)]
pub struct BucketIndex<K> {
    area: Rect,
    columns: usize,
    rows: usize,
    buckets: Vec<Vec<K>>,
}

impl<K: Copy + PartialEq> BucketIndex<K> {
    /// Creates an empty index covering `area`, far edges included.
    #[must_use]
    pub fn new(area: Rect) -> Self {
        let columns = (area.width().max(0.0) / BUCKET_SIZE) as usize + 1;
        let rows = (area.height().max(0.0) / BUCKET_SIZE) as usize + 1;
        Self {
            area,
            columns,
            rows,
            buckets: vec![Vec::new(); columns * rows],
        }
    }

    /// Number of bucket columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of bucket rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Stores `key` in the bucket containing `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutsideBucketGrid`] when `position` is not covered by the grid.
    pub fn add(&mut self, key: K, position: Vec2) -> Result<(), WorldError> {
        let index = self
            .bucket_for(position)
            .ok_or(WorldError::OutsideBucketGrid {
                x: position.x,
                y: position.y,
            })?;
        self.buckets[index].push(key);
        Ok(())
    }

    /// Removes `key` from the bucket containing `position`, reporting whether it was present.
    pub fn remove(&mut self, key: K, position: Vec2) -> bool {
        let Some(index) = self.bucket_for(position) else {
            return false;
        };
        let bucket = &mut self.buckets[index];
        match bucket.iter().position(|candidate| *candidate == key) {
            Some(slot) => {
                let _ = bucket.swap_remove(slot);
                true
            }
            None => false,
        }
    }

    /// Entries in the 3×3 block of buckets centered on the bucket containing `position`.
    #[must_use]
    pub fn near_position(&self, position: Vec2) -> Vec<K> {
        let (column, row) = self.cell_of(position);
        self.collect_range(column - 1, column + 1, row - 1, row + 1)
    }

    /// Entries in every bucket touched by `rect`, widened by one bucket on each side.
    #[must_use]
    pub fn overlapping(&self, rect: &Rect) -> Vec<K> {
        let (first_column, first_row) = self.cell_of(rect.top_left());
        let (last_column, last_row) = self.cell_of(rect.bottom_right());
        self.collect_range(first_column - 1, last_column + 1, first_row - 1, last_row + 1)
    }

    fn collect_range(&self, first_column: i64, last_column: i64, first_row: i64, last_row: i64) -> Vec<K> {
        let first_column = first_column.max(0);
        let first_row = first_row.max(0);
        let last_column = last_column.min(self.columns as i64 - 1);
        let last_row = last_row.min(self.rows as i64 - 1);

        let mut found = Vec::new();
        for column in first_column..=last_column {
            for row in first_row..=last_row {
                let index = column as usize * self.rows + row as usize;
                found.extend_from_slice(&self.buckets[index]);
            }
        }
        found
    }

    fn cell_of(&self, position: Vec2) -> (i64, i64) {
        let column = ((position.x - self.area.x()) / BUCKET_SIZE).floor() as i64;
        let row = ((position.y - self.area.y()) / BUCKET_SIZE).floor() as i64;
        (column, row)
    }

    fn bucket_for(&self, position: Vec2) -> Option<usize> {
        let (column, row) = self.cell_of(position);
        if column < 0 || row < 0 || column >= self.columns as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(column as usize * self.rows + row as usize)
    }
}
