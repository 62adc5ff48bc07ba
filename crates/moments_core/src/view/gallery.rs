//! Fixed-column gallery grouping.

use crate::model::moment::Moment;

/// Column count used by the gallery screen.
pub const DEFAULT_COLUMNS: usize = 4;

/// Moments grouped into rows of a fixed-width grid, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryGrid {
    columns: usize,
    rows: Vec<Vec<Moment>>,
}

impl GalleryGrid {
    /// Groups `moments` into rows of `columns` cells; `0` means the default.
    ///
    /// Only the last row may be shorter than `columns`.
    pub fn build(moments: Vec<Moment>, columns: usize) -> Self {
        let columns = if columns == 0 { DEFAULT_COLUMNS } else { columns };
        let rows = moments
            .chunks(columns)
            .map(|row| row.to_vec())
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Vec<Moment>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Moment> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::{GalleryGrid, DEFAULT_COLUMNS};
    use crate::model::moment::Moment;
    use crate::model::moment_id::MomentId;

    fn moments(count: i64) -> Vec<Moment> {
        (0..count)
            .rev()
            .map(|offset| {
                let id = MomentId::from_parts(1_700_000_000_000 + offset, 0).unwrap();
                Moment::new(id, "", None)
            })
            .collect()
    }

    #[test]
    fn build_fills_rows_and_keeps_order() {
        let input = moments(6);
        let grid = GalleryGrid::build(input.clone(), 4);
        assert_eq!(grid.rows().len(), 2);
        assert_eq!(grid.rows()[0].len(), 4);
        assert_eq!(grid.rows()[1].len(), 2);
        assert_eq!(grid.len(), 6);
        let flattened = grid.iter().cloned().collect::<Vec<_>>();
        assert_eq!(flattened, input);
    }

    #[test]
    fn zero_columns_falls_back_to_default() {
        let grid = GalleryGrid::build(moments(1), 0);
        assert_eq!(grid.columns(), DEFAULT_COLUMNS);
    }

    #[test]
    fn empty_listing_has_no_rows() {
        let grid = GalleryGrid::build(Vec::new(), 3);
        assert!(grid.is_empty());
        assert_eq!(grid.len(), 0);
    }
}
