use std::collections::HashMap;

use crate::types::Vec2;

/// Uniform grid over pill centres. With a cell at least as wide as the
/// largest pill diameter, every overlapping pair lands in the same or an
/// adjacent cell.
#[derive(Debug, Default)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, positions: &[Vec2], cell_size: f32) {
        self.cells.clear();
        self.cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        for (idx, pos) in positions.iter().enumerate() {
            let key = self.cell_key(*pos);
            self.cells.entry(key).or_default().push(idx);
        }
    }

    /// Indices in the 3x3 block around `pos`, sorted ascending.
    pub fn query_neighbors(&self, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_key(pos);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(indices);
                }
            }
        }
        out.sort_unstable();
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}
