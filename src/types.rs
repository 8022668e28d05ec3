use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// An input rectangle. Orientation is chosen per placement, never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: usize,
    pub base: Rect,
}

impl Piece {
    pub fn new(id: usize, base: Rect) -> Self {
        Self { id, base }
    }

    pub fn area(&self) -> u64 {
        self.base.area()
    }

    /// Effective dimensions for the given orientation.
    pub fn oriented(&self, rotated: bool) -> Rect {
        if rotated { self.base.rotated() } else { self.base }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub piece_id: usize,
    /// `None` until the rows have been assigned to containers.
    pub container: Option<usize>,
    pub row: usize,
    pub rotated: bool,
    pub rect: Rect,
    pub area: u64,
}

impl Placement {
    pub fn new(piece: &Piece, row: usize, rotated: bool) -> Self {
        let rect = piece.oriented(rotated);
        Self {
            piece_id: piece.id,
            container: None,
            row,
            rotated,
            rect,
            area: rect.area(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackingResult {
    pub placements: Vec<Placement>,
    pub total_waste: i64,
    pub total_rows: usize,
    pub container: Rect,
    /// Set when the search was stopped before enumeration finished.
    pub cancelled: bool,
}

impl PackingResult {
    /// Containers opened by the assignment, including a trailing empty one
    /// when there are no rows at all.
    pub fn container_count(&self) -> usize {
        self.placements
            .iter()
            .filter_map(|p| p.container)
            .max()
            .map_or(1, |c| c + 1)
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.area).sum()
    }

    pub fn waste_percent(&self) -> f64 {
        let total = self.container.area() * self.container_count() as u64;
        if total == 0 {
            return 0.0;
        }
        self.total_waste as f64 / total as f64 * 100.0
    }

    /// Placements grouped by row, in ascending row order.
    pub fn rows(&self) -> Vec<Vec<&Placement>> {
        let mut rows: Vec<Vec<&Placement>> = vec![Vec::new(); self.total_rows];
        for p in &self.placements {
            if let Some(row) = rows.get_mut(p.row) {
                row.push(p);
            }
        }
        rows
    }

    pub fn row_height(&self, row: usize) -> u32 {
        self.placements
            .iter()
            .filter(|p| p.row == row)
            .map(|p| p.rect.h)
            .max()
            .unwrap_or(0)
    }
}
