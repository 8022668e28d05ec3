use std::cmp::Reverse;

use crate::row::fill_row;
use crate::types::{Piece, Placement};

/// Rows built for one rotation vector, before container assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub placements: Vec<Placement>,
    pub rows: usize,
}

/// Largest remaining piece by area; ties go to the lowest id.
fn starter_index(pool: &[Piece]) -> Option<usize> {
    pool.iter()
        .enumerate()
        .max_by_key(|(_, p)| (p.area(), Reverse(p.id)))
        .map(|(idx, _)| idx)
}

/// Builds rows for one rotation vector.
///
/// Each bit decides the orientation of the piece that starts the next row.
/// Returns `None` if a row starter is wider than the container.
pub fn evaluate(pieces: &[Piece], rotations: &[bool], container_width: u32) -> Option<Trial> {
    let mut pool = pieces.to_vec();
    let mut placements = Vec::with_capacity(pieces.len());
    let mut rows = 0;

    for &rotated in rotations {
        let Some(idx) = starter_index(&pool) else {
            break;
        };
        let starter = pool.remove(idx);
        let rect = starter.oriented(rotated);
        if rect.w > container_width {
            tracing::trace!(piece = starter.id, rotated, "row starter wider than container");
            return None;
        }

        placements.push(Placement::new(&starter, rows, rotated));
        let width_budget = container_width - rect.w;
        let area_budget = width_budget as i64 * rect.h as i64;
        let (row, rest) = fill_row(rows, rect.h, width_budget, area_budget, pool);
        placements.extend(row);
        pool = rest;
        rows += 1;
    }

    Some(Trial { placements, rows })
}
