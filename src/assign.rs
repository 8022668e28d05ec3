use crate::types::{Placement, Rect};

/// Stacks rows into containers in row order and tags each placement with
/// its container index.
///
/// Waste is the uncovered area of every row across the full container width,
/// plus the unused height of each closed container and of the last one. A row
/// that overflows the current container always moves to a fresh one, even if
/// it is taller than the container itself; that container's leftover then goes
/// negative.
pub fn assign(mut placements: Vec<Placement>, container: Rect) -> (i64, Vec<Placement>) {
    let width = container.w as i64;
    let height = container.h as i64;

    placements.sort_by_key(|p| p.row);

    let mut total_waste = 0i64;
    let mut current_height = 0i64;
    let mut index = 0usize;

    for row in placements.chunk_by_mut(|a, b| a.row == b.row) {
        let row_height = row.iter().map(|p| p.rect.h).max().unwrap_or(0) as i64;
        let row_area: i64 = row.iter().map(|p| p.area as i64).sum();
        total_waste += width * row_height - row_area;

        if current_height + row_height > height {
            total_waste += (height - current_height) * width;
            index += 1;
            current_height = 0;
        }

        for p in row.iter_mut() {
            p.container = Some(index);
        }
        current_height += row_height;
    }

    total_waste += (height - current_height) * width;
    (total_waste, placements)
}
