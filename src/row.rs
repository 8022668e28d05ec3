use std::cmp::Reverse;

use crate::types::{Piece, Placement, Rect};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    pool_idx: usize,
    piece_id: usize,
    rotated: bool,
    rect: Rect,
}

#[derive(Debug)]
struct RowState {
    row: usize,
    target_height: u32,
    width_budget: u32,
    area_budget: i64,
    placements: Vec<Placement>,
    pool: Vec<Piece>,
}

impl RowState {
    /// Both orientations of every pooled piece that passes the area filter,
    /// ordered by closeness to the target height, then widest first.
    fn candidates(&self) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .pool
            .iter()
            .enumerate()
            .filter(|(_, p)| i64::try_from(p.area()).is_ok_and(|a| a <= self.area_budget))
            .flat_map(|(pool_idx, p)| {
                [false, true].map(|rotated| Candidate {
                    pool_idx,
                    piece_id: p.id,
                    rotated,
                    rect: p.oriented(rotated),
                })
            })
            .collect();

        let target = self.target_height;
        candidates.sort_by_key(|c| {
            (
                c.rect.h.abs_diff(target),
                Reverse(c.rect.w),
                c.piece_id,
                c.rotated,
            )
        });
        candidates
    }

    fn next_fit(&self) -> Option<Candidate> {
        self.candidates()
            .into_iter()
            .find(|c| c.rect.w <= self.width_budget)
    }

    fn accept(&mut self, c: Candidate) {
        let piece = self.pool.remove(c.pool_idx);
        self.placements.push(Placement::new(&piece, self.row, c.rotated));
        self.width_budget -= c.rect.w;
        self.target_height = self.target_height.max(c.rect.h);
        // Charged against the updated row height, not the piece's own.
        self.area_budget -= c.rect.w as i64 * self.target_height as i64;
    }
}

/// Greedily extends row `row` with pieces from `pool`.
///
/// Returns the placements added to the row (the starter is not included)
/// and the pieces that are still unplaced, in their original order.
pub fn fill_row(
    row: usize,
    target_height: u32,
    width_budget: u32,
    area_budget: i64,
    pool: Vec<Piece>,
) -> (Vec<Placement>, Vec<Piece>) {
    let mut state = RowState {
        row,
        target_height,
        width_budget,
        area_budget,
        placements: Vec::new(),
        pool,
    };

    while let Some(candidate) = state.next_fit() {
        state.accept(candidate);
    }

    (state.placements, state.pool)
}
