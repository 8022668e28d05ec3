use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assign::assign;
use crate::error::{Error, Result};
use crate::trial;
use crate::types::{PackingResult, Piece, Rect};

/// Cooperative cancellation handle, checked between trials.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reported each time the search finds a strictly better layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub trial: u64,
    pub total_waste: i64,
    pub total_rows: usize,
}

pub struct Solver {
    container: Rect,
    pieces: Vec<Piece>,
}

impl Solver {
    /// Pieces get ids `0..n` in input order.
    pub fn new(container: Rect, dims: &[Rect]) -> Result<Self> {
        if container.w == 0 || container.h == 0 {
            return Err(Error::InvalidContainer(container));
        }
        if let Some((index, &rect)) = dims.iter().enumerate().find(|(_, r)| r.w == 0 || r.h == 0)
        {
            return Err(Error::InvalidPiece { index, rect });
        }

        let pieces = dims
            .iter()
            .enumerate()
            .map(|(id, &rect)| Piece::new(id, rect))
            .collect();
        Ok(Self { container, pieces })
    }

    pub fn from_lists(container: Rect, widths: &[u32], heights: &[u32]) -> Result<Self> {
        if widths.len() != heights.len() {
            return Err(Error::LengthMismatch {
                widths: widths.len(),
                heights: heights.len(),
            });
        }
        let dims: Vec<Rect> = widths
            .iter()
            .zip(heights)
            .map(|(&w, &h)| Rect::new(w, h))
            .collect();
        Self::new(container, &dims)
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn solve(&self, cancel: &CancelToken) -> Result<PackingResult> {
        self.solve_with_progress(cancel, |_| {})
    }

    /// Tries rotation vectors in lexicographic order and keeps the layout with
    /// the least waste. Ties keep the earlier trial.
    ///
    /// The search stops at trial `2^R`, where `R` is the most rows any
    /// feasible trial has used so far. This is a heuristic cut-off, not an
    /// optimality bound.
    pub fn solve_with_progress(
        &self,
        cancel: &CancelToken,
        mut on_improve: impl FnMut(&Progress),
    ) -> Result<PackingResult> {
        let n = self.pieces.len();
        let trial_count = pow2(n);

        let mut best: Option<PackingResult> = None;
        let mut max_rows = 0usize;
        let mut cancelled = false;
        let mut i: u64 = 0;

        loop {
            if trial_count.is_some_and(|count| i >= count) {
                break;
            }
            if max_rows > 0 && pow2(max_rows).is_some_and(|bound| i >= bound) {
                tracing::debug!(trial = i, max_rows, "row-count bound reached");
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::warn!(trial = i, "search cancelled");
                break;
            }

            let rotations = rotation_vector(i, n);
            if let Some(trial) = trial::evaluate(&self.pieces, &rotations, self.container.w) {
                max_rows = max_rows.max(trial.rows);
                let (waste, placements) = assign(trial.placements, self.container);

                if best.as_ref().is_none_or(|b| waste < b.total_waste) {
                    let progress = Progress {
                        trial: i,
                        total_waste: waste,
                        total_rows: trial.rows,
                    };
                    tracing::debug!(
                        trial = i,
                        waste,
                        rows = trial.rows,
                        "new best layout"
                    );
                    on_improve(&progress);
                    best = Some(PackingResult {
                        placements,
                        total_waste: waste,
                        total_rows: trial.rows,
                        container: self.container,
                        cancelled: false,
                    });
                }
            }

            match i.checked_add(1) {
                Some(next) => i = next,
                None => break,
            }
        }

        let mut best = best.ok_or(Error::NoFeasibleSolution)?;
        best.cancelled = cancelled;
        tracing::info!(
            trials = i,
            waste = best.total_waste,
            rows = best.total_rows,
            cancelled,
            "search finished"
        );
        Ok(best)
    }
}

/// `2^k`, or `None` once that no longer fits in a `u64`.
fn pow2(k: usize) -> Option<u64> {
    u32::try_from(k).ok().and_then(|k| 1u64.checked_shl(k))
}

/// Rotation vector number `i` of length `n`. The first position is the most
/// significant bit, so `i = 0, 1, 2, ...` walks `{0,1}^n` lexicographically.
fn rotation_vector(i: u64, n: usize) -> Vec<bool> {
    (0..n)
        .map(|k| {
            let shift = n - 1 - k;
            shift < 64 && (i >> shift) & 1 == 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(container: (u32, u32), dims: &[(u32, u32)]) -> Solver {
        let dims: Vec<Rect> = dims.iter().map(|&(w, h)| Rect::new(w, h)).collect();
        Solver::new(Rect::new(container.0, container.1), &dims).unwrap()
    }

    /// Validates a complete result:
    /// 1. Every piece is placed exactly once with a container assigned
    /// 2. No row is wider than the container
    /// 3. Waste plus placed area equals the area of the containers used
    fn assert_result_valid(result: &PackingResult, expected_pieces: usize) {
        let mut ids: Vec<usize> = result.placements.iter().map(|p| p.piece_id).collect();
        ids.sort();
        assert_eq!(ids, (0..expected_pieces).collect::<Vec<_>>());
        assert!(result.placements.iter().all(|p| p.container.is_some()));

        for (ri, row) in result.rows().iter().enumerate() {
            let width: u32 = row.iter().map(|p| p.rect.w).sum();
            assert!(
                width <= result.container.w,
                "row {ri} is {width} wide, container is {}",
                result.container.w
            );
        }

        assert_eq!(
            result.total_waste + result.used_area() as i64,
            result.container.area() as i64 * result.container_count() as i64,
            "accounting identity violated"
        );
    }

    #[test]
    fn test_rotation_vector_order() {
        assert_eq!(rotation_vector(0, 3), vec![false, false, false]);
        assert_eq!(rotation_vector(1, 3), vec![false, false, true]);
        assert_eq!(rotation_vector(4, 3), vec![true, false, false]);
        assert_eq!(rotation_vector(7, 3), vec![true, true, true]);
        assert!(rotation_vector(u64::MAX, 70)[..6].iter().all(|b| !b));
    }

    #[test]
    fn test_pow2() {
        assert_eq!(pow2(0), Some(1));
        assert_eq!(pow2(10), Some(1024));
        assert_eq!(pow2(63), Some(1 << 63));
        assert_eq!(pow2(64), None);
    }

    #[test]
    fn test_two_pieces_share_a_row() {
        let s = solver((10, 10), &[(6, 4), (4, 4)]);
        let result = s.solve(&CancelToken::new()).unwrap();
        assert_result_valid(&result, 2);
        assert_eq!(result.total_rows, 1);
        assert_eq!(result.total_waste, 60);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_equal_area_pieces() {
        // 6x4 and 4x6: every trial wastes 52, so the first trial (two rows) is kept
        let s = solver((10, 10), &[(6, 4), (4, 6)]);
        let result = s.solve(&CancelToken::new()).unwrap();
        assert_result_valid(&result, 2);
        assert_eq!(result.total_waste, 52);
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.container_count(), 1);
    }

    #[test]
    fn test_too_wide_both_ways() {
        let s = solver((10, 10), &[(20, 15)]);
        assert_eq!(s.solve(&CancelToken::new()), Err(Error::NoFeasibleSolution));
    }

    #[test]
    fn test_tall_piece_overflows_container() {
        // 20x5 is too wide, but turned to 5x20 it starts a row taller than the container
        let s = solver((10, 10), &[(20, 5)]);
        let result = s.solve(&CancelToken::new()).unwrap();
        assert_result_valid(&result, 1);
        assert!(result.placements[0].rotated);
        assert_eq!(result.placements[0].container, Some(1));
        assert_eq!(result.container_count(), 2);
        assert_eq!(result.total_waste, 100);
    }

    #[test]
    fn test_no_pieces() {
        let s = solver((10, 7), &[]);
        let result = s.solve(&CancelToken::new()).unwrap();
        assert!(result.placements.is_empty());
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.total_waste, 70);
        assert_eq!(result.container_count(), 1);
    }

    #[test]
    fn test_cancel_after_first_improvement() {
        let s = solver((10, 10), &[(5, 3), (4, 4), (2, 6)]);
        let cancel = CancelToken::new();
        let mut improvements = Vec::new();
        let result = s
            .solve_with_progress(&cancel, |p| {
                improvements.push(*p);
                cancel.cancel();
            })
            .unwrap();

        assert_eq!(improvements.len(), 1);
        assert_eq!(improvements[0].trial, 0);
        assert!(result.cancelled);
        assert_result_valid(&result, 3);

        let first = trial::evaluate(s.pieces(), &[false, false, false], 10).unwrap();
        let (waste, placements) = assign(first.placements, Rect::new(10, 10));
        assert_eq!(result.total_waste, waste);
        assert_eq!(result.placements, placements);
    }

    #[test]
    fn test_cancel_before_start() {
        let s = solver((10, 10), &[(5, 3)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = s.solve(&cancel).unwrap_err();
        assert_eq!(err, Error::NoFeasibleSolution);
        // Nothing was tried, so the message must not blame the pieces
        assert_eq!(err.to_string(), "no feasible layout found");
    }

    #[test]
    fn test_row_bound_stops_search() {
        // Trial 0 packs both pieces in one 12-high row, which spills into a
        // second container. With R = 1 only trials 0 and 1 run, so trial 2
        // (starter turned to 12x2, one container) is never reached.
        let s = solver((12, 10), &[(2, 12), (1, 1)]);
        let mut seen: Vec<u64> = Vec::new();
        let result = s
            .solve_with_progress(&CancelToken::new(), |p| seen.push(p.trial))
            .unwrap();

        assert_eq!(seen, vec![0]);
        assert_eq!(result.total_rows, 1);
        assert_eq!(result.total_waste, 215);
        assert_eq!(result.container_count(), 2);
        assert!(!result.cancelled);
        assert_result_valid(&result, 2);

        let skipped = trial::evaluate(s.pieces(), &[true, false], 12).unwrap();
        let (waste, _) = assign(skipped.placements, Rect::new(12, 10));
        assert_eq!(waste, 95);
    }

    #[test]
    fn test_row_bound_uses_most_rows_seen() {
        // Trial 0 is the first best with 2 rows. Trial 2 ties on waste but
        // uses 3 rows, which widens the window to 8 trials, so the better
        // single-row layout at trial 4 is still found.
        let s = solver((10, 12), &[(10, 2), (2, 7), (1, 12)]);
        let mut seen: Vec<Progress> = Vec::new();
        let result = s
            .solve_with_progress(&CancelToken::new(), |p| seen.push(*p))
            .unwrap();

        let trials: Vec<u64> = seen.iter().map(|p| p.trial).collect();
        assert_eq!(trials, vec![0, 4]);
        assert_eq!(seen[0].total_rows, 2);
        assert_eq!(seen[0].total_waste, 194);
        assert_eq!(result.total_rows, 1);
        assert_eq!(result.total_waste, 74);
        assert_eq!(result.container_count(), 1);
        assert_result_valid(&result, 3);

        let widening = trial::evaluate(s.pieces(), &[false, true, false], 10).unwrap();
        assert_eq!(widening.rows, 3);
    }

    #[test]
    fn test_progress_waste_strictly_decreases() {
        let s = solver(
            (100, 80),
            &[(60, 30), (45, 20), (30, 30), (25, 40), (20, 10), (15, 35), (50, 15)],
        );
        let mut seen: Vec<Progress> = Vec::new();
        let result = s
            .solve_with_progress(&CancelToken::new(), |p| seen.push(*p))
            .unwrap();
        assert_result_valid(&result, 7);
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[1].total_waste < w[0].total_waste));
        assert!(seen.windows(2).all(|w| w[1].trial > w[0].trial));
        assert_eq!(seen.last().map(|p| p.total_waste), Some(result.total_waste));
    }

    #[test]
    fn test_deterministic() {
        let dims = [(8, 3), (3, 5), (4, 4), (6, 2), (2, 2), (7, 1), (5, 5), (1, 6)];
        let a = solver((12, 9), &dims).solve(&CancelToken::new()).unwrap();
        let b = solver((12, 9), &dims).solve(&CancelToken::new()).unwrap();
        assert_result_valid(&a, dims.len());
        assert_eq!(a.total_waste, b.total_waste);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_mixed_sizes_valid() {
        let dims = [
            (400, 300),
            (300, 200),
            (250, 250),
            (600, 150),
            (120, 480),
            (90, 90),
            (200, 350),
            (310, 140),
            (500, 100),
            (75, 220),
        ];
        let result = solver((1000, 700), &dims).solve(&CancelToken::new()).unwrap();
        assert_result_valid(&result, dims.len());
        assert!(result.total_rows >= 1 && result.total_rows <= dims.len());
    }

    #[test]
    fn test_rejects_zero_container() {
        let err = Solver::new(Rect::new(0, 10), &[]).err();
        assert_eq!(err, Some(Error::InvalidContainer(Rect::new(0, 10))));
    }

    #[test]
    fn test_rejects_zero_piece() {
        let err = Solver::new(Rect::new(10, 10), &[Rect::new(3, 3), Rect::new(4, 0)]).err();
        assert_eq!(
            err,
            Some(Error::InvalidPiece {
                index: 1,
                rect: Rect::new(4, 0)
            })
        );
    }

    #[test]
    fn test_rejects_mismatched_lists() {
        let err = Solver::from_lists(Rect::new(10, 10), &[1, 2, 3], &[1, 2]).err();
        assert_eq!(
            err,
            Some(Error::LengthMismatch {
                widths: 3,
                heights: 2
            })
        );
    }

    #[test]
    fn test_from_lists_assigns_ids_in_order() {
        let s = Solver::from_lists(Rect::new(10, 10), &[3, 5], &[4, 6]).unwrap();
        assert_eq!(s.pieces()[1], Piece::new(1, Rect::new(5, 6)));
    }
}
