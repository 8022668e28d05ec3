use std::cmp::Reverse;

use crate::types::{PackingResult, Placement};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Placement table ordered by container, row, then tallest piece first.
pub fn render_table(result: &PackingResult) -> String {
    let mut rows: Vec<&Placement> = result.placements.iter().collect();
    rows.sort_by_key(|p| (p.container, p.row, Reverse(p.rect.h)));

    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:>9} {:>5} {:>7} {:>7} {:>7}\n",
        "Piece", "Container", "Row", "Rotated", "Width", "Height"
    ));
    for p in rows {
        let container = p.container.map_or("-".to_string(), |c| c.to_string());
        out.push_str(&format!(
            "{:>6} {:>9} {:>5} {:>7} {:>7} {:>7}\n",
            p.piece_id, container, p.row, p.rotated, p.rect.w, p.rect.h
        ));
    }
    out.push_str(&format!("Total Waste: {} mm²\n", result.total_waste));
    out.push_str(&format!("Total Rows Used: {}\n", result.total_rows));
    out
}

/// ASCII diagram of one container: rows stacked from the top, pieces laid
/// left to right within each row.
pub fn render_container(result: &PackingResult, container: usize) -> String {
    let stock = result.container;
    let scale = f64::min(MAX_WIDTH / stock.w as f64, MAX_HEIGHT / stock.h as f64);
    let grid_w = (stock.w as f64 * scale).round() as usize;
    let grid_h = (stock.h as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    let mut y = 0u32;
    for (row_idx, row) in result.rows().iter().enumerate() {
        if row.first().and_then(|p| p.container) != Some(container) {
            continue;
        }

        let mut x = 0u32;
        for p in row {
            let sx = (x as f64 * scale).round() as usize;
            let sy = (y as f64 * scale).round() as usize;
            let sw = (p.rect.w as f64 * scale).round() as usize;
            let sh = (p.rect.h as f64 * scale).round() as usize;
            x += p.rect.w;

            if sw == 0 || sh == 0 {
                continue;
            }

            draw_rect(&mut grid, sx, sy, sw, sh);
            draw_label(&mut grid, &p.rect.to_string(), sx, sy, sw, sh);
        }
        y += result.row_height(row_idx);
    }

    let mut out = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn draw_label(grid: &mut [Vec<char>], label: &str, sx: usize, sy: usize, sw: usize, sh: usize) {
    if sw <= 2 {
        return;
    }
    let label_chars: Vec<char> = label.chars().collect();
    let cx = sx + sw / 2;
    let cy = sy + sh / 2;
    let start_x = cx.saturating_sub(label_chars.len() / 2);

    for (i, &ch) in label_chars.iter().enumerate() {
        let x = start_x + i;
        if x > sx && x < sx + sw && cy > sy && cy < sy + sh && cy < grid.len() && x < grid[cy].len()
        {
            grid[cy][x] = ch;
        }
    }
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i < cols {
            for j in [y, y + h] {
                if j < rows {
                    grid[j][i] = if grid[j][i] == '|' || grid[j][i] == '+' {
                        '+'
                    } else {
                        '-'
                    };
                }
            }
        }
    }

    for j in y..=y + h {
        if j < rows {
            for i in [x, x + w] {
                if i < cols {
                    grid[j][i] = if grid[j][i] == '-' || grid[j][i] == '+' {
                        '+'
                    } else {
                        '|'
                    };
                }
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
