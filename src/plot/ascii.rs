//! ASCII plotting of a forecast batch for terminal output.
//!
//! Fixed-size grid with deterministic output (helpful for golden tests).
//!
//! Plot elements:
//! - one glyph per family at each day: `L` (L1), `R` (L2), `E` (mixed)
//! - `.` segments joining consecutive days of the same series

use crate::domain::{ForecastBatch, ForecastSeries, ModelFamily};

/// Render the forecast series with day on the x-axis and net output on the y-axis.
pub fn render_forecast_plot(batch: &ForecastBatch, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (d_min, d_max) = day_range(batch);
    let (y_min, y_max) = y_range(&batch.series);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let points: Vec<(char, Vec<(usize, usize)>)> = batch
        .series
        .iter()
        .map(|s| {
            let pts = batch
                .days
                .iter()
                .zip(s.predictions.iter())
                .filter(|(_, y)| y.is_finite())
                .map(|(d, &y)| {
                    (
                        map_x(d.day as f64, d_min, d_max, width),
                        map_y(y, y_min, y_max, height),
                    )
                })
                .collect();
            (glyph(s.family), pts)
        })
        .collect();

    // Segments first so glyphs overlay them.
    for (_, pts) in &points {
        for pair in pts.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            draw_line(&mut grid, x0, y0, x1, y1, '.');
        }
    }
    for (ch, pts) in &points {
        for &(x, y) in pts {
            grid[y][x] = *ch;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: day=[{d_min:.0}, {d_max:.0}] | net=[{y_min:.2}, {y_max:.2}]MW\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = batch
        .series
        .iter()
        .map(|s| format!("{}={}", glyph(s.family), s.family.display_name()))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" ")));

    out
}

fn glyph(family: ModelFamily) -> char {
    match family {
        ModelFamily::L1 => 'L',
        ModelFamily::L2 => 'R',
        ModelFamily::Mixed => 'E',
    }
}

fn day_range(batch: &ForecastBatch) -> (f64, f64) {
    let min_d = batch.days.iter().map(|d| d.day).min();
    let max_d = batch.days.iter().map(|d| d.day).max();
    match (min_d, max_d) {
        (Some(lo), Some(hi)) if hi > lo => (lo as f64, hi as f64),
        (Some(d), _) => (d as f64 - 1.0, d as f64 + 1.0),
        _ => (0.0, 1.0),
    }
}

fn y_range(series: &[ForecastSeries]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for y in series.iter().flat_map(|s| s.predictions.iter()).filter(|y| y.is_finite()) {
        min_y = min_y.min(*y);
        max_y = max_y.max(*y);
    }

    if min_y.is_finite() && max_y.is_finite() {
        if max_y > min_y {
            (min_y, max_y)
        } else {
            (min_y - 1.0, max_y + 1.0)
        }
    } else {
        (0.0, 1.0)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
