//! The four pipeline plots

use super::canvas::{blues, coolwarm, is_dark, text_height, text_width, Canvas, BLACK, GRID, WHITE};
use super::stats::{gaussian_kde, histogram};
use crate::error::{FraudError, Result};
use crate::evaluation::ConfusionMatrix;
use image::Rgb;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::Path;

const FRAUD_RED: Rgb<u8> = Rgb([214, 39, 40]);
const LEGIT_BLUE: Rgb<u8> = Rgb([31, 119, 180]);
const BAR: Rgb<u8> = Rgb([76, 114, 176]);

/// Pixel rectangle holding the data region of a chart
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: i64,
    top: i64,
    width: u32,
    height: u32,
}

impl Frame {
    fn right(&self) -> i64 {
        self.left + self.width as i64
    }

    fn bottom(&self) -> i64 {
        self.top + self.height as i64
    }

    /// Map a value in [lo, hi] onto the frame's x range
    fn x_at(&self, v: f64, lo: f64, hi: f64) -> i64 {
        let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };
        self.left + (t * self.width as f64).round() as i64
    }

    /// Map a value in [0, max] onto the frame's y range, 0 at the bottom
    fn y_at(&self, v: f64, max: f64) -> i64 {
        let t = if max > 0.0 { v / max } else { 0.0 };
        self.bottom() - (t * self.height as f64).round() as i64
    }
}

fn title(canvas: &mut Canvas, text: &str) {
    let cx = canvas.width() as i64 / 2;
    canvas.text_centered(cx, 18, text, 3, BLACK);
}

fn format_tick(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else if v.abs() >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else if v.abs() >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Left axis with `n` evenly spaced ticks from 0 to `max`
fn y_axis(canvas: &mut Canvas, frame: Frame, max: f64, n: usize) {
    canvas.line(frame.left, frame.top, frame.left, frame.bottom(), BLACK, 1);
    for i in 0..=n {
        let v = max * i as f64 / n as f64;
        let y = frame.y_at(v, max);
        canvas.line(frame.left + 1, y, frame.right(), y, GRID, 1);
        canvas.line(frame.left - 5, y, frame.left, y, BLACK, 1);
        canvas.text_right(frame.left - 8, y - 3, &format_tick(v), 1, BLACK);
    }
}

fn nice_max(v: f64) -> f64 {
    if v <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(v.log10().floor());
    for step in [1.0, 2.0, 2.5, 5.0, 10.0] {
        if step * magnitude >= v {
            return step * magnitude;
        }
    }
    10.0 * magnitude
}

/// Vertical gradient bar from `lo` (bottom) to `hi` (top)
fn colorbar(
    canvas: &mut Canvas,
    x: i64,
    top: i64,
    height: u32,
    lo: f64,
    hi: f64,
    cmap: fn(f64) -> Rgb<u8>,
) {
    for dy in 0..height {
        let t = 1.0 - dy as f64 / (height.max(2) - 1) as f64;
        canvas.fill_rect(x, top + dy as i64, 18, 1, cmap(t));
    }
    canvas.stroke_rect(x, top, 18, height, BLACK);
    canvas.text(x + 24, top - 3, &format_tick(hi), 1, BLACK);
    canvas.text(x + 24, top + height as i64 - 4, &format_tick(lo), 1, BLACK);
}

/// Annotated blue heatmap; rows are actual labels, columns predicted labels
pub fn plot_confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
    let k = cm.labels.len();
    if k == 0 {
        return Err(FraudError::Plot("confusion matrix has no labels".to_string()));
    }

    let mut canvas = Canvas::new(640, 560);
    title(&mut canvas, "Confusion Matrix");

    let cell = (400 / k as u32).max(1);
    let frame = Frame {
        left: 120,
        top: 70,
        width: cell * k as u32,
        height: cell * k as u32,
    };
    let max = cm.matrix.iter().copied().max().unwrap_or(0).max(1) as f64;

    for r in 0..k {
        for c in 0..k {
            let count = cm.matrix[[r, c]];
            let color = blues(count as f64 / max);
            let x = frame.left + (c as u32 * cell) as i64;
            let y = frame.top + (r as u32 * cell) as i64;
            canvas.fill_rect(x, y, cell, cell, color);

            let ink = if is_dark(color) { WHITE } else { BLACK };
            let label = count.to_string();
            let cy = y + cell as i64 / 2 - text_height(3) as i64 / 2;
            canvas.text_centered(x + cell as i64 / 2, cy, &label, 3, ink);
        }
    }
    canvas.stroke_rect(frame.left, frame.top, frame.width, frame.height, BLACK);

    for (i, label) in cm.labels.iter().enumerate() {
        let center = (i as u32 * cell + cell / 2) as i64;
        canvas.text_centered(frame.left + center, frame.bottom() + 10, &label.to_string(), 2, BLACK);
        canvas.text_right(frame.left - 10, frame.top + center - 7, &label.to_string(), 2, BLACK);
    }
    canvas.text_centered(
        frame.left + frame.width as i64 / 2,
        frame.bottom() + 40,
        "Predicted",
        2,
        BLACK,
    );
    canvas.text_vertical(40, frame.top + frame.height as i64 / 2 - 48, "Actual", 2, BLACK);

    colorbar(&mut canvas, frame.right() + 30, frame.top, frame.height, 0.0, max, blues);
    canvas.save(path)
}

/// Bar per class with its count printed above
pub fn plot_class_distribution(counts: &BTreeMap<i64, usize>, path: &Path) -> Result<()> {
    let mut canvas = Canvas::new(640, 480);
    title(&mut canvas, "Class Distribution");

    let frame = Frame {
        left: 90,
        top: 70,
        width: 500,
        height: 330,
    };
    let max = nice_max(counts.values().copied().max().unwrap_or(0) as f64);
    y_axis(&mut canvas, frame, max, 5);
    canvas.line(frame.left, frame.bottom(), frame.right(), frame.bottom(), BLACK, 1);

    let n = counts.len().max(1) as u32;
    let slot = frame.width / n;
    let bar_w = slot * 3 / 5;
    for (i, (label, &count)) in counts.iter().enumerate() {
        let x = frame.left + (i as u32 * slot + (slot - bar_w) / 2) as i64;
        let y = frame.y_at(count as f64, max);
        canvas.fill_rect(x, y, bar_w, (frame.bottom() - y).max(0) as u32, BAR);

        let cx = x + bar_w as i64 / 2;
        canvas.text_centered(cx, y - 14, &count.to_string(), 1, BLACK);
        canvas.text_centered(cx, frame.bottom() + 10, &label.to_string(), 2, BLACK);
    }
    canvas.text_centered(
        frame.left + frame.width as i64 / 2,
        frame.bottom() + 40,
        "Class",
        2,
        BLACK,
    );
    canvas.text_vertical(20, frame.top + 80, "Count", 2, BLACK);
    canvas.save(path)
}

/// Coolwarm heatmap of a correlation matrix over [-1, 1]; NaN cells are gray
pub fn plot_correlation_heatmap(names: &[String], corr: &Array2<f64>, path: &Path) -> Result<()> {
    let k = names.len();
    if corr.dim() != (k, k) {
        return Err(FraudError::Shape {
            expected: format!("{}x{} correlation matrix", k, k),
            actual: format!("{}x{}", corr.nrows(), corr.ncols()),
        });
    }
    if k == 0 {
        return Err(FraudError::Plot("no columns to correlate".to_string()));
    }

    let label_w = names.iter().map(|n| text_width(n, 1)).max().unwrap_or(0);
    let label_h = names.iter().map(|n| n.chars().count() as u32).max().unwrap_or(0) * 8;

    let mut canvas = Canvas::new(1200, 800 + label_h);
    title(&mut canvas, "Feature Correlation Heatmap");

    let area = 640u32;
    let cell = (area / k as u32).max(1);
    let frame = Frame {
        left: 40 + label_w as i64 + 8,
        top: 70,
        width: cell * k as u32,
        height: cell * k as u32,
    };

    for r in 0..k {
        for c in 0..k {
            let v = corr[[r, c]];
            let color = if v.is_nan() {
                Rgb([160, 160, 160])
            } else {
                coolwarm((v + 1.0) / 2.0)
            };
            let x = frame.left + (c as u32 * cell) as i64;
            let y = frame.top + (r as u32 * cell) as i64;
            canvas.fill_rect(x, y, cell, cell, color);
        }
    }

    for (i, name) in names.iter().enumerate() {
        let center = (i as u32 * cell + cell / 2) as i64;
        canvas.text_right(frame.left - 6, frame.top + center - 3, name, 1, BLACK);
        canvas.text_vertical(frame.left + center - 2, frame.bottom() + 6, name, 1, BLACK);
    }

    colorbar(&mut canvas, frame.right() + 40, frame.top, frame.height, -1.0, 1.0, coolwarm);
    canvas.save(path)
}

/// Overlaid density histograms of `Amount` with KDE curves and a legend
pub fn plot_amount_distribution(fraud: &[f64], legit: &[f64], path: &Path) -> Result<()> {
    const BINS: usize = 50;

    let all = fraud.iter().chain(legit.iter());
    let lo = all.clone().copied().fold(f64::INFINITY, f64::min);
    let hi = all.copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return Err(FraudError::Plot("no amounts to plot".to_string()));
    }
    let hi = if hi > lo { hi } else { lo + 1.0 };
    let bin_w = (hi - lo) / BINS as f64;

    // Each group is normalized to unit area so the rare class stays visible
    let density = |values: &[f64]| -> Vec<f64> {
        let n = values.len().max(1) as f64;
        histogram(values, BINS, lo, hi)
            .into_iter()
            .map(|c| c as f64 / (n * bin_w))
            .collect()
    };
    let fraud_hist = density(fraud);
    let legit_hist = density(legit);

    let grid: Vec<f64> = (0..=200).map(|i| lo + (hi - lo) * i as f64 / 200.0).collect();
    let fraud_kde = gaussian_kde(fraud, &grid);
    let legit_kde = gaussian_kde(legit, &grid);

    let peak = fraud_hist
        .iter()
        .chain(legit_hist.iter())
        .chain(fraud_kde.iter().flatten())
        .chain(legit_kde.iter().flatten())
        .copied()
        .fold(0.0, f64::max);
    let max = nice_max(peak);

    let mut canvas = Canvas::new(800, 400);
    title(&mut canvas, "Fraud vs. Non-Fraud Transaction Amounts");

    let frame = Frame {
        left: 80,
        top: 60,
        width: 680,
        height: 260,
    };
    y_axis(&mut canvas, frame, max, 4);
    canvas.line(frame.left, frame.bottom(), frame.right(), frame.bottom(), BLACK, 1);

    for (hist, color) in [(&legit_hist, LEGIT_BLUE), (&fraud_hist, FRAUD_RED)] {
        for (i, &d) in hist.iter().enumerate() {
            let x0 = frame.x_at(lo + i as f64 * bin_w, lo, hi);
            let x1 = frame.x_at(lo + (i + 1) as f64 * bin_w, lo, hi);
            let y = frame.y_at(d, max);
            let h = (frame.bottom() - y).max(0) as u32;
            canvas.blend_rect(x0, y, (x1 - x0).max(1) as u32, h, color, 0.4);
        }
    }

    for (kde, color) in [(&legit_kde, LEGIT_BLUE), (&fraud_kde, FRAUD_RED)] {
        if let Some(curve) = kde {
            let points: Vec<(i64, i64)> = grid
                .iter()
                .zip(curve.iter())
                .map(|(&g, &d)| (frame.x_at(g, lo, hi), frame.y_at(d.min(max), max)))
                .collect();
            canvas.polyline(&points, color, 2);
        }
    }

    for (i, v) in [lo, (lo + hi) / 2.0, hi].iter().enumerate() {
        let x = frame.x_at(*v, lo, hi);
        canvas.line(x, frame.bottom(), x, frame.bottom() + 5, BLACK, 1);
        let label = format_tick(*v);
        match i {
            0 => canvas.text(x, frame.bottom() + 10, &label, 1, BLACK),
            2 => canvas.text_right(x, frame.bottom() + 10, &label, 1, BLACK),
            _ => canvas.text_centered(x, frame.bottom() + 10, &label, 1, BLACK),
        }
    }
    canvas.text_centered(
        frame.left + frame.width as i64 / 2,
        frame.bottom() + 30,
        "Amount",
        2,
        BLACK,
    );
    canvas.text_vertical(20, frame.top + 40, "Density", 2, BLACK);

    let legend_x = frame.right() - 150;
    let mut legend_y = frame.top + 10;
    canvas.fill_rect(legend_x - 8, legend_y - 8, 150, 52, WHITE);
    canvas.stroke_rect(legend_x - 8, legend_y - 8, 150, 52, GRID);
    for (label, color) in [("Fraud", FRAUD_RED), ("Non-Fraud", LEGIT_BLUE)] {
        canvas.blend_rect(legend_x, legend_y, 20, 14, color, 0.6);
        canvas.text(legend_x + 28, legend_y, label, 2, BLACK);
        legend_y += 22;
    }

    canvas.save(path)
}
