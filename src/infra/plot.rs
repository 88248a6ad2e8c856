// ============================================================
// Layer 6 — ROC Plot
// ============================================================
// Renders the evaluator's curves as a standalone SVG:
//
//   - one polyline per class with a defined AUC
//   - the dashed chance diagonal
//   - a legend entry "<label> (AUC = x.xx)" per curve
//   - the title "Multi-class ROC Curve (Macro AUC = x.xx)"
//
// Axes run from 0 to 1 on both sides; SVG's y axis points down,
// so true-positive rates are flipped when mapped to pixels.

use std::{fmt::Write as _, fs, path::Path};

use crate::domain::error::PipelineResult;
use crate::ml::roc::RocCurve;

const WIDTH:  f64 = 640.0;
const HEIGHT: f64 = 520.0;
const LEFT:   f64 = 70.0;
const TOP:    f64 = 50.0;
const SIDE:   f64 = 400.0;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728",
    "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

/// A labelled curve and its area.
pub struct PlotSeries<'a> {
    pub label: &'a str,
    pub auc:   f64,
    pub curve: &'a RocCurve,
}

fn px(fpr: f64) -> f64 {
    LEFT + fpr * SIDE
}

fn py(tpr: f64) -> f64 {
    TOP + (1.0 - tpr) * SIDE
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn render_roc_svg(series: &[PlotSeries<'_>], macro_auc: f64) -> String {
    let mut svg = String::new();

    // write! into a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="28" text-anchor="middle" font-size="15">Multi-class ROC Curve (Macro AUC = {:.2})</text>"#,
        LEFT + SIDE / 2.0,
        macro_auc
    );

    // frame, ticks, axis labels
    let _ = writeln!(
        svg,
        r#"<rect x="{LEFT}" y="{TOP}" width="{SIDE}" height="{SIDE}" fill="none" stroke="black"/>"#
    );
    for i in 0..=5 {
        let v = i as f64 / 5.0;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{v:.1}</text>"#,
            px(v),
            TOP + SIDE + 18.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{v:.1}</text>"#,
            LEFT - 8.0,
            py(v) + 4.0
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">False Positive Rate</text>"#,
        LEFT + SIDE / 2.0,
        TOP + SIDE + 40.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" transform="rotate(-90 20 {:.1})">True Positive Rate</text>"#,
        TOP + SIDE / 2.0,
        TOP + SIDE / 2.0
    );

    let _ = writeln!(
        svg,
        r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#888" stroke-dasharray="6 4"/>"##,
        px(0.0),
        py(0.0),
        px(1.0),
        py(1.0)
    );

    for (i, s) in series.iter().enumerate() {
        let color  = PALETTE[i % PALETTE.len()];
        let points = s
            .curve
            .fpr
            .iter()
            .zip(&s.curve.tpr)
            .map(|(&x, &y)| format!("{:.2},{:.2}", px(x), py(y)))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            svg,
            r#"<polyline points="{points}" fill="none" stroke="{color}" stroke-width="2"/>"#
        );

        let ly = TOP + 14.0 + i as f64 * 18.0;
        let lx = LEFT + SIDE + 12.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{lx:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{color}" stroke-width="2"/>"#,
            ly - 4.0,
            lx + 18.0,
            ly - 4.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{ly:.1}">{} (AUC = {:.2})</text>"#,
            lx + 24.0,
            escape(s.label),
            s.auc
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render and write the plot, creating parent directories.
pub fn write_roc_svg(path: &Path, series: &[PlotSeries<'_>], macro_auc: f64) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_roc_svg(series, macro_auc))?;
    tracing::debug!("Wrote ROC plot to '{}'", path.display());
    Ok(())
}
