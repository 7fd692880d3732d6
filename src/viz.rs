//! Diagnostic figures.
//!
//! Plotting functions build a [`Figure`] value holding everything needed to
//! draw it; nothing touches the filesystem until [`Figure::save_png`].
//!
//! ```text
//!   plot_erp(&epochs)              → Figure { Erp  }  butterfly per label
//!   plot_scalp(&weights, &layout)  → Figure { Topo }  IDW-interpolated map
//!   plot_filter_response(l, h, fs) → Figure { FilterResponse }  gain in dB
//!   figure.save_png("erp.png")     → BitMapBackend
//! ```
//!
//! Rendering draws shapes only. Titles and labels live on the [`Figure`]
//! value; plotters is built without a font backend.
use std::error::Error;
use std::f64::consts::PI;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use plotters::prelude::*;

use crate::epoch::Epochs;
use crate::error::{ErpError, Result};
use crate::filter;
use crate::recording::EventLabel;

/// Default canvas size in pixels.
pub const FIGURE_SIZE: (u32, u32) = (800, 600);
/// Interpolation grid resolution of scalp maps.
const TOPO_GRID: usize = 64;
/// Frequencies evaluated between 0 Hz and Nyquist by [`plot_filter_response`].
pub const RESPONSE_POINTS: usize = 512;
/// Gain floor in dB, so stop-band zeros stay finite.
const GAIN_FLOOR_DB: f64 = -240.0;

/// matplotlib `tab:red`.
pub const TAB_RED: RGBColor = RGBColor(214, 39, 40);
/// matplotlib `tab:blue`.
pub const TAB_BLUE: RGBColor = RGBColor(31, 119, 180);

/// Line colour of each event label.
pub fn label_color(label: EventLabel) -> RGBColor {
    match label {
        EventLabel::Target => TAB_RED,
        EventLabel::NonTarget => TAB_BLUE,
    }
}

// ── Figures ──────────────────────────────────────────────────────────────────

/// A renderable figure.
#[derive(Debug, Clone)]
pub struct Figure {
    /// Not rasterised.
    pub title: String,
    pub size: (u32, u32),
    pub kind: FigureKind,
}

#[derive(Debug, Clone)]
pub enum FigureKind {
    Erp(ErpPlot),
    Topo(TopoPlot),
    FilterResponse(FilterResponsePlot),
}

/// Averaged responses, one trace per label present.
#[derive(Debug, Clone)]
pub struct ErpPlot {
    pub times: Array1<f64>,
    pub traces: Vec<ErpTrace>,
}

/// Evoked response `[n_channels, n_times]` of one label.
#[derive(Debug, Clone)]
pub struct ErpTrace {
    pub label: EventLabel,
    pub n_epochs: usize,
    pub evoked: Array2<f64>,
}

/// Sensor-space weights on a 2-D head layout.
#[derive(Debug, Clone)]
pub struct TopoPlot {
    pub weights: Array1<f64>,
    pub layout: ChannelLayout,
    /// Interpolated map over `[-extent, extent]²`; `NaN` outside the head.
    pub grid: Array2<f64>,
    pub extent: f64,
}

/// Frequency response of a band-pass FIR.
#[derive(Debug, Clone)]
pub struct FilterResponsePlot {
    /// Evaluation frequencies in Hz, `0..=nyquist`.
    pub freqs: Array1<f64>,
    /// `20·log10|H(f)|`, floored at -240 dB.
    pub gain_db: Array1<f64>,
    /// `(l_freq, h_freq)`, drawn as dashed verticals.
    pub cutoffs: (f64, f64),
    pub n_taps: usize,
}

impl Figure {
    pub fn erp(&self) -> Option<&ErpPlot> {
        match &self.kind {
            FigureKind::Erp(p) => Some(p),
            _ => None,
        }
    }

    pub fn topo(&self) -> Option<&TopoPlot> {
        match &self.kind {
            FigureKind::Topo(p) => Some(p),
            _ => None,
        }
    }

    pub fn filter_response(&self) -> Option<&FilterResponsePlot> {
        match &self.kind {
            FigureKind::FilterResponse(p) => Some(p),
            _ => None,
        }
    }

    /// Render to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let drawn = match &self.kind {
            FigureKind::Erp(p) => draw_erp(p, path, self.size),
            FigureKind::Topo(p) => draw_topo(p, path, self.size),
            FigureKind::FilterResponse(p) => draw_filter_response(p, path, self.size),
        };
        drawn.map_err(|e| ErpError::Render(anyhow::anyhow!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "figure saved");
        Ok(())
    }
}

/// Target-vs-non-target ERP: per label (target first) the average over its
/// epochs, every channel drawn in the label's colour.
pub fn plot_erp(epochs: &Epochs) -> Result<Figure> {
    let traces: Vec<ErpTrace> = [EventLabel::Target, EventLabel::NonTarget]
        .into_iter()
        .filter_map(|label| {
            epochs.average(label).map(|evoked| ErpTrace { label, n_epochs: epochs.count(label), evoked })
        })
        .collect();
    if traces.is_empty() {
        return Err(ErpError::validation("no epochs to average"));
    }
    Ok(Figure {
        title: "Target vs non-target ERP".into(),
        size: FIGURE_SIZE,
        kind: FigureKind::Erp(ErpPlot { times: epochs.times.clone(), traces }),
    })
}

/// Frequency response of a Hamming-windowed band-pass with `3·sfreq` taps
/// (rounded up to odd), in dB from 0 Hz to Nyquist.
///
/// Requires `0 < l_freq < h_freq < sfreq / 2`.
pub fn plot_filter_response(l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Figure> {
    let nyq = sfreq / 2.0;
    if !(sfreq > 0.0 && l_freq > 0.0 && l_freq < h_freq && h_freq < nyq) {
        return Err(ErpError::config(format!(
            "band-pass edges must satisfy 0 < {l_freq} < {h_freq} < {nyq}"
        )));
    }
    let n_taps = (3.0 * sfreq).round() as usize | 1;
    let h = filter::firwin(n_taps, &[l_freq, h_freq], sfreq, false);
    let freqs = Array1::linspace(0.0, nyq, RESPONSE_POINTS);
    let gain_db = freqs.mapv(|f| (20.0 * filter::gain_at(&h, f, sfreq).log10()).max(GAIN_FLOOR_DB));
    tracing::debug!(l_freq, h_freq, sfreq, n_taps, "filter response");
    Ok(Figure {
        title: format!("Band-pass {l_freq}-{h_freq} Hz frequency response"),
        size: FIGURE_SIZE,
        kind: FigureKind::FilterResponse(FilterResponsePlot { freqs, gain_db, cutoffs: (l_freq, h_freq), n_taps }),
    })
}

/// Scalp map of one weight per channel in `layout`.
pub fn plot_scalp(weights: ArrayView1<'_, f64>, layout: &ChannelLayout) -> Result<Figure> {
    if weights.len() != layout.len() {
        return Err(ErpError::validation(format!(
            "{} weights for {} channels in the layout",
            weights.len(),
            layout.len()
        )));
    }
    let head = layout.positions.rows().into_iter().map(|p| p[0].hypot(p[1])).fold(1.0, f64::max);
    let extent = head * 1.1;
    let step = 2.0 * extent / TOPO_GRID as f64;
    let grid = Array2::from_shape_fn((TOPO_GRID, TOPO_GRID), |(i, j)| {
        let x = -extent + (j as f64 + 0.5) * step;
        let y = -extent + (i as f64 + 0.5) * step;
        if x.hypot(y) > head {
            f64::NAN
        } else {
            idw(&layout.positions, weights, x, y)
        }
    });
    Ok(Figure {
        title: "Classifier weights".into(),
        size: (600, 600),
        kind: FigureKind::Topo(TopoPlot { weights: weights.to_owned(), layout: layout.clone(), grid, extent }),
    })
}

/// Inverse-distance-squared interpolation at `(x, y)`.
fn idw(pos: &Array2<f64>, values: ArrayView1<'_, f64>, x: f64, y: f64) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for (p, &v) in pos.rows().into_iter().zip(values) {
        let d2 = (p[0] - x).powi(2) + (p[1] - y).powi(2);
        if d2 < 1e-12 {
            return v;
        }
        num += v / d2;
        den += 1.0 / d2;
    }
    num / den
}

// ── Channel layout ───────────────────────────────────────────────────────────

/// How a [`ChannelLayout`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    /// Projected from sensor positions stored in the file.
    Sensors,
    /// Looked up in the 10-20 table.
    Standard1020,
    /// Evenly spaced on a circle.
    Circle,
}

/// 2-D sensor positions in head units (head outline at radius 1, nose up).
#[derive(Debug, Clone)]
pub struct ChannelLayout {
    pub names: Vec<String>,
    /// `[n_channels, 2]`.
    pub positions: Array2<f64>,
    pub source: LayoutSource,
}

impl ChannelLayout {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Best available layout: sensor positions, then the 10-20 table, then a circle.
    pub fn resolve(names: &[String], positions: Option<&Array2<f64>>) -> Self {
        if let Some(layout) = positions.and_then(|p| Self::from_positions(names, p)) {
            return layout;
        }
        if let Some(layout) = Self::standard_1020(names) {
            return layout;
        }
        tracing::debug!(n = names.len(), "no sensor positions; using a circular layout");
        Self::circle(names)
    }

    /// Azimuthal equidistant projection of 3-D positions around their centroid.
    pub fn from_positions(names: &[String], pos: &Array2<f64>) -> Option<Self> {
        if pos.dim() != (names.len(), 3) || names.is_empty() || pos.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let centre = pos.mean_axis(ndarray::Axis(0))?;
        let mut out = Array2::<f64>::zeros((names.len(), 2));
        for (mut dst, p) in out.rows_mut().into_iter().zip(pos.rows()) {
            let (x, y, z) = (p[0] - centre[0], p[1] - centre[1], p[2] - centre[2]);
            let r = (x * x + y * y + z * z).sqrt();
            if r == 0.0 {
                continue;
            }
            let theta = (z / r).clamp(-1.0, 1.0).acos() / (PI / 2.0);
            let phi = y.atan2(x);
            dst[0] = theta * phi.cos();
            dst[1] = theta * phi.sin();
        }
        if out.iter().all(|&v| v == 0.0) {
            return None;
        }
        Some(Self { names: names.to_vec(), positions: out, source: LayoutSource::Sensors })
    }

    /// Positions from the 10-20 table; `None` unless every name is known.
    pub fn standard_1020(names: &[String]) -> Option<Self> {
        let mut out = Array2::<f64>::zeros((names.len(), 2));
        for (mut dst, name) in out.rows_mut().into_iter().zip(names) {
            let &(_, r, deg) = STANDARD_1020.iter().find(|(n, _, _)| n.eq_ignore_ascii_case(name.trim()))?;
            let a = deg.to_radians();
            dst[0] = r * a.cos();
            dst[1] = r * a.sin();
        }
        (!names.is_empty())
            .then(|| Self { names: names.to_vec(), positions: out, source: LayoutSource::Standard1020 })
    }

    /// Channels evenly spaced on a circle of radius 0.8, first one at the nose.
    pub fn circle(names: &[String]) -> Self {
        let n = names.len().max(1) as f64;
        let positions = Array2::from_shape_fn((names.len(), 2), |(i, k)| {
            let a = PI / 2.0 + 2.0 * PI * i as f64 / n;
            0.8 * if k == 0 { a.cos() } else { a.sin() }
        });
        Self { names: names.to_vec(), positions, source: LayoutSource::Circle }
    }
}

/// `(name, radius, angle°)`: radius 1 at the head outline, 90° towards the nose.
#[rustfmt::skip]
const STANDARD_1020: &[(&str, f64, f64)] = &[
    ("Fpz", 0.8, 90.0),  ("Fp1", 0.8, 108.0), ("Fp2", 0.8, 72.0),
    ("AFz", 0.6, 90.0),  ("AF3", 0.65, 115.0), ("AF4", 0.65, 65.0),
    ("AF7", 0.8, 126.0), ("AF8", 0.8, 54.0),
    ("Fz",  0.4, 90.0),  ("F1", 0.43, 112.0), ("F2", 0.43, 68.0),
    ("F3",  0.5, 130.0), ("F4", 0.5, 50.0),   ("F5", 0.63, 139.0),
    ("F6",  0.63, 41.0), ("F7", 0.8, 144.0),  ("F8", 0.8, 36.0),
    ("FCz", 0.2, 90.0),  ("FC1", 0.28, 135.0), ("FC2", 0.28, 45.0),
    ("FC3", 0.45, 153.0), ("FC4", 0.45, 27.0), ("FC5", 0.62, 159.0),
    ("FC6", 0.62, 21.0), ("FT7", 0.8, 162.0), ("FT8", 0.8, 18.0),
    ("Cz",  0.0, 90.0),  ("C1", 0.2, 180.0),  ("C2", 0.2, 0.0),
    ("C3",  0.4, 180.0), ("C4", 0.4, 0.0),    ("C5", 0.6, 180.0),
    ("C6",  0.6, 0.0),   ("T7", 0.8, 180.0),  ("T8", 0.8, 0.0),
    ("T3",  0.8, 180.0), ("T4", 0.8, 0.0),
    ("CPz", 0.2, 270.0), ("CP1", 0.28, 225.0), ("CP2", 0.28, 315.0),
    ("CP3", 0.45, 207.0), ("CP4", 0.45, 333.0), ("CP5", 0.62, 201.0),
    ("CP6", 0.62, 339.0), ("TP7", 0.8, 198.0), ("TP8", 0.8, 342.0),
    ("Pz",  0.4, 270.0), ("P1", 0.43, 248.0), ("P2", 0.43, 292.0),
    ("P3",  0.5, 230.0), ("P4", 0.5, 310.0),  ("P5", 0.63, 221.0),
    ("P6",  0.63, 319.0), ("P7", 0.8, 216.0), ("P8", 0.8, 324.0),
    ("T5",  0.8, 216.0), ("T6", 0.8, 324.0),
    ("POz", 0.6, 270.0), ("PO3", 0.65, 245.0), ("PO4", 0.65, 295.0),
    ("PO7", 0.8, 234.0), ("PO8", 0.8, 306.0),
    ("Oz",  0.8, 270.0), ("O1", 0.8, 252.0),  ("O2", 0.8, 288.0),
];

// ── Rendering ────────────────────────────────────────────────────────────────

fn draw_erp(plot: &ErpPlot, path: &Path, size: (u32, u32)) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let t0 = plot.times.first().copied().unwrap_or(0.0);
    let t1 = plot.times.last().copied().unwrap_or(1.0).max(t0 + 1e-3);
    let (lo, hi) = plot
        .traces
        .iter()
        .flat_map(|t| t.evoked.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v * 1e6), hi.max(v * 1e6)));
    let margin = ((hi - lo) * 0.1).max(1e-3);

    // No label areas: plotters is built without a font backend.
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(t0..t1, (lo - margin)..(hi + margin))?;
    chart.configure_mesh().draw()?;
    chart.draw_series(LineSeries::new([(t0, 0.0), (t1, 0.0)], &BLACK))?;
    chart.draw_series(LineSeries::new([(0.0, lo - margin), (0.0, hi + margin)], &BLACK))?;

    for trace in &plot.traces {
        let color = label_color(trace.label);
        for row in trace.evoked.rows() {
            chart.draw_series(LineSeries::new(
                plot.times.iter().zip(row.iter()).map(|(&t, &v)| (t, v * 1e6)),
                ShapeStyle::from(&color).stroke_width(1),
            ))?;
        }
    }
    root.present()?;
    Ok(())
}

fn draw_topo(plot: &TopoPlot, path: &Path, size: (u32, u32)) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let e = plot.extent;
    let mut chart = ChartBuilder::on(&root).margin(10).build_cartesian_2d(-e..e, -e..e)?;

    let vmax = plot.grid.iter().filter(|v| v.is_finite()).fold(0.0_f64, |m, v| m.max(v.abs())).max(1e-300);
    let (n_rows, n_cols) = plot.grid.dim();
    let step = 2.0 * e / n_cols as f64;
    chart.draw_series(
        (0..n_rows)
            .flat_map(|i| (0..n_cols).map(move |j| (i, j)))
            .filter(|&(i, j)| plot.grid[[i, j]].is_finite())
            .map(|(i, j)| {
                let x = -e + j as f64 * step;
                let y = -e + i as f64 * step;
                Rectangle::new([(x, y), (x + step, y + step)], diverging(plot.grid[[i, j]] / vmax).filled())
            }),
    )?;

    let head = e / 1.1;
    chart.draw_series(LineSeries::new(
        (0..=120).map(|k| {
            let a = 2.0 * PI * k as f64 / 120.0;
            (head * a.cos(), head * a.sin())
        }),
        &BLACK,
    ))?;
    chart.draw_series(LineSeries::new(
        vec![(-0.1 * head, head), (0.0, 1.1 * head), (0.1 * head, head)],
        &BLACK,
    ))?;
    chart.draw_series(
        plot.layout
            .positions
            .rows()
            .into_iter()
            .map(|p| Circle::new((p[0], p[1]), 3, BLACK.filled())),
    )?;
    root.present()?;
    Ok(())
}

fn draw_filter_response(
    plot: &FilterResponsePlot,
    path: &Path,
    size: (u32, u32),
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let f1 = plot.freqs.last().copied().unwrap_or(1.0).max(1e-3);
    let lo = plot.gain_db.iter().copied().fold(0.0_f64, f64::min).max(-120.0);
    let mut chart = ChartBuilder::on(&root).margin(10).build_cartesian_2d(0.0..f1, lo..10.0)?;
    chart.configure_mesh().draw()?;

    chart.draw_series(LineSeries::new(
        plot.freqs.iter().zip(plot.gain_db.iter()).map(|(&f, &g)| (f, g.max(lo))),
        ShapeStyle::from(&TAB_BLUE).stroke_width(2),
    ))?;
    let (l, h) = plot.cutoffs;
    for f in [l, h] {
        chart.draw_series(DashedLineSeries::new([(f, lo), (f, 10.0)], 6, 4, BLACK.into()))?;
    }
    root.present()?;
    Ok(())
}

/// Blue–white–red colour for `v` in `[-1, 1]`.
fn diverging(v: f64) -> RGBColor {
    const BLUE: (f64, f64, f64) = (33.0, 102.0, 172.0);
    const RED: (f64, f64, f64) = (178.0, 24.0, 43.0);
    let v = v.clamp(-1.0, 1.0);
    let (target, w) = if v < 0.0 { (BLUE, -v) } else { (RED, v) };
    let mix = |c: f64| (255.0 + (c - 255.0) * w).round() as u8;
    RGBColor(mix(target.0), mix(target.1), mix(target.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn layout_prefers_1020_table_over_circle() {
        let layout = ChannelLayout::resolve(&names(&["Fz", "cz", "Pz"]), None);
        assert_eq!(layout.source, LayoutSource::Standard1020);
        approx::assert_abs_diff_eq!(layout.positions[[1, 0]], 0.0, epsilon = 1e-12);
        assert!(layout.positions[[0, 1]] > 0.0 && layout.positions[[2, 1]] < 0.0);

        let layout = ChannelLayout::resolve(&names(&["EEG00", "EEG01"]), None);
        assert_eq!(layout.source, LayoutSource::Circle);
    }

    #[test]
    fn sensor_positions_project_inside_head() {
        // Vertex plus four points on the equator.
        let pos = array![[0.0, 0.0, 0.09], [0.09, 0.0, 0.0], [-0.09, 0.0, 0.0], [0.0, 0.09, 0.0], [0.0, -0.09, 0.0]];
        let layout = ChannelLayout::resolve(&names(&["a", "b", "c", "d", "e"]), Some(&pos));
        assert_eq!(layout.source, LayoutSource::Sensors);
        assert!(layout.positions.rows().into_iter().all(|p| p[0].hypot(p[1]) <= 1.2));
    }

    #[test]
    fn scalp_grid_interpolates_between_sensors() {
        let layout = ChannelLayout::circle(&names(&["a", "b", "c", "d"]));
        let fig = plot_scalp(array![1.0, 1.0, 1.0, 1.0].view(), &layout).unwrap();
        let topo = fig.topo().unwrap();
        let centre = topo.grid[[TOPO_GRID / 2, TOPO_GRID / 2]];
        approx::assert_abs_diff_eq!(centre, 1.0, epsilon = 1e-9);
        assert!(topo.grid[[0, 0]].is_nan());
        assert!(plot_scalp(array![1.0].view(), &layout).is_err());
    }

    #[test]
    fn filter_response_passes_band_and_rejects_line_noise() {
        let fig = plot_filter_response(0.1, 30.0, 256.0).unwrap();
        let resp = fig.filter_response().unwrap();
        assert_eq!(resp.n_taps, 769);
        assert_eq!(resp.freqs.len(), RESPONSE_POINTS);
        approx::assert_abs_diff_eq!(resp.freqs[RESPONSE_POINTS - 1], 128.0, epsilon = 1e-9);

        let db_at = |f: f64| {
            let i = resp.freqs.iter().position(|&x| x >= f).unwrap();
            resp.gain_db[i]
        };
        assert!(db_at(10.0).abs() < 0.1, "{} dB at 10 Hz", db_at(10.0));
        assert!(db_at(60.0) < -40.0, "{} dB at 60 Hz", db_at(60.0));
        assert!(resp.gain_db.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn filter_response_rejects_bad_edges() {
        for (l, h) in [(0.0, 30.0), (30.0, 10.0), (1.0, 128.0)] {
            assert!(matches!(plot_filter_response(l, h, 256.0), Err(ErpError::Config(_))), "{l}-{h}");
        }
    }

    #[test]
    fn diverging_endpoints() {
        assert_eq!(diverging(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging(1.0), RGBColor(178, 24, 43));
        assert_eq!(diverging(-2.0), RGBColor(33, 102, 172));
    }
}
