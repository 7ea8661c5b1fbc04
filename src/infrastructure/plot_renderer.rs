// PNG rendering of comparison figures
use crate::domain::metrics::LinearFit;
use crate::domain::series::TimeSeries;
use crate::infrastructure::config::PlotSettings;
use chrono::{NaiveDateTime, TimeDelta};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CRIMSON: RGBColor = RGBColor(220, 20, 60);
const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);
const MODEL_COLORS: [RGBColor; 2] = [CRIMSON, ROYAL_BLUE];
const COLORBAR_WIDTH: u32 = 90;
const COLORBAR_STEPS: usize = 64;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to draw {}: {message}", .path.display())]
    Draw { path: PathBuf, message: String },
    #[error("nothing to plot for {}", .path.display())]
    NoData { path: PathBuf },
}

fn draw_err<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> RenderError + '_ {
    move |e| RenderError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Square-binned counts over `[min, max]` on both axes, row-major by y.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
    pub counts: Vec<u64>,
}

impl DensityGrid {
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    pub fn count(&self, x_bin: usize, y_bin: usize) -> u64 {
        self.counts[y_bin * self.bins + x_bin]
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Bin paired values; pairs outside the range are dropped.
pub fn density_bins(x: &[f64], y: &[f64], min: f64, max: f64, bins: usize) -> DensityGrid {
    let bins = bins.max(1);
    let mut counts = vec![0u64; bins * bins];
    let width = (max - min) / bins as f64;
    let index = |v: f64| -> Option<usize> {
        if !(min..=max).contains(&v) || width <= 0.0 {
            return None;
        }
        Some((((v - min) / width) as usize).min(bins - 1))
    };
    for (&xv, &yv) in x.iter().zip(y) {
        if let (Some(i), Some(j)) = (index(xv), index(yv)) {
            counts[j * bins + i] += 1;
        }
    }
    DensityGrid {
        min,
        max,
        bins,
        counts,
    }
}

/// Plasma-like colour for `t` in [0, 1].
fn plasma(t: f64) -> RGBColor {
    const ANCHORS: [(f64, f64, f64); 5] = [
        (13.0, 8.0, 135.0),
        (126.0, 3.0, 168.0),
        (204.0, 71.0, 120.0),
        (248.0, 149.0, 64.0),
        (240.0, 249.0, 33.0),
    ];
    let t = t.clamp(0.0, 1.0) * (ANCHORS.len() - 1) as f64;
    let lo = (t.floor() as usize).min(ANCHORS.len() - 2);
    let frac = t - lo as f64;
    let (a, b) = (ANCHORS[lo], ANCHORS[lo + 1]);
    let lerp = |p: f64, q: f64| (p + (q - p) * frac).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn log_scale(count: u64, max_count: u64) -> f64 {
    if max_count <= 1 {
        1.0
    } else {
        (count as f64).ln() / (max_count as f64).ln()
    }
}

/// Inverse of [`log_scale`]: the count shown at colour-bar position `t`.
fn colorbar_count(t: f64, max_count: u64) -> f64 {
    (max_count.max(1) as f64).powf(t)
}

fn days_since(origin: NaiveDateTime, time: NaiveDateTime) -> f64 {
    (time - origin).num_milliseconds() as f64 / 86_400_000.0
}

fn value_range<'a>(series: impl Iterator<Item = &'a TimeSeries>) -> (f64, f64) {
    let (lo, hi) = series
        .flat_map(|s| s.points().iter().map(|p| p.value))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}

pub struct PlotRenderer {
    settings: PlotSettings,
}

impl PlotRenderer {
    pub fn new(settings: PlotSettings) -> Self {
        Self { settings }
    }

    /// Overlay observed and modeled series against time.
    ///
    /// The x range spans the first model's samples plus one cadence step before the start.
    pub fn render_timeseries(
        &self,
        path: &Path,
        observed: (&str, &TimeSeries),
        models: &[(String, &TimeSeries)],
    ) -> Result<(), RenderError> {
        let Some((_, base)) = models.first() else {
            return Err(RenderError::NoData {
                path: path.to_path_buf(),
            });
        };
        let (Some(first), Some(last)) = (base.first_time(), base.last_time()) else {
            return Err(RenderError::NoData {
                path: path.to_path_buf(),
            });
        };
        let origin = first - base.cadence().unwrap_or_else(|| TimeDelta::minutes(1));
        let x_end = days_since(origin, last).max(f64::EPSILON);
        let (y_min, y_max) =
            value_range(std::iter::once(observed.1).chain(models.iter().map(|(_, s)| *s)));

        let root = BitMapBackend::new(path, (self.settings.width, self.settings.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err(path))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_end, y_min..y_max)
            .map_err(draw_err(path))?;

        let format_tick = |x: &f64| {
            (origin + TimeDelta::milliseconds((x * 86_400_000.0) as i64))
                .format("%m-%d %H:%M")
                .to_string()
        };
        chart
            .configure_mesh()
            .y_desc("Sym-H [nT]")
            .x_labels(8)
            .x_label_formatter(&format_tick)
            .draw()
            .map_err(draw_err(path))?;

        let to_points = |series: &TimeSeries| -> Vec<(f64, f64)> {
            series
                .points()
                .iter()
                .map(|p| (days_since(origin, p.time), p.value))
                .filter(|(x, _)| (0.0..=x_end).contains(x))
                .collect()
        };

        chart
            .draw_series(LineSeries::new(to_points(observed.1), &BLACK))
            .map_err(draw_err(path))?
            .label(observed.0)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        for ((label, series), color) in models.iter().zip(MODEL_COLORS) {
            chart
                .draw_series(LineSeries::new(to_points(*series), &color))
                .map_err(draw_err(path))?
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err(path))?;

        root.present().map_err(draw_err(path))?;
        tracing::info!("Wrote time-series comparison to {}", path.display());
        Ok(())
    }

    /// Density scatter of modeled vs observed with fitted and identity lines.
    pub fn render_scatter(
        &self,
        path: &Path,
        observed: &[f64],
        modeled: &[f64],
        fit: &LinearFit,
        fit_name: &str,
    ) -> Result<(), RenderError> {
        let (lo, hi) = (self.settings.scatter_min, self.settings.scatter_max);
        let grid = density_bins(observed, modeled, lo, hi, self.settings.density_bins);
        let max_count = grid.max_count();
        if max_count == 0 {
            tracing::warn!("No samples fall inside the scatter range [{}, {}]", lo, hi);
        }

        let size = self.settings.scatter_size;
        let root = BitMapBackend::new(path, (size + COLORBAR_WIDTH, size)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err(path))?;
        let (plot_area, bar_area) = root.split_horizontally(size as i32);

        let mut chart = ChartBuilder::on(&plot_area)
            .caption(fit.equation(), ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(lo..hi, lo..hi)
            .map_err(draw_err(path))?;

        chart
            .configure_mesh()
            .x_desc("Sym-H (Observed) [nT]")
            .y_desc("Sym-H (Modeled) [nT]")
            .draw()
            .map_err(draw_err(path))?;

        let width = grid.bin_width();
        let cells = (0..grid.bins).flat_map(|j| (0..grid.bins).map(move |i| (i, j)));
        chart
            .draw_series(cells.filter_map(|(i, j)| {
                let count = grid.count(i, j);
                if count == 0 {
                    return None;
                }
                let x0 = lo + i as f64 * width;
                let y0 = lo + j as f64 * width;
                let color = plasma(log_scale(count, max_count)).mix(0.7);
                Some(Rectangle::new([(x0, y0), (x0 + width, y0 + width)], color.filled()))
            }))
            .map_err(draw_err(path))?;

        chart
            .draw_series(LineSeries::new(
                [(lo, fit.predict(lo)), (hi, fit.predict(hi))],
                &RED,
            ))
            .map_err(draw_err(path))?
            .label(fit_name)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .draw_series(DashedLineSeries::new(
                vec![(lo, lo), (hi, hi)],
                6,
                4,
                BLACK.stroke_width(1),
            ))
            .map_err(draw_err(path))?
            .label("1:1")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err(path))?;

        // colour bar on the same log scale as the cells
        let mut bar = ChartBuilder::on(&bar_area)
            .margin(10)
            .margin_top(40)
            .x_label_area_size(45)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..1.0, 0.0..1.0)
            .map_err(draw_err(path))?;
        let format_count = |t: &f64| format!("{:.0}", colorbar_count(*t, max_count));
        bar.configure_mesh()
            .disable_mesh()
            .x_labels(0)
            .y_labels(5)
            .y_label_formatter(&format_count)
            .y_desc("Counts")
            .draw()
            .map_err(draw_err(path))?;
        bar.draw_series((0..COLORBAR_STEPS).map(|k| {
            let t0 = k as f64 / COLORBAR_STEPS as f64;
            let t1 = (k + 1) as f64 / COLORBAR_STEPS as f64;
            Rectangle::new([(0.0, t0), (1.0, t1)], plasma(t0).mix(0.7).filled())
        }))
        .map_err(draw_err(path))?;

        root.present().map_err(draw_err(path))?;
        tracing::info!("Wrote density scatter to {}", path.display());
        Ok(())
    }
}
