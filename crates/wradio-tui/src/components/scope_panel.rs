//! Scope panel — replays visualizer draw instructions onto a ratatui Chart.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    widgets::{Axis, Block, Chart, Dataset, GraphType},
    Frame,
};

use wradio_core::{DrawOp, Paint, VizFrame};

use crate::theme;

pub struct ScopePanel {
    /// Per-frame chart data, reused across draws to avoid reallocating.
    lines: Vec<(Paint, Vec<(f64, f64)>)>,
}

impl Default for ScopePanel {
    fn default() -> Self {
        Self { lines: Vec::new() }
    }
}

fn paint_color(paint: Paint) -> Color {
    match paint {
        Paint::Background => theme::C_BG,
        Paint::Grid => theme::C_GRID,
        Paint::Trace => theme::C_TRACE,
    }
}

impl ScopePanel {
    /// The visualizer's origin is the top-left corner; the chart's is the
    /// bottom-left, so y flips against the surface height.
    pub fn draw(&mut self, frame: &mut Frame, area: Rect, viz: &VizFrame, surface: (f32, f32)) {
        let (w, h) = surface;
        self.lines.clear();
        for op in &viz.ops {
            if let DrawOp::Polyline { points, paint } = op {
                let pts = points
                    .iter()
                    .map(|&(x, y)| (x as f64, (h - y) as f64))
                    .collect();
                self.lines.push((*paint, pts));
            }
        }

        let datasets: Vec<Dataset> = self
            .lines
            .iter()
            .map(|(paint, pts)| {
                Dataset::default()
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(paint_color(*paint)))
                    .data(pts)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(Block::default().style(Style::default().bg(theme::C_BG)))
            .x_axis(Axis::default().bounds([0.0, w as f64]))
            .y_axis(Axis::default().bounds([0.0, h as f64]));

        frame.render_widget(chart, area);
    }
}
