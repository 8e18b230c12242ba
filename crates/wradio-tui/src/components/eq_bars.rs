//! Equalizer bars — vertical block-glyph columns driven by the visualizer's
//! per-frame bar heights.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme;

/// Partial fills for the top cell of a column, in eighths.
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Default)]
pub struct EqBars;

impl EqBars {
    /// `bars` are heights in percent.
    pub fn draw(&self, frame: &mut Frame, area: Rect, bars: &[f32]) {
        if area.height == 0 || bars.is_empty() {
            return;
        }
        let rows = area.height as usize;
        let style = Style::default().fg(theme::C_BARS).bg(theme::C_BG);

        let mut lines = Vec::with_capacity(rows);
        for row in 0..rows {
            // Rows render top-down; this row covers the eighths band
            // [seg_base, seg_base + 8) counted from the bottom.
            let seg_base = ((rows - 1 - row) * 8) as i32;
            let mut spans = Vec::with_capacity(bars.len() * 2);
            for &pct in bars {
                let eighths = (pct.clamp(0.0, 100.0) / 100.0 * (rows * 8) as f32) as i32;
                let filled = (eighths - seg_base).clamp(0, 8);
                let glyph = if filled == 0 {
                    ' '
                } else {
                    BLOCKS[filled as usize - 1]
                };
                spans.push(Span::styled(glyph.to_string(), style));
                spans.push(Span::styled(" ", style));
            }
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines).style(style), area);
    }
}
