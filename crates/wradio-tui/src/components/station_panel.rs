//! Station panel — the tuning dial and station labels.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use wradio_core::Station;

use crate::theme;

#[derive(Default)]
pub struct StationPanel;

pub struct StationView<'a> {
    pub stations: &'a [Station],
    /// Needle position in station units, mid-snap values included.
    pub dial_pos: f64,
    /// Station the needle currently points at.
    pub preview_index: usize,
    pub is_shuffle: bool,
    pub now_playing: Option<&'a str>,
}

impl StationPanel {
    pub fn draw(&self, frame: &mut Frame, area: Rect, view: &StationView) {
        let mode = if view.is_shuffle { "shuffle" } else { "in order" };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::style_border())
            .title(Span::styled(format!(" Tuning ({mode}) "), theme::style_secondary()));

        let mut lines = Vec::with_capacity(view.stations.len() + 2);
        lines.push(self.dial_line(view, area.width.saturating_sub(4) as usize));
        lines.push(Line::default());

        for (i, station) in view.stations.iter().enumerate() {
            let marker = if i == view.preview_index { "▸ " } else { "  " };
            let style = if i == view.preview_index {
                theme::style_selected()
            } else {
                theme::style_default()
            };
            let count = station.valid_track_count();
            lines.push(Line::from(vec![
                Span::styled(marker, theme::style_accent()),
                Span::styled(station.name.clone(), style),
                Span::styled(format!("  ({count} tracks)"), theme::style_muted()),
            ]));
        }

        if let Some(title) = view.now_playing {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("♪ ", theme::style_live()),
                Span::styled(title.to_string(), theme::style_default()),
            ]));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    /// A one-line dial: detent ticks with the needle between them.
    fn dial_line(&self, view: &StationView, width: usize) -> Line<'static> {
        let count = view.stations.len();
        if count < 2 || width < count {
            return Line::from(Span::styled("─".repeat(width.max(1)), theme::style_muted()));
        }
        let span = (count - 1) as f64;
        let needle_cell = ((view.dial_pos / span) * (width - 1) as f64).round() as usize;

        let mut cells = vec!['─'; width];
        for i in 0..count {
            let cell = ((i as f64 / span) * (width - 1) as f64).round() as usize;
            cells[cell] = '┴';
        }
        cells[needle_cell.min(width - 1)] = '●';

        let text: String = cells.into_iter().collect();
        Line::from(Span::styled(text, ratatui::style::Style::default().fg(theme::C_DIAL)))
    }
}
