//! Status bar — controller status line, helper text, and level readouts.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use wradio_core::{StatusLevel, StatusLine};

use crate::theme;

#[derive(Default)]
pub struct StatusBar;

pub struct StatusView<'a> {
    pub status: &'a StatusLine,
    pub helper: Option<&'a str>,
    pub volume_pct: u8,
    pub tone_pct: u8,
    pub powered: bool,
}

impl StatusBar {
    pub fn draw(&self, frame: &mut Frame, area: Rect, view: &StatusView) {
        let status_style = match view.status.level {
            StatusLevel::Idle => theme::style_secondary(),
            StatusLevel::Live => theme::style_live(),
            StatusLevel::Warn => theme::style_warn(),
        };

        let power = if view.powered { "⏻ on " } else { "⏻ off" };
        let mut top = vec![
            Span::styled(power, if view.powered {
                theme::style_live()
            } else {
                theme::style_muted()
            }),
            Span::styled("  ", theme::style_default()),
            Span::styled(view.status.text.clone(), status_style),
        ];
        top.push(Span::styled(
            format!("   vol {:>3}%  tone {:>3}%", view.volume_pct, view.tone_pct),
            theme::style_secondary(),
        ));

        let mut lines = vec![Line::from(top)];
        if let Some(helper) = view.helper {
            lines.push(Line::from(Span::styled(
                helper.to_string(),
                theme::style_muted(),
            )));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }
}
