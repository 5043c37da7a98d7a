//! Create/edit form.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

const LABEL_WIDTH: usize = 18;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(form) = &app.form else { return };

  let block = Block::default()
    .title(format!(" {} ", form.title()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let lines: Vec<Line> = form
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let active = i == form.cursor;
      let label_style = if active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let mut spans = vec![
        Span::styled(format!("{:>width$}  ", field.label, width = LABEL_WIDTH), label_style),
        Span::raw(field.value.clone()),
      ];
      if active {
        spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
      }
      Line::from(spans)
    })
    .collect();

  // Keep the active field on screen.
  let height = inner.height as usize;
  let scroll = form.cursor.saturating_sub(height.saturating_sub(1));
  f.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
}
