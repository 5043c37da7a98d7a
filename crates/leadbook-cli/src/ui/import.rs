//! Workbook import: path prompt and staged-row review.

use leadbook_core::lead::{APOLLO_ID, FULL_NAME, LeadInput};
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Row, Table},
};

use crate::{app::App, ui::centered};

const PREVIEW_COLUMNS: [(&str, &str); 5] = [
  (APOLLO_ID, "Apollo ID"),
  (FULL_NAME, "Full Name"),
  ("email", "Email"),
  ("jobTitle", "Job Title"),
  ("companyName", "Company"),
];

pub fn draw_path_prompt(f: &mut Frame, area: Rect, app: &App) {
  let popup = centered(area, 70.min(area.width), 3);
  let block = Block::default()
    .title(" Import workbook ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let line = Line::from(vec![
    Span::raw(app.path_input.clone()),
    Span::styled("█", Style::default().fg(Color::Cyan)),
  ]);

  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(line).block(block), popup);
}

fn cell(input: &LeadInput, key: &str) -> String {
  input.text(key).unwrap_or_default().to_owned()
}

pub fn draw_review(f: &mut Frame, area: Rect, app: &App) {
  let Some(staged) = &app.staged else { return };

  let [summary_area, table_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

  let summary = Paragraph::new(vec![
    Line::from(staged.source.display().to_string()),
    Line::from(Span::styled(
      format!(
        "{} rows staged, showing the first {}",
        staged.total(),
        staged.preview().len()
      ),
      Style::default().add_modifier(Modifier::BOLD),
    )),
  ])
  .block(Block::default().borders(Borders::BOTTOM));
  f.render_widget(summary, summary_area);

  let header = Row::new(PREVIEW_COLUMNS.map(|(_, label)| label))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
  let rows = staged
    .preview()
    .iter()
    .map(|input| Row::new(PREVIEW_COLUMNS.map(|(key, _)| cell(input, key))));

  let table = Table::new(rows, [Constraint::Ratio(1, 5); 5])
    .header(header)
    .block(
      Block::default()
        .title(" Review import ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    );
  f.render_widget(table, table_area);
}
