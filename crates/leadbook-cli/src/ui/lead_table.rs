//! Lead table, the main screen.

use leadbook_core::lead::{Lead, NOT_AVAILABLE};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, Cell, Row, Table, TableState},
};

use crate::app::App;

/// `city, state, country`, skipping blank and sentinel parts.
pub fn location(lead: &Lead) -> String {
  [&lead.profile.city, &lead.profile.state, &lead.profile.country]
    .into_iter()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
    .collect::<Vec<_>>()
    .join(", ")
}

/// Render the lead table into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let visible = app.visible();
  let total = app.leads.len();

  let title = if app.filtering || !app.filter.is_empty() {
    format!(" Leads ({}/{})  /{} ", visible.len(), total, app.filter)
  } else {
    format!(" Leads ({total}) ")
  };

  let header = Row::new(["Name", "Email", "Job Title", "Company", "Industry", "Location"])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

  let rows = visible.iter().map(|lead| {
    Row::new(vec![
      Cell::from(lead.full_name.clone()),
      Cell::from(lead.profile.email.clone()),
      Cell::from(lead.profile.job_title.clone()),
      Cell::from(lead.profile.company_name.clone()),
      Cell::from(lead.profile.industry.clone()),
      Cell::from(location(lead)),
    ])
  });

  let widths = [
    Constraint::Percentage(18),
    Constraint::Percentage(22),
    Constraint::Percentage(16),
    Constraint::Percentage(16),
    Constraint::Percentage(12),
    Constraint::Percentage(16),
  ];

  let table = Table::new(rows, widths)
    .header(header)
    .block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    );

  let mut state = TableState::default();
  if !visible.is_empty() {
    state.select(Some(app.list_cursor));
  }
  f.render_stateful_widget(table, area, &mut state);
}
