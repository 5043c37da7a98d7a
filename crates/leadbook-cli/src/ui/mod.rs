//! TUI rendering.

pub mod import;
pub mod lead_form;
pub mod lead_table;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);

  match app.screen {
    Screen::LeadForm => lead_form::draw(f, rows[1], app),
    Screen::ImportReview => import::draw_review(f, rows[1], app),
    _ => lead_table::draw(f, rows[1], app),
  }
  match app.screen {
    Screen::ConfirmDelete => draw_confirm_delete(f, rows[1], app),
    Screen::ImportPath => import::draw_path_prompt(f, rows[1], app),
    _ => {}
  }

  draw_status(f, rows[2], app);
}

/// A `width` × `height` rectangle centred in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height)])
    .flex(Flex::Center)
    .areas(area);
  let [rect] = Layout::horizontal([Constraint::Length(width)])
    .flex(Flex::Center)
    .areas(row);
  rect
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " leadbook",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{}  {date} ", app.client.active_url()),
    Style::default().fg(Color::Gray),
  );

  let left_width = left.content.len() as u16;
  let right_width = right.content.len() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Delete confirmation ──────────────────────────────────────────────────────

fn draw_confirm_delete(f: &mut Frame, area: Rect, app: &App) {
  let name = app.selected().map(|l| l.full_name.as_str()).unwrap_or("");
  let popup = centered(area, 50.min(area.width), 5);

  let block = Block::default()
    .title(" Delete lead ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let text = vec![
    Line::from(format!("Delete {name}?")),
    Line::from(""),
    Line::from(Span::styled(
      "[y] delete  [n] cancel",
      Style::default().fg(Color::DarkGray),
    )),
  ];

  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(text).block(block), popup);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    Screen::LeadList if app.filtering => ("SEARCH", "Type to filter  Enter keep  Esc clear"),
    Screen::LeadList => (
      "LEADS",
      "↑↓/jk move  a add  e edit  d delete  i import  r refresh  / search  q quit",
    ),
    Screen::LeadForm => ("FORM", "Tab/↑↓ field  Enter save  Esc discard"),
    Screen::ConfirmDelete => ("DELETE", "y confirm  n cancel"),
    Screen::ImportPath => ("IMPORT", "Type a workbook path  Enter read  Esc cancel"),
    Screen::ImportReview => ("REVIEW", "y submit  Esc discard"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}
