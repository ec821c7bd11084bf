use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Block, Borders, Padding, Paragraph, Tabs},
};
use regex::Regex;

use crate::git::FileStatus;
use crate::models::{State, Tab, Viewport};
use crate::theme::Theme;

pub const PLACEHOLDER: &str = "(no files)";

const FOOTER: &str = "Tab switch view | ↑/↓ select branch | q quit";

static HASH_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{7}: ").unwrap());
static TICKET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]+-\d+").unwrap());

/// Draws the whole dashboard. Reads state, never changes it.
pub fn render(f: &mut Frame, state: &State, theme: &Theme) {
    let area = drawing_area(state.viewport, f.area());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tab header
            Constraint::Min(1),
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_tabs(f, rows[0], state.active_tab, theme);
    match state.active_tab {
        Tab::Status => render_status(f, rows[1], state, theme),
        Tab::Logs => render_logs(f, rows[1], state, theme),
    }
    f.render_widget(Paragraph::new(FOOTER).style(theme.footer), rows[2]);
}

/// The viewport clipped to the frame; an unknown viewport uses the frame.
fn drawing_area(viewport: Viewport, frame: Rect) -> Rect {
    if viewport.width == 0 || viewport.height == 0 {
        return frame;
    }
    Rect {
        width: viewport.width.min(frame.width),
        height: viewport.height.min(frame.height),
        ..frame
    }
}

fn render_tabs(f: &mut Frame, area: Rect, active: Tab, theme: &Theme) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
        .style(theme.tab)
        .highlight_style(theme.tab_active)
        .select(active.as_index())
        .divider(symbols::DOT)
        .padding("", "   ");
    f.render_widget(tabs, area);
}

fn render_status(f: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let untracked = state
        .untracked
        .iter()
        .map(|path| Line::from(format!("- {path}")))
        .collect();

    f.render_widget(panel("Untracked", theme.panel_title, untracked, theme), columns[0]);
    f.render_widget(
        panel("Modified", theme.panel_title, status_lines(&state.modified), theme),
        columns[1],
    );
    f.render_widget(
        panel("Staged", theme.staged_title, status_lines(&state.staged), theme),
        columns[2],
    );
}

fn status_lines(files: &BTreeMap<String, FileStatus>) -> Vec<Line<'static>> {
    files
        .iter()
        .map(|(path, status)| Line::from(format!("- {path}: {status}")))
        .collect()
}

fn panel<'a>(
    title: &'a str,
    title_style: Style,
    lines: Vec<Line<'a>>,
    theme: &Theme,
) -> Paragraph<'a> {
    let lines = if lines.is_empty() {
        vec![Line::styled(PLACEHOLDER, theme.placeholder)]
    } else {
        lines
    };
    Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_style(theme.panel_border)
            .padding(Padding::horizontal(1)),
    )
}

fn render_logs(f: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);

    let branches: Vec<Line> = state
        .branches
        .iter()
        .enumerate()
        .map(|(i, branch)| {
            if i == state.cursor {
                Line::styled(format!("> {}", branch.name), theme.branch_selected)
            } else {
                Line::styled(format!("  {}", branch.name), theme.branch)
            }
        })
        .collect();
    let branches = if branches.is_empty() {
        vec![Line::styled("(no branches)", theme.placeholder)]
    } else {
        branches
    };
    let block = |title: &'static str| {
        Block::default()
            .title(Span::styled(title, theme.panel_title))
            .borders(Borders::ALL)
            .border_style(theme.panel_border)
            .padding(Padding::horizontal(1))
    };
    f.render_widget(Paragraph::new(branches).block(block("Branches")), columns[0]);

    let logs: Vec<Line> = state
        .logs
        .lines()
        .map(|line| render_log_line(line, theme))
        .collect();
    f.render_widget(Paragraph::new(logs).block(block("Logs")), columns[1]);
}

/// Highlights the short hash and any ticket ids without changing the text.
fn render_log_line<'a>(line: &'a str, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    let rest = match HASH_PREFIX.find(line) {
        Some(m) => {
            spans.push(Span::styled(&line[..7], theme.commit_hash));
            spans.push(Span::raw(&line[7..m.end()]));
            &line[m.end()..]
        }
        None => line,
    };

    let mut last = 0;
    for m in TICKET_REGEX.find_iter(rest) {
        if m.start() > last {
            spans.push(Span::raw(&rest[last..m.start()]));
        }
        spans.push(Span::styled(m.as_str(), theme.commit_ticket));
        last = m.end();
    }
    if last < rest.len() {
        spans.push(Span::raw(&rest[last..]));
    }
    Line::from(spans)
}
