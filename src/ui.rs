use ep_cohesion::engine::{ComparisonReport, NonCoherentVoting};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Agreement,
    NonCoherent,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Agreement => Page::NonCoherent,
            Page::NonCoherent => Page::Agreement,
        }
    }

    pub fn previous(&self) -> Self {
        // Two pages: previous is next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Agreement => "Group Agreement",
            Page::NonCoherent => "Non-coherent Roll-calls",
        }
    }
}

pub struct App {
    pub report: ComparisonReport,

    /// Where the report came from (run id or file)
    pub origin: String,

    pub current_page: Page,
    pub agreement_state: TableState,
    pub votings_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(report: ComparisonReport, origin: impl Into<String>) -> Self {
        let mut agreement_state = TableState::default();
        if !report.per_group.is_empty() {
            agreement_state.select(Some(0));
        }

        let mut votings_state = TableState::default();
        if !report.non_coherent_votings.is_empty() {
            votings_state.select(Some(0));
        }

        Self {
            report,
            origin: origin.into(),
            current_page: Page::Agreement,
            agreement_state,
            votings_state,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn selected_voting(&self) -> Option<&NonCoherentVoting> {
        self.votings_state
            .selected()
            .and_then(|i| self.report.non_coherent_votings.get(i))
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Agreement => self.report.per_group.len(),
            Page::NonCoherent => self.report.non_coherent_votings.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Agreement => &mut self.agreement_state,
            Page::NonCoherent => &mut self.votings_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) => (i + PAGE_STEP).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.current_state();
        let i = state.selected().map_or(0, |i| i.saturating_sub(PAGE_STEP));
        state.select(Some(i));
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        if len > 0 {
            self.current_state().select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.current_state().select(Some(0)),
                KeyCode::End => app.select_last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::NonCoherent {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_votings(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Agreement => render_agreement(f, chunks[1], app),
            Page::NonCoherent => render_votings(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Agreement, Page::NonCoherent].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.report.party.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw(format!(
        "  {} → {}  |  ",
        app.report.start_date, app.report.end_date
    )));
    tab_spans.push(Span::styled(
        format!("Cohesion: {}", format_percentage(app.report.overall_average_cohesion)),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_agreement(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Group", "Same", "Different", "Agreement"]);

    let rows = app.report.per_group.iter().map(|(group, agreement)| {
        let percentage = app.report.per_group_percentages.get(group).copied().flatten();
        let color = match percentage {
            Some(p) if p >= 75.0 => Color::Green,
            Some(p) if p >= 50.0 => Color::Yellow,
            Some(_) => Color::Red,
            None => Color::DarkGray,
        };

        Row::new(vec![
            Cell::from(truncate(group, 60)),
            Cell::from(agreement.same.to_string()),
            Cell::from(agreement.different.to_string()),
            Cell::from(format_percentage(percentage)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(40),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Majority agreement per group "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.agreement_state);
}

fn render_votings(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Date", "Cohesion", "Roll-call"]);

    let rows = app.report.non_coherent_votings.iter().map(|voting| {
        let color = if voting.cohesion >= 75.0 { Color::Yellow } else { Color::Red };
        Row::new(vec![
            Cell::from(voting.date.to_string()),
            Cell::from(format!("{:.1}%", voting.cohesion)).style(Style::default().fg(color)),
            Cell::from(truncate(&voting.identifier, 80)),
        ])
        .height(1)
    });

    let title = format!(
        " {} of {} roll-calls ",
        app.report.non_coherent_votings.len(),
        app.report.diagnostics.roll_calls
    );

    let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(10), Constraint::Min(20)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.votings_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.selected_voting() {
        Some(voting) => vec![
            Line::from(vec![
                Span::styled("Date: ", Style::default().fg(Color::Yellow)),
                Span::raw(voting.date.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Cohesion: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("{:.2}%", voting.cohesion)),
            ]),
            Line::from(""),
            Line::from(Span::styled("Roll-call:", Style::default().fg(Color::Yellow))),
            Line::from(voting.identifier.clone()),
        ],
        None => vec![Line::from("No roll-call selected")],
    };

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Detail "),
        );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let diagnostics = &app.report.diagnostics;

    let status_spans = vec![
        Span::styled(format!(" {} ", app.origin), Style::default().fg(Color::Cyan)),
        Span::raw(format!(
            "| {} days, {} without votes, {} unattributable, {} unresolved voters | ",
            diagnostics.days_examined,
            diagnostics.days_without_document,
            diagnostics.days_unattributable,
            diagnostics.unresolved_voters
        )),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn format_percentage(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |p| format!("{:.1}%", p))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ep_cohesion::engine::{Agreement, Diagnostics};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn report_with_votings(count: usize) -> ComparisonReport {
        let date = NaiveDate::from_ymd_opt(2021, 3, 10).unwrap();
        let mut per_group = BTreeMap::new();
        per_group.insert("Alpha".to_string(), Agreement { same: 3, different: 1 });
        per_group.insert("Beta".to_string(), Agreement::default());

        ComparisonReport {
            party: "Test Party (Hungary)".to_string(),
            start_date: date,
            end_date: date,
            per_group_percentages: per_group
                .iter()
                .map(|(name, agreement)| (name.clone(), agreement.percentage()))
                .collect(),
            per_group,
            overall_average_cohesion: Some(90.0),
            non_coherent_votings: (0..count)
                .map(|i| NonCoherentVoting {
                    date,
                    identifier: format!("vote {}", i),
                    cohesion: 50.0,
                })
                .collect(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_navigation_wraps_around() {
        let mut app = App::new(report_with_votings(3), "test");
        app.next_page();
        assert_eq!(app.current_page, Page::NonCoherent);

        app.previous();
        assert_eq!(app.votings_state.selected(), Some(2));
        app.next();
        assert_eq!(app.votings_state.selected(), Some(0));
        assert_eq!(app.selected_voting().unwrap().identifier, "vote 0");
    }

    #[test]
    fn test_paging_is_clamped() {
        let mut app = App::new(report_with_votings(25), "test");
        app.next_page();

        app.page_down();
        assert_eq!(app.votings_state.selected(), Some(20));
        app.page_down();
        assert_eq!(app.votings_state.selected(), Some(24));
        app.page_up();
        assert_eq!(app.votings_state.selected(), Some(4));
        app.page_up();
        assert_eq!(app.votings_state.selected(), Some(0));
    }

    #[test]
    fn test_pages_keep_separate_selection() {
        let mut app = App::new(report_with_votings(0), "test");
        app.next();
        assert_eq!(app.agreement_state.selected(), Some(1));

        app.next_page();
        app.next();
        assert_eq!(app.votings_state.selected(), None, "Empty list stays unselected");
        assert!(app.selected_voting().is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("DONÁTH", 10), "DONÁTH");
        assert_eq!(truncate("Magyar Szocialista Párt", 10), "Magyar ...");
    }
}
