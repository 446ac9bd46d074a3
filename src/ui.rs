use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use expense_tracker::display::{format_amount, format_date, truncate};
use expense_tracker::tracker::{AssumeYes, CategoryFilter, ExpenseTracker, Notice, NoticeLevel, Submission, DELETE_PROMPT};
use expense_tracker::{Expense, ExpenseCandidate, ExpenseId, KeyValueStore, DATE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Categories,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::Categories,
            Page::Categories => Page::Expenses,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Categories => "By Category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Adding,
    ConfirmDelete(ExpenseId),
}

const FORM_LABELS: [&str; 4] = ["Amount", "Category", "Description", "Date"];
const CATEGORY_FIELD: usize = 1;

/// The add-expense form. Text is kept raw; validation happens on submit.
#[derive(Debug, Clone, Default)]
pub struct AddForm {
    pub fields: [String; 4],
    pub focus: usize,
}

impl AddForm {
    fn fresh(default_category: &str) -> Self {
        AddForm {
            fields: [
                String::new(),
                default_category.to_string(),
                String::new(),
                Local::now().date_naive().format(DATE_FORMAT).to_string(),
            ],
            focus: 0,
        }
    }

    fn candidate(&self) -> ExpenseCandidate {
        let [amount, category, description, date] = &self.fields;
        ExpenseCandidate::new(amount.as_str(), category.as_str(), description.as_str(), date.as_str())
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FORM_LABELS.len();
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + FORM_LABELS.len() - 1) % FORM_LABELS.len();
    }
}

pub struct App<S: KeyValueStore> {
    pub tracker: ExpenseTracker<S>,
    pub state: TableState,
    pub current_page: Page,
    pub mode: Mode,
    pub form: AddForm,
    pub notice: Option<Notice>,
    pub show_detail: bool,
    categories: Vec<String>,
    currency_symbol: String,
    /// 0 = all categories, n = categories[n - 1]
    filter_index: usize,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(mut tracker: ExpenseTracker<S>, categories: Vec<String>, currency_symbol: impl Into<String>) -> Self {
        let notice = tracker.take_notices().pop();

        let mut app = Self {
            tracker,
            state: TableState::default(),
            current_page: Page::Expenses,
            mode: Mode::Browse,
            form: AddForm::default(),
            notice,
            show_detail: false,
            categories,
            currency_symbol: currency_symbol.into(),
            filter_index: 0,
        };
        app.sync_selection();
        app
    }

    pub fn visible_len(&self) -> usize {
        self.tracker.visible().len()
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        let i = self.state.selected()?;
        self.tracker.visible().get(i).copied()
    }

    /// Keep the table selection inside the visible rows.
    fn sync_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    fn apply_filter_index(&mut self, index: usize) {
        self.filter_index = index;
        let filter = match index {
            0 => CategoryFilter::All,
            n => CategoryFilter::Category(self.categories[n - 1].clone()),
        };
        self.tracker.set_filter(filter);
        self.state.select(Some(0));
        self.sync_selection();
    }

    pub fn next_filter(&mut self) {
        let index = (self.filter_index + 1) % (self.categories.len() + 1);
        self.apply_filter_index(index);
    }

    pub fn previous_filter(&mut self) {
        let count = self.categories.len() + 1;
        self.apply_filter_index((self.filter_index + count - 1) % count);
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter_index(0);
    }

    pub fn next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn start_adding(&mut self) {
        let default_category = match self.tracker.filter() {
            CategoryFilter::Category(c) => c.clone(),
            CategoryFilter::All => self.categories.first().cloned().unwrap_or_default(),
        };
        self.form = AddForm::fresh(&default_category);
        self.mode = Mode::Adding;
    }

    pub fn submit_form(&mut self) {
        let submission = self.tracker.submit_expense(&self.form.candidate());
        self.notice = Some(submission.notice().clone());

        if let Submission::Added { .. } = submission {
            self.mode = Mode::Browse;
            self.state.select(Some(0));
            self.sync_selection();
        }
    }

    pub fn request_delete(&mut self) {
        if let Some(id) = self.selected_expense().map(|e| e.id().clone()) {
            self.mode = Mode::ConfirmDelete(id);
        }
    }

    /// Answer the open confirmation popup.
    pub fn answer_delete(&mut self, confirmed: bool) {
        if let Mode::ConfirmDelete(id) = std::mem::replace(&mut self.mode, Mode::Browse) {
            if confirmed {
                self.notice = self.tracker.request_delete(&id, &mut AssumeYes);
                self.sync_selection();
            }
        }
    }

    fn cycle_form_category(&mut self, forward: bool) {
        if self.categories.is_empty() {
            return;
        }
        let current = &self.form.fields[CATEGORY_FIELD];
        let count = self.categories.len();
        let next = match self.categories.iter().position(|c| c == current) {
            Some(i) if forward => (i + 1) % count,
            Some(i) => (i + count - 1) % count,
            None => 0,
        };
        self.form.fields[CATEGORY_FIELD] = self.categories[next].clone();
    }

    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode.clone() {
            Mode::ConfirmDelete(_) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.answer_delete(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.answer_delete(false),
                _ => {}
            },
            Mode::Adding => match key.code {
                KeyCode::Esc => self.mode = Mode::Browse,
                KeyCode::Enter => self.submit_form(),
                KeyCode::Tab | KeyCode::Down => self.form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
                KeyCode::Left if self.form.focus == CATEGORY_FIELD => self.cycle_form_category(false),
                KeyCode::Right if self.form.focus == CATEGORY_FIELD => self.cycle_form_category(true),
                KeyCode::Backspace => {
                    self.form.fields[self.form.focus].pop();
                }
                KeyCode::Char(c) => self.form.fields[self.form.focus].push(c),
                _ => {}
            },
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
                KeyCode::Tab | KeyCode::BackTab => self.current_page = self.current_page.next(),
                KeyCode::Enter => self.show_detail = !self.show_detail,
                KeyCode::Char('a') => self.start_adding(),
                KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
                KeyCode::Char('f') => self.next_filter(),
                KeyCode::Char('F') => self.previous_filter(),
                KeyCode::Char('c') => self.clear_filter(),
                KeyCode::Down | KeyCode::Char('j') => self.next(),
                KeyCode::Up | KeyCode::Char('k') => self.previous(),
                KeyCode::Home => self.sync_first(),
                KeyCode::End => {
                    let len = self.visible_len();
                    if len > 0 {
                        self.state.select(Some(len - 1));
                    }
                }
                _ => {}
            },
        }
        false
    }

    fn sync_first(&mut self) {
        self.state.select(Some(0));
        self.sync_selection();
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with totals
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Notice + key help
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Expenses if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Expenses => render_table(f, chunks[1], app),
        Page::Categories => render_categories(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    match app.mode {
        Mode::Adding => render_form(f, app),
        Mode::ConfirmDelete(_) => render_confirm(f, app),
        Mode::Browse => {}
    }
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut spans = vec![];
    for (i, page) in [Page::Expenses, Page::Categories].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Total: {}", format_amount(app.tracker.total(), &app.currency_symbol)),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));

    if let CategoryFilter::Category(c) = app.tracker.filter() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("{}: {}", c, format_amount(app.tracker.filtered_total(), &app.currency_symbol)),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_table<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows: Vec<Row> = app
        .tracker
        .visible()
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(format_date(e.date())),
                Cell::from(truncate(e.category(), 16)),
                Cell::from(truncate(e.description(), 40)),
                Cell::from(format_amount(e.amount(), &app.currency_symbol)).style(Style::default().fg(Color::Red)),
            ])
            .height(1)
        })
        .collect();

    let title = match app.tracker.filter() {
        CategoryFilter::All => " Expenses ".to_string(),
        CategoryFilter::Category(c) => format!(" Expenses - {} ", c),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(18),
            Constraint::Min(20),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Date", "Category", "Description", "Amount"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_categories<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let total = app.tracker.total();

    let rows: Vec<Row> = app
        .tracker
        .category_totals()
        .into_iter()
        .map(|(category, amount)| {
            let count = app.tracker.store().by_category(&category).len();
            let share = if total.is_zero() {
                String::from("-")
            } else {
                format!("{:.1}%", (amount / total * rust_decimal::Decimal::ONE_HUNDRED).round_dp(1))
            };
            Row::new(vec![
                Cell::from(category),
                Cell::from(count.to_string()),
                Cell::from(format_amount(amount, &app.currency_symbol)).style(Style::default().fg(Color::Red)),
                Cell::from(share),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Category", "Count", "Total", "Share"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Spending by Category "),
    );

    f.render_widget(table, area);
}

fn render_detail_panel<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Expense Details ");

    let Some(e) = app.selected_expense() else {
        f.render_widget(Paragraph::new("No expense selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Date: ", label), Span::raw(format_date(e.date()))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::styled(format_amount(e.amount(), &app.currency_symbol), Style::default().fg(Color::Red)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  Category: ", label), Span::raw(e.category().to_string())]),
        Line::from(""),
        Line::from(vec![Span::styled("  Description: ", label)]),
        Line::from(format!("  {}", wrap_text(e.description(), 35))),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(vec![
            Span::styled("  Added: ", label),
            Span::styled(
                e.created_at().format("%Y-%m-%d %H:%M UTC").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Id: ", label),
            Span::styled(e.id().to_string(), Style::default().fg(Color::DarkGray)),
        ]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut spans = vec![];

    if let Some(notice) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        spans.push(Span::styled(format!(" {} ", notice), Style::default().fg(color)));
        spans.push(Span::raw("|"));
    }

    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    spans.push(Span::styled(
        format!(" Row: {}/{} ", selected, app.visible_len()),
        Style::default().fg(Color::Cyan),
    ));

    for (key, action) in [("a", "Add"), ("d", "Delete"), ("f", "Filter"), ("c", "Clear"), ("Tab", "Page")] {
        spans.push(Span::raw("| "));
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {} ", action)));
    }
    spans.push(Span::raw("| "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White)));

    f.render_widget(status_bar, area);
}

fn render_form<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let area = centered_rect(50, 12, f.size());

    let mut content = vec![Line::from("")];
    for (i, label) in FORM_LABELS.iter().enumerate() {
        let focused = i == app.form.focus;
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let cursor = if focused { "_" } else { "" };
        content.push(Line::from(vec![
            Span::styled(format!("  {:<12} ", label), style),
            Span::raw(format!("{}{}", app.form.fields[i], cursor)),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Enter save · Tab next · ←/→ category · Esc cancel",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Add Expense "),
    );

    f.render_widget(Clear, area);
    f.render_widget(form, area);
}

fn render_confirm<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let area = centered_rect(50, 7, f.size());

    let subject = app
        .selected_expense()
        .map(|e| format!("{} - {}", e.description(), format_amount(e.amount(), &app.currency_symbol)))
        .unwrap_or_default();

    let content = vec![
        Line::from(""),
        Line::from(format!("  {}", DELETE_PROMPT)),
        Line::from(Span::styled(format!("  {}", subject), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" delete   "),
            Span::styled("n", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" keep"),
        ]),
    ];

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete Expense "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.chars().count() + word.chars().count() + 1 > width {
            if !result.is_empty() {
                result.push_str("\n  ");
            }
            result.push_str(&current_line);
            current_line.clear();
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n  ");
        }
        result.push_str(&current_line);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_tracker::tracker::{MSG_ADDED, MSG_DELETED};
    use expense_tracker::{MemoryStore, DEFAULT_SLOT_KEY};
    use rust_decimal_macros::dec;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app_with(expenses: &[(&str, &str, &str, &str)]) -> App<MemoryStore> {
        let mut tracker = ExpenseTracker::open(MemoryStore::new(), DEFAULT_SLOT_KEY);
        for (amount, category, description, date) in expenses {
            tracker.submit_expense(&ExpenseCandidate::new(*amount, *category, *description, *date));
        }
        let categories = vec!["Food".to_string(), "Transport".to_string()];
        App::new(tracker, categories, "$")
    }

    #[test]
    fn test_add_through_form() {
        let mut app = app_with(&[]);

        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.mode, Mode::Adding);
        assert_eq!(app.form.fields[CATEGORY_FIELD], "Food");

        type_text(&mut app, "12.50");
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "Bus pass");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.notice, Some(Notice::success(MSG_ADDED)));
        let added = app.selected_expense().unwrap();
        assert_eq!(added.category(), "Transport");
        assert_eq!(added.amount(), dec!(12.50));
    }

    #[test]
    fn test_rejected_form_stays_open() {
        let mut app = app_with(&[]);

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "0");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Adding);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
        assert_eq!(app.tracker.expenses().len(), 0);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut app = app_with(&[("5", "Food", "Bagel", "2024-01-10")]);

        app.handle_key(key(KeyCode::Char('d')));
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.tracker.expenses().len(), 1);

        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.notice, Some(Notice::success(MSG_DELETED)));
        assert!(app.tracker.expenses().is_empty());
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_filter_cycles_through_categories() {
        let mut app = app_with(&[
            ("12.50", "Food", "Lunch", "2024-01-10"),
            ("7.25", "Transport", "Bus", "2024-01-11"),
        ]);

        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.tracker.filter(), &CategoryFilter::Category("Food".to_string()));
        assert_eq!(app.visible_len(), 1);

        app.handle_key(key(KeyCode::Char('f')));
        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.tracker.filter(), &CategoryFilter::All);
        assert_eq!(app.visible_len(), 2);

        app.handle_key(key(KeyCode::Char('F')));
        assert_eq!(app.tracker.filter(), &CategoryFilter::Category("Transport".to_string()));
        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(app.tracker.filter(), &CategoryFilter::All);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app_with(&[
            ("1", "Food", "A", "2024-01-10"),
            ("2", "Food", "B", "2024-01-11"),
        ]);

        assert_eq!(app.state.selected(), Some(0));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.state.selected(), Some(1));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.state.selected(), Some(0));
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short", 10), "short");
        assert_eq!(wrap_text("one two three", 7), "one two\n  three");
    }
}
