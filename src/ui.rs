use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::{
    CategoryTotal, Expense, ExpenseDraft, ExpenseFilter, ExpenseQuery, ExpenseRepository,
    ExpenseStore, FacetField, MonthlyTotal, SortKey, SortOrder, ALL_CATEGORIES, ALL_LOCATIONS,
    ALL_MONTHS,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row,
        Table, TableState,
    },
    Frame, Terminal,
};
use std::io;

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const FIELD_LABELS: [&str; 5] = ["Date", "Category", "Amount", "Description", "Location"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Trends,
    Categories,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::Trends,
            Page::Trends => Page::Categories,
            Page::Categories => Page::Expenses,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Expenses => Page::Categories,
            Page::Trends => Page::Expenses,
            Page::Categories => Page::Trends,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Trends => "Trends",
            Page::Categories => "Categories",
        }
    }
}

// ============================================================================
// FORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(i64),
}

/// Add/edit dialog. Fields hold raw text in `FIELD_LABELS` order.
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub mode: FormMode,
    pub fields: [String; 5],
    pub focus: usize,
}

impl ExpenseForm {
    pub fn add(today: NaiveDate) -> Self {
        ExpenseForm {
            mode: FormMode::Add,
            fields: [
                today.format(DATE_INPUT_FORMAT).to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
            focus: 1,
        }
    }

    pub fn edit(expense: &Expense) -> Self {
        let draft = ExpenseDraft::from_expense(expense);
        ExpenseForm {
            mode: FormMode::Edit(expense.id),
            fields: [
                expense.date.format(DATE_INPUT_FORMAT).to_string(),
                draft.category,
                draft.amount,
                draft.description,
                draft.location,
            ],
            focus: 0,
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Add => " Add Expense ".to_string(),
            FormMode::Edit(id) => format!(" Edit Expense #{} ", id),
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn input(&mut self, c: char) {
        self.fields[self.focus].push(c);
    }

    fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }

    /// Turn the typed text into a draft. A blank date is passed on as
    /// missing so the repository reports it; unreadable dates stop here.
    pub fn to_draft(&self) -> Result<ExpenseDraft, String> {
        let date_text = self.fields[0].trim();
        let date = if date_text.is_empty() {
            None
        } else {
            let parsed = NaiveDate::parse_from_str(date_text, DATE_INPUT_FORMAT)
                .map_err(|_| "Invalid date. Use YYYY-MM-DD.".to_string())?;
            Some(parsed)
        };

        Ok(ExpenseDraft::new(
            date,
            self.fields[1].clone(),
            self.fields[2].clone(),
            self.fields[3].clone(),
            self.fields[4].clone(),
        ))
    }
}

// ============================================================================
// APP STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Current filter choices, as labels. The "All ..." labels mean no filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub category: String,
    pub location: String,
    pub month: String,
}

impl Default for FilterSelection {
    fn default() -> Self {
        FilterSelection {
            category: ALL_CATEGORIES.to_string(),
            location: ALL_LOCATIONS.to_string(),
            month: ALL_MONTHS.to_string(),
        }
    }
}

impl FilterSelection {
    pub fn to_filter(&self) -> ExpenseFilter {
        ExpenseFilter::from_selection(&self.category, &self.location, &self.month)
    }
}

pub struct App<S: ExpenseStore> {
    repo: ExpenseRepository<S>,
    pub expenses: Vec<Expense>,
    /// Total of the rows currently shown
    pub view_total: f64,
    pub trends: Vec<MonthlyTotal>,
    pub category_totals: Vec<CategoryTotal>,
    pub state: TableState,
    pub current_page: Page,
    pub selection: FilterSelection,
    pub category_choices: Vec<String>,
    pub location_choices: Vec<String>,
    pub month_choices: Vec<String>,
    pub sort: Option<(SortKey, SortOrder)>,
    pub form: Option<ExpenseForm>,
    pub status: Option<Status>,
}

impl<S: ExpenseStore> App<S> {
    pub fn new(repo: ExpenseRepository<S>) -> Result<Self> {
        let mut app = Self {
            repo,
            expenses: Vec::new(),
            view_total: 0.0,
            trends: Vec::new(),
            category_totals: Vec::new(),
            state: TableState::default(),
            current_page: Page::Expenses,
            selection: FilterSelection::default(),
            category_choices: Vec::new(),
            location_choices: Vec::new(),
            month_choices: Vec::new(),
            sort: None,
            form: None,
            status: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload everything on screen from the repository
    pub fn refresh(&mut self) -> Result<()> {
        self.category_choices = with_sentinel(
            ALL_CATEGORIES,
            self.repo.get_distinct_values(FacetField::Category)?,
        );
        self.location_choices = with_sentinel(
            ALL_LOCATIONS,
            self.repo.get_distinct_values(FacetField::Location)?,
        );

        let mut months: Vec<String> = self
            .repo
            .get_distinct_months()?
            .iter()
            .filter_map(|year_month| year_month.get(5..7).map(str::to_string))
            .collect();
        months.sort();
        months.dedup();
        self.month_choices = with_sentinel(ALL_MONTHS, months);

        // A choice can vanish when its last expense is removed or edited away
        if !self.category_choices.contains(&self.selection.category) {
            self.selection.category = ALL_CATEGORIES.to_string();
        }
        if !self.location_choices.contains(&self.selection.location) {
            self.selection.location = ALL_LOCATIONS.to_string();
        }
        if !self.month_choices.contains(&self.selection.month) {
            self.selection.month = ALL_MONTHS.to_string();
        }

        let filter = self.selection.to_filter();
        let unfiltered = filter.is_empty();
        let query = ExpenseQuery {
            filter,
            sort: self.sort,
        };

        self.expenses = self.repo.filter_expenses(&query)?;
        self.view_total = if unfiltered {
            self.repo.get_total_expenses()?
        } else {
            self.expenses.iter().map(|e| e.amount).sum()
        };
        self.trends = self.repo.get_expense_trends()?;
        self.category_totals = self.repo.get_category_totals()?;

        let len = self.expenses.len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }

        Ok(())
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.state.selected().and_then(|i| self.expenses.get(i))
    }

    /// Handle one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.form.is_some() {
            self.handle_form_key(key)?;
            return Ok(false);
        }

        self.status = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home if !self.expenses.is_empty() => self.state.select(Some(0)),
            KeyCode::End if !self.expenses.is_empty() => {
                self.state.select(Some(self.expenses.len() - 1))
            }
            KeyCode::Char('n') => self.form = Some(ExpenseForm::add(Local::now().date_naive())),
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('x') | KeyCode::Delete => self.remove_selected()?,
            KeyCode::Char('f') => {
                self.selection.category = cycle(&self.category_choices, &self.selection.category);
                self.refresh()?;
            }
            KeyCode::Char('l') => {
                self.selection.location = cycle(&self.location_choices, &self.selection.location);
                self.refresh()?;
            }
            KeyCode::Char('m') => {
                self.selection.month = cycle(&self.month_choices, &self.selection.month);
                self.refresh()?;
            }
            KeyCode::Char('c') => {
                self.selection = FilterSelection::default();
                self.current_page = Page::Expenses;
                self.refresh()?;
            }
            KeyCode::Char('d') => self.toggle_sort(SortKey::Date)?,
            KeyCode::Char('a') => self.toggle_sort(SortKey::Amount)?,
            _ => {}
        }

        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.status = None;
            }
            KeyCode::Enter => self.submit_form()?,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input(c),
            _ => {}
        }

        Ok(())
    }

    fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.as_ref() else {
            return Ok(());
        };
        let mode = form.mode;

        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                self.status = Some(Status::Error(message));
                return Ok(());
            }
        };

        let saved = match mode {
            FormMode::Add => self.repo.add_expense(&draft),
            FormMode::Edit(id) => self.repo.edit_expense(id, &draft),
        };

        match saved {
            Ok(expense) => {
                self.form = None;
                self.refresh()?;
                if let Some(i) = self.expenses.iter().position(|e| e.id == expense.id) {
                    self.state.select(Some(i));
                }
                self.status = Some(Status::Info(format!("Saved expense #{}", expense.id)));
            }
            // The form stays open with the offending field focused
            Err(e) if e.is_recoverable() => {
                if let (Some(form), Some(invalid)) = (self.form.as_mut(), e.as_validation()) {
                    if let Some(i) = FIELD_LABELS
                        .iter()
                        .position(|label| label.eq_ignore_ascii_case(invalid.field()))
                    {
                        form.focus = i;
                    }
                }
                self.status = Some(Status::Error(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    fn open_edit_form(&mut self) {
        match self.selected_expense().map(ExpenseForm::edit) {
            Some(form) => self.form = Some(form),
            None => self.status = Some(Status::Error("No expense selected.".to_string())),
        }
    }

    fn remove_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected_expense().map(|e| e.id) else {
            return Ok(());
        };

        self.repo.remove_expense(id)?;
        self.refresh()?;
        self.status = Some(Status::Info(format!("Removed expense #{}", id)));

        Ok(())
    }

    fn toggle_sort(&mut self, key: SortKey) -> Result<()> {
        self.sort = match self.sort {
            Some((current, order)) if current == key => Some((key, order.reversed())),
            _ => Some((key, SortOrder::Ascending)),
        };
        self.refresh()
    }

    pub fn next(&mut self) {
        let len = self.expenses.len();
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
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.expenses.is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }
}

fn with_sentinel(sentinel: &str, values: Vec<String>) -> Vec<String> {
    let mut choices = Vec::with_capacity(values.len() + 1);
    choices.push(sentinel.to_string());
    choices.extend(values);
    choices
}

/// Next choice after `current`, wrapping around. `choices` always starts
/// with its sentinel, so it is never empty.
fn cycle(choices: &[String], current: &str) -> String {
    let index = choices.iter().position(|c| c == current).unwrap_or(0);
    choices[(index + 1) % choices.len()].clone()
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui<S: ExpenseStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal before reporting anything
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend, S: ExpenseStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key)? {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui<S: ExpenseStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Expenses => render_table(f, chunks[1], app),
        Page::Trends => render_trends(f, chunks[1], app),
        Page::Categories => render_categories(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(form) = &app.form {
        render_form(f, f.size(), form);
    }
}

fn render_header<S: ExpenseStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let pages = [Page::Expenses, Page::Trends, Page::Categories];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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
        format!("Total Expenses: {}", format_currency(app.view_total)),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!(
            "{} · {} · {}",
            app.selection.category,
            app.selection.location,
            month_label(&app.selection.month)
        ),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table<S: ExpenseStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let arrow = |key: SortKey| match app.sort {
        Some((current, SortOrder::Ascending)) if current == key => " ▲",
        Some((current, SortOrder::Descending)) if current == key => " ▼",
        _ => "",
    };

    let header_cells = [
        "ID".to_string(),
        format!("Date{}", arrow(SortKey::Date)),
        "Category".to_string(),
        format!("Amount{}", arrow(SortKey::Amount)),
        "Description".to_string(),
        "Location".to_string(),
    ]
    .into_iter()
    .map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.expenses.iter().map(|expense| {
        let cells = vec![
            Cell::from(expense.id.to_string()),
            Cell::from(format_date(expense.date)),
            Cell::from(truncate(&expense.category, 18)),
            Cell::from(format_currency(expense.amount)).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&expense.description, 32)),
            Cell::from(truncate(&expense.location, 20)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(13),
            Constraint::Length(20),
            Constraint::Length(14),
            Constraint::Length(34),
            Constraint::Length(22),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Expenses ({}) ", app.expenses.len())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_trends<S: ExpenseStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Expense Trends Over Time ");

    if app.trends.is_empty() {
        f.render_widget(Paragraph::new("  No expenses recorded yet").block(block), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    let points: Vec<(f64, f64)> = app
        .trends
        .iter()
        .enumerate()
        .map(|(i, trend)| (i as f64, trend.total))
        .collect();
    let max = app.trends.iter().map(|t| t.total).fold(0.0, f64::max);
    let last = (app.trends.len() - 1) as f64;

    let mut x_labels = vec![Span::raw(app.trends[0].month.clone())];
    if app.trends.len() > 1 {
        x_labels.push(Span::raw(app.trends[app.trends.len() - 1].month.clone()));
    }

    let dataset = Dataset::default()
        .name("Total Amount")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("Month")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, last.max(1.0)])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Total Amount")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max * 1.1])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format_currency(max / 2.0)),
                    Span::raw(format_currency(max)),
                ]),
        );

    f.render_widget(chart, chunks[0]);

    let rows = app.trends.iter().map(|trend| {
        Row::new(vec![
            Cell::from(trend.month.clone()),
            Cell::from(format_currency(trend.total)),
        ])
    });
    let table = Table::new(rows, [Constraint::Length(9), Constraint::Min(10)])
        .header(Row::new(vec!["Month", "Total"]).style(Style::default().fg(Color::Yellow)))
        .block(Block::default().borders(Borders::ALL).title(" By Month "));

    f.render_widget(table, chunks[1]);
}

fn render_categories<S: ExpenseStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Expense Distribution by Category ");

    if app.category_totals.is_empty() {
        f.render_widget(Paragraph::new("  No expenses recorded yet").block(block), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let bars: Vec<(&str, u64)> = app
        .category_totals
        .iter()
        .map(|c| (c.category.as_str(), c.total.round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(bars.as_slice())
        .bar_width(10)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .label_style(Style::default().fg(Color::White));

    f.render_widget(chart, chunks[0]);

    let grand_total: f64 = app.category_totals.iter().map(|c| c.total).sum();
    let rows = app.category_totals.iter().map(|c| {
        let share = if grand_total > 0.0 { c.total * 100.0 / grand_total } else { 0.0 };
        Row::new(vec![
            Cell::from(c.category.clone()),
            Cell::from(format_currency(c.total)),
            Cell::from(format!("{:.1}%", share)),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Length(24), Constraint::Length(16), Constraint::Length(8)],
    )
    .header(
        Row::new(vec!["Category", "Total", "Share"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Totals "));

    f.render_widget(table, chunks[1]);
}

fn render_form(f: &mut Frame, area: Rect, form: &ExpenseForm) {
    let popup = centered_rect(60, 50, area);

    let mut content = vec![Line::from("")];
    for (i, label) in FIELD_LABELS.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let cursor = if focused { "▏" } else { "" };

        content.push(Line::from(vec![
            Span::styled(format!("  {:<12}", format!("{}:", label)), label_style),
            Span::raw(form.fields[i].clone()),
            Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ]));
        content.push(Line::from(""));
    }
    content.push(Line::from(Span::styled(
        "  Date as YYYY-MM-DD · Tab next field · Enter save · Esc cancel",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let dialog = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(form.title()),
    );

    f.render_widget(Clear, popup);
    f.render_widget(dialog, popup);
}

fn render_status_bar<S: ExpenseStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let status_spans = match &app.status {
        Some(Status::Error(message)) => vec![Span::styled(
            format!(" ✗ {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
        Some(Status::Info(message)) => vec![Span::styled(
            format!(" ✓ {}", message),
            Style::default().fg(Color::Green),
        )],
        None => key_help(app),
    };

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn key_help<S: ExpenseStore>(app: &App<S>) -> Vec<Span<'static>> {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.expenses.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        key("n"),
        Span::raw(" Add "),
        key("e"),
        Span::raw(" Edit "),
        key("x"),
        Span::raw(" Remove | "),
        key("f/l/m"),
        Span::raw(" Filter "),
        key("c"),
        Span::raw(" Clear | "),
        key("d/a"),
        Span::raw(" Sort | "),
        key("Tab"),
        Span::raw(" Page | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ]
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

// ============================================================================
// FORMATTING
// ============================================================================

/// "$1,234.50"
fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();

    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// "15-Jan-2024"
fn format_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// "02" → "February"; anything else (the sentinel) is shown as is
fn month_label(month: &str) -> String {
    month
        .parse::<u32>()
        .ok()
        .and_then(|m| NaiveDate::from_ymd_opt(2000, m, 1))
        .map(|d| d.format("%B").to_string())
        .unwrap_or_else(|| month.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use expense_tracker::MemoryStore;

    fn press(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn seeded_app() -> App<MemoryStore> {
        let mut repo = ExpenseRepository::new(MemoryStore::new());
        for (date, category, amount, description, location) in [
            ("2024-01-15", "Food", "12.50", "Lunch", "Cafe"),
            ("2024-02-01", "Food", "20.00", "Dinner", "Cafe"),
            ("2024-02-10", "Transit", "5.00", "Bus", "City"),
        ] {
            repo.add_expense(&ExpenseDraft::new(
                NaiveDate::parse_from_str(date, DATE_INPUT_FORMAT).ok(),
                category,
                amount,
                description,
                location,
            ))
            .unwrap();
        }
        App::new(repo).unwrap()
    }

    #[test]
    fn test_add_through_form_reports_validation_errors() {
        let mut app = App::new(ExpenseRepository::new(MemoryStore::new())).unwrap();
        assert_eq!(app.view_total, 0.0);

        press(&mut app, KeyCode::Char('n'));
        assert!(app.form.is_some());

        // focus starts on Category; the date is pre-filled with today
        type_text(&mut app, "Food");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "abc");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Lunch");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Cafe");
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.status,
            Some(Status::Error("Invalid amount. Please enter a number.".to_string()))
        );
        assert!(app.expenses.is_empty());
        assert_eq!(app.form.as_ref().map(|f| f.focus), Some(2));

        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "12.50");
        press(&mut app, KeyCode::Enter);

        assert!(app.form.is_none());
        assert_eq!(app.expenses.len(), 1);
        assert_eq!(app.expenses[0].amount, 12.5);
        assert_eq!(app.view_total, 12.5);
        assert_eq!(app.status, Some(Status::Info("Saved expense #1".to_string())));
    }

    #[test]
    fn test_bad_or_missing_date() {
        let mut app = App::new(ExpenseRepository::new(MemoryStore::new())).unwrap();
        press(&mut app, KeyCode::Char('n'));

        let form = app.form.as_mut().unwrap();
        form.fields = [
            "15/01/2024".to_string(),
            "Food".to_string(),
            "3".to_string(),
            "Tea".to_string(),
            "Cafe".to_string(),
        ];
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status, Some(Status::Error("Invalid date. Use YYYY-MM-DD.".to_string())));

        // Parses, but has no four-digit year; the store never sees it
        let form = app.form.as_mut().unwrap();
        form.fields[0] = "+10000-01-15".to_string();
        form.focus = 3;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status, Some(Status::Error("Invalid date. Use YYYY-MM-DD.".to_string())));
        assert_eq!(app.form.as_ref().map(|f| f.focus), Some(0));
        assert!(app.trends.is_empty());

        app.form.as_mut().unwrap().fields[0].clear();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status, Some(Status::Error("Please select a date.".to_string())));

        press(&mut app, KeyCode::Esc);
        assert!(app.form.is_none());
        assert!(app.expenses.is_empty());
    }

    #[test]
    fn test_filter_cycling() {
        let mut app = seeded_app();
        assert_eq!(app.category_choices, vec![ALL_CATEGORIES, "Food", "Transit"]);
        assert_eq!(app.month_choices, vec![ALL_MONTHS, "01", "02"]);
        assert_eq!(app.view_total, 37.5);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.selection.category, "Food");
        assert_eq!(app.expenses.len(), 2);
        assert_eq!(app.view_total, 32.5);

        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.selection.month, "02");
        assert_eq!(app.expenses.len(), 1);
        assert_eq!(app.expenses[0].description, "Dinner");

        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.selection.location, "City");
        assert!(app.expenses.is_empty());
        assert_eq!(app.state.selected(), None);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.selection, FilterSelection::default());
        assert_eq!(app.expenses.len(), 3);
    }

    #[test]
    fn test_removing_last_of_a_category_resets_filter() {
        let mut app = seeded_app();
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.selection.category, "Transit");

        press(&mut app, KeyCode::Char('x'));

        assert_eq!(app.selection.category, ALL_CATEGORIES);
        assert_eq!(app.expenses.len(), 2);
        assert_eq!(app.category_choices, vec![ALL_CATEGORIES, "Food"]);
    }

    #[test]
    fn test_sort_toggle() {
        let mut app = seeded_app();

        press(&mut app, KeyCode::Char('a'));
        let amounts: Vec<f64> = app.expenses.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![5.0, 12.5, 20.0]);

        press(&mut app, KeyCode::Char('a'));
        let amounts: Vec<f64> = app.expenses.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![20.0, 12.5, 5.0]);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.sort, Some((SortKey::Date, SortOrder::Ascending)));
        assert_eq!(app.expenses[0].description, "Lunch");
    }

    #[test]
    fn test_edit_selected_expense() {
        let mut app = seeded_app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_expense().unwrap().description, "Dinner");

        press(&mut app, KeyCode::Char('e'));
        let form = app.form.as_mut().unwrap();
        assert_eq!(form.mode, FormMode::Edit(2));
        assert_eq!(form.fields[0], "2024-02-01");
        assert_eq!(form.fields[2], "20");

        form.focus = 2;
        form.fields[2].clear();
        type_text(&mut app, "99.99");
        press(&mut app, KeyCode::Enter);

        assert!(app.form.is_none());
        assert_eq!(app.selected_expense().unwrap().amount, 99.99);
        assert!((app.view_total - (12.5 + 99.99 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = seeded_app();
        assert!(!press(&mut app, KeyCode::Tab));
        assert_eq!(app.current_page, Page::Trends);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(37.5), "$37.50");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()), "15-Jan-2024");
        assert_eq!(month_label("02"), "February");
        assert_eq!(month_label(ALL_MONTHS), ALL_MONTHS);
        assert_eq!(truncate("Café au lait", 8), "Café ...");
    }
}
