use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode, Screen};
use super::commands;
use super::theme;
use super::util::format_currency;

/// Keys that act outside command mode, shown in the help overlay.
const KEYS: &[(&str, &str)] = &[
    ("1-3, Tab", "switch screen"),
    ("H / L", "previous / next month"),
    ("j k, arrows", "move selection"),
    ("g / G", "first / last row"),
    (":", "command line"),
    ("/", "live search in Transactions"),
    ("D", "delete the selected transaction"),
    ("r", "reload from the store"),
    ("Esc", "clear search and status"),
    ("?", "this help"),
    ("Ctrl-q, Ctrl-c", "quit"),
];

pub(crate) fn render(f: &mut Frame, app: &App) {
    let [header, body, status, prompt] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, app);
    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, body, app),
        Screen::Transactions => super::screens::transactions::render(f, body, app),
        Screen::Budgets => super::screens::budgets::render(f, body, app),
    }
    render_status(f, status, app);
    render_prompt(f, prompt, app);

    if app.show_help {
        render_help(f, f.area());
    }
}

/// `fintrack  ‹ 2024-05 ›   1 Dashboard  2 Transactions  3 Budgets    local`
fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let bar = Style::default().bg(theme::HEADER_BG);
    let mut spans = vec![
        Span::styled(
            " fintrack ",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ‹ ", theme::dim_style()),
        Span::styled(
            app.current_month.as_str(),
            Style::default()
                .fg(theme::YELLOW)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" › ", theme::dim_style()),
    ];
    for (i, screen) in Screen::all().iter().enumerate() {
        let style = if *screen == app.screen {
            Style::default()
                .fg(theme::HEADER_BG)
                .bg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            theme::dim_style()
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!(" {} {screen} ", i + 1), style));
    }

    let backend = format!(" {} ", app.backend);
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + backend.chars().count());
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(backend, theme::dim_style()));

    f.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}

/// Mode badge on the left, the month's money at a glance on the right.
fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let (label, color) = match app.input_mode {
        InputMode::Normal => ("NORMAL", theme::ACCENT),
        InputMode::Command => ("COMMAND", theme::GREEN),
        InputMode::Search => ("SEARCH", theme::YELLOW),
        InputMode::Confirm => ("CONFIRM", theme::RED),
    };
    let badge = Span::styled(
        format!(" {label} "),
        Style::default()
            .fg(theme::HEADER_BG)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    );

    let totals = &app.month_totals;
    let mut right = vec![
        Span::styled(
            format!("in {} ", format_currency(totals.total_income)),
            theme::income_style(),
        ),
        Span::styled(
            format!("out {} ", format_currency(totals.total_expenses)),
            theme::expense_style(),
        ),
        Span::styled(
            format!("net {} ", format_currency(totals.net_balance)),
            Style::default().fg(theme::signed_color(totals.net_balance)),
        ),
    ];
    let over = app.over_budget_count();
    if over > 0 {
        right.push(Span::styled(
            format!(" {over} over budget "),
            Style::default()
                .fg(theme::HEADER_BG)
                .bg(theme::RED)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let left = format!(" {} txns this month ", app.transactions.len());
    let used = badge.width()
        + left.chars().count()
        + right.iter().map(|s| s.width()).sum::<usize>();
    let pad = (area.width as usize).saturating_sub(used);

    let mut spans = vec![badge, Span::styled(left, theme::status_bar_style())];
    spans.push(Span::raw(" ".repeat(pad)));
    spans.extend(right);
    f.render_widget(
        Paragraph::new(Line::from(spans)).style(theme::status_bar_style()),
        area,
    );
}

/// The bottom line: what is being typed, or the latest status message.
fn render_prompt(f: &mut Frame, area: Rect, app: &App) {
    let (line, cursor) = match app.input_mode {
        InputMode::Command => {
            let mut spans = vec![
                Span::styled(":", Style::default().fg(theme::GREEN)),
                Span::styled(app.command_input.as_str(), theme::command_bar_style()),
            ];
            let matches = commands::completions(&app.command_input);
            if !matches.is_empty() {
                spans.push(Span::styled(
                    format!("   {}", matches.join("  ")),
                    theme::dim_style(),
                ));
            }
            (Line::from(spans), Some(1 + app.command_input.chars().count()))
        }
        InputMode::Search => (
            Line::from(vec![
                Span::styled("/", Style::default().fg(theme::YELLOW)),
                Span::styled(app.search_input.as_str(), theme::command_bar_style()),
                Span::styled(
                    format!("   {} in {}", app.transactions.len(), app.current_month),
                    theme::dim_style(),
                ),
            ]),
            Some(1 + app.search_input.chars().count()),
        ),
        InputMode::Confirm => (
            Line::from(vec![
                Span::styled(
                    app.confirm_message.as_str(),
                    Style::default().fg(theme::YELLOW),
                ),
                Span::styled("  y / n", theme::dim_style()),
            ]),
            None,
        ),
        InputMode::Normal if app.status_message.is_empty() => (
            Line::from(Span::styled(
                " :add to record, :budget to set a limit, ? for help",
                theme::dim_style(),
            )),
            None,
        ),
        InputMode::Normal => (
            Line::from(Span::styled(
                format!(" {}", app.status_message),
                theme::command_bar_style(),
            )),
            None,
        ),
    };

    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme::COMMAND_BG)),
        area,
    );
    if let Some(offset) = cursor {
        f.set_cursor_position((area.x + offset as u16, area.y));
    }
}

fn render_help(f: &mut Frame, area: Rect) {
    let entries = commands::help_entries();

    let mut rows: Vec<Row> = vec![section_row("Keys")];
    rows.extend(KEYS.iter().map(|(key, what)| {
        Row::new(vec![
            Cell::from(*key).style(Style::default().fg(theme::ACCENT)),
            Cell::from(*what).style(theme::normal_style()),
        ])
    }));
    rows.push(Row::new(vec![Cell::from("")]));
    rows.push(section_row("Commands"));
    rows.extend(entries.iter().map(|(names, desc)| {
        Row::new(vec![
            Cell::from(format!(":{names}")).style(Style::default().fg(theme::GREEN)),
            Cell::from(*desc).style(theme::normal_style()),
        ])
    }));

    let height = (rows.len() as u16 + 3).min(area.height);
    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Max(90)])
        .flex(Flex::Center)
        .areas(popup);

    let table = Table::new(rows, [Constraint::Length(22), Constraint::Min(20)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .title(Span::styled(
                " fintrack help ",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ))
            .title_bottom(
                Line::from(Span::styled(" any key closes ", theme::dim_style())).centered(),
            )
            .style(Style::default().bg(theme::HEADER_BG)),
    );

    f.render_widget(Clear, popup);
    f.render_widget(table, popup);
}

fn section_row(title: &str) -> Row<'_> {
    Row::new(vec![Cell::from(Span::styled(title, theme::section_style()))])
}
