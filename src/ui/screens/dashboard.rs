use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_currency, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Breakdown + recent
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_breakdown_chart(f, lower[0], app);
    render_recent(f, lower[1], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let totals = &app.month_totals;
    let income_count = app.transactions.iter().filter(|t| t.is_income()).count();
    let expense_count = app.transactions.iter().filter(|t| t.is_expense()).count();
    let over = app.over_budget_count();

    render_card(
        f,
        cards[0],
        "Income",
        totals.total_income,
        theme::GREEN,
        format!("{income_count} txns"),
    );
    render_card(
        f,
        cards[1],
        "Expenses",
        totals.total_expenses,
        theme::RED,
        if over > 0 {
            format!("{expense_count} txns, {over} over budget")
        } else {
            format!("{expense_count} txns")
        },
    );
    render_card(
        f,
        cards[2],
        "Net",
        totals.net_balance,
        theme::signed_color(totals.net_balance),
        app.current_month.clone(),
    );
    render_card(
        f,
        cards[3],
        "Balance",
        app.balance.net_balance,
        theme::signed_color(app.balance.net_balance),
        "all time".into(),
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, amount: Decimal, color: Color, subtitle: String) {
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format_currency(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(theme::panel(title));

    f.render_widget(text, area);
}

fn render_breakdown_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = theme::panel(format!("Spending by Category, {}", app.current_month));

    if app.breakdown.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses this month. Add one with :add",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = app
        .breakdown
        .iter()
        .take(10)
        .map(|(name, amt)| {
            Bar::default()
                .value(amt.round().to_u64().unwrap_or(0))
                .text_value(format_currency(*amt))
                .label(Line::from(truncate(name, 10)))
                .style(Style::default().fg(theme::ACCENT))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .value_style(Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD));

    f.render_widget(chart, area);
}

fn render_recent(f: &mut Frame, area: Rect, app: &App) {
    let width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = app
        .recent
        .iter()
        .map(|t| {
            let (sign, style) = if t.is_income() {
                ("+", theme::income_style())
            } else {
                ("-", theme::expense_style())
            };
            let amount = format!("{sign}{}", format_currency(t.amount));
            let label_width = width.saturating_sub(amount.chars().count() + 12);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", t.date), theme::dim_style()),
                Span::styled(
                    format!("{:<label_width$} ", truncate(&t.category, label_width)),
                    theme::normal_style(),
                ),
                Span::styled(amount, style),
            ]))
        })
        .collect();

    if items.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled("Nothing yet", theme::dim_style())))
            .centered()
            .block(theme::panel("Recent"));
        f.render_widget(msg, area);
        return;
    }

    f.render_widget(List::new(items).block(theme::panel("Recent")), area);
}
