use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_currency, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.transactions.is_empty() {
        render_empty(f, area, app);
        return;
    }

    let header = Row::new(
        ["Date", "Type", "Category", "Amount", "Notes"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .transactions
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let (sign, amount_style) = if txn.is_income() {
                ("+", theme::income_style())
            } else {
                ("-", theme::expense_style())
            };

            let style = if i == app.transaction_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(txn.date.as_str()),
                Cell::from(txn.kind.label()),
                Cell::from(truncate(&txn.category, 20)),
                Cell::from(Span::styled(
                    format!("{sign}{}", format_currency(txn.amount)),
                    amount_style,
                )),
                Cell::from(truncate(txn.notes.as_deref().unwrap_or(""), 40)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(21),
        Constraint::Length(16),
        Constraint::Min(10),
    ];

    let search = if app.search_input.is_empty() {
        String::new()
    } else {
        format!(" search: '{}'", app.search_input)
    };
    let title = format!(
        "Transactions {} ({}){search}",
        app.current_month,
        app.transactions.len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(title));
    f.render_widget(table, area);
}

fn render_empty(f: &mut Frame, area: Rect, app: &App) {
    let (first, second) = if app.search_input.is_empty() {
        (
            format!("No transactions for {}", app.current_month),
            "Add one with :add expense 250 Food & Dining",
        )
    } else {
        (
            format!("No transactions matching '{}'", app.search_input),
            "Press Esc to clear the search",
        )
    };
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(first, theme::dim_style())),
        Line::from(""),
        Line::from(Span::styled(second, theme::dim_style())),
    ])
    .centered()
    .block(theme::panel("Transactions (0)"));
    f.render_widget(msg, area);
}
