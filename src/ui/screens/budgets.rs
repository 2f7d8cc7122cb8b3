use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_currency, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.budget_rows.is_empty() {
        render_empty(f, area, app);
        return;
    }

    let items: Vec<ListItem> = app
        .budget_rows
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, row)| {
            let progress = &row.progress;
            let color = theme::budget_color(progress);
            let ratio = (progress.percentage / Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0);

            let name_style = if i == app.budget_index {
                theme::selected_style()
            } else if i % 2 == 0 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let remaining = if progress.is_over_budget {
                format!(" over by {}", format_currency(-progress.remaining))
            } else {
                format!(" {} left", format_currency(progress.remaining))
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<20}", truncate(&row.budget.category, 19)), name_style),
                Span::styled(
                    format!(
                        "{} / {} ",
                        format_currency(progress.spent),
                        format_currency(row.budget.limit)
                    ),
                    Style::default().fg(color),
                ),
                Span::styled(progress_bar(ratio, 20), Style::default().fg(color)),
                Span::styled(
                    format!(" {:.0}%", progress.percentage),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(remaining, theme::dim_style()),
            ]))
        })
        .collect();

    let over = app.over_budget_count();
    let title = if over > 0 {
        format!("Budgets for {} ({over} over)", app.current_month)
    } else {
        format!("Budgets for {}", app.current_month)
    };
    f.render_widget(List::new(items).block(theme::panel(title)), area);
}

fn render_empty(f: &mut Frame, area: Rect, app: &App) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("No budgets set for {}", app.current_month),
            theme::dim_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Use :budget <category> <limit> to set a spending limit",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(theme::panel("Budgets"));
    f.render_widget(msg, area);
}
