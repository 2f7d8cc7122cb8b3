use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use super::app::{App, InputMode, PendingAction, Screen};
use super::util::{expand_home, format_currency};
use crate::backup;
use crate::engine;
use crate::input;
use crate::models::category;
use crate::models::{NewTransaction, TransactionPatch, TransactionType};
use crate::store::RecordStore;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &dyn RecordStore) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit", cmd_quit, r);
    register_command!("quit", "Quit", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "add",
        "Add transaction (e.g. :add expense 250 Food & Dining @2024-05-03 -- lunch)",
        cmd_add,
        r
    );
    register_command!("a", "Add transaction", cmd_add, r);
    register_command!(
        "edit",
        "Edit selected transaction (e.g. :edit amount 300)",
        cmd_edit,
        r
    );
    register_command!("e", "Edit selected transaction", cmd_edit, r);
    register_command!("delete", "Delete selected transaction", cmd_delete, r);
    register_command!(
        "budget",
        "Set budget for this month (e.g. :budget Food & Dining 5000)",
        cmd_budget,
        r
    );
    register_command!(
        "search",
        "Search transactions (e.g. :search coffee)",
        cmd_search,
        r
    );
    register_command!("s", "Search transactions", cmd_search, r);
    register_command!(
        "export",
        "Export backup as JSON (e.g. :export ~/finance.json)",
        cmd_export,
        r
    );
    register_command!(
        "import",
        "Replace all records from a JSON backup",
        cmd_import,
        r
    );
    register_command!(
        "sheet",
        "Export spreadsheet CSVs (e.g. :sheet ~/finance-data)",
        cmd_sheet,
        r
    );
    register_command!("categories", "List suggested categories", cmd_categories, r);
    register_command!("refresh", "Reload records from the store", cmd_refresh, r);

    r
});

/// Run a `:` command. Validation problems and store failures both end up
/// in the status line; they never abort the TUI.
pub(crate) fn handle_command(input: &str, app: &mut App, store: &dyn RecordStore) {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, store) {
            app.set_status(format!("Error: {e:#}"));
        }
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }
}

/// One help row per command: every name it answers to, longest first, and
/// the most detailed description registered for it.
pub(crate) fn help_entries() -> Vec<(String, &'static str)> {
    let mut groups: HashMap<usize, (Vec<&'static str>, &'static str)> = HashMap::new();
    for (&name, cmd) in COMMANDS.iter() {
        let (names, desc) = groups.entry(cmd.run as usize).or_default();
        names.push(name);
        if cmd.description.len() > desc.len() {
            *desc = cmd.description;
        }
    }
    let mut entries: Vec<(String, &'static str)> = groups
        .into_values()
        .map(|(mut names, desc)| {
            names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            (names.join(", "), desc)
        })
        .collect();
    entries.sort();
    entries
}

/// Commands whose name starts with what has been typed so far.
pub(crate) fn completions(partial: &str) -> Vec<&'static str> {
    let name = partial.split_whitespace().next().unwrap_or("");
    if name.is_empty() || partial.contains(' ') {
        return Vec::new();
    }
    let mut names: Vec<&'static str> = COMMANDS
        .keys()
        .copied()
        .filter(|k| k.len() > 1 && k.starts_with(name))
        .collect();
    names.sort_unstable();
    names
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Argument parsing ─────────────────────────────────────────

/// Parse `<type> <amount> <category...> [@YYYY-MM-DD] [-- notes]`.
pub(crate) fn parse_add(args: &str, today: NaiveDate) -> anyhow::Result<NewTransaction> {
    let (main, notes) = match args.split_once("--") {
        Some((main, notes)) => (main, notes.trim()),
        None => (args, ""),
    };

    let mut tokens = main.split_whitespace();
    let kind_str = tokens.next().context("Transaction type is required")?;
    let kind = TransactionType::parse(kind_str)
        .with_context(|| format!("Unknown type '{kind_str}' (use income or expense)"))?;
    let amount = input::parse_amount(tokens.next().context("Amount is required")?)?;

    let mut date = None;
    let mut category_words = Vec::new();
    for token in tokens {
        match token.strip_prefix('@') {
            Some(d) => date = Some(input::validate_date(d)?),
            None => category_words.push(token),
        }
    }
    if category_words.is_empty() {
        bail!("Category is required");
    }
    let category = category::normalize(kind, &category_words.join(" "));
    let date = date.unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

    Ok(NewTransaction::new(amount, kind, category, date).with_notes(notes))
}

/// Parse `<field> <value>` into a single-field patch. A new category is
/// matched against the suggestions for `kind`, the edited record's type.
pub(crate) fn parse_edit(args: &str, kind: TransactionType) -> anyhow::Result<TransactionPatch> {
    let (field, value) = args.split_once(' ').unwrap_or((args, ""));
    let value = value.trim();
    let mut patch = TransactionPatch::default();
    match field {
        "amount" => patch.amount = Some(input::parse_amount(value)?),
        "type" => {
            patch.kind = Some(
                TransactionType::parse(value)
                    .with_context(|| format!("Unknown type '{value}' (use income or expense)"))?,
            )
        }
        "category" if !value.is_empty() => patch.category = Some(category::normalize(kind, value)),
        "category" => bail!("Category must not be empty"),
        "date" => patch.date = Some(input::validate_date(value)?),
        "notes" => patch.notes = Some(value.to_string()),
        "" => bail!("Usage: :edit <amount|type|category|date|notes> <value>"),
        other => bail!("Unknown field '{other}' (amount, type, category, date, notes)"),
    }
    Ok(patch)
}

/// Parse `<category...> <limit>`; the last word is the limit.
pub(crate) fn parse_budget(args: &str) -> anyhow::Result<(String, rust_decimal::Decimal)> {
    let (category, limit) = args
        .rsplit_once(' ')
        .context("Usage: :budget <category> <limit>")?;
    let category = category.trim();
    if category.is_empty() {
        bail!("Category is required");
    }
    let limit = input::parse_amount(limit)?;
    Ok((category::normalize(TransactionType::Expense, category), limit))
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.screen = Screen::Transactions;
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_refresh(_args: &str, app: &mut App, store: &dyn RecordStore) -> anyhow::Result<()> {
    app.set_status(format!("Reloaded from {} store", store.name()));
    app.refresh(store);
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    let month = if args.is_empty() {
        engine::current_month(app.today)
    } else {
        input::validate_month(args)?
    };
    app.set_status(format!("Switched to month: {month}"));
    app.set_month(month);
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    let month = input::shift_month(&app.current_month, 1)?;
    app.set_status(format!("Switched to month: {month}"));
    app.set_month(month);
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    let month = input::shift_month(&app.current_month, -1)?;
    app.set_status(format!("Switched to month: {month}"));
    app.set_month(month);
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, store: &dyn RecordStore) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add <income|expense> <amount> <category> [@YYYY-MM-DD] [-- notes]");
        return Ok(());
    }
    let new = parse_add(args, app.today)?;
    let txn = store.create(new)?;
    app.refresh(store);
    app.set_status(format!(
        "Added {} {} in {} on {}",
        txn.kind,
        format_currency(txn.amount),
        txn.category,
        txn.date
    ));
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, store: &dyn RecordStore) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    let Some((id, kind)) = app.selected_transaction().map(|t| (t.id.clone(), t.kind)) else {
        app.set_status("No transaction selected");
        return Ok(());
    };
    let patch = parse_edit(args, kind)?;
    store.update(&id, &patch)?;
    app.refresh(store);
    app.set_status("Transaction updated");
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    request_delete(app);
    Ok(())
}

/// Ask for confirmation before deleting the highlighted transaction.
pub(crate) fn request_delete(app: &mut App) {
    let Some((id, label)) = app.selected_transaction().map(|txn| {
        let label = format!(
            "{} {} ({})",
            txn.category,
            format_currency(txn.amount),
            txn.date
        );
        (txn.id.clone(), label)
    }) else {
        app.set_status("No transaction selected");
        return;
    };
    app.confirm_message = format!("Delete {label}?");
    app.pending_action = Some(PendingAction::DeleteTransaction { id, label });
    app.input_mode = InputMode::Confirm;
}

fn cmd_budget(args: &str, app: &mut App, store: &dyn RecordStore) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :budget <category> <limit>. Example: :budget Food & Dining 5000");
        return Ok(());
    }
    let (category, limit) = parse_budget(args)?;
    let budget = store.upsert_budget(&category, limit, &app.current_month)?;
    app.refresh(store);
    app.screen = Screen::Budgets;
    app.set_status(format!(
        "Budget set: {} = {} for {}",
        budget.category,
        format_currency(budget.limit),
        budget.month
    ));
    Ok(())
}

fn cmd_search(args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.search_input = args.to_string();
    app.screen = Screen::Transactions;
    app.transaction_index = 0;
    app.transaction_scroll = 0;
    app.recompute();
    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, store: &dyn RecordStore) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :export <path.json>");
        return Ok(());
    }
    let path = expand_home(args);
    let payload = backup::export_data(store)?;
    backup::write_payload(&path, &payload)?;
    app.set_status(format!(
        "Exported {} transactions and {} budgets to {}",
        payload.transactions.len(),
        payload.budgets.len(),
        path.display()
    ));
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <path.json>");
        return Ok(());
    }
    let path = expand_home(args);
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    app.confirm_message = format!("Replace ALL records with {}?", path.display());
    app.pending_action = Some(PendingAction::Import { path });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_sheet(args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    let dir = if args.is_empty() {
        std::path::PathBuf::from(backup::default_dir_name(&app.current_month))
    } else {
        expand_home(args)
    };
    backup::write_spreadsheet(&dir, &app.records)?;
    app.set_status(format!("Spreadsheet written to {}", dir.display()));
    Ok(())
}

fn cmd_categories(_args: &str, app: &mut App, _store: &dyn RecordStore) -> anyhow::Result<()> {
    app.set_status(format!(
        "Expense: {} | Income: {}",
        category::EXPENSE_CATEGORIES.join(", "),
        category::INCOME_CATEGORIES.join(", ")
    ));
    Ok(())
}

/// Carry out a confirmed [`PendingAction`].
pub(crate) fn run_pending(
    action: PendingAction,
    app: &mut App,
    store: &dyn RecordStore,
) -> anyhow::Result<()> {
    match action {
        PendingAction::DeleteTransaction { id, label } => {
            store.delete(&id)?;
            app.refresh(store);
            app.set_status(format!("Deleted: {label}"));
        }
        PendingAction::Import { path } => {
            let payload = backup::read_payload(&path)?;
            backup::import_data(store, &payload)?;
            app.refresh(store);
            app.set_status(format!(
                "Imported {} transactions and {} budgets",
                payload.transactions.len(),
                payload.budgets.len()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
