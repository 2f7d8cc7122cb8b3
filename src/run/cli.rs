use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::backup;
use crate::config::{GlobalArgs, RemoteSettings};
use crate::engine;
use crate::input;
use crate::models::category;
use crate::models::{NewTransaction, TransactionPatch, TransactionType};
use crate::store::{AuthClient, RecordStore, Session, SignUp};
use crate::ui::util::{expand_home, format_currency, progress_bar, truncate};

/// Personal finance tracker: income, expenses and monthly budgets.
///
/// Run without a subcommand to open the interactive terminal UI.
#[derive(Debug, Parser)]
#[command(name = "fintrack", version, about)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Record a transaction
    Add {
        /// income or expense
        #[arg(value_parser = kind_arg)]
        kind: TransactionType,
        #[arg(value_parser = amount_arg)]
        amount: Decimal,
        category: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long, value_parser = date_arg)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change fields of an existing transaction
    Edit {
        id: String,
        #[arg(long, value_parser = amount_arg)]
        amount: Option<Decimal>,
        #[arg(long = "type", value_parser = kind_arg)]
        kind: Option<TransactionType>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = date_arg)]
        date: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a transaction (no error if it is already gone)
    Delete { id: String },
    /// List transactions, newest first
    List {
        #[arg(long, value_parser = month_arg)]
        month: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Income, expenses and spending by category for a month
    Summary {
        #[arg(value_parser = month_arg)]
        month: Option<String>,
    },
    /// Set the spending limit for a category
    Budget {
        category: String,
        #[arg(value_parser = amount_arg)]
        limit: Decimal,
        #[arg(long, value_parser = month_arg)]
        month: Option<String>,
    },
    /// Show budget progress for a month
    Budgets {
        #[arg(value_parser = month_arg)]
        month: Option<String>,
    },
    /// Write every record to a JSON backup
    Export { path: String },
    /// Replace every record with the contents of a JSON backup
    Import { path: String },
    /// Write Transactions, Summary and Category Breakdown CSV sheets
    Spreadsheet { dir: Option<String> },
    /// List suggested categories
    Categories,
    /// Sign in to the remote backend and save the session
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create a remote account and save the session
    Signup {
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out of the remote backend and forget the saved session
    Logout,
}

impl Command {
    /// Account commands talk to the auth API directly and run before any
    /// store is opened.
    pub(crate) fn is_account(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Signup { .. } | Self::Logout)
    }
}

fn kind_arg(s: &str) -> Result<TransactionType, String> {
    TransactionType::parse(s).ok_or_else(|| format!("unknown type '{s}' (use income or expense)"))
}

fn amount_arg(s: &str) -> Result<Decimal, String> {
    input::parse_amount(s).map_err(|e| format!("{e:#}"))
}

fn date_arg(s: &str) -> Result<String, String> {
    input::validate_date(s).map_err(|e| format!("{e:#}"))
}

fn month_arg(s: &str) -> Result<String, String> {
    input::validate_month(s).map_err(|e| format!("{e:#}"))
}

pub(crate) fn as_cli(command: Command, store: &dyn RecordStore) -> Result<()> {
    match command {
        Command::Add {
            kind,
            amount,
            category,
            date,
            notes,
        } => cli_add(store, kind, amount, &category, date, notes),
        Command::Edit {
            id,
            amount,
            kind,
            category,
            date,
            notes,
        } => {
            let patch = TransactionPatch {
                amount,
                kind,
                category,
                date,
                notes,
            };
            cli_edit(store, &id, patch)
        }
        Command::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {id}");
            Ok(())
        }
        Command::List { month, limit } => cli_list(store, month.as_deref(), limit),
        Command::Summary { month } => cli_summary(store, &month_or_current(month)),
        Command::Budget {
            category,
            limit,
            month,
        } => {
            let category = category::normalize(TransactionType::Expense, &category);
            let budget = store.upsert_budget(&category, limit, &month_or_current(month))?;
            println!(
                "Budget set: {} = {} for {}",
                budget.category,
                format_currency(budget.limit),
                budget.month
            );
            Ok(())
        }
        Command::Budgets { month } => cli_budgets(store, &month_or_current(month)),
        Command::Export { path } => {
            let path = expand_home(&path);
            let payload = backup::export_data(store)?;
            backup::write_payload(&path, &payload)?;
            println!(
                "Exported {} transactions and {} budgets to {}",
                payload.transactions.len(),
                payload.budgets.len(),
                path.display()
            );
            Ok(())
        }
        Command::Import { path } => {
            let payload = backup::read_payload(&expand_home(&path))?;
            backup::import_data(store, &payload)?;
            println!(
                "Imported {} transactions and {} budgets",
                payload.transactions.len(),
                payload.budgets.len()
            );
            Ok(())
        }
        Command::Spreadsheet { dir } => {
            let dir = dir.map(|d| expand_home(&d)).unwrap_or_else(|| {
                PathBuf::from(backup::default_dir_name(&engine::current_month(input::today())))
            });
            backup::write_spreadsheet(&dir, &store.list()?)?;
            println!("Spreadsheet written to {}", dir.display());
            Ok(())
        }
        Command::Categories => {
            println!("Expense: {}", category::EXPENSE_CATEGORIES.join(", "));
            println!("Income:  {}", category::INCOME_CATEGORIES.join(", "));
            Ok(())
        }
        Command::Login { .. } | Command::Signup { .. } | Command::Logout => {
            bail!("Account commands do not use a record store")
        }
    }
}

pub(crate) fn as_account(
    command: Command,
    remote: &RemoteSettings,
    session_path: &Path,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let session = AuthClient::new(remote)?.sign_in(&email, &password, now)?;
            session.save(session_path)?;
            println!("Signed in as {email}");
            Ok(())
        }
        Command::Signup { email, password } => {
            let password = password_or_prompt(password)?;
            match AuthClient::new(remote)?.sign_up(&email, &password, now)? {
                SignUp::SignedIn(session) => {
                    session.save(session_path)?;
                    println!("Account created, signed in as {email}");
                }
                SignUp::ConfirmationPending { email: sent_to } => {
                    println!(
                        "Account created. Confirm the address sent to {}, then run `fintrack login`",
                        sent_to.as_deref().unwrap_or(&email)
                    );
                }
            }
            Ok(())
        }
        Command::Logout => {
            if let Some(session) = Session::load(session_path)? {
                let revoked =
                    AuthClient::new(remote).and_then(|auth| auth.sign_out(&session.access_token));
                if let Err(e) = revoked {
                    tracing::warn!(error = %e, "server-side sign-out failed");
                }
            }
            if Session::clear(session_path)? {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
            Ok(())
        }
        _ => bail!("Not an account command"),
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(password)
}

fn month_or_current(month: Option<String>) -> String {
    month.unwrap_or_else(|| engine::current_month(input::today()))
}

fn cli_add(
    store: &dyn RecordStore,
    kind: TransactionType,
    amount: Decimal,
    category: &str,
    date: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let category = category::normalize(kind, category);
    if category.is_empty() {
        bail!("Category is required");
    }
    let date = date.unwrap_or_else(input::today_string);
    let new = NewTransaction::new(amount, kind, category, date).with_notes(notes.unwrap_or_default());
    let txn = store.create(new)?;
    println!(
        "Added {} {} in {} on {} (id {})",
        txn.kind,
        format_currency(txn.amount),
        txn.category,
        txn.date,
        txn.id
    );
    Ok(())
}

fn cli_edit(store: &dyn RecordStore, id: &str, mut patch: TransactionPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one of --amount, --type, --category, --date, --notes");
    }
    if let Some(input) = patch.category.take() {
        if input.trim().is_empty() {
            bail!("Category must not be empty");
        }
        let kind = match patch.kind {
            Some(kind) => kind,
            None => store
                .list()?
                .into_iter()
                .find(|t| t.id == id)
                .map(|t| t.kind)
                .with_context(|| format!("No transaction with id {id}"))?,
        };
        patch.category = Some(category::normalize(kind, &input));
    }
    store.update(id, &patch)?;
    println!("Updated {id}");
    Ok(())
}

fn cli_list(store: &dyn RecordStore, month: Option<&str>, limit: Option<usize>) -> Result<()> {
    let all = store.list()?;
    let shown: Vec<_> = match month {
        Some(m) => engine::filter_by_month(&all, m),
        None => all.iter().collect(),
    };
    let shown = &shown[..limit.unwrap_or(shown.len()).min(shown.len())];

    if shown.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<10}  {:<7}  {:<20}  {:>16}  {:<36}  Notes",
        "Date", "Type", "Category", "Amount", "ID"
    );
    println!("{}", "─".repeat(104));
    for t in shown {
        println!(
            "{:<10}  {:<7}  {:<20}  {:>16}  {:<36}  {}",
            t.date,
            t.kind.label(),
            truncate(&t.category, 20),
            format_currency(t.signed_amount()),
            t.id,
            t.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cli_summary(store: &dyn RecordStore, month: &str) -> Result<()> {
    let all = store.list()?;
    let txns = engine::month_transactions(&all, month);
    let totals = engine::compute_totals(&txns);
    let balance = engine::compute_totals(&all);

    println!("fintrack, {month}");
    println!("{}", "─".repeat(40));
    println!("  Income:     {}", format_currency(totals.total_income));
    println!("  Expenses:   {}", format_currency(totals.total_expenses));
    println!("  Net:        {}", format_currency(totals.net_balance));
    println!("  Balance:    {}", format_currency(balance.net_balance));
    println!("  Month Txns: {}", txns.len());

    let breakdown = engine::expense_breakdown(&txns);
    if !breakdown.is_empty() {
        println!();
        println!("Spending by Category:");
        for (name, amount) in &breakdown {
            println!("  {name:<24} {}", format_currency(*amount));
        }
    }

    Ok(())
}

fn cli_budgets(store: &dyn RecordStore, month: &str) -> Result<()> {
    let all = store.list()?;
    let mut budgets: Vec<_> = store
        .list_budgets()?
        .into_iter()
        .filter(|b| b.month == month)
        .collect();
    if budgets.is_empty() {
        println!("No budgets for {month}");
        return Ok(());
    }
    budgets.sort_by(|a, b| a.category.cmp(&b.category));

    println!("Budgets for {month}");
    println!("{}", "─".repeat(80));
    for budget in &budgets {
        let p = engine::compute_budget_progress(budget, &all);
        let ratio = rust_decimal::prelude::ToPrimitive::to_f64(&(p.percentage / Decimal::ONE_HUNDRED))
            .unwrap_or(0.0);
        println!(
            "  {:<20} {:>14} / {:<14} {} {:>4.0}%{}",
            truncate(&budget.category, 20),
            format_currency(p.spent),
            format_currency(budget.limit),
            progress_bar(ratio, 20),
            p.percentage,
            if p.is_over_budget { "  OVER" } else { "" }
        );
    }
    Ok(())
}
