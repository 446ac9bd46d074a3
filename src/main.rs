// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use expense_tracker::display::{format_amount, format_date, truncate};
use expense_tracker::logging;
use expense_tracker::tracker::{AssumeYes, Confirm, ExpenseTracker, Submission};
use expense_tracker::{
    write_export, CategoryFilter, Config, ExpenseCandidate, ExpenseId, ExportFormat, GlobalArgs,
    KeyValueStore, DATE_FORMAT,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Personal expense log")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List expenses, newest date first
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Record a new expense
    Add {
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an expense by id
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sum of all expenses, or of one category
    Total {
        #[arg(long)]
        category: Option<String>,
    },
    /// Totals per category
    Categories,
    /// Write all expenses to expenses-YYYY-MM-DD.<format>
    Export {
        #[arg(short, long, value_enum, default_value_t)]
        format: ExportFormat,
        /// Target directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Interactive terminal UI (default)
    Tui,
}

/// Asks on stdin; anything but y/yes declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

type Tracker = ExpenseTracker<Box<dyn KeyValueStore>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_warning) = Config::load(&cli.global);
    let command = cli.command.unwrap_or(Command::Tui);

    // The TUI owns the terminal, so its logs go to a file
    let log_file = match command {
        Command::Tui => {
            let dir = config.storage.data_dir();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
            Some(dir.join("expense-tracker.log"))
        }
        _ => None,
    };
    logging::init(&config.logging, log_file.as_deref())?;
    if let Some(warning) = config_warning {
        warn!("{}", warning);
    }

    let backend = config
        .storage
        .open_backend()
        .context("Failed to open expense storage")?;
    info!(backend = %backend.describe(), key = %config.storage.key, "storage opened");
    let mut tracker = ExpenseTracker::open(backend, config.storage.key.clone());

    if !matches!(command, Command::Tui) {
        for notice in tracker.take_notices() {
            eprintln!("⚠️  {}", notice);
        }
    }

    let symbol = config.display.currency_symbol.as_str();
    match command {
        Command::List { category } => run_list(&mut tracker, category.as_deref(), symbol),
        Command::Add {
            amount,
            category,
            description,
            date,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive().format(DATE_FORMAT).to_string());
            run_add(&mut tracker, ExpenseCandidate::new(amount, category, description, date), symbol)
        }
        Command::Delete { id, yes } => run_delete(&mut tracker, id, yes),
        Command::Total { category } => {
            run_total(&tracker, category.as_deref(), symbol);
            Ok(())
        }
        Command::Categories => {
            run_categories(&tracker, symbol);
            Ok(())
        }
        Command::Export { format, output } => run_export(&tracker, format, output),
        Command::Tui => run_ui_mode(tracker, &config),
    }
}

fn run_list(tracker: &mut Tracker, category: Option<&str>, symbol: &str) -> Result<()> {
    tracker.set_filter(CategoryFilter::from(category));
    let visible = tracker.visible();

    if visible.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    println!("{:<14} {:<16} {:<40} {:>12}  {}", "Date", "Category", "Description", "Amount", "Id");
    println!("{}", "─".repeat(100));
    for e in &visible {
        println!(
            "{:<14} {:<16} {:<40} {:>12}  {}",
            format_date(e.date()),
            truncate(e.category(), 16),
            truncate(e.description(), 40),
            format_amount(e.amount(), symbol),
            e.id()
        );
    }
    println!("{}", "─".repeat(100));

    if let CategoryFilter::Category(c) = tracker.filter() {
        println!("{} total: {}", c, format_amount(tracker.filtered_total(), symbol));
    }
    println!("Total: {}", format_amount(tracker.total(), symbol));
    Ok(())
}

fn run_add(tracker: &mut Tracker, candidate: ExpenseCandidate, symbol: &str) -> Result<()> {
    match tracker.submit_expense(&candidate) {
        Submission::Added { expense, notice } => {
            if !notice.is_success() {
                bail!("{}", notice);
            }
            println!("✅ {}", notice);
            println!(
                "   {} · {} · {} · {}",
                format_amount(expense.amount(), symbol),
                expense.category(),
                expense.description(),
                format_date(expense.date())
            );
            println!("   id: {}", expense.id());
            Ok(())
        }
        Submission::Rejected { notice, .. } => bail!("{}", notice),
    }
}

fn run_delete(tracker: &mut Tracker, id: String, yes: bool) -> Result<()> {
    let id = ExpenseId::from(id);
    if tracker.store().get(&id).is_none() {
        println!("No expense with id {}", id);
        return Ok(());
    }

    let notice = if yes {
        tracker.request_delete(&id, &mut AssumeYes)
    } else {
        tracker.request_delete(&id, &mut StdinConfirm)
    };

    match notice {
        Some(notice) if notice.is_success() => println!("✅ {}", notice),
        Some(notice) => bail!("{}", notice),
        None => println!("Cancelled."),
    }
    Ok(())
}

fn run_total(tracker: &Tracker, category: Option<&str>, symbol: &str) {
    match CategoryFilter::from(category) {
        CategoryFilter::All => println!("Total: {}", format_amount(tracker.total(), symbol)),
        CategoryFilter::Category(c) => println!(
            "{} total: {}",
            c,
            format_amount(tracker.store().total_by_category(&c), symbol)
        ),
    }
}

fn run_categories(tracker: &Tracker, symbol: &str) {
    let totals = tracker.category_totals();
    if totals.is_empty() {
        println!("No expenses recorded yet.");
        return;
    }

    for (category, amount) in totals {
        println!("{:<20} {:>12}", category, format_amount(amount, symbol));
    }
    println!("{:<20} {:>12}", "Total", format_amount(tracker.total(), symbol));
}

fn run_export(tracker: &Tracker, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    let today = Local::now().date_naive();

    let path = write_export(&dir, format, tracker.expenses(), today)
        .with_context(|| format!("Failed to export to {}", dir.display()))?;

    println!("📤 Exported {} expenses to {}", tracker.expenses().len(), path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(tracker: Tracker, config: &Config) -> Result<()> {
    let mut app = ui::App::new(
        tracker,
        config.display.categories.clone(),
        config.display.currency_symbol.clone(),
    );
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_tracker: Tracker, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a subcommand: expense-tracker list | add | delete | total | export");
    std::process::exit(1);
}
