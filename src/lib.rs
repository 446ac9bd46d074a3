// Expense Tracker - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod expense;  // Record, candidate, validation
pub mod storage;  // Key-value slot backends (memory, file)
pub mod sqlite;   // SQLite slot backend
pub mod store;    // Expense Store over one slot
pub mod tracker;  // Command interface for front ends
pub mod export;   // JSON / CSV export
pub mod display;  // Amount and date formatting
pub mod config;   // TOML config + CLI overrides
pub mod logging;  // tracing subscriber setup

// Re-export commonly used types
pub use expense::{
    sum_amounts, validate, validate_all, validate_at,
    Expense, ExpenseCandidate, ExpenseId, ValidationError, DATE_FORMAT, MAX_AMOUNT,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sqlite::SqliteStore;
pub use store::{load, ExpenseStore, Loaded, Saved, DEFAULT_SLOT_KEY};
pub use tracker::{
    AssumeYes, CategoryFilter, Confirm, ExpenseTracker, Notice, NoticeLevel, Submission,
};
pub use export::{export_csv, export_file_name, export_json, write_export, ExportError, ExportFormat};
pub use display::{format_amount, format_date};
pub use config::{BackendKind, Config, ConfigWarning, GlobalArgs};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
