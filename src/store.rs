// 💾 Expense Store - the single owner of the expense list
//
// Records are kept newest-added-first. Every mutation rewrites the whole
// list into one durable slot; a failed write never touches memory.

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::expense::{sum_amounts, validate, Expense, ExpenseCandidate, ExpenseId, ValidationError};
use crate::storage::{KeyValueStore, StorageError};

/// Slot name used when none is configured
pub const DEFAULT_SLOT_KEY: &str = "expenseTracker";

/// Result of reading the durable slot. A read or decode failure yields an
/// empty list plus the warning to surface.
#[derive(Debug)]
pub struct Loaded {
    pub expenses: Vec<Expense>,
    pub warning: Option<StorageError>,
}

/// A mutation that already happened in memory, with the outcome of writing
/// it through to the slot.
#[derive(Debug)]
pub struct Saved<T> {
    pub value: T,
    pub save_error: Option<StorageError>,
}

impl<T> Saved<T> {
    pub fn is_persisted(&self) -> bool {
        self.save_error.is_none()
    }
}

/// Read the expense list from `key`. Absent or blank slots are an empty list.
pub fn load<S: KeyValueStore + ?Sized>(backend: &S, key: &str) -> Loaded {
    match read_slot(backend, key) {
        Ok(expenses) => Loaded {
            expenses,
            warning: None,
        },
        Err(e) => {
            warn!(slot = key, location = %backend.describe(), error = %e, "Error loading expenses, starting fresh");
            Loaded {
                expenses: Vec::new(),
                warning: Some(e),
            }
        }
    }
}

fn read_slot<S: KeyValueStore + ?Sized>(backend: &S, key: &str) -> Result<Vec<Expense>, StorageError> {
    let saved = match backend.get(key)? {
        Some(saved) if !saved.trim().is_empty() => saved,
        _ => return Ok(Vec::new()),
    };

    serde_json::from_str(&saved).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub struct ExpenseStore<S: KeyValueStore> {
    backend: S,
    key: String,
    expenses: Vec<Expense>,
}

impl<S: KeyValueStore> ExpenseStore<S> {
    /// Load the store from `key` in `backend`. Never fails: an unreadable
    /// slot gives an empty store and the load warning.
    pub fn open(backend: S, key: impl Into<String>) -> (Self, Option<StorageError>) {
        let key = key.into();
        let Loaded { expenses, warning } = load(&backend, &key);

        debug!(slot = %key, location = %backend.describe(), count = expenses.len(), "expense store opened");

        let store = ExpenseStore {
            backend,
            key,
            expenses,
        };
        (store, warning)
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id() == id)
    }

    pub fn slot_key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Validate and prepend a new expense, then persist. A rejected candidate
    /// leaves the store untouched.
    pub fn add(&mut self, candidate: &ExpenseCandidate) -> Result<Saved<Expense>, ValidationError> {
        let expense = validate(candidate)?;
        Ok(self.insert(expense))
    }

    /// Prepend an already validated record, then persist.
    pub fn insert(&mut self, expense: Expense) -> Saved<Expense> {
        info!(id = %expense.id(), amount = %expense.amount(), category = expense.category(), "expense added");

        self.expenses.insert(0, expense.clone());
        let save_error = self.persist().err();

        Saved {
            value: expense,
            save_error,
        }
    }

    /// Remove the record with `id`. Unknown ids are a no-op; the list is
    /// persisted either way. Returns whether a record was removed.
    pub fn delete(&mut self, id: &ExpenseId) -> Saved<bool> {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id() != id);
        let removed = self.expenses.len() < before;

        if removed {
            info!(id = %id, "expense deleted");
        } else {
            debug!(id = %id, "delete of unknown expense ignored");
        }

        let save_error = self.persist().err();
        Saved {
            value: removed,
            save_error,
        }
    }

    /// Write the full list to the slot as one value.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let result = serde_json::to_string(&self.expenses)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.set(&self.key, &json));

        match &result {
            Ok(()) => debug!(slot = %self.key, count = self.expenses.len(), "expenses saved"),
            Err(e) => error!(slot = %self.key, location = %self.backend.describe(), error = %e, "Error saving expenses"),
        }
        result
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Sum of every stored amount, whatever view filter is active.
    pub fn total(&self) -> Decimal {
        sum_amounts(self.expenses.iter().map(|e| e.amount()))
    }

    pub fn by_category(&self, category: &str) -> Vec<&Expense> {
        self.expenses.iter().filter(|e| e.in_category(category)).collect()
    }

    pub fn total_by_category(&self, category: &str) -> Decimal {
        sum_amounts(self.by_category(category).iter().map(|e| e.amount()))
    }

    /// Distinct categories in use, in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for e in &self.expenses {
            if !seen.contains(&e.category()) {
                seen.push(e.category());
            }
        }
        seen
    }

    /// Per-category sums, largest first (ties by name).
    pub fn category_totals(&self) -> Vec<(String, Decimal)> {
        let mut totals: Vec<(String, Decimal)> = self
            .categories()
            .into_iter()
            .map(|c| (c.to_string(), self.total_by_category(c)))
            .collect();

        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        totals
    }
}

// ============================================================================
// TESTS
// ============================================================================
