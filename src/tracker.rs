// 🎛️ Command Interface - what any front end (CLI, TUI, HTTP) calls
//
// submit_expense / request_delete / set_filter in, notices and views out.
// The tracker owns the store; front ends never touch the slot directly.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::expense::{sum_amounts, Expense, ExpenseCandidate, ExpenseId, ValidationError};
use crate::storage::KeyValueStore;
use crate::store::ExpenseStore;

pub const MSG_ADDED: &str = "Expense added successfully!";
pub const MSG_DELETED: &str = "Expense deleted successfully!";
pub const MSG_SAVE_FAILED: &str = "Failed to save expenses. Please try again.";
pub const MSG_LOAD_FAILED: &str = "Failed to load expenses. Starting fresh.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this expense?";

// ============================================================================
// NOTICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A short message for the user about the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Which records the list view shows. Never affects `total()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(c) => expense.in_category(c),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Category(c) => c,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    /// Blank text means no filter. Any other text, "all" included, names a
    /// category, so every stored category stays selectable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Category(s.to_string()))
        }
    }
}

impl From<Option<&str>> for CategoryFilter {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(s) => s.parse().unwrap_or_default(),
            None => CategoryFilter::All,
        }
    }
}

// ============================================================================
// CONFIRMATION GATE
// ============================================================================

/// Interactive yes/no gate asked before destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirmation already given out of band (e.g. `--yes`, `?confirm=true`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Outcome of `submit_expense`.
#[derive(Debug)]
pub enum Submission {
    Added { expense: Expense, notice: Notice },
    Rejected { error: ValidationError, notice: Notice },
}

impl Submission {
    pub fn notice(&self) -> &Notice {
        match self {
            Submission::Added { notice, .. } | Submission::Rejected { notice, .. } => notice,
        }
    }

    pub fn expense(&self) -> Option<&Expense> {
        match self {
            Submission::Added { expense, .. } => Some(expense),
            Submission::Rejected { .. } => None,
        }
    }
}

pub struct ExpenseTracker<S: KeyValueStore> {
    store: ExpenseStore<S>,
    filter: CategoryFilter,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore> ExpenseTracker<S> {
    /// Load expenses from `key`; an unreadable slot queues a warning notice.
    pub fn open(backend: S, key: impl Into<String>) -> Self {
        let (store, warning) = ExpenseStore::open(backend, key);

        let mut notices = Vec::new();
        if warning.is_some() {
            notices.push(Notice::warning(MSG_LOAD_FAILED));
        }

        ExpenseTracker {
            store,
            filter: CategoryFilter::All,
            notices,
        }
    }

    pub fn store(&self) -> &ExpenseStore<S> {
        &self.store
    }

    /// Pending notices not tied to a command (load failures), oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn submit_expense(&mut self, candidate: &ExpenseCandidate) -> Submission {
        match self.store.add(candidate) {
            Ok(saved) => {
                let notice = match saved.save_error {
                    None => Notice::success(MSG_ADDED),
                    Some(_) => Notice::error(MSG_SAVE_FAILED),
                };
                Submission::Added {
                    expense: saved.value,
                    notice,
                }
            }
            Err(error) => {
                debug!(field = error.field(), reason = %error, "expense rejected");
                let notice = Notice::error(error.to_string());
                Submission::Rejected { error, notice }
            }
        }
    }

    /// Delete `id` once `confirm` agrees. `None` when the user declined.
    pub fn request_delete(&mut self, id: &ExpenseId, confirm: &mut dyn Confirm) -> Option<Notice> {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(id = %id, "delete declined");
            return None;
        }

        let saved = self.store.delete(id);
        Some(match saved.save_error {
            None => Notice::success(MSG_DELETED),
            Some(_) => Notice::error(MSG_SAVE_FAILED),
        })
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        debug!(filter = filter.label(), "filter changed");
        self.filter = filter;
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Records passing the current filter, newest date first.
    pub fn visible(&self) -> Vec<&Expense> {
        self.view(&self.filter)
    }

    /// Records passing `filter`, newest date first. Records sharing a date
    /// keep their newest-added-first order.
    pub fn view(&self, filter: &CategoryFilter) -> Vec<&Expense> {
        let mut visible: Vec<&Expense> = self
            .store
            .expenses()
            .iter()
            .filter(|e| filter.matches(e))
            .collect();
        visible.sort_by(|a, b| b.date().cmp(&a.date()));
        visible
    }

    /// Running total over every record, regardless of the filter.
    pub fn total(&self) -> Decimal {
        self.store.total()
    }

    /// Total of what the list view currently shows.
    pub fn filtered_total(&self) -> Decimal {
        sum_amounts(self.visible().iter().map(|e| e.amount()))
    }

    /// Per-category totals over every record, largest first.
    pub fn category_totals(&self) -> Vec<(String, Decimal)> {
        self.store.category_totals()
    }

    pub fn expenses(&self) -> &[Expense] {
        self.store.expenses()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::store::DEFAULT_SLOT_KEY;
    use rust_decimal_macros::dec;

    fn tracker() -> ExpenseTracker<MemoryStore> {
        ExpenseTracker::open(MemoryStore::new(), DEFAULT_SLOT_KEY)
    }

    fn submit(t: &mut ExpenseTracker<MemoryStore>, amount: &str, category: &str, description: &str, date: &str) -> Submission {
        t.submit_expense(&ExpenseCandidate::new(amount, category, description, date))
    }

    #[test]
    fn test_submit_success_notice() {
        let mut t = tracker();
        let submission = submit(&mut t, "12.50", "Food", "Lunch", "2024-01-10");

        assert_eq!(submission.notice(), &Notice::success(MSG_ADDED));
        assert_eq!(submission.expense().unwrap().description(), "Lunch");
        assert_eq!(t.total(), dec!(12.50));
    }

    #[test]
    fn test_submit_rejection_reason() {
        let mut t = tracker();
        let submission = submit(&mut t, "0", "Food", "Nothing", "2024-01-10");

        match submission {
            Submission::Rejected { error, notice } => {
                assert_eq!(error, ValidationError::InvalidAmount);
                assert_eq!(notice.level, NoticeLevel::Error);
                assert_eq!(notice.message, "Please enter a valid amount greater than 0.");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(t.expenses().is_empty());
    }

    #[test]
    fn test_declined_delete_changes_nothing() {
        let mut t = tracker();
        let id = submit(&mut t, "5", "Food", "Bagel", "2024-01-10").expense().unwrap().id().clone();

        let mut asked = Vec::new();
        let notice = t.request_delete(&id, &mut |prompt: &str| {
            asked.push(prompt.to_string());
            false
        });

        assert!(notice.is_none());
        assert_eq!(asked, vec![DELETE_PROMPT.to_string()]);
        assert_eq!(t.expenses().len(), 1);
    }

    #[test]
    fn test_confirmed_delete() {
        let mut t = tracker();
        let id = submit(&mut t, "5", "Food", "Bagel", "2024-01-10").expense().unwrap().id().clone();

        let notice = t.request_delete(&id, &mut AssumeYes).unwrap();
        assert_eq!(notice, Notice::success(MSG_DELETED));
        assert!(t.expenses().is_empty());

        // Unknown id: still a success, nothing removed
        let notice = t.request_delete(&ExpenseId::from("gone"), &mut AssumeYes).unwrap();
        assert!(notice.is_success());
    }

    #[test]
    fn test_filter_limits_view_not_total() {
        let mut t = tracker();
        submit(&mut t, "12.50", "Food", "Lunch", "2024-01-10");
        submit(&mut t, "7.25", "Transport", "Bus", "2024-01-11");
        submit(&mut t, "3.00", "Food", "Coffee", "2024-01-09");

        t.set_filter("Food".parse().unwrap());
        let visible: Vec<_> = t.visible().iter().map(|e| e.description()).collect();
        assert_eq!(visible, vec!["Lunch", "Coffee"]);
        assert_eq!(t.filtered_total(), dec!(15.50));
        assert_eq!(t.total(), dec!(22.75));

        t.set_filter(CategoryFilter::All);
        assert_eq!(t.visible().len(), 3);
    }

    #[test]
    fn test_visible_orders_by_date_then_insertion() {
        let mut t = tracker();
        submit(&mut t, "1", "Food", "Older", "2024-01-01");
        submit(&mut t, "1", "Food", "Same day first", "2024-02-01");
        submit(&mut t, "1", "Food", "Same day second", "2024-02-01");

        let visible: Vec<_> = t.visible().iter().map(|e| e.description()).collect();
        assert_eq!(visible, vec!["Same day second", "Same day first", "Older"]);
    }

    #[test]
    fn test_load_failure_queues_warning() {
        let mut backend = MemoryStore::new();
        backend.set(DEFAULT_SLOT_KEY, "[{broken").unwrap();

        let mut t = ExpenseTracker::open(backend, DEFAULT_SLOT_KEY);
        assert!(t.expenses().is_empty());
        assert_eq!(t.take_notices(), vec![Notice::warning(MSG_LOAD_FAILED)]);
        assert!(t.take_notices().is_empty());
    }

    #[test]
    fn test_save_failure_notice_keeps_record() {
        let mut t = ExpenseTracker::open(MemoryStore::with_quota(64), DEFAULT_SLOT_KEY);
        let submission = submit(&mut t, "9.99", "Shopping", "Socks", "2024-01-10");

        assert_eq!(submission.notice(), &Notice::error(MSG_SAVE_FAILED));
        assert_eq!(t.expenses().len(), 1);
        assert!(matches!(
            t.store().backend().get(DEFAULT_SLOT_KEY),
            Ok(None)
        ));
    }

    #[test]
    fn test_view_ignores_active_filter() {
        let mut t = tracker();
        submit(&mut t, "12.50", "Food", "Lunch", "2024-01-10");
        submit(&mut t, "7.25", "Transport", "Bus", "2024-01-11");
        submit(&mut t, "3.00", "Food", "Coffee", "2024-01-09");

        t.set_filter("Food".parse().unwrap());
        let transport = t.view(&CategoryFilter::Category("Transport".to_string()));
        assert_eq!(transport.len(), 1);
        assert_eq!(t.visible().len(), 2);

        assert_eq!(
            t.category_totals(),
            vec![("Food".to_string(), dec!(15.50)), ("Transport".to_string(), dec!(7.25))]
        );
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("  ".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "ALL".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Category("ALL".to_string())
        );
        assert_eq!(
            " Food ".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Category("Food".to_string())
        );
        assert_eq!(CategoryFilter::from(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::from(Some("")), CategoryFilter::All);
    }

    #[test]
    fn test_category_named_all_is_filterable() {
        let mut t = tracker();
        submit(&mut t, "4", "all", "Everything store", "2024-01-10");
        submit(&mut t, "9", "Food", "Dinner", "2024-01-11");

        t.set_filter(CategoryFilter::from(Some("all")));
        let visible: Vec<_> = t.visible().iter().map(|e| e.description()).collect();
        assert_eq!(visible, vec!["Everything store"]);
        assert_eq!(t.filtered_total(), dec!(4));
        assert_eq!(t.total(), dec!(13));
    }
}
