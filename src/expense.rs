// 🧾 Expense Model - records, candidates and validation
//
// An Expense is only ever built from an ExpenseCandidate that passed
// validation. Once built it is never mutated; deletion is the only way out.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Calendar date format used by candidates, storage and exports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest amount a single expense may carry (one billion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Exact sum of the given amounts. Saturates at `Decimal::MAX` instead of
/// overflowing, which only records loaded from outside data can reach.
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let mut total = Decimal::ZERO;
    for amount in amounts {
        match total.checked_add(amount) {
            Some(sum) => total = sum,
            None => {
                warn!("expense total overflowed, capping at the largest decimal");
                return Decimal::MAX;
            }
        }
    }
    total
}

// ============================================================================
// IDENTITY
// ============================================================================

/// Opaque record identity. Fresh ids are v4 UUIDs; ids loaded from older
/// data are kept verbatim whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn generate() -> Self {
        ExpenseId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        ExpenseId(value.to_string())
    }
}

impl From<String> for ExpenseId {
    fn from(value: String) -> Self {
        ExpenseId(value)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// A stored expense. Field names on the wire are `id`, `amount`, `category`,
/// `description`, `date` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: ExpenseId,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    amount: Decimal,
    category: String,
    description: String,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Expense {
    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The date the user chose for the expense (not the creation time)
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// When the record was created; audit and export only
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category == category
    }
}

// ============================================================================
// CANDIDATE (raw user input)
// ============================================================================

/// Unvalidated input proposed for a new expense, kept as the raw text a form
/// or command line delivers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCandidate {
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

// JSON clients send the amount either as a number or as text.
fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "amount must be a number or a string, got {}",
            other
        ))),
    }
}

impl ExpenseCandidate {
    pub fn new(
        amount: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        ExpenseCandidate {
            amount: amount.into(),
            category: category.into(),
            description: description.into(),
            date: date.into(),
        }
    }

    fn parse_amount(&self) -> Result<Decimal, ValidationError> {
        match Decimal::from_str(self.amount.trim()) {
            Ok(amount) if amount > Decimal::ZERO && amount <= MAX_AMOUNT => Ok(amount),
            _ => Err(ValidationError::InvalidAmount),
        }
    }

    fn parse_category(&self) -> Result<String, ValidationError> {
        let category = self.category.trim();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        Ok(category.to_string())
    }

    fn parse_description(&self) -> Result<String, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        Ok(description.to_string())
    }

    fn parse_date(&self) -> Result<NaiveDate, ValidationError> {
        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Why a candidate was rejected. The messages are the ones shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid amount greater than 0.")]
    InvalidAmount,
    #[error("Please select a category.")]
    MissingCategory,
    #[error("Please enter a description.")]
    MissingDescription,
    #[error("Please select a date.")]
    MissingDate,
    #[error("Please select a valid date (YYYY-MM-DD), got {0:?}.")]
    InvalidDate(String),
}

impl ValidationError {
    /// Name of the candidate field that failed
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount => "amount",
            ValidationError::MissingCategory => "category",
            ValidationError::MissingDescription => "description",
            ValidationError::MissingDate | ValidationError::InvalidDate(_) => "date",
        }
    }
}

/// Validate a candidate and build the record it describes, with a fresh id
/// and the current time as creation timestamp.
///
/// Checks run in order (amount, category, description, date) and stop at the
/// first failure.
pub fn validate(candidate: &ExpenseCandidate) -> Result<Expense, ValidationError> {
    validate_at(candidate, ExpenseId::generate(), Utc::now())
}

/// Same as [`validate`] with caller-supplied identity and creation time.
pub fn validate_at(
    candidate: &ExpenseCandidate,
    id: ExpenseId,
    created_at: DateTime<Utc>,
) -> Result<Expense, ValidationError> {
    let amount = candidate.parse_amount()?;
    let category = candidate.parse_category()?;
    let description = candidate.parse_description()?;
    let date = candidate.parse_date()?;

    Ok(Expense {
        id,
        amount,
        category,
        description,
        date,
        created_at,
    })
}

/// Every failing condition of a candidate, in check order. Empty when the
/// candidate is valid.
pub fn validate_all(candidate: &ExpenseCandidate) -> Vec<ValidationError> {
    [
        candidate.parse_amount().err(),
        candidate.parse_category().err(),
        candidate.parse_description().err(),
        candidate.parse_date().err(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lunch() -> ExpenseCandidate {
        ExpenseCandidate::new("12.50", "Food", "Lunch", "2024-01-10")
    }

    #[test]
    fn test_validate_valid_candidate() {
        let expense = validate(&lunch()).unwrap();

        assert_eq!(expense.amount(), dec!(12.50));
        assert_eq!(expense.category(), "Food");
        assert_eq!(expense.description(), "Lunch");
        assert_eq!(expense.date(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(!expense.id().as_str().is_empty());
    }

    #[test]
    fn test_validate_trims_description() {
        let mut candidate = lunch();
        candidate.description = "   Lunch with team  ".to_string();

        let expense = validate(&candidate).unwrap();
        assert_eq!(expense.description(), "Lunch with team");
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        for amount in ["0", "-3", "0.00", "", "abc", "NaN"] {
            let mut candidate = lunch();
            candidate.amount = amount.to_string();

            assert_eq!(
                validate(&candidate).unwrap_err(),
                ValidationError::InvalidAmount,
                "amount {:?} should be rejected",
                amount
            );
        }
    }

    #[test]
    fn test_validate_amount_upper_bound() {
        let mut candidate = lunch();
        candidate.amount = "1000000000".to_string();
        assert_eq!(validate(&candidate).unwrap().amount(), MAX_AMOUNT);

        for amount in ["1000000000.01", "79228162514264337593543950335"] {
            candidate.amount = amount.to_string();
            assert_eq!(validate(&candidate).unwrap_err(), ValidationError::InvalidAmount);
        }
    }

    #[test]
    fn test_sum_amounts_saturates() {
        assert_eq!(sum_amounts([dec!(12.50), dec!(7.25)]), dec!(19.75));
        assert_eq!(sum_amounts(Vec::<Decimal>::new()), Decimal::ZERO);
        assert_eq!(sum_amounts([Decimal::MAX, Decimal::MAX, dec!(1)]), Decimal::MAX);
    }

    #[test]
    fn test_high_precision_amount_survives_json() {
        let created_at = Utc::now();
        let mut candidate = lunch();
        candidate.amount = "0.123456789012345678".to_string();
        let expense = validate_at(&candidate, ExpenseId::from("p"), created_at).unwrap();

        let json = serde_json::to_string(&expense).unwrap();
        assert!(json.contains("\"amount\":0.123456789012345678"));

        let back: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount(), dec!(0.123456789012345678));
        assert_eq!(back, expense);
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut candidate = lunch();
        candidate.category = String::new();
        assert_eq!(validate(&candidate).unwrap_err(), ValidationError::MissingCategory);

        let mut candidate = lunch();
        candidate.description = "   ".to_string();
        assert_eq!(validate(&candidate).unwrap_err(), ValidationError::MissingDescription);

        let mut candidate = lunch();
        candidate.date = String::new();
        assert_eq!(validate(&candidate).unwrap_err(), ValidationError::MissingDate);
    }

    #[test]
    fn test_validate_unparseable_date() {
        let mut candidate = lunch();
        candidate.date = "10/01/2024".to_string();

        let err = validate(&candidate).unwrap_err();
        assert_eq!(err, ValidationError::InvalidDate("10/01/2024".to_string()));
        assert_eq!(err.field(), "date");
    }

    #[test]
    fn test_validate_reports_first_failure_only() {
        let candidate = ExpenseCandidate::new("0", "", "", "");

        assert_eq!(validate(&candidate).unwrap_err(), ValidationError::InvalidAmount);
    }

    #[test]
    fn test_validate_all_collects_in_order() {
        let candidate = ExpenseCandidate::new("0", "", " ", "");

        let errors = validate_all(&candidate);
        let fields: Vec<_> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["amount", "category", "description", "date"]);

        assert!(validate_all(&lunch()).is_empty());
    }

    #[test]
    fn test_wire_format_field_names() {
        let created_at = DateTime::parse_from_rfc3339("2024-01-10T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let expense = validate_at(&lunch(), ExpenseId::from("abc"), created_at).unwrap();

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["amount"].to_string(), "12.50");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["description"], "Lunch");
        assert_eq!(json["date"], "2024-01-10");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_reads_records_written_by_older_versions() {
        let json = r#"{
            "id": "1704879000000",
            "amount": 7.25,
            "category": "Transport",
            "description": "Bus",
            "date": "2024-01-11",
            "createdAt": "2024-01-11T08:15:00.000Z"
        }"#;

        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.id().as_str(), "1704879000000");
        assert_eq!(expense.amount(), dec!(7.25));
        assert!(expense.in_category("Transport"));
    }

    #[test]
    fn test_candidate_accepts_numeric_amount() {
        let candidate: ExpenseCandidate = serde_json::from_str(
            r#"{"amount": 19.75, "category": "Food", "description": "Dinner", "date": "2024-02-01"}"#,
        )
        .unwrap();

        assert_eq!(candidate.amount, "19.75");
        assert_eq!(validate(&candidate).unwrap().amount(), dec!(19.75));
    }
}
