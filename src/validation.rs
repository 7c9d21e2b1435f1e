// Input validation - the only gate between typed text and the store
//
// Checks run in a fixed order and stop at the first failure, so the user
// always sees one actionable message at a time.

use crate::expense::{ExpenseDraft, NewExpense};
use chrono::{Datelike, NaiveDate};

/// Years a date may carry. Outside this range the ISO text form gains a
/// sign or a fifth digit and SQLite's date functions return NULL.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a date.")]
    MissingDate,
    #[error("Invalid date. Use YYYY-MM-DD.")]
    InvalidDate(NaiveDate),
    #[error("Please enter a category.")]
    MissingCategory,
    #[error("Please enter an amount.")]
    MissingAmount,
    #[error("Invalid amount. Please enter a number.")]
    InvalidAmount(String),
    #[error("Amount must be greater than zero.")]
    NonPositiveAmount(f64),
    #[error("Please enter a description.")]
    MissingDescription,
    #[error("Please enter a location.")]
    MissingLocation,
}

impl ValidationError {
    /// Name of the field the error is about
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingDate | ValidationError::InvalidDate(_) => "date",
            ValidationError::MissingCategory => "category",
            ValidationError::MissingAmount
            | ValidationError::InvalidAmount(_)
            | ValidationError::NonPositiveAmount(_) => "amount",
            ValidationError::MissingDescription => "description",
            ValidationError::MissingLocation => "location",
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Validate a draft into a record that may be persisted.
///
/// Order: date (missing, year outside 0..=9999), category, amount (missing,
/// not a number, not positive), description, location. Text fields are
/// trimmed; whitespace-only is empty.
pub fn validate(draft: &ExpenseDraft) -> Result<NewExpense, ValidationError> {
    let date = draft.date.ok_or(ValidationError::MissingDate)?;
    if !YEARS.contains(&date.year()) {
        return Err(ValidationError::InvalidDate(date));
    }

    let category = required(&draft.category, ValidationError::MissingCategory)?;

    let amount = parse_amount(&draft.amount)?;

    let description = required(&draft.description, ValidationError::MissingDescription)?;
    let location = required(&draft.location, ValidationError::MissingLocation)?;

    Ok(NewExpense {
        date,
        category,
        amount,
        description,
        location,
    })
}

fn required(value: &str, missing: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(missing)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a typed amount. `inf` and `NaN` parse as f64 but are not amounts.
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::MissingAmount);
    }

    let amount = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| ValidationError::InvalidAmount(raw.to_string()))?;

    if amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExpenseDraft {
        ExpenseDraft::new(
            NaiveDate::from_ymd_opt(2024, 1, 15),
            "Food",
            "12.50",
            "Lunch",
            "Cafe",
        )
    }

    #[test]
    fn test_valid_draft() {
        let expense = validate(&draft()).unwrap();

        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.amount, 12.5);
        assert_eq!(expense.description, "Lunch");
        assert_eq!(expense.location, "Cafe");
    }

    #[test]
    fn test_each_failure_is_distinct() {
        let cases = vec![
            (ExpenseDraft { date: None, ..draft() }, ValidationError::MissingDate),
            (
                ExpenseDraft { category: String::new(), ..draft() },
                ValidationError::MissingCategory,
            ),
            (
                ExpenseDraft { amount: String::new(), ..draft() },
                ValidationError::MissingAmount,
            ),
            (
                ExpenseDraft { amount: "twelve".to_string(), ..draft() },
                ValidationError::InvalidAmount("twelve".to_string()),
            ),
            (
                ExpenseDraft { amount: "0".to_string(), ..draft() },
                ValidationError::NonPositiveAmount(0.0),
            ),
            (
                ExpenseDraft { amount: "-3.5".to_string(), ..draft() },
                ValidationError::NonPositiveAmount(-3.5),
            ),
            (
                ExpenseDraft { description: String::new(), ..draft() },
                ValidationError::MissingDescription,
            ),
            (
                ExpenseDraft { location: String::new(), ..draft() },
                ValidationError::MissingLocation,
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(validate(&input), Err(expected));
        }
    }

    #[test]
    fn test_validation_stops_at_first_failure() {
        let input = ExpenseDraft {
            date: None,
            category: String::new(),
            amount: "abc".to_string(),
            description: String::new(),
            location: String::new(),
        };

        assert_eq!(validate(&input), Err(ValidationError::MissingDate));

        let input = ExpenseDraft {
            amount: "abc".to_string(),
            location: String::new(),
            ..draft()
        };

        assert_eq!(validate(&input), Err(ValidationError::InvalidAmount("abc".to_string())));
    }

    #[test]
    fn test_whitespace_only_text_is_missing() {
        let input = ExpenseDraft { location: "   ".to_string(), ..draft() };
        assert_eq!(validate(&input), Err(ValidationError::MissingLocation));

        let input = ExpenseDraft { category: "  Food ".to_string(), ..draft() };
        assert_eq!(validate(&input).unwrap().category, "Food");
    }

    #[test]
    fn test_dates_outside_four_digit_years() {
        let far_future = NaiveDate::parse_from_str("+10000-01-15", "%Y-%m-%d").unwrap();
        let input = ExpenseDraft { date: Some(far_future), ..draft() };
        assert_eq!(validate(&input), Err(ValidationError::InvalidDate(far_future)));

        let before_year_zero = NaiveDate::from_ymd_opt(-1, 6, 1).unwrap();
        let input = ExpenseDraft {
            date: Some(before_year_zero),
            amount: "x".to_string(),
            ..draft()
        };
        assert_eq!(validate(&input), Err(ValidationError::InvalidDate(before_year_zero)));

        for edge in [(0, 1, 1), (9999, 12, 31)] {
            let date = NaiveDate::from_ymd_opt(edge.0, edge.1, edge.2);
            assert!(validate(&ExpenseDraft { date, ..draft() }).is_ok());
        }
    }

    #[test]
    fn test_non_finite_amounts_are_invalid() {
        for raw in ["inf", "NaN", "-inf"] {
            assert_eq!(parse_amount(raw), Err(ValidationError::InvalidAmount(raw.to_string())));
        }
        assert_eq!(parse_amount(" 7.25 "), Ok(7.25));
        assert_eq!(parse_amount("   "), Err(ValidationError::InvalidAmount("   ".to_string())));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(ValidationError::MissingDate.field(), "date");
        assert_eq!(ValidationError::InvalidDate(NaiveDate::MAX).field(), "date");
        assert_eq!(ValidationError::NonPositiveAmount(0.0).field(), "amount");
        assert_eq!(ValidationError::MissingLocation.field(), "location");
        assert_eq!(
            ValidationError::InvalidAmount("x".to_string()).to_string(),
            "Invalid amount. Please enter a number."
        );
    }
}
