// Expense model - the single flat record type and its query vocabulary

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Presentation-edge wildcard for the category filter
pub const ALL_CATEGORIES: &str = "All Categories";
/// Presentation-edge wildcard for the location filter
pub const ALL_LOCATIONS: &str = "All Locations";
/// Presentation-edge wildcard for the month filter
pub const ALL_MONTHS: &str = "All Months";

// ============================================================================
// EXPENSE
// ============================================================================

/// A persisted expense. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub location: String,
}

impl Expense {
    /// Two-digit month ("01".."12"), the key used by month filters
    pub fn month(&self) -> String {
        format!("{:02}", self.date.month())
    }

    /// Year and month ("2024-02"), the key used by trend aggregation
    pub fn year_month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    pub fn matches(&self, filter: &ExpenseFilter) -> bool {
        filter.category.as_deref().map_or(true, |c| self.category == c)
            && filter.location.as_deref().map_or(true, |l| self.location == l)
            && filter.month.as_deref().map_or(true, |m| self.month() == m)
    }
}

/// Raw user input, exactly as typed. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseDraft {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub amount: String,
    pub description: String,
    pub location: String,
}

impl ExpenseDraft {
    pub fn new(
        date: Option<NaiveDate>,
        category: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        ExpenseDraft {
            date,
            category: category.into(),
            amount: amount.into(),
            description: description.into(),
            location: location.into(),
        }
    }

    /// Draft pre-filled from a stored expense (edit forms start from this)
    pub fn from_expense(expense: &Expense) -> Self {
        ExpenseDraft {
            date: Some(expense.date),
            category: expense.category.clone(),
            amount: expense.amount.to_string(),
            description: expense.description.clone(),
            location: expense.location.clone(),
        }
    }
}

/// A draft that passed validation and may be written to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub location: String,
}

impl NewExpense {
    pub fn with_id(self, id: i64) -> Expense {
        Expense {
            id,
            date: self.date,
            category: self.category,
            amount: self.amount,
            description: self.description,
            location: self.location,
        }
    }
}

// ============================================================================
// FACETS, FILTERS, SORTING
// ============================================================================

/// Columns that can be faceted into distinct filter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    Category,
    Location,
}

impl FacetField {
    pub fn column(&self) -> &'static str {
        match self {
            FacetField::Category => "category",
            FacetField::Location => "location",
        }
    }

    pub fn value_of<'a>(&self, expense: &'a Expense) -> &'a str {
        match self {
            FacetField::Category => &expense.category,
            FacetField::Location => &expense.location,
        }
    }
}

/// Conjunctive filter. `None` on a dimension means "do not filter on it".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    /// Two-digit month, matched against the date's month in any year
    pub month: Option<String>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        ExpenseFilter::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    /// Build a filter from UI selections, where the "All ..." labels mean
    /// no filter on that dimension.
    pub fn from_selection(category: &str, location: &str, month: &str) -> Self {
        fn unless(value: &str, sentinel: &str) -> Option<String> {
            (value != sentinel).then(|| value.to_string())
        }

        ExpenseFilter {
            category: unless(category, ALL_CATEGORIES),
            location: unless(location, ALL_LOCATIONS),
            month: unless(month, ALL_MONTHS),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.location.is_none() && self.month.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Amount,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Amount => "amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Filter plus optional ordering. Without a sort, rows come back in
/// storage order (ascending id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub filter: ExpenseFilter,
    pub sort: Option<(SortKey, SortOrder)>,
}

impl ExpenseQuery {
    pub fn new(filter: ExpenseFilter) -> Self {
        ExpenseQuery { filter, sort: None }
    }

    pub fn sorted_by(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = Some((key, order));
        self
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// "YYYY-MM"
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}
