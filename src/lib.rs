// Expense Tracker - Core Library
// Exposes the repository and its stores for the CLI, the terminal UI and tests

pub mod config;
pub mod error;
pub mod expense;
pub mod report;
pub mod repository;
pub mod store;
pub mod transfer;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{ExpenseError, Result};
pub use expense::{
    CategoryTotal, Expense, ExpenseDraft, ExpenseFilter, ExpenseQuery, FacetField, MonthlyTotal,
    NewExpense, SortKey, SortOrder, ALL_CATEGORIES, ALL_LOCATIONS, ALL_MONTHS,
};
pub use report::{CategoryShare, Summary};
pub use repository::{ExpenseRepository, ImportSummary};
pub use store::{ExpenseStore, MemoryStore, SqliteStore};
pub use transfer::{read_drafts, write_expenses};
pub use validation::{validate, ValidationError};
