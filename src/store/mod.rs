//! # Storage
//!
//! The repository talks to persistence only through [`ExpenseStore`], so the
//! SQLite table and the in-memory double are interchangeable.
//!
//! Stores do not validate. Everything they are handed has already passed
//! [`crate::validation::validate`].

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::expense::{CategoryTotal, Expense, ExpenseQuery, FacetField, MonthlyTotal, NewExpense};
use anyhow::Result;

/// A durable table of expense rows.
pub trait ExpenseStore {
    /// Insert a row and return the id the store assigned to it.
    /// Ids increase monotonically and are never reused.
    fn insert(&mut self, expense: &NewExpense) -> Result<i64>;

    /// Overwrite every field of an existing row.
    /// Returns false if no row has that id.
    fn update(&mut self, id: i64, expense: &NewExpense) -> Result<bool>;

    /// Delete a row. Returns false if no row has that id.
    fn delete(&mut self, id: i64) -> Result<bool>;

    fn get(&self, id: i64) -> Result<Option<Expense>>;

    /// Rows matching the query's filter, in the query's order
    /// (ascending id when unsorted).
    fn query(&self, query: &ExpenseQuery) -> Result<Vec<Expense>>;

    /// Raw `SUM(amount)`: `None` when the table is empty.
    fn sum_amount(&self) -> Result<Option<f64>>;

    /// Distinct values of a facet column, ascending.
    fn distinct(&self, field: FacetField) -> Result<Vec<String>>;

    /// Total amount per "YYYY-MM", ascending by month.
    fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>>;

    /// Total amount per category, ascending by category.
    fn category_totals(&self) -> Result<Vec<CategoryTotal>>;
}
