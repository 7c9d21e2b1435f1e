// Expense Repository - gatekeeper between user input and the store
//
// Every write is validated in full before the store is touched, so a
// rejected draft never leaves a partial row or a consumed id behind.

use crate::error::{ExpenseError, Result};
use crate::expense::{
    CategoryTotal, Expense, ExpenseDraft, ExpenseFilter, ExpenseQuery, FacetField, MonthlyTotal,
};
use crate::store::ExpenseStore;
use crate::validation::{validate, ValidationError};
use tracing::{debug, info, warn};

// ============================================================================
// IMPORT SUMMARY
// ============================================================================

/// Outcome of a bulk import: how many drafts were stored, and which were
/// rejected (by zero-based position in the input) and why.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: Vec<(usize, ValidationError)>,
}

// ============================================================================
// REPOSITORY
// ============================================================================

pub struct ExpenseRepository<S: ExpenseStore> {
    store: S,
}

impl<S: ExpenseStore> ExpenseRepository<S> {
    pub fn new(store: S) -> Self {
        ExpenseRepository { store }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Validate and insert a new expense, returning it with its new id
    pub fn add_expense(&mut self, draft: &ExpenseDraft) -> Result<Expense> {
        let expense = validate(draft)?;
        let id = self.store.insert(&expense)?;

        info!(id, category = %expense.category, amount = expense.amount, "expense added");
        Ok(expense.with_id(id))
    }

    /// Validate and overwrite every field of an existing expense.
    ///
    /// Validation runs first; an unknown id is reported as `NotFound`.
    pub fn edit_expense(&mut self, id: i64, draft: &ExpenseDraft) -> Result<Expense> {
        let expense = validate(draft)?;

        if !self.store.update(id, &expense)? {
            warn!(id, "edit of unknown expense");
            return Err(ExpenseError::NotFound(id));
        }

        info!(id, "expense updated");
        Ok(expense.with_id(id))
    }

    /// Delete an expense. Unknown ids are a no-op, so this is idempotent.
    /// Returns whether a row was actually removed.
    pub fn remove_expense(&mut self, id: i64) -> Result<bool> {
        let removed = self.store.delete(id)?;
        if removed {
            info!(id, "expense removed");
        } else {
            debug!(id, "remove of unknown expense ignored");
        }
        Ok(removed)
    }

    /// Add each draft in turn, skipping the ones that fail validation
    pub fn import_expenses(&mut self, drafts: &[ExpenseDraft]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (index, draft) in drafts.iter().enumerate() {
            match self.add_expense(draft) {
                Ok(_) => summary.inserted += 1,
                Err(ExpenseError::Validation(e)) => {
                    warn!(row = index, error = %e, "skipping invalid expense");
                    summary.rejected.push((index, e));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            inserted = summary.inserted,
            rejected = summary.rejected.len(),
            "import finished"
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn get_expenses(&self) -> Result<Vec<Expense>> {
        self.filter_expenses(&ExpenseQuery::default())
    }

    pub fn get_expense_by_id(&self, id: i64) -> Result<Option<Expense>> {
        Ok(self.store.get(id)?)
    }

    /// Sum of all amounts. An empty table sums to zero, never to nothing.
    pub fn get_total_expenses(&self) -> Result<f64> {
        Ok(self.store.sum_amount()?.unwrap_or(0.0))
    }

    pub fn get_expenses_by_category(&self, category: &str) -> Result<Vec<Expense>> {
        self.filter_expenses(&ExpenseQuery::new(ExpenseFilter::all().category(category)))
    }

    pub fn get_expenses_by_location(&self, location: &str) -> Result<Vec<Expense>> {
        self.filter_expenses(&ExpenseQuery::new(ExpenseFilter::all().location(location)))
    }

    /// `month` is two digits ("01".."12") and matches that month in any year
    pub fn get_expenses_by_month(&self, month: &str) -> Result<Vec<Expense>> {
        self.filter_expenses(&ExpenseQuery::new(ExpenseFilter::all().month(month)))
    }

    /// `None` on either side means "any"; both `None` returns every row
    pub fn get_expenses_by_category_and_location(
        &self,
        category: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<Expense>> {
        let filter = ExpenseFilter {
            category: category.map(str::to_string),
            location: location.map(str::to_string),
            month: None,
        };
        self.filter_expenses(&ExpenseQuery::new(filter))
    }

    /// Combined category/location/month filter with optional ordering
    pub fn filter_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let expenses = self.store.query(query)?;
        debug!(
            filter = ?query.filter,
            sort = ?query.sort,
            rows = expenses.len(),
            "filtered expenses"
        );
        Ok(expenses)
    }

    pub fn get_distinct_values(&self, field: FacetField) -> Result<Vec<String>> {
        Ok(self.store.distinct(field)?)
    }

    /// Total per calendar month, oldest first
    pub fn get_expense_trends(&self) -> Result<Vec<MonthlyTotal>> {
        Ok(self.store.monthly_totals()?)
    }

    pub fn get_category_totals(&self) -> Result<Vec<CategoryTotal>> {
        Ok(self.store.category_totals()?)
    }

    /// Every "YYYY-MM" that has at least one expense, oldest first
    pub fn get_distinct_months(&self) -> Result<Vec<String>> {
        Ok(self
            .get_expense_trends()?
            .into_iter()
            .map(|trend| trend.month)
            .collect())
    }
}
