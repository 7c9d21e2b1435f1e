use super::ExpenseStore;
use crate::expense::{
    CategoryTotal, Expense, ExpenseQuery, FacetField, MonthlyTotal, NewExpense, SortKey, SortOrder,
};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory expense table with the same observable behaviour as
/// [`super::SqliteStore`]. Used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<Expense>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl ExpenseStore for MemoryStore {
    fn insert(&mut self, expense: &NewExpense) -> Result<i64> {
        // AUTOINCREMENT semantics: never hand out an id twice
        self.last_id += 1;
        self.rows.push(expense.clone().with_id(self.last_id));
        Ok(self.last_id)
    }

    fn update(&mut self, id: i64, expense: &NewExpense) -> Result<bool> {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                *row = expense.clone().with_id(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        Ok(self.rows.len() != before)
    }

    fn get(&self, id: i64) -> Result<Option<Expense>> {
        Ok(self.rows.iter().find(|row| row.id == id).cloned())
    }

    fn query(&self, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let mut matching: Vec<Expense> = self
            .rows
            .iter()
            .filter(|row| row.matches(&query.filter))
            .cloned()
            .collect();

        // Rows are kept in id order, and sort_by is stable, so ties stay
        // in id order like the SQL tiebreaker.
        if let Some((key, order)) = query.sort {
            matching.sort_by(|a, b| {
                let ordering = match key {
                    SortKey::Date => a.date.cmp(&b.date),
                    SortKey::Amount => a.amount.total_cmp(&b.amount),
                };
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        Ok(matching)
    }

    fn sum_amount(&self) -> Result<Option<f64>> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.rows.iter().map(|row| row.amount).sum()))
    }

    fn distinct(&self, field: FacetField) -> Result<Vec<String>> {
        let values: BTreeSet<&str> = self.rows.iter().map(|row| field.value_of(row)).collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for row in &self.rows {
            *totals.entry(row.year_month()).or_insert(0.0) += row.amount;
        }

        Ok(totals
            .into_iter()
            .map(|(month, total)| MonthlyTotal { month, total })
            .collect())
    }

    fn category_totals(&self) -> Result<Vec<CategoryTotal>> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for row in &self.rows {
            *totals.entry(row.category.as_str()).or_insert(0.0) += row.amount;
        }

        Ok(totals
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect())
    }
}
