use super::ExpenseStore;
use crate::expense::{CategoryTotal, Expense, ExpenseQuery, FacetField, MonthlyTotal, NewExpense};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const COLUMNS: &str = "id, date, category, amount, description, location";

/// Expense table backed by a single SQLite connection held for the session.
/// Every write is one auto-committed statement.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the table exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        // WAL for crash recovery; not available for in-memory databases
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;

        setup_database(&conn)?;
        debug!(path = %path.display(), "opened expense database");

        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

/// Create the expense table if absent. The schema is never migrated.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS my_expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date DATE,
            category TEXT,
            amount REAL,
            description TEXT,
            location TEXT
        )",
        [],
    )
    .context("Failed to create expense table")?;

    Ok(())
}

fn map_expense_row(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
    })
}

impl ExpenseStore for SqliteStore {
    fn insert(&mut self, expense: &NewExpense) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO my_expenses (date, category, amount, description, location)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                expense.date,
                expense.category,
                expense.amount,
                expense.description,
                expense.location,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, id: i64, expense: &NewExpense) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE my_expenses
             SET date = ?1, category = ?2, amount = ?3, description = ?4, location = ?5
             WHERE id = ?6",
            params![
                expense.date,
                expense.category,
                expense.amount,
                expense.description,
                expense.location,
                id,
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM my_expenses WHERE id = ?1", params![id])?;

        Ok(changed > 0)
    }

    fn get(&self, id: i64) -> Result<Option<Expense>> {
        let expense = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM my_expenses WHERE id = ?1"),
                params![id],
                map_expense_row,
            )
            .optional()?;

        Ok(expense)
    }

    fn query(&self, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let filter = &query.filter;
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<&str> = Vec::new();

        if let Some(category) = filter.category.as_deref() {
            clauses.push("category = ?");
            args.push(category);
        }
        if let Some(location) = filter.location.as_deref() {
            clauses.push("location = ?");
            args.push(location);
        }
        if let Some(month) = filter.month.as_deref() {
            clauses.push("strftime('%m', date) = ?");
            args.push(month);
        }

        let mut sql = format!("SELECT {COLUMNS} FROM my_expenses");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        match query.sort {
            Some((key, order)) => {
                sql.push_str(&format!(" ORDER BY {} {}, id ASC", key.column(), order.keyword()))
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        debug!(%sql, "querying expenses");

        let mut stmt = self.conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(params_from_iter(args), map_expense_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    fn sum_amount(&self) -> Result<Option<f64>> {
        let total: Option<f64> =
            self.conn.query_row("SELECT SUM(amount) FROM my_expenses", [], |row| row.get(0))?;

        Ok(total)
    }

    fn distinct(&self, field: FacetField) -> Result<Vec<String>> {
        let column = field.column();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM my_expenses ORDER BY {column}"
        ))?;

        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(values)
    }

    fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', date) AS month, SUM(amount) AS total_amount
             FROM my_expenses
             GROUP BY month
             ORDER BY month",
        )?;

        let totals = stmt
            .query_map([], |row| {
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    fn category_totals(&self) -> Result<Vec<CategoryTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, SUM(amount) AS total_amount
             FROM my_expenses
             GROUP BY category
             ORDER BY category",
        )?;

        let totals = stmt
            .query_map([], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{ExpenseFilter, SortKey, SortOrder};
    use chrono::NaiveDate;

    fn new_expense(
        date: (i32, u32, u32),
        category: &str,
        amount: f64,
        location: &str,
    ) -> NewExpense {
        NewExpense {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category: category.to_string(),
            amount,
            description: "test".to_string(),
            location: location.to_string(),
        }
    }

    #[test]
    fn test_dates_are_stored_as_iso_text() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert(&new_expense((2024, 1, 5), "Food", 3.0, "Cafe")).unwrap();

        let stored: String = store
            .conn
            .query_row("SELECT date FROM my_expenses WHERE id = ?1", params![id], |row| row.get(0))
            .unwrap();

        assert_eq!(stored, "2024-01-05");
    }

    #[test]
    fn test_sum_is_null_on_empty_table() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.sum_amount().unwrap(), None);
    }

    #[test]
    fn test_sorted_query() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_expense((2024, 3, 1), "Food", 10.0, "Cafe")).unwrap();
        store.insert(&new_expense((2024, 1, 1), "Food", 30.0, "Cafe")).unwrap();
        store.insert(&new_expense((2024, 2, 1), "Rent", 20.0, "Home")).unwrap();

        let by_date = store
            .query(&ExpenseQuery::default().sorted_by(SortKey::Date, SortOrder::Ascending))
            .unwrap();
        let dates: Vec<u32> = by_date.iter().map(|e| chrono::Datelike::month(&e.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);

        let by_amount = store
            .query(
                &ExpenseQuery::new(ExpenseFilter::all().category("Food"))
                    .sorted_by(SortKey::Amount, SortOrder::Descending),
            )
            .unwrap();
        let amounts: Vec<f64> = by_amount.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![30.0, 10.0]);
    }

    #[test]
    fn test_filter_values_are_bound_not_interpolated() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_expense((2024, 1, 1), "Food", 1.0, "Cafe")).unwrap();

        let hostile = ExpenseQuery::new(ExpenseFilter::all().category("' OR '1'='1"));
        assert!(store.query(&hostile).unwrap().is_empty());
    }

    #[test]
    fn test_file_database_persists_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");

        let id = {
            let mut store = SqliteStore::open(&path).unwrap();
            store.insert(&new_expense((2024, 5, 20), "Books", 42.0, "Shop")).unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        let expense = store.get(id).unwrap().unwrap();
        assert_eq!(expense.category, "Books");
        assert_eq!(expense.amount, 42.0);
    }
}
