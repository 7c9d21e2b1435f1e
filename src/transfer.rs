// CSV transfer - bulk import and export of expenses
//
// Imported rows are only drafts: they go through the repository's
// validation like anything typed into the UI.

use crate::expense::{Expense, ExpenseDraft};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One CSV row. Everything is text so that bad values reach validation
/// instead of failing deserialization.
#[derive(Debug, Deserialize, Serialize)]
struct ExpenseRecord {
    #[serde(rename = "Date")]
    date: String,

    #[serde(rename = "Category")]
    category: String,

    #[serde(rename = "Amount")]
    amount: String,

    #[serde(rename = "Description")]
    description: String,

    #[serde(rename = "Location")]
    location: String,
}

impl From<ExpenseRecord> for ExpenseDraft {
    fn from(record: ExpenseRecord) -> Self {
        ExpenseDraft {
            // An unreadable date is treated as no date at all
            date: NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT).ok(),
            category: record.category,
            amount: record.amount,
            description: record.description,
            location: record.location,
        }
    }
}

impl From<&Expense> for ExpenseRecord {
    fn from(expense: &Expense) -> Self {
        ExpenseRecord {
            date: expense.date.format(DATE_FORMAT).to_string(),
            category: expense.category.clone(),
            // Shortest text that parses back to the same f64
            amount: expense.amount.to_string(),
            description: expense.description.clone(),
            location: expense.location.clone(),
        }
    }
}

pub fn read_drafts(csv_path: &Path) -> Result<Vec<ExpenseDraft>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut drafts = Vec::new();

    for result in rdr.deserialize() {
        let record: ExpenseRecord = result.context("Failed to deserialize expense row")?;
        drafts.push(record.into());
    }

    Ok(drafts)
}

pub fn write_expenses(csv_path: &Path, expenses: &[Expense]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(csv_path)
        .with_context(|| format!("Failed to create CSV file {}", csv_path.display()))?;

    if expenses.is_empty() {
        // serialize() writes the header lazily, so an empty export needs it explicitly
        wtr.write_record(["Date", "Category", "Amount", "Description", "Location"])?;
    }

    for expense in expenses {
        wtr.serialize(ExpenseRecord::from(expense))
            .context("Failed to write expense row")?;
    }

    wtr.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ExpenseRepository;
    use crate::store::MemoryStore;
    use std::fs;

    #[test]
    fn test_read_drafts_keeps_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        fs::write(
            &path,
            "Date,Category,Amount,Description,Location\n\
             2024-01-15,Food,12.50,Lunch,Cafe\n\
             15/01/2024,Food,abc,Dinner,Cafe\n",
        )
        .unwrap();

        let drafts = read_drafts(&path).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(drafts[0].amount, "12.50");
        assert_eq!(drafts[1].date, None);
        assert_eq!(drafts[1].amount, "abc");
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut source = ExpenseRepository::new(MemoryStore::new());
        source
            .add_expense(&ExpenseDraft::new(
                NaiveDate::from_ymd_opt(2024, 2, 10),
                "Transit",
                "5",
                "Bus, return",
                "City",
            ))
            .unwrap();
        source
            .add_expense(&ExpenseDraft::new(
                NaiveDate::from_ymd_opt(2024, 2, 1),
                "Food",
                "20.00",
                "Dinner",
                "Cafe",
            ))
            .unwrap();
        for (amount, description) in [("0.004", "Stamp"), ("1.239", "Fuel per litre")] {
            source
                .add_expense(&ExpenseDraft::new(
                    NaiveDate::from_ymd_opt(2024, 3, 5),
                    "Misc",
                    amount,
                    description,
                    "Town",
                ))
                .unwrap();
        }

        let exported = source.get_expenses().unwrap();
        write_expenses(&path, &exported).unwrap();

        let mut target = ExpenseRepository::new(MemoryStore::new());
        let summary = target.import_expenses(&read_drafts(&path).unwrap()).unwrap();
        assert_eq!(summary.inserted, 4);
        assert!(summary.rejected.is_empty());

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(",0.004,"));
        assert!(contents.contains(",1.239,"));
        assert_eq!(target.get_expenses().unwrap(), exported);
    }

    #[test]
    fn test_empty_export_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_expenses(&path, &[]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "Date,Category,Amount,Description,Location");
        assert!(read_drafts(&path).unwrap().is_empty());
    }
}
