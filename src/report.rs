// Spending summary - the numbers behind the trend and distribution charts

use crate::error::Result;
use crate::expense::MonthlyTotal;
use crate::repository::ExpenseRepository;
use crate::store::ExpenseStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    /// Percentage of the overall total (0 when nothing has been spent)
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total: f64,
    pub trends: Vec<MonthlyTotal>,
    pub categories: Vec<CategoryShare>,
}

impl Summary {
    pub fn build<S: ExpenseStore>(repo: &ExpenseRepository<S>) -> Result<Self> {
        let count = repo.get_expenses()?.len();
        let total = repo.get_total_expenses()?;

        let categories = repo
            .get_category_totals()?
            .into_iter()
            .map(|c| CategoryShare {
                percent: if total > 0.0 { c.total * 100.0 / total } else { 0.0 },
                category: c.category,
                total: c.total,
            })
            .collect();

        Ok(Summary {
            count,
            total,
            trends: repo.get_expense_trends()?,
            categories,
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
