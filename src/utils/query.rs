//! Dynamic `WHERE` clauses for list endpoints.
//!
//! Values are bound as text and cast in the condition where needed
//! (`user_id = {}::uuid`), so one parameter list serves both the count and
//! the page query.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Default)]
pub struct Filters {
    clause: String,
    params: Vec<String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `AND <condition>`; every `{}` in `condition` becomes the new
    /// parameter's placeholder.
    pub fn push(&mut self, condition: &str, value: impl ToString) -> &mut Self {
        self.params.push(value.to_string());
        let placeholder = format!("${}", self.params.len());
        self.clause.push_str(" AND ");
        self.clause.push_str(&condition.replace("{}", &placeholder));
        self
    }

    pub fn push_opt<T: ToString>(&mut self, condition: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(condition, value);
        }
        self
    }

    /// Case-insensitive substring match.
    pub fn push_like(&mut self, condition: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(condition, format!("%{}%", value));
        }
        self
    }

    /// Add a condition without a parameter.
    pub fn push_raw(&mut self, condition: &str) -> &mut Self {
        self.clause.push_str(" AND ");
        self.clause.push_str(condition);
        self
    }

    pub fn where_clause(&self) -> String {
        format!(" WHERE 1=1{}", self.clause)
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub async fn count(&self, db: &PgPool, from: &str) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}{}", from, self.where_clause());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in &self.params {
            query = query.bind(param);
        }
        query.fetch_one(db).await
    }

    pub async fn fetch_page<T>(
        &self,
        db: &PgPool,
        select: &str,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "{}{} ORDER BY {} LIMIT {} OFFSET {}",
            select,
            self.where_clause(),
            order_by,
            limit,
            offset
        );
        let mut query = sqlx::query_as::<_, T>(&sql);
        for param in &self.params {
            query = query.bind(param);
        }
        query.fetch_all(db).await
    }
}
