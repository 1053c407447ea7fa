//! Shared pagination and ordering inputs for list queries.
//!
//! Each entity's filter struct (in `queries`) embeds a [`Page`] and, where
//! ordering is selectable, a [`SortOrder`]. Filters are rendered with
//! `sqlx::QueryBuilder` so every value is bound, never interpolated.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    /// Rows to skip
    pub skip: Option<i64>,
    /// Maximum rows to return
    pub take: Option<i64>,
}

impl Page {
    /// First `take` rows.
    pub fn first(take: i64) -> Self {
        Self {
            skip: None,
            take: Some(take),
        }
    }

    /// Rows `skip..skip + take`.
    pub fn window(skip: i64, take: i64) -> Self {
        Self {
            skip: Some(skip),
            take: Some(take),
        }
    }

    /// Append `LIMIT`/`OFFSET` clauses.
    ///
    /// SQLite has no bare OFFSET, so a skip without a take uses `LIMIT -1`.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match (self.take, self.skip) {
            (None, None) => {}
            (take, skip) => {
                qb.push(" LIMIT ");
                qb.push_bind(take.unwrap_or(-1).max(-1));
                if let Some(skip) = skip {
                    qb.push(" OFFSET ");
                    qb.push_bind(skip.max(0));
                }
            }
        }
    }
}

/// Tracks whether a WHERE clause has been opened yet.
pub(crate) struct Conditions {
    started: bool,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self { started: false }
    }

    /// Push `WHERE` for the first condition and `AND` afterwards.
    pub(crate) fn next<'a, 'args>(
        &mut self,
        qb: &'a mut QueryBuilder<'args, Sqlite>,
    ) -> &'a mut QueryBuilder<'args, Sqlite> {
        if self.started {
            qb.push(" AND ");
        } else {
            qb.push(" WHERE ");
            self.started = true;
        }
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(page: Page) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT 1");
        page.push_to(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_page_rendering() {
        assert_eq!(render(Page::default()), "SELECT 1");
        assert_eq!(render(Page::first(10)), "SELECT 1 LIMIT ?");
        assert_eq!(render(Page::window(5, 10)), "SELECT 1 LIMIT ? OFFSET ?");
        assert_eq!(
            render(Page {
                skip: Some(5),
                take: None
            }),
            "SELECT 1 LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_conditions_join_with_and() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM t");
        let mut conditions = Conditions::new();
        conditions.next(&mut qb).push("a = ").push_bind(1_i64);
        conditions.next(&mut qb).push("b = ").push_bind(2_i64);
        assert_eq!(qb.sql(), "SELECT * FROM t WHERE a = ? AND b = ?");
    }
}
