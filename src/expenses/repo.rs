use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::access::ListScope;
use crate::expenses::dto::{Category, ResolvedFilter, SortOrder, TimeWindow};

/// Expense record in the database. Ownership is set at insert and never
/// changes afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Category,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_id: Uuid,
}

const COLUMNS: &str = "id, title, description, amount, category, created_at, updated_at, owner_id";

impl Expense {
    /// Inserts a new expense; `created_at` and `updated_at` both take the
    /// transaction timestamp, so they start out equal.
    pub async fn create(
        db: &PgPool,
        owner_id: Uuid,
        title: &str,
        description: Option<&str>,
        amount: f64,
        category: Category,
    ) -> Result<Expense, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            "INSERT INTO expenses (title, description, amount, category, owner_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, description, amount, category, created_at, updated_at, owner_id",
        )
        .bind(title)
        .bind(description)
        .bind(amount)
        .bind(category)
        .bind(owner_id)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Expense>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            "SELECT id, title, description, amount, category, created_at, updated_at, owner_id \
             FROM expenses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Writes the merged field set; `updated_at` advances to now, which is
    /// strictly later than the creating transaction.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        amount: f64,
        category: Category,
    ) -> Result<Expense, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            "UPDATE expenses \
             SET title = $2, description = $3, amount = $4, category = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, title, description, amount, category, created_at, updated_at, owner_id",
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(amount)
        .bind(category)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Runs the scoped, filtered listing: total count first (pre-pagination),
    /// then the requested page. An empty category set short-circuits to an
    /// empty result.
    pub async fn search(
        db: &PgPool,
        scope: ListScope,
        filter: &ResolvedFilter,
    ) -> Result<(Vec<Expense>, i64), sqlx::Error> {
        if filter.categories.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let count: i64 = count_query(scope, filter)
            .build_query_scalar()
            .fetch_one(db)
            .await?;

        let items = list_query(scope, filter)
            .build_query_as::<Expense>()
            .fetch_all(db)
            .await?;

        Ok((items, count))
    }
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, scope: ListScope, filter: &ResolvedFilter) {
    qb.push(" WHERE category IN (");
    let mut separated = qb.separated(", ");
    for category in &filter.categories {
        separated.push_bind(*category);
    }
    qb.push(")");

    if let ListScope::Own(owner_id) = scope {
        qb.push(" AND owner_id = ").push_bind(owner_id);
    }

    match filter.window {
        TimeWindow::All => {}
        TimeWindow::Since(threshold) => {
            qb.push(" AND created_at >= ").push_bind(threshold);
        }
        TimeWindow::Between(start, end) => {
            qb.push(" AND created_at BETWEEN ").push_bind(start);
            qb.push(" AND ").push_bind(end);
        }
    }
}

fn count_query(scope: ListScope, filter: &ResolvedFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM expenses");
    push_predicate(&mut qb, scope, filter);
    qb
}

fn list_query(scope: ListScope, filter: &ResolvedFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM expenses"));
    push_predicate(&mut qb, scope, filter);

    // Sort column names come from a closed enum, never from user input.
    qb.push(" ORDER BY ");
    qb.push(filter.order_by.column());
    qb.push(match filter.sort_order {
        SortOrder::Asc => " ASC",
        SortOrder::Desc => " DESC",
    });
    // Deterministic tiebreak for equal sort keys.
    qb.push(", id ASC");

    qb.push(" OFFSET ").push_bind(filter.skip);
    qb.push(" LIMIT ").push_bind(filter.limit);
    qb
}
