use sqlx::PgPool;
use uuid::Uuid;

use super::error::DbError;
use super::models::Profile;
use crate::filter::Filter;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &Filter) -> Result<(Vec<Profile>, i64), DbError> {
        let (where_clause, search_param) = match filter.search_like(1, &["name"]) {
            Some((sql, param)) => (format!("WHERE {}", sql), Some(param)),
            None => (String::new(), None),
        };

        let mut sql = format!(
            "SELECT id, name, created_at, updated_at FROM profiles {} ORDER BY {}",
            where_clause,
            filter.order_clause(None)
        );
        if let Some((offset, limit)) = filter.pagination() {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let mut query = sqlx::query_as::<_, Profile>(&sql);
        if let Some(term) = &search_param {
            query = query.bind(term);
        }
        let items = query.fetch_all(&self.pool).await?;

        let count_sql = format!("SELECT COUNT(*) FROM profiles {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(term) = &search_param {
            count_query = count_query.bind(term);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<Profile, DbError> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, name, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    pub async fn create(&self, name: &str) -> Result<Profile, DbError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn update(&self, id: Uuid, name: &str) -> Result<Profile, DbError> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET name = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
