use sqlx::PgPool;
use uuid::Uuid;

use super::error::DbError;
use super::models::UserWithProfile;
use crate::filter::Filter;

/// Columns the list endpoint's search box matches against.
const SEARCH_COLUMNS: &[&str] = &["users.name", "users.email"];

const USER_SELECT: &str = r#"
    SELECT
        users.id, users.name, users.email, users.enabled, users.profile_id,
        profiles.name AS profile_name,
        users.created_at, users.updated_at
    FROM users
    JOIN profiles ON profiles.id = users.profile_id
"#;

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile_id: Uuid,
    pub password_hash: Option<String>,
    pub token_id: Option<Uuid>,
}

pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile_id: Uuid,
    pub credentials: Option<CredentialChange>,
}

/// Password lifecycle, decided by the service layer.
///
/// Setting a password always rotates the session token identifier; clearing
/// one drops both - either way, previously issued tokens stop resolving.
pub enum CredentialChange {
    Set { password_hash: String, token_id: Uuid },
    Clear,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &Filter,
        profile_id: Option<Uuid>,
    ) -> Result<(Vec<UserWithProfile>, i64), DbError> {
        let mut conditions: Vec<String> = vec![];
        let mut search_param: Option<String> = None;
        let mut param_index = 1;

        if let Some((sql, param)) = filter.search_like(param_index, SEARCH_COLUMNS) {
            conditions.push(sql);
            search_param = Some(param);
            param_index += 1;
        }
        if profile_id.is_some() {
            conditions.push(format!("users.profile_id = ${}", param_index));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut sql = format!(
            "{} {} ORDER BY {}",
            USER_SELECT,
            where_clause,
            filter.order_clause(Some("users"))
        );
        if let Some((offset, limit)) = filter.pagination() {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let mut query = sqlx::query_as::<_, UserWithProfile>(&sql);
        if let Some(term) = &search_param {
            query = query.bind(term);
        }
        if let Some(pid) = profile_id {
            query = query.bind(pid);
        }
        let items = query.fetch_all(&self.pool).await?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM users JOIN profiles ON profiles.id = users.profile_id {}",
            where_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(term) = &search_param {
            count_query = count_query.bind(term);
        }
        if let Some(pid) = profile_id {
            count_query = count_query.bind(pid);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<UserWithProfile, DbError> {
        let sql = format!("{} WHERE users.id = $1", USER_SELECT);
        sqlx::query_as::<_, UserWithProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Insert the user and its one-to-one auth record in a single
    /// transaction.
    pub async fn create(&self, user: NewUser) -> Result<UserWithProfile, DbError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, enabled, profile_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.enabled)
        .bind(user.profile_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO auths (id, user_id, enabled, profile_id, token_id, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(user.enabled)
        .bind(user.profile_id)
        .bind(user.token_id)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.find(id).await
    }

    /// Full update of the user row; the auth record's enabled flag and
    /// profile reference are kept in step, and an optional credential change
    /// is applied in the same transaction.
    pub async fn update(&self, id: Uuid, update: UserUpdate) -> Result<UserWithProfile, DbError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, enabled = $4, profile_id = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.enabled)
        .bind(update.profile_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        sqlx::query(
            r#"
            UPDATE auths
            SET enabled = $2, profile_id = $3, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .bind(update.enabled)
        .bind(update.profile_id)
        .execute(&mut *tx)
        .await?;

        match update.credentials {
            Some(CredentialChange::Set { password_hash, token_id }) => {
                sqlx::query(
                    r#"
                    UPDATE auths
                    SET password_hash = $2, token_id = $3, updated_at = now()
                    WHERE user_id = $1
                    "#,
                )
                .bind(id)
                .bind(password_hash)
                .bind(token_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(CredentialChange::Clear) => {
                sqlx::query(
                    r#"
                    UPDATE auths
                    SET password_hash = NULL, token_id = NULL, updated_at = now()
                    WHERE user_id = $1
                    "#,
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            None => {}
        }

        tx.commit().await?;
        self.find(id).await
    }

    /// Deleting a user cascades to its auth record (FK ON DELETE CASCADE).
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
