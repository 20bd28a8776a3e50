use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::DbError;
use super::models::{Product, ProductWithDepartment};
use crate::filter::Filter;

const PRODUCT_SELECT: &str = r#"
    SELECT
        products.id, products.name, products.price, products.department_id,
        departments.name AS department_name,
        products.created_at, products.updated_at
    FROM products
    JOIN departments ON departments.id = products.department_id
"#;

pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub department_id: Uuid,
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &Filter,
        department_id: Option<Uuid>,
    ) -> Result<(Vec<ProductWithDepartment>, i64), DbError> {
        let mut conditions: Vec<String> = vec![];
        let mut search_param: Option<String> = None;
        let mut param_index = 1;

        if let Some((sql, param)) = filter.search_like(param_index, &["products.name"]) {
            conditions.push(sql);
            search_param = Some(param);
            param_index += 1;
        }
        if department_id.is_some() {
            conditions.push(format!("products.department_id = ${}", param_index));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // The join brings in departments.name, so the sort column is
        // qualified with the products table unless the caller names one.
        let mut sql = format!(
            "{} {} ORDER BY {}",
            PRODUCT_SELECT,
            where_clause,
            filter.order_clause(Some("products"))
        );
        if let Some((offset, limit)) = filter.pagination() {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let mut query = sqlx::query_as::<_, ProductWithDepartment>(&sql);
        if let Some(term) = &search_param {
            query = query.bind(term);
        }
        if let Some(did) = department_id {
            query = query.bind(did);
        }
        let items = query.fetch_all(&self.pool).await?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM products JOIN departments ON departments.id = products.department_id {}",
            where_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(term) = &search_param {
            count_query = count_query.bind(term);
        }
        if let Some(did) = department_id {
            count_query = count_query.bind(did);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<ProductWithDepartment, DbError> {
        let sql = format!("{} WHERE products.id = $1", PRODUCT_SELECT);
        sqlx::query_as::<_, ProductWithDepartment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product, DbError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, price, department_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, department_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.price)
        .bind(input.department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, DbError> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, price = $3, department_id = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, price, department_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.department_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
