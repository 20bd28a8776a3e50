use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::user_service::ServiceError;
use crate::database::models::{Product, ProductWithDepartment};
use crate::database::products::{ProductInput as ProductRecord, ProductRepository};
use crate::filter::Filter;

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub department_id: Uuid,
}

#[derive(Clone)]
pub struct ProductService {
    products: ProductRepository,
}

impl ProductService {
    pub fn new(products: ProductRepository) -> Self {
        Self { products }
    }

    pub async fn list(
        &self,
        filter: &Filter,
        department_id: Option<Uuid>,
    ) -> Result<(Vec<ProductWithDepartment>, i64), ServiceError> {
        Ok(self.products.list(filter, department_id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductWithDepartment, ServiceError> {
        Ok(self.products.find(id).await?)
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        validate(&input)?;
        Ok(self.products.create(record(input)).await?)
    }

    pub async fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, ServiceError> {
        validate(&input)?;
        Ok(self.products.update(id, record(input)).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.products.delete(id).await?)
    }
}

fn record(input: ProductInput) -> ProductRecord {
    ProductRecord { name: input.name, price: input.price, department_id: input.department_id }
}

fn validate(input: &ProductInput) -> Result<(), ServiceError> {
    let mut errors = vec![];
    if input.name.trim().is_empty() {
        errors.push(("name".to_string(), "must not be empty".to_string()));
    }
    if input.price.is_sign_negative() {
        errors.push(("price".to_string(), "must not be negative".to_string()));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}
