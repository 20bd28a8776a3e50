use serde::Deserialize;
use uuid::Uuid;

use super::user_service::ServiceError;
use crate::database::departments::DepartmentRepository;
use crate::database::models::Department;
use crate::filter::Filter;

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
}

#[derive(Clone)]
pub struct DepartmentService {
    departments: DepartmentRepository,
}

impl DepartmentService {
    pub fn new(departments: DepartmentRepository) -> Self {
        Self { departments }
    }

    pub async fn list(&self, filter: &Filter) -> Result<(Vec<Department>, i64), ServiceError> {
        Ok(self.departments.list(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Department, ServiceError> {
        Ok(self.departments.find(id).await?)
    }

    pub async fn create(&self, input: DepartmentInput) -> Result<Department, ServiceError> {
        validate_name(&input.name)?;
        Ok(self.departments.create(input.name.trim()).await?)
    }

    pub async fn update(&self, id: Uuid, input: DepartmentInput) -> Result<Department, ServiceError> {
        validate_name(&input.name)?;
        Ok(self.departments.update(id, input.name.trim()).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.departments.delete(id).await?)
    }
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(vec![(
            "name".to_string(),
            "must not be empty".to_string(),
        )]));
    }
    Ok(())
}
