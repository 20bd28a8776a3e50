use serde::Deserialize;
use uuid::Uuid;

use super::user_service::ServiceError;
use crate::database::models::Profile;
use crate::database::profiles::ProfileRepository;
use crate::filter::Filter;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub name: String,
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: ProfileRepository,
}

impl ProfileService {
    pub fn new(profiles: ProfileRepository) -> Self {
        Self { profiles }
    }

    pub async fn list(&self, filter: &Filter) -> Result<(Vec<Profile>, i64), ServiceError> {
        Ok(self.profiles.list(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile, ServiceError> {
        Ok(self.profiles.find(id).await?)
    }

    pub async fn create(&self, input: ProfileInput) -> Result<Profile, ServiceError> {
        validate_name(&input.name)?;
        Ok(self.profiles.create(input.name.trim()).await?)
    }

    pub async fn update(&self, id: Uuid, input: ProfileInput) -> Result<Profile, ServiceError> {
        validate_name(&input.name)?;
        Ok(self.profiles.update(id, input.name.trim()).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.profiles.delete(id).await?)
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
