use serde::Deserialize;
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};
use crate::database::models::UserWithProfile;
use crate::database::users::{CredentialChange, NewUser, UserRepository, UserUpdate};
use crate::database::DbError;
use crate::filter::Filter;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid fields")]
    Validation(Vec<(String, String)>),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub profile_id: Uuid,
    /// Absent for invite flows - the account exists but cannot log in until
    /// a password is set.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserInput {
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile_id: Uuid,
    /// Setting a password rotates the session token identifier, invalidating
    /// every previously issued token for this account.
    pub password: Option<String>,
    /// Clears the password AND the session token identifier (invite-style
    /// reset). Ignored when `password` is also present.
    #[serde(default)]
    pub reset_password: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn list(
        &self,
        filter: &Filter,
        profile_id: Option<Uuid>,
    ) -> Result<(Vec<UserWithProfile>, i64), ServiceError> {
        Ok(self.users.list(filter, profile_id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<UserWithProfile, ServiceError> {
        Ok(self.users.find(id).await?)
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<UserWithProfile, ServiceError> {
        validate_identity(&input.name, &input.email)?;
        if let Some(pw) = &input.password {
            validate_password(pw)?;
        }

        let (password_hash, token_id) = match &input.password {
            Some(pw) => (Some(password::hash_password(pw)?), Some(Uuid::new_v4())),
            None => (None, None),
        };

        let user = self
            .users
            .create(NewUser {
                name: input.name,
                email: input.email,
                enabled: input.enabled,
                profile_id: input.profile_id,
                password_hash,
                token_id,
            })
            .await?;
        Ok(user)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<UserWithProfile, ServiceError> {
        validate_identity(&input.name, &input.email)?;
        if let Some(pw) = &input.password {
            validate_password(pw)?;
        }

        let credentials = match (&input.password, input.reset_password) {
            (Some(pw), _) => Some(CredentialChange::Set {
                password_hash: password::hash_password(pw)?,
                token_id: Uuid::new_v4(),
            }),
            (None, true) => Some(CredentialChange::Clear),
            (None, false) => None,
        };

        let user = self
            .users
            .update(
                id,
                UserUpdate {
                    name: input.name,
                    email: input.email,
                    enabled: input.enabled,
                    profile_id: input.profile_id,
                    credentials,
                },
            )
            .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.users.delete(id).await?)
    }
}

fn validate_identity(name: &str, email: &str) -> Result<(), ServiceError> {
    let mut errors = vec![];
    if name.trim().is_empty() {
        errors.push(("name".to_string(), "must not be empty".to_string()));
    }
    if name.len() > 100 {
        errors.push(("name".to_string(), "must be at most 100 characters".to_string()));
    }
    if !is_valid_email(email) {
        errors.push(("email".to_string(), "invalid email format".to_string()));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Validation(vec![(
            "password".to_string(),
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        )]));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1].contains('.') && !parts[1].starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@nodot"));
        assert!(!is_valid_email("alice@.com"));
    }

    #[test]
    fn identity_validation_collects_field_errors() {
        let err = validate_identity("", "nope").unwrap_err();
        match err {
            ServiceError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert!(fields.iter().any(|(f, _)| f == "name"));
                assert!(fields.iter().any(|(f, _)| f == "email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn short_passwords_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough").is_ok());
    }
}
