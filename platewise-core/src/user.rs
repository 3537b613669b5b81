use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{optional_text, required_text, ValidationError};
use crate::ids::UserId;

/// A registered reviewer.
///
/// `password_hash` is stored as supplied and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
}

impl User {
    pub fn create(id: UserId, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            is_verified: false,
            is_active: true,
            created_date: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            phone: None,
        }
    }
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let username = required_text(self.username, "username")?;
        let email = required_text(self.email, "email")?;
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail(email));
        }
        let password_hash = required_text(self.password_hash, "password_hash")?;

        Ok(NewUser {
            username,
            email,
            password_hash,
            first_name: optional_text(self.first_name),
            last_name: optional_text(self.last_name),
            phone: optional_text(self.phone),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            username: Some("ada".to_string()),
            email: Some("ada@example.com".to_string()),
            password_hash: Some("$argon2id$abc".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_user() {
        let new = request().validate().unwrap();
        assert_eq!(new.username, "ada");
        assert_eq!(new.email, "ada@example.com");
    }

    #[test]
    fn test_rejects_bad_email() {
        let err = CreateUserRequest {
            email: Some("not-an-email".to_string()),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail("not-an-email".to_string()));
    }

    #[test]
    fn test_requires_password_hash() {
        let err = CreateUserRequest {
            password_hash: None,
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("password_hash"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::create(UserId(1), request().validate().unwrap(), Utc::now());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ada");
    }
}
