//! User data models.
//!
//! - [`User`]: a user as stored
//! - [`NewUser`]: payload for creating a user
//! - [`TokenResponse`]: body returned by the token endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A user in the system.
///
/// `password_hash` is a bcrypt hash and is never serialized.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub roles: Vec<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_core::validate::check;
    use sales_core::AppError;

    fn new_user() -> NewUser {
        NewUser {
            name: "Bill Kennedy".to_string(),
            email: "bill@example.com".to_string(),
            roles: vec!["ADMIN".to_string()],
            password: "gophers123".to_string(),
            password_confirm: "gophers123".to_string(),
        }
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Bill Kennedy".to_string(),
            email: "bill@example.com".to_string(),
            roles: vec!["ADMIN".to_string()],
            password_hash: "$2b$04$secret".to_string(),
            date_created: Utc::now(),
            date_updated: Utc::now(),
        };

        let serialized = serde_json::to_string(&user).unwrap();
        assert!(!serialized.contains("password"));
        assert!(!serialized.contains("$2b$"));
        assert!(serialized.contains(r#""email":"bill@example.com""#));
    }

    #[test]
    fn test_new_user_valid() {
        assert!(check(&new_user()).is_ok());
    }

    #[test]
    fn test_new_user_password_mismatch() {
        let mut nu = new_user();
        nu.password_confirm = "gophers124".to_string();

        match check(&nu) {
            Err(AppError::Fields(fields)) => {
                assert_eq!(fields.as_slice()[0].field, "password_confirm");
                assert_eq!(fields.as_slice()[0].error, "passwords do not match");
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_new_user_reports_every_invalid_field() {
        let nu = NewUser {
            name: String::new(),
            email: "nope".to_string(),
            roles: Vec::new(),
            password: "short".to_string(),
            password_confirm: "short".to_string(),
        };

        match check(&nu) {
            Err(AppError::Fields(fields)) => {
                let names: Vec<&str> = fields.as_slice().iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["email", "name", "password", "roles"]);
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }
}
