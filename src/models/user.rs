// src/models/user.rs

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid username regex"));

/// Account role. Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Educator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Educator => "educator",
            Role::Admin => "admin",
        }
    }

    /// Educators and admins may author exams and read analytics.
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Educator | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "educator" => Ok(Role::Educator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// 'student', 'educator' or 'admin'.
    pub role: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        regex(
            path = *USERNAME_RE,
            message = "Username may only contain letters, digits, '_', '.' and '-'."
        )
    )]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    /// Defaults to student. Admin accounts cannot be self-registered.
    pub role: Option<Role>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Student, Role::Educator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("teacher".parse::<Role>().is_err());
    }

    #[test]
    fn only_educators_and_admins_author() {
        assert!(!Role::Student.can_author());
        assert!(Role::Educator.can_author());
        assert!(Role::Admin.can_author());
    }

    #[test]
    fn username_rejects_spaces() {
        let req = CreateUserRequest {
            username: "bad name".to_string(),
            password: "password123".to_string(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_username_fails_validation() {
        let req = CreateUserRequest {
            username: "yo".to_string(),
            password: "password123".to_string(),
            role: None,
        };
        assert!(req.validate().is_err());
    }
}
