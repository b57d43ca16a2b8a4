/*
 * Responsibility
 * - Users request/response DTOs
 * - validate() checks shape only (emails, roles, password confirmation)
 * - The password hash never leaves the repo row
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::repos::user_repo::UserRow;
use crate::services::auth::Role;

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

fn check_roles(roles: &[String], fields: &mut Vec<FieldError>) {
    if roles.is_empty() {
        fields.push(FieldError::new("roles", "at least one role is required"));
    }
    for role in roles {
        if Role::parse(role).is_none() {
            fields.push(FieldError::new("roles", format!("unknown role: {role}")));
        }
    }
}

/// Normalized role tags as stored ("admin", "user").
pub(crate) fn normalize_roles(roles: &[String]) -> Vec<String> {
    let mut parsed: Vec<Role> = roles.iter().filter_map(|r| Role::parse(r)).collect();
    parsed.sort();
    parsed.dedup();
    parsed.iter().map(|r| r.as_str().to_string()).collect()
}

fn finish(fields: Vec<FieldError>) -> Result<(), AppError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation("data validation error", fields))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub department: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push(FieldError::new("name", "name is required"));
        }
        if !looks_like_email(&self.email) {
            fields.push(FieldError::new("email", "invalid email address"));
        }
        check_roles(&self.roles, &mut fields);
        if self.password.is_empty() {
            fields.push(FieldError::new("password", "password is required"));
        }
        if self.password != self.password_confirm {
            fields.push(FieldError::new("passwordConfirm", "passwords do not match"));
        }
        finish(fields)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub department: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            fields.push(FieldError::new("name", "name cannot be empty"));
        }
        if let Some(email) = &self.email
            && !looks_like_email(email)
        {
            fields.push(FieldError::new("email", "invalid email address"));
        }
        if let Some(roles) = &self.roles {
            check_roles(roles, &mut fields);
        }
        if let Some(password) = &self.password {
            if password.is_empty() {
                fields.push(FieldError::new("password", "password cannot be empty"));
            }
            if self.password_confirm.as_deref() != Some(password.as_str()) {
                fields.push(FieldError::new("passwordConfirm", "passwords do not match"));
            }
        }
        finish(fields)
    }

    /// Roles and the enabled flag are admin-only, even on the caller's own record.
    pub fn touches_admin_fields(&self) -> bool {
        self.roles.is_some() || self.enabled.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub department: Option<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            roles: row.roles,
            department: row.department,
            enabled: row.enabled,
            date_created: row.date_created,
            date_updated: row.date_updated,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilterParams {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(password_confirm: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            roles: vec!["USER".into()],
            department: None,
            password: "gophers".into(),
            password_confirm: password_confirm.into(),
        }
    }

    #[test]
    fn create_requires_matching_passwords() {
        assert!(create("gophers").validate().is_ok());

        match create("gopher").validate() {
            Err(AppError::Validation { fields, .. }) => {
                assert_eq!(fields, vec![FieldError::new("passwordConfirm", "passwords do not match")]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn roles_and_enabled_are_admin_fields() {
        let rename = UpdateUserRequest {
            name: Some("Ada L".into()),
            ..Default::default()
        };
        assert!(!rename.touches_admin_fields());

        let promote = UpdateUserRequest {
            roles: Some(vec!["admin".into()]),
            ..Default::default()
        };
        assert!(promote.touches_admin_fields());

        let disable = UpdateUserRequest {
            enabled: Some(false),
            ..Default::default()
        };
        assert!(disable.touches_admin_fields());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let mut req = create("gophers");
        req.roles = vec!["root".into()];
        assert!(req.validate().is_err());
    }

    #[test]
    fn roles_are_normalized_and_deduplicated() {
        let roles = normalize_roles(&["USER".into(), "admin".into(), "user".into()]);
        assert_eq!(roles, vec!["admin".to_string(), "user".to_string()]);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("ab.io"));
    }
}
