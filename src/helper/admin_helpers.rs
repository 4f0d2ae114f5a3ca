use serde::Deserialize;
use thiserror::Error;

use crate::helper::time_helpers::{format_yangon, parse_yangon_local, TimeError};
use crate::models::{Role, UserUpsert};

#[derive(Error, Debug, PartialEq)]
pub enum AdminHelperError {
    #[error("Username is required.")]
    MissingUsername,
    #[error("Password is required for new accounts.")]
    MissingPassword,
    #[error("Unknown role '{0}'. Use ADMIN, USER or TRIAL.")]
    Role(String),
    #[error("Trial accounts need an expiry date.")]
    MissingExpiry,
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Account form posted by the admin screen. `expiredAtLocal` is the raw value of
/// a datetime-local input and is read as Asia/Yangon wall-clock time.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub username: String,
    pub password: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub expired_at_local: Option<String>,
}

pub fn build_user_upsert(form: UserForm, creating: bool) -> Result<UserUpsert, AdminHelperError> {
    let username = form.username.trim().to_string();
    if username.is_empty() {
        return Err(AdminHelperError::MissingUsername);
    }

    let password = form.password.filter(|password| !password.is_empty());
    if creating && password.is_none() {
        return Err(AdminHelperError::MissingPassword);
    }

    let role = Role::parse(&form.role).ok_or_else(|| AdminHelperError::Role(form.role.clone()))?;

    let expiry_input = form
        .expired_at_local
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let expired_at = match (role, expiry_input) {
        (Role::Trial, Some(local)) => Some(format_yangon(parse_yangon_local(local)?)),
        (Role::Trial, None) if creating => return Err(AdminHelperError::MissingExpiry),
        // Non-trial accounts ignore the expiry field.
        _ => None,
    };

    Ok(UserUpsert {
        username,
        password,
        email: form.email.unwrap_or_default().trim().to_string(),
        role,
        expired_at,
    })
}
