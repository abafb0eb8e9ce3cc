//! Request payloads and their validation.
//!
//! Validation runs before any service call; every failure becomes
//! `AppError::Validation` (400).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};

const MAX_USERNAME_LEN: usize = 50;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$").unwrap()
});

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    pub username: Option<String>,
    pub password: Option<String>,
    pub fullname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of both `PUT` and `DELETE /authentications`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenPayload {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPayload {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlaylistPayload {
    pub target_email: Option<String>,
}

pub struct ValidRegistration<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub fullname: &'a str,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> AppResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AppError::Validation(format!(
            "\"{}\" is not allowed to be empty",
            field
        ))),
        None => Err(AppError::Validation(format!("\"{}\" is required", field))),
    }
}

impl RegisterUserPayload {
    pub fn validate(&self) -> AppResult<ValidRegistration<'_>> {
        let username = required("username", &self.username)?;
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::Validation(format!(
                "\"username\" must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        Ok(ValidRegistration {
            username,
            password: required("password", &self.password)?,
            fullname: required("fullname", &self.fullname)?,
        })
    }
}

impl LoginPayload {
    pub fn validate(&self) -> AppResult<(&str, &str)> {
        Ok((
            required("username", &self.username)?,
            required("password", &self.password)?,
        ))
    }
}

impl RefreshTokenPayload {
    pub fn validate(&self) -> AppResult<&str> {
        required("refreshToken", &self.refresh_token)
    }
}

impl PlaylistPayload {
    pub fn validate(&self) -> AppResult<&str> {
        required("name", &self.name)
    }
}

impl ExportPlaylistPayload {
    pub fn validate(&self) -> AppResult<&str> {
        let email = required("targetEmail", &self.target_email)?;
        if !EMAIL_REGEX.is_match(email) {
            return Err(AppError::Validation("\"targetEmail\" must be a valid email".into()));
        }
        Ok(email)
    }
}
