use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, password_matches},
    repo_types::NewUser,
};
use crate::{db::DbError, error::AppError, state::AppState};

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn issue(keys: &JwtKeys, user_id: uuid::Uuid) -> Result<String, AppError> {
    keys.sign(user_id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e.to_string())
    })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<AuthResponse, AppError> {
    let email = req.email.trim().to_string();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.store.get_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;

    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash,
            first_name: non_blank(req.first_name),
            last_name: non_blank(req.last_name),
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration
            DbError::Conflict(_) => AppError::Conflict("User already exists".into()),
            other => other.into(),
        })?;

    let token = issue(&JwtKeys::new(&state.config.jwt), user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok(AuthResponse { user: user.into(), token })
}

/// Unknown email and wrong password produce the same error.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<AuthResponse, AppError> {
    let email = req.email.trim();

    let Some(user) = state.store.get_user_by_email(email).await? else {
        warn!("login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !password_matches(&req.password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = issue(&JwtKeys::new(&state.config.jwt), user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse { user: user.into(), token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("ali@pkmatchz.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn blank_names_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Sharifa ".into())), Some("Sharifa".into()));
        assert_eq!(non_blank(None), None);
    }
}
