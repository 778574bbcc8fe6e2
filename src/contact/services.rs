use tracing::{error, info};

use super::{
    dto::ContactRequest,
    repo_types::{ContactSubmission, NewContactSubmission},
};
use crate::{auth::is_valid_email, error::AppError, state::AppState};

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

pub(crate) fn validate(req: ContactRequest) -> Result<NewContactSubmission, AppError> {
    let submission = NewContactSubmission {
        first_name: required("firstName", req.first_name)?,
        last_name: required("lastName", req.last_name)?,
        email: required("email", req.email)?,
        subject: required("subject", req.subject)?,
        message: required("message", req.message)?,
    };
    if !is_valid_email(&submission.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(submission)
}

/// Persists, then hands the row to the notifier without waiting on it.
pub async fn submit(state: &AppState, req: ContactRequest) -> Result<ContactSubmission, AppError> {
    let submission = state.store.create_contact_submission(validate(req)?).await?;
    info!(contact_id = %submission.id, "contact submission stored");

    let notifier = state.notifier.clone();
    let row = submission.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&row).await {
            error!(error = %e, contact_id = %row.id, "contact notification failed");
        }
    });

    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            first_name: "Sheena".into(),
            last_name: "Khan".into(),
            email: "sheena@example.com".into(),
            subject: "Hello".into(),
            message: "Love the app".into(),
        }
    }

    #[test]
    fn valid_request_is_trimmed() {
        let mut req = request();
        req.subject = "  Hello  ".into();
        assert_eq!(validate(req).unwrap().subject, "Hello");
    }

    #[test]
    fn blank_field_is_rejected() {
        let mut req = request();
        req.message = "   ".into();
        let err = validate(req).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "message is required"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut req = request();
        req.email = "sheena-at-example".into();
        assert!(matches!(validate(req), Err(AppError::Validation(_))));
    }
}
