//! Account flow errors and Sentry integration.
//!
//! Session flows return [`AccountError`]: either the backend's user errors,
//! verbatim so a form can attach them to fields, or a generic failure whose
//! wording depends on the flow. The cause of a generic failure is logged and
//! captured to Sentry, never shown to the customer.

use thiserror::Error;

use crate::shopify::{CustomerUserError, ShopifyError};

/// Message shown when login or a password reset fails for a reason the
/// customer cannot fix.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, please try again!";

/// Message shown when account creation fails for a reason the customer cannot
/// fix.
pub const SIGNUP_FAILURE_MESSAGE: &str =
    "Oops! Sorry something went wrong, try again later please!";

/// Account flows, for logs and for picking the failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Login,
    CreateCustomer,
    PasswordReset,
}

impl Flow {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CreateCustomer => "create_customer",
            Self::PasswordReset => "request_password_reset",
        }
    }

    /// The generic failure this flow reports.
    #[must_use]
    pub const fn failure(self) -> AccountError {
        match self {
            Self::CreateCustomer => AccountError::SignupFailed,
            Self::Login | Self::PasswordReset => AccountError::Failed,
        }
    }
}

/// Outcome of a failed account flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The backend rejected the input.
    #[error("{}", format_user_errors(.0))]
    Rejected(Vec<CustomerUserError>),

    /// Anything else. The cause has already been logged and reported.
    #[error("Sorry, please try again!")]
    Failed,

    /// Account creation failed for anything other than user errors.
    #[error("Oops! Sorry something went wrong, try again later please!")]
    SignupFailed,
}

impl AccountError {
    /// All user errors, empty for the generic failures.
    #[must_use]
    pub fn user_errors(&self) -> &[CustomerUserError] {
        match self {
            Self::Rejected(errors) => errors,
            Self::Failed | Self::SignupFailed => &[],
        }
    }

    /// `(form field, message)` pairs for errors attributable to a field.
    #[must_use]
    pub fn field_errors(&self) -> Vec<(&str, &str)> {
        self.user_errors()
            .iter()
            .filter_map(|e| e.form_field().map(|field| (field, e.message.as_str())))
            .collect()
    }

    /// Messages that belong to no field. For the generic failures, their
    /// message.
    #[must_use]
    pub fn non_field_messages(&self) -> Vec<&str> {
        match self {
            Self::Rejected(errors) => errors
                .iter()
                .filter(|e| e.form_field().is_none())
                .map(|e| e.message.as_str())
                .collect(),
            Self::Failed => vec![GENERIC_FAILURE_MESSAGE],
            Self::SignupFailed => vec![SIGNUP_FAILURE_MESSAGE],
        }
    }
}

fn format_user_errors(errors: &[CustomerUserError]) -> String {
    if errors.is_empty() {
        return GENERIC_FAILURE_MESSAGE.to_string();
    }
    errors
        .iter()
        .map(|e| match e.form_field() {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Log and capture a remote failure, returning the flow's generic failure.
pub fn report_failure(flow: Flow, error: &ShopifyError) -> AccountError {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        flow = flow.name(),
        error = %error,
        sentry_event_id = %event_id,
        "Account flow failed"
    );
    flow.failure()
}

/// Set the Sentry user context for the signed-in customer.
///
/// Call this after a successful login to associate errors with the customer.
pub fn set_sentry_user(display_name: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(display_name.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a cart or session action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("variant_id", "gid://shopify/ProductVariant/1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> AccountError {
        AccountError::Rejected(vec![
            CustomerUserError::invalid_field("email", "Email has already been taken"),
            CustomerUserError::unknown("Creating Customer Limit exceeded. Please try again later."),
        ])
    }

    #[test]
    fn test_failed_display_is_generic() {
        assert_eq!(AccountError::Failed.to_string(), "Sorry, please try again!");
        assert!(AccountError::Failed.user_errors().is_empty());
        assert_eq!(
            AccountError::Failed.non_field_messages(),
            vec![GENERIC_FAILURE_MESSAGE]
        );
    }

    #[test]
    fn test_signup_failure_has_its_own_message() {
        let err = Flow::CreateCustomer.failure();
        assert_eq!(err, AccountError::SignupFailed);
        assert_eq!(err.to_string(), SIGNUP_FAILURE_MESSAGE);
        assert_eq!(err.non_field_messages(), vec![SIGNUP_FAILURE_MESSAGE]);
        assert!(err.field_errors().is_empty());

        assert_eq!(Flow::Login.failure(), AccountError::Failed);
        assert_eq!(Flow::PasswordReset.failure(), AccountError::Failed);
    }

    #[test]
    fn test_field_errors_split() {
        let err = rejected();
        assert_eq!(
            err.field_errors(),
            vec![("email", "Email has already been taken")]
        );
        assert_eq!(
            err.non_field_messages(),
            vec!["Creating Customer Limit exceeded. Please try again later."]
        );
    }

    #[test]
    fn test_rejected_display() {
        assert_eq!(
            rejected().to_string(),
            "email: Email has already been taken; Creating Customer Limit exceeded. Please try again later."
        );
        assert_eq!(
            AccountError::Rejected(vec![]).to_string(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_report_failure_collapses() {
        let err = report_failure(Flow::Login, &ShopifyError::RateLimited(2));
        assert_eq!(err, AccountError::Failed);
        let err = report_failure(Flow::CreateCustomer, &ShopifyError::RateLimited(2));
        assert_eq!(err, AccountError::SignupFailed);
    }
}
