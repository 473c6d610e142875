use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::pages::{render, ErrorPage, Notice};

/// Whole seconds to wait, rounded up and never zero.
fn wait_text(d: &Duration) -> String {
    match (d.as_secs_f64().ceil() as u64).max(1) {
        1 => "1 second".to_string(),
        n => format!("{n} seconds"),
    }
}

/// Every failure a request can run into.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("A user with this email already exists")]
    DuplicateIdentity,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please log in first")]
    Unauthenticated,

    #[error("Administrator access required")]
    Unauthorized,

    #[error("Too many failed attempts, try again in {}", wait_text(.retry_after))]
    Throttled { retry_after: Duration },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateIdentity => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated | Self::Unauthorized => StatusCode::SEE_OTHER,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors the user can fix by editing the form and trying again.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateIdentity
                | Self::InvalidCredentials
                | Self::Throttled { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                Redirect::to(&Notice::LoginRequired.location("/login")).into_response()
            }
            Self::Unauthorized => Redirect::to("/admin").into_response(),
            Self::Storage(ref e) => {
                error!(error = %e, "storage failure");
                server_error()
            }
            Self::Internal(ref e) => {
                error!(error = ?e, "internal failure");
                server_error()
            }
            other => {
                let status = other.status();
                render(
                    status,
                    &ErrorPage {
                        message: other.to_string(),
                    },
                )
            }
        }
    }
}

fn server_error() -> Response {
    render(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorPage {
            message: "Something went wrong on our side. Please try again later.".into(),
        },
    )
}
