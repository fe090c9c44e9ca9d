use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::session::SessionError;

/// Per-field validation messages from a 422 response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub message: Option<String>,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str(self.message.as_deref().unwrap_or("validation failed"));
        }
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("not found")]
    NotFound,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("unexpected response ({}): {message}", display_status(.status))]
    Unknown {
        status: Option<StatusCode>,
        message: String,
    },

    /// The request could not be built, e.g. a bad base URL or task id.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Build the error for a non-2xx response from its status and raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone().or_else(|| b.error.clone()))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized { message },
            StatusCode::UNPROCESSABLE_ENTITY => {
                let fields = parsed
                    .and_then(|b| b.errors)
                    .map(|errors| {
                        errors
                            .into_iter()
                            .map(|(field, messages)| (field, messages.into_vec()))
                            .collect()
                    })
                    .unwrap_or_default();
                Self::ValidationFailed(FieldErrors {
                    message: Some(message),
                    fields,
                })
            }
            StatusCode::NOT_FOUND => Self::NotFound,
            _ => Self::Unknown {
                status: Some(status),
                message,
            },
        }
    }

    /// True when the request never produced a response.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Unknown {
                status: e.status(),
                message: format!("failed to parse response: {}", e),
            }
        } else if let Some(status) = e.status() {
            Self::from_response(status, "")
        } else {
            Self::NetworkFailure(e.to_string())
        }
    }
}

fn display_status(status: &Option<StatusCode>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "no status".to_string())
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    errors: Option<BTreeMap<String, Messages>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Messages {
    Many(Vec<String>),
    One(String),
}

impl Messages {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(v) => v,
            Self::One(s) => vec![s],
        }
    }
}
