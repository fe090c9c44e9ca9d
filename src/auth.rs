use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::{ApiClient, ApiError, Credentials, FieldErrors, Registration};
use crate::core::user::Session;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub const LOGIN_REJECTED: &str = "Incorrect email or password.";
pub const LOGIN_UNREACHABLE: &str = "Something went wrong, please try again.";
pub const REGISTERED: &str = "Registration successful! Please log in.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("'{0}' is not a valid email address")]
    BadEmail(String),
}

/// A login or registration attempt that failed, either locally or at the server.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn require(value: &str, name: &'static str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        Err(InputError::Missing(name))
    } else {
        Ok(())
    }
}

fn check_email(email: &str) -> Result<(), InputError> {
    require(email, "email")?;
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(InputError::BadEmail(email.trim().to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            error: None,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        check_email(&self.email)?;
        require(&self.password, "password")
    }

    /// Log in and persist the session. Failures leave a message in `error`.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Session, AuthError> {
        self.error = None;
        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        let credentials = Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match api.login(&credentials).await {
            Ok(session) => Ok(session),
            Err(e) => {
                log::error!("Login failed: {}", e);
                self.error = Some(login_message(&e).to_string());
                Err(e.into())
            }
        }
    }
}

/// A response from the server means the credentials were refused; anything else is a retryable fault.
pub fn login_message(e: &ApiError) -> &'static str {
    match e {
        ApiError::NetworkFailure(_) | ApiError::Session(_) | ApiError::InvalidRequest(_) => {
            LOGIN_UNREACHABLE
        }
        _ => LOGIN_REJECTED,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    /// Server-side messages keyed by field name.
    pub field_errors: FieldErrors,
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        require(&self.name, "name")?;
        check_email(&self.email)?;
        require(&self.password, "password")
    }

    pub async fn submit(&mut self, api: &ApiClient) -> Result<(), AuthError> {
        self.error = None;
        self.field_errors = FieldErrors::default();
        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        let registration = Registration {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match api.register(&registration).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Registration failed: {}", e);
                match &e {
                    ApiError::ValidationFailed(fields) => {
                        self.field_errors = fields.clone();
                        self.error = Some(fields.to_string());
                    }
                    other => self.error = Some(other.to_string()),
                }
                Err(e.into())
            }
        }
    }
}
