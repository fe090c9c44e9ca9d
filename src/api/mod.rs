pub mod error;

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::id::Id;
use crate::core::task::{Task, TaskDraft};
use crate::core::user::{Session, User};
use crate::session::SessionStore;

pub use error::{ApiError, FieldErrors};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body shapes accepted for single resources and collections: bare or in a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}

/// One `GET /tasks` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListing {
    pub tasks: Vec<Task>,
    /// Rows in the response that could not be read as tasks.
    pub skipped: usize,
}

/// REST client for the task backend.
///
/// The session store is consulted on every request, so a login through one
/// clone of the client is visible to all others sharing the store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidRequest(format!("bad base URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!("bad base URL '{}'", base_url)));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| ApiError::NetworkFailure(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: parsed,
            http,
            session,
        })
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Base URL with `segments` appended. Each segment is percent-encoded, so
    /// a `/` inside one never adds a path level.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest(format!("bad base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with JSON headers and the bearer token, if one is stored.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.url(segments)?;
        log::debug!("{} {}", method, url);
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(token) = self.session.token()? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send and turn any non-2xx status into an `ApiError`.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let resp = builder.send().await.map_err(|e| {
            log::error!("API request failed: {}", e);
            ApiError::from(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);
        log::warn!("API error {}: {}", status, err);
        Err(err)
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::NetworkFailure(format!("Failed to read response: {}", e)))?;
        serde_json::from_str(&text).map_err(|e| ApiError::Unknown {
            status: Some(status),
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// The task in a 2xx reply, if the body holds one. The status alone decides success.
    async fn returned_task(resp: Response) -> Option<Task> {
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Could not read saved task body: {}", e);
                return None;
            }
        };
        if text.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<Envelope<Task>>(&text) {
            Ok(envelope) => Some(envelope.into_inner()),
            Err(e) => {
                log::debug!("Reply body is not a task: {}", e);
                None
            }
        }
    }

    /// `POST /login`. On success the token and profile are written to the session store.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let resp = self
            .send(self.request(Method::POST, &["login"])?.json(credentials))
            .await?;
        let body: LoginResponse = Self::json(resp).await?;

        let token = body.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            log::warn!("Login response for {} carried no token", credentials.email);
            ApiError::Unauthorized {
                message: "login response did not include a token".to_string(),
            }
        })?;

        let session = Session {
            token,
            user: body.user,
        };
        self.session.save(&session)?;
        log::info!("Logged in as {}", credentials.email);
        Ok(session)
    }

    /// `POST /register`. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, &["register"])?.json(registration))
            .await?;
        log::info!("Registered {}", registration.email);
        Ok(())
    }

    /// Forget the stored session. The backend is not contacted.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.clear()?;
        log::info!("Logged out");
        Ok(())
    }

    /// `GET /tasks`, bare array or `data` envelope. Rows that are not tasks are
    /// skipped and counted; a body with no array at all is an error.
    pub async fn list_tasks(&self) -> Result<TaskListing, ApiError> {
        let resp = self.send(self.request(Method::GET, &["tasks"])?).await?;
        let status = resp.status();
        let value: serde_json::Value = Self::json(resp).await?;

        let Some(rows) = task_rows(value) else {
            log::warn!("Task list body is not an array");
            return Err(ApiError::Unknown {
                status: Some(status),
                message: "task list body is not an array".to_string(),
            });
        };

        let mut listing = TaskListing::default();
        for row in rows {
            match serde_json::from_value::<Task>(row) {
                Ok(task) => listing.tasks.push(task),
                Err(e) => {
                    log::warn!("Skipping unreadable task row: {}", e);
                    listing.skipped += 1;
                }
            }
        }
        log::debug!(
            "Fetched {} tasks ({} skipped)",
            listing.tasks.len(),
            listing.skipped
        );
        Ok(listing)
    }

    /// `POST /tasks`. Returns the created task when the reply carries it.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        let resp = self
            .send(self.request(Method::POST, &["tasks"])?.json(draft))
            .await?;
        let task = Self::returned_task(resp).await;
        match &task {
            Some(task) => log::info!("Created task {}", task.id),
            None => log::info!("Created task '{}'", draft.title),
        }
        Ok(task)
    }

    /// `PUT /tasks/:id`. Returns the updated task when the reply carries it.
    pub async fn update_task(&self, id: &Id, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        let resp = self
            .send(
                self.request(Method::PUT, &["tasks", task_segment(id)?])?
                    .json(draft),
            )
            .await?;
        let task = Self::returned_task(resp).await;
        log::info!("Updated task {}", id);
        Ok(task)
    }

    /// `DELETE /tasks/:id`.
    pub async fn delete_task(&self, id: &Id) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &["tasks", task_segment(id)?])?)
            .await?;
        log::info!("Deleted task {}", id);
        Ok(())
    }
}

fn task_rows(value: serde_json::Value) -> Option<Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(rows) => Some(rows),
        serde_json::Value::Object(mut body) => match body.remove("data") {
            Some(serde_json::Value::Array(rows)) => Some(rows),
            _ => None,
        },
        _ => None,
    }
}

/// Ids that would collapse into a dot segment cannot name a task.
fn task_segment(id: &Id) -> Result<&str, ApiError> {
    match id.as_str() {
        "" | "." | ".." => Err(ApiError::InvalidRequest(format!(
            "'{}' is not a usable task id",
            id
        ))),
        segment => Ok(segment),
    }
}
