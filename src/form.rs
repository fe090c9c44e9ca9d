use chrono::NaiveDate;

use crate::api::{ApiClient, ApiError};
use crate::core::id::Id;
use crate::core::task::{Task, TaskDraft, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Deadline,
}

/// Why a draft was rejected before it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("deadline '{0}' is not a date (expected YYYY-MM-DD)")]
    BadDeadline(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] DraftError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The create/edit task modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    mode: FormMode,
    pub draft: TaskDraft,
    /// Last submission failure, shown inline until the next attempt.
    pub error: Option<String>,
}

impl TaskForm {
    /// Edit mode when given a task, otherwise create mode with default fields.
    pub fn open(task: Option<&Task>) -> Self {
        match task {
            Some(task) => Self {
                mode: FormMode::Edit(task.id.clone()),
                draft: task.draft(),
                error: None,
            },
            None => Self {
                mode: FormMode::Create,
                draft: TaskDraft::default(),
                error: None,
            },
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn heading(&self) -> &'static str {
        if self.is_edit() { "Edit Task" } else { "New Task" }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_edit() { "Update" } else { "Save" }
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.draft.title = value,
            FormField::Description => self.draft.description = value,
            FormField::Deadline => self.draft.deadline = value,
        }
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.draft.status = status;
    }

    /// Required-field checks matching the form inputs.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.draft.title.trim().is_empty() {
            return Err(DraftError::Missing("title"));
        }
        if self.draft.description.trim().is_empty() {
            return Err(DraftError::Missing("description"));
        }
        let deadline = self.draft.deadline.trim();
        if deadline.is_empty() {
            return Err(DraftError::Missing("deadline"));
        }
        if NaiveDate::parse_from_str(deadline, "%Y-%m-%d").is_err() {
            return Err(DraftError::BadDeadline(deadline.to_string()));
        }
        Ok(())
    }

    /// Create or update depending on the mode. Any 2xx reply is a save; the
    /// task is returned when the backend echoes it. On failure the message is
    /// kept in `error` and the form stays as it was, ready for another attempt.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Option<Task>, SubmitError> {
        self.error = None;
        let result = self.try_submit(api).await;
        if let Err(e) = &result {
            log::warn!("Saving task failed: {}", e);
            self.error = Some(submit_message(e));
        }
        result
    }

    async fn try_submit(&self, api: &ApiClient) -> Result<Option<Task>, SubmitError> {
        self.validate()?;
        let mut draft = self.draft.clone();
        draft.deadline = draft.deadline.trim().to_string();
        let task = match &self.mode {
            FormMode::Create => api.create_task(&draft).await?,
            FormMode::Edit(id) => api.update_task(id, &draft).await?,
        };
        Ok(task)
    }
}

fn submit_message(e: &SubmitError) -> String {
    match e {
        SubmitError::Invalid(e) => e.to_string(),
        SubmitError::Api(ApiError::ValidationFailed(fields)) => fields.to_string(),
        SubmitError::Api(ApiError::NotFound) => "Task no longer exists".to_string(),
        SubmitError::Api(ApiError::Unauthorized { .. }) => {
            "Session expired, please log in again".to_string()
        }
        SubmitError::Api(ApiError::InvalidRequest(reason)) => reason.clone(),
        SubmitError::Api(ApiError::NetworkFailure(_)) => {
            "Could not reach the server, please try again".to_string()
        }
        SubmitError::Api(e) => format!("Failed to save task: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Task {
        Task {
            id: Id::from("t-9"),
            title: "Write report".into(),
            description: "Q3 summary".into(),
            deadline: "2025-03-01".into(),
            status: TaskStatus::InProgress,
        }
    }

    #[test]
    fn open_without_task_is_create_with_defaults() {
        let form = TaskForm::open(None);
        assert_eq!(form.mode(), &FormMode::Create);
        assert_eq!(form.draft, TaskDraft::default());
        assert_eq!(form.draft.status, TaskStatus::Pending);
        assert_eq!(form.heading(), "New Task");
        assert_eq!(form.submit_label(), "Save");
    }

    #[test]
    fn open_with_task_is_edit_prefilled() {
        let task = existing();
        let form = TaskForm::open(Some(&task));
        assert_eq!(form.mode(), &FormMode::Edit(Id::from("t-9")));
        assert_eq!(form.draft.title, "Write report");
        assert_eq!(form.draft.status, TaskStatus::InProgress);
        assert_eq!(form.heading(), "Edit Task");
        assert_eq!(form.submit_label(), "Update");
    }

    #[test]
    fn reopening_for_create_discards_previous_fields() {
        let mut form = TaskForm::open(Some(&existing()));
        form.set_field(FormField::Title, "changed");
        let form = TaskForm::open(None);
        assert_eq!(form.draft.title, "");
    }

    #[test]
    fn validation() {
        let mut form = TaskForm::open(None);
        assert_eq!(form.validate(), Err(DraftError::Missing("title")));
        form.set_field(FormField::Title, "Pay rent");
        assert_eq!(form.validate(), Err(DraftError::Missing("description")));
        form.set_field(FormField::Description, "before the 5th");
        assert_eq!(form.validate(), Err(DraftError::Missing("deadline")));
        form.set_field(FormField::Deadline, "05/02/2025");
        assert!(matches!(form.validate(), Err(DraftError::BadDeadline(_))));
        form.set_field(FormField::Deadline, "2025-02-05");
        assert_eq!(form.validate(), Ok(()));
    }
}
