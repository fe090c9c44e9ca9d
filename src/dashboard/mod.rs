pub mod message;

use crate::api::{ApiClient, ApiError};
use crate::core::id::Id;
use crate::core::task::Task;
use crate::form::{SubmitError, TaskForm};
use crate::view::{Page, ViewState};

pub use message::Message;

pub const LOAD_FAILED: &str = "Failed to load tasks";

/// What happened to an open form on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    NoForm,
    /// The backend accepted the save. `task` is set when the reply echoed it;
    /// `refreshed` is false when the refetch afterwards failed.
    Saved { task: Option<Task>, refreshed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// State behind the task list screen: the cached collection, search and
/// pagination, and the task form when it is open.
///
/// Network actions are awaited one after another; the collection is replaced
/// wholesale by every successful fetch.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    tasks: Vec<Task>,
    view: ViewState,
    load: LoadState,
    form: Option<TaskForm>,
    notice: Option<String>,
    user_name: Option<String>,
}

impl Dashboard {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            view: ViewState::new(rows_per_page),
            ..Self::default()
        }
    }

    /// Read the signed-in user's name from the session and fetch the tasks.
    pub async fn mount(&mut self, api: &ApiClient) {
        self.user_name = match api.session().user() {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                log::warn!("Could not read stored user: {}", e);
                None
            }
        };
        // Failures are recorded in `load`.
        let _ = self.refresh(api).await;
    }

    /// Replace the collection with a fresh `GET /tasks`.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        self.load = LoadState::Loading;
        match api.list_tasks().await {
            Ok(listing) => {
                self.tasks = listing.tasks;
                self.load = LoadState::Ready;
                if listing.skipped > 0 {
                    self.notice = Some(format!(
                        "{} task(s) could not be read and are not shown",
                        listing.skipped
                    ));
                }
                let total = self.total_pages();
                let current = self.view.current_page();
                self.view.go_to(current, total);
                Ok(())
            }
            Err(e) => {
                log::error!("Error fetching tasks: {}", e);
                self.tasks.clear();
                self.load = LoadState::Failed(LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::SearchChanged(term) => self.view.set_search(term),
            Message::RowsPerPageChanged(rows) => self.view.set_rows_per_page(rows),
            Message::GoToPage(page) => {
                let total = self.total_pages();
                self.view.go_to(page, total);
            }
            Message::FirstPage => self.view.first(),
            Message::PreviousPage => {
                let total = self.total_pages();
                self.view.previous(total);
            }
            Message::NextPage => {
                let total = self.total_pages();
                self.view.next(total);
            }
            Message::LastPage => {
                let total = self.total_pages();
                self.view.last(total);
            }

            Message::OpenCreate => self.form = Some(TaskForm::open(None)),
            Message::OpenEdit(id) => match self.task(&id) {
                Some(task) => self.form = Some(TaskForm::open(Some(task))),
                None => {
                    log::warn!("Edit requested for unknown task {}", id);
                    self.notice = Some(format!("Task {} not found", id));
                }
            },
            Message::CloseForm => self.form = None,
            Message::FormFieldChanged(field, value) => {
                if let Some(form) = self.form.as_mut() {
                    form.set_field(field, value);
                }
            }
            Message::FormStatusChanged(status) => {
                if let Some(form) = self.form.as_mut() {
                    form.set_status(status);
                }
            }

            Message::DismissNotice => self.notice = None,
        }
    }

    /// Submit the open form. On success the collection is refetched and the
    /// form closes; on failure it stays open with its error set. A failed
    /// refetch after a save is reported in the notice and the outcome.
    pub async fn submit_form(&mut self, api: &ApiClient) -> Result<SubmitOutcome, SubmitError> {
        let Some(form) = self.form.as_mut() else {
            return Ok(SubmitOutcome::NoForm);
        };
        let task = form.submit(api).await?;
        self.form = None;
        let refreshed = match self.refresh(api).await {
            Ok(()) => true,
            Err(e) => {
                self.notice = Some(format!(
                    "Task saved, but the list could not be reloaded: {}",
                    e
                ));
                false
            }
        };
        Ok(SubmitOutcome::Saved { task, refreshed })
    }

    /// Delete a task, then refetch. Confirmation is the caller's job.
    pub async fn delete(&mut self, api: &ApiClient, id: &Id) -> Result<(), ApiError> {
        if let Err(e) = api.delete_task(id).await {
            log::error!("Error deleting task {}: {}", id, e);
            self.notice = Some(format!("Failed to delete task: {}", e));
            return Err(e);
        }
        self.refresh(api).await
    }

    /// Clear the stored session and forget everything cached.
    pub fn logout(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        api.logout()?;
        *self = Self::new(self.view.rows_per_page());
        Ok(())
    }

    pub fn page(&self) -> Page<'_> {
        self.view.page(&self.tasks)
    }

    pub fn total_pages(&self) -> usize {
        self.page().total_pages
    }

    pub fn task(&self, id: &Id) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn has_previous(&self) -> bool {
        self.view.has_previous()
    }

    pub fn has_next(&self) -> bool {
        self.view.has_next(self.total_pages())
    }
}
