use crate::core::id::Id;
use crate::core::task::TaskStatus;
use crate::form::FormField;

/// Dashboard events that only touch local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Search and pagination
    SearchChanged(String),
    RowsPerPageChanged(usize),
    GoToPage(usize),
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,

    // Task form
    OpenCreate,
    OpenEdit(Id),
    CloseForm,
    FormFieldChanged(FormField, String),
    FormStatusChanged(TaskStatus),

    DismissNotice,
}
