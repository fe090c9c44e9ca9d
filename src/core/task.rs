use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::Id;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// A status this client has no name for, kept as the backend sent it.
    Other(String),
}

impl TaskStatus {
    /// Wire form, as the backend stores it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Other(raw) => raw,
        }
    }

    /// Known statuses only; `Other` is never produced here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// null or empty reads as the default; unknown names are kept in `Other`.
impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(Self::parse(&raw).unwrap_or(Self::Other(raw)))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown status '{}' (expected pending, in-progress or completed)", s)
        })
    }
}

/// A task as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Date string as entered, normally `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deadline: String,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            deadline: self.deadline.clone(),
            status: self.status.clone(),
        }
    }

    /// Case-insensitive substring match against title or description.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Task fields without the identifier; the body of create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub status: TaskStatus,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in-progress\"");
        let s: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, TaskStatus::InProgress);
        assert_eq!("Completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn unknown_and_null_statuses_still_read() {
        let archived: TaskStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(archived, TaskStatus::Other("archived".into()));
        assert_eq!(archived.label(), "archived");
        assert_eq!(serde_json::to_string(&archived).unwrap(), "\"archived\"");

        let missing: TaskStatus = serde_json::from_str("null").unwrap();
        assert_eq!(missing, TaskStatus::Pending);
        assert_eq!(TaskStatus::InProgress.label(), "In Progress");
    }

    #[test]
    fn tolerates_nulls_and_extra_fields() {
        let json = r#"{
            "id": 12,
            "title": "Buy milk",
            "description": null,
            "user_id": 3,
            "created_at": "2024-11-02T10:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "12");
        assert_eq!(task.description, "");
        assert_eq!(task.deadline, "");
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn matches_title_or_description() {
        let task: Task = serde_json::from_str(
            r#"{"id":"1","title":"Write Report","description":"quarterly numbers","deadline":"2024-12-01","status":"pending"}"#,
        )
        .unwrap();
        assert!(task.matches("report"));
        assert!(task.matches("quarter"));
        assert!(task.matches(""));
        assert!(!task.matches("milk"));
    }

    #[test]
    fn draft_body_has_no_id() {
        let body = serde_json::to_value(TaskDraft::new("Plan trip")).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["status"], "pending");
    }
}
