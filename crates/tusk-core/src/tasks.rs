//! Task creation flows: structured drafts and free-text prompts.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::api::types::{CreatedTask, PromptRequest, TaskRequest};
use crate::api::{ApiClient, ApiErrorKind, FlowError};

/// Display-level priority, mapped to a lowercase transport value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Returns the lowercase wire value.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {value}")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_value())
    }
}

/// Task lifecycle status sent on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Returns the lowercase wire value.
    pub fn wire_value(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(format!("Unknown status: {value}")),
        }
    }
}

/// A due date assembled from independently-picked date and time parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl DueDate {
    /// Combines the parts into an ISO-8601 timestamp with zero seconds.
    ///
    /// # Errors
    /// Returns a validation error for an invalid calendar date or time.
    pub fn to_iso8601(&self) -> Result<String, FlowError> {
        let timestamp = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, 0))
            .ok_or_else(|| FlowError::validation("Invalid due date."))?;
        Ok(timestamp.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// A not-yet-submitted task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due: Option<DueDate>,
    /// Task type/category label.
    pub kind: Option<String>,
}

impl TaskDraft {
    /// Validates the draft and builds the wire due date.
    /// No network call happens past a failing draft.
    fn validate(&self) -> Result<Option<String>, FlowError> {
        if self.title.trim().is_empty() {
            return Err(FlowError::validation("Title is required."));
        }
        self.due.map(|d| d.to_iso8601()).transpose()
    }
}

/// A free-text task prompt, optionally carrying the prior incomplete prompt
/// for multi-turn clarification.
#[derive(Debug, Clone, Default)]
pub struct PromptDraft {
    pub prompt: String,
    pub previous_prompt: Option<String>,
}

/// Outcome of a prompt-based creation attempt.
#[derive(Debug, Clone)]
pub enum PromptOutcome {
    /// The server created a task.
    Created(CreatedTask),
    /// The server needs more detail; loop with `previous_prompt` set.
    NeedsDetails(String),
}

/// Orchestrates task creation against the API.
pub struct TaskFlow<'a> {
    client: &'a ApiClient,
}

impl<'a> TaskFlow<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Creates a task from a structured draft.
    ///
    /// An empty title never issues a network call. A 401 surfaces as
    /// [`ApiErrorKind::AuthRequired`] so the caller routes to
    /// re-authentication instead of showing a generic error.
    ///
    /// # Errors
    /// Returns a validation error for a bad draft, or the API error.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<CreatedTask, FlowError> {
        let due_date = draft.validate()?;

        let created: CreatedTask = self
            .client
            .post_json(
                "/v1/tasks/",
                &TaskRequest {
                    title: draft.title.trim(),
                    description: &draft.description,
                    priority: draft.priority.wire_value(),
                    status: draft.status.wire_value(),
                    due_date,
                    kind: draft.kind.as_deref(),
                },
            )
            .await?;
        tracing::debug!("Task created: {}", created.title);
        Ok(created)
    }

    /// Creates a task from a natural-language prompt.
    ///
    /// An HTTP 422 reply is the server asking for more detail: it becomes
    /// [`PromptOutcome::NeedsDetails`] with the server's message so the
    /// caller can loop, resubmitting with `previous_prompt` set.
    ///
    /// # Errors
    /// Returns a validation error for an empty prompt, or the API error.
    pub async fn create_from_prompt(&self, draft: &PromptDraft) -> Result<PromptOutcome, FlowError> {
        if draft.prompt.trim().is_empty() {
            return Err(FlowError::validation("Describe the task first."));
        }

        let result: Result<CreatedTask, _> = self
            .client
            .post_json(
                "/v1/tasks/prompts/",
                &PromptRequest {
                    prompt: draft.prompt.trim(),
                    previous_prompt: draft.previous_prompt.as_deref(),
                },
            )
            .await;

        match result {
            Ok(created) => Ok(PromptOutcome::Created(created)),
            Err(e) if e.kind == ApiErrorKind::Api && e.status == Some(422) => {
                Ok(PromptOutcome::NeedsDetails(e.message))
            }
            Err(e) => Err(e.into()),
        }
    }
}
