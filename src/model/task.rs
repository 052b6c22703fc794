use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FleetError, Result};
use crate::location::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Assigned => write!(f, "assigned"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl TaskStatus {
    /// Legal lifecycle edges. The Failed→Pending edge is structurally legal
    /// here; the retry budget gating it lives in the task queue.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Pending, Assigned)
                | (Assigned, InProgress)
                | (InProgress, Completed)
                | (Assigned | InProgress, Failed)
                | (Pending | Assigned | InProgress, Cancelled)
                | (Failed, Pending)
        )
    }
}

/// Outcome of a failure report: the task either re-entered the pending
/// queue or settled in Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Requeued,
    Failed,
}

/// A unit of work with a target location and an optional capability
/// requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub target_position: Position,
    pub required_capability: Option<String>,
    /// Higher value = more urgent. Default 0.
    pub priority: i32,
    pub status: TaskStatus,
    pub assigned_robot_id: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(target_position: Position) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            target_position,
            required_capability: None,
            priority: 0,
            status: TaskStatus::Pending,
            assigned_robot_id: None,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_capability(mut self, tag: impl Into<String>) -> Self {
        self.required_capability = Some(tag.into());
        self
    }

    /// Apply a status change, rejecting edges outside the lifecycle graph.
    pub fn transition(&mut self, to: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(FleetError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Assigned or in progress: the task currently binds a robot.
    pub fn is_active(&self) -> bool {
        matches!(self.status, TaskStatus::Assigned | TaskStatus::InProgress)
    }

    /// No further transition will be accepted given the retry budget.
    pub fn is_terminal(&self, max_retries: u32) -> bool {
        match self.status {
            TaskStatus::Completed | TaskStatus::Cancelled => true,
            TaskStatus::Failed => self.retry_count >= max_retries,
            _ => false,
        }
    }
}
