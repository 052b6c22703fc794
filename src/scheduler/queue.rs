use std::collections::HashMap;

use uuid::Uuid;

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::location;
use crate::model::{FailureOutcome, Task, TaskStatus};

/// Owns the task map and every task lifecycle transition, including the
/// retry policy. Robot state is deliberately out of reach: operations that
/// unbind a robot return its id so the caller holding the registry can free
/// it.
#[derive(Debug)]
pub struct TaskQueue {
    tasks: HashMap<Uuid, Task>,
    config: FleetConfig,
}

impl TaskQueue {
    pub fn new(config: FleetConfig) -> Self {
        Self {
            tasks: HashMap::new(),
            config,
        }
    }

    /// Accept a new task into the queue. The target position must satisfy
    /// the configured bounds, and the task must not have left Pending.
    pub fn submit(&mut self, task: Task) -> Result<Uuid> {
        if !location::is_within(task.target_position, self.config.bounds.as_ref()) {
            return Err(FleetError::Validation(format!(
                "target position {} is outside the configured bounds",
                task.target_position
            )));
        }
        if task.status != TaskStatus::Pending {
            return Err(FleetError::Validation(format!(
                "submitted task must be pending, got {}",
                task.status
            )));
        }
        if self.tasks.len() >= self.config.max_tasks {
            return Err(FleetError::QueueAtCapacity);
        }
        let task_id = task.task_id;
        self.tasks.insert(task_id, task);
        tracing::debug!(task_id = %task_id, "Task submitted");
        Ok(task_id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Cancel a task. Legal from Pending/Assigned/InProgress only; returns
    /// the robot id the task was bound to, if any, so it can be freed.
    pub fn cancel(&mut self, id: &Uuid) -> Result<Option<String>> {
        let task = self.tasks.get_mut(id).ok_or(FleetError::TaskNotFound(*id))?;
        let robot = task.assigned_robot_id.clone();
        task.transition(TaskStatus::Cancelled)?;
        task.assigned_robot_id = None;
        tracing::info!(task_id = %id, "Task cancelled");
        Ok(robot)
    }

    /// The assigned robot has begun work on the task.
    pub fn start(&mut self, id: &Uuid) -> Result<()> {
        let task = self.tasks.get_mut(id).ok_or(FleetError::TaskNotFound(*id))?;
        task.transition(TaskStatus::InProgress)
    }

    /// Finish a task that is in progress; returns the robot id to free.
    pub fn mark_completed(&mut self, id: &Uuid) -> Result<Option<String>> {
        let task = self.tasks.get_mut(id).ok_or(FleetError::TaskNotFound(*id))?;
        let robot = task.assigned_robot_id.clone();
        task.transition(TaskStatus::Completed)?;
        tracing::info!(task_id = %id, "Task completed");
        Ok(robot)
    }

    /// Report a failure on an active task. With `requeue` and retry budget
    /// remaining the task re-enters Pending with `retry_count` bumped;
    /// otherwise it settles in Failed. Returns the outcome and the robot id
    /// the task was bound to.
    pub fn mark_failed(&mut self, id: &Uuid, requeue: bool) -> Result<(FailureOutcome, Option<String>)> {
        let max_retries = self.config.max_retries;
        let task = self.tasks.get_mut(id).ok_or(FleetError::TaskNotFound(*id))?;
        let robot = task.assigned_robot_id.clone();
        task.transition(TaskStatus::Failed)?;
        if requeue && task.retry_count < max_retries {
            task.retry_count += 1;
            task.assigned_robot_id = None;
            task.transition(TaskStatus::Pending)?;
            tracing::info!(task_id = %id, retry_count = task.retry_count, "Task requeued after failure");
            Ok((FailureOutcome::Requeued, robot))
        } else {
            tracing::warn!(task_id = %id, retry_count = task.retry_count, "Task failed");
            Ok((FailureOutcome::Failed, robot))
        }
    }

    /// Pending tasks ordered by priority descending, then creation time,
    /// then task id. The order is total, so repeated calls over the same
    /// queue agree.
    pub fn pending_by_priority(&self) -> Vec<&Task> {
        let mut pending: Vec<&Task> = self.tasks.values().filter(|t| t.is_pending()).collect();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.task_id.cmp(&b.task_id))
        });
        pending
    }

    /// Tasks currently referencing the given robot.
    pub fn tasks_for_robot(&self, robot_id: &str) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.assigned_robot_id.as_deref() == Some(robot_id))
            .collect()
    }

    /// The active (Assigned/InProgress) task bound to the robot, if any.
    pub fn active_task_for_robot(&self, robot_id: &str) -> Option<&Task> {
        self.tasks
            .values()
            .find(|t| t.is_active() && t.assigned_robot_id.as_deref() == Some(robot_id))
    }

    /// All tasks sorted chronologically by creation time.
    pub fn all_tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|t| (t.created_at, t.task_id));
        tasks
    }

    /// Drop tasks that have reached a settled state (Completed, Cancelled,
    /// Failed). Returns the number removed.
    pub fn purge_finished(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| {
            !matches!(
                task.status,
                TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed
            )
        });
        before - self.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.config.max_tasks
    }
}
