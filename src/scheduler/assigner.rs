use serde::Serialize;
use uuid::Uuid;

use crate::config::{CapabilityMatch, FleetConfig};
use crate::error::{FleetError, Result};
use crate::location::{self, Position};
use crate::model::{Robot, RobotStatus, TaskStatus};
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::registry::RobotRegistry;

/// One task-to-robot binding committed by an assignment pass.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub task_id: Uuid,
    pub robot_id: String,
    pub distance: f64,
}

/// Matches pending tasks to eligible robots. Stateless between passes: the
/// registry and queue carry all the state, the assigner carries the policy.
#[derive(Debug, Clone)]
pub struct TaskAssigner {
    config: FleetConfig,
}

impl TaskAssigner {
    pub fn new(config: FleetConfig) -> Self {
        Self { config }
    }

    /// Run one assignment pass over the given registry and queue.
    ///
    /// Tasks are visited in `pending_by_priority` order. For each task the
    /// eligible robots are the available ones (Idle, battery above the
    /// threshold) that match its capability requirement and have not been
    /// claimed earlier in this pass; the nearest wins, ties to the lowest
    /// robot id. Tasks with no eligible robot stay Pending. Per-task errors
    /// are logged and skipped; the pass itself never fails.
    pub fn run_pass(&self, registry: &mut RobotRegistry, queue: &mut TaskQueue) -> Vec<Assignment> {
        let pending: Vec<(Uuid, Position, Option<String>)> = queue
            .pending_by_priority()
            .iter()
            .map(|t| (t.task_id, t.target_position, t.required_capability.clone()))
            .collect();

        let mut assignments = Vec::new();
        let mut claimed: Vec<String> = Vec::new();

        for (task_id, target, required) in pending {
            let eligible: Vec<(String, Position)> = registry
                .all()
                .filter(|r| !claimed.iter().any(|c| c == &r.robot_id))
                .filter(|r| r.is_available(self.config.min_battery))
                .filter(|r| self.capability_ok(required.as_deref(), r))
                .map(|r| (r.robot_id.clone(), r.position))
                .collect();

            let robot_id = match location::nearest(target, &eligible) {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(task_id = %task_id, error = %e, "Skipping task with unmatchable geometry");
                    continue;
                }
            };

            match self.commit(registry, queue, &task_id, &robot_id, target) {
                Ok(distance) => {
                    tracing::info!(task_id = %task_id, robot_id = %robot_id, distance, "Task assigned");
                    claimed.push(robot_id.clone());
                    assignments.push(Assignment {
                        task_id,
                        robot_id,
                        distance,
                    });
                }
                Err(e) => {
                    tracing::warn!(task_id = %task_id, robot_id = %robot_id, error = %e, "Assignment commit failed");
                }
            }
        }

        assignments
    }

    /// Bind one task to one robot: robot goes Busy, task goes Assigned with
    /// the back-reference set. Rolls the robot back if the task side is
    /// rejected.
    fn commit(
        &self,
        registry: &mut RobotRegistry,
        queue: &mut TaskQueue,
        task_id: &Uuid,
        robot_id: &str,
        target: Position,
    ) -> Result<f64> {
        let robot = registry
            .get_mut(robot_id)
            .ok_or_else(|| FleetError::RobotNotFound(robot_id.to_string()))?;
        let distance = location::distance(target, robot.position)?;
        robot.transition(RobotStatus::Busy)?;

        let task = queue
            .get_mut(task_id)
            .ok_or(FleetError::TaskNotFound(*task_id))?;
        if let Err(e) = task.transition(TaskStatus::Assigned) {
            if let Some(robot) = registry.get_mut(robot_id) {
                let _ = robot.transition(RobotStatus::Idle);
            }
            return Err(e);
        }
        task.assigned_robot_id = Some(robot_id.to_string());
        Ok(distance)
    }

    fn capability_ok(&self, required: Option<&str>, robot: &Robot) -> bool {
        // A task with no requirement matches every robot in both modes.
        match (self.config.capability_match, required) {
            (_, None) => true,
            (CapabilityMatch::Subset, Some(tag)) => robot.capabilities.contains(tag),
            (CapabilityMatch::Exact, Some(tag)) => {
                robot.capabilities.len() == 1 && robot.capabilities.contains(tag)
            }
        }
    }
}
