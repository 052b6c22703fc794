//! Heartbeat-driven liveness monitoring.
//!
//! The heartbeat timestamps live on the robots themselves; these functions
//! are the only code that moves a robot to Offline on timeout grounds, and
//! the only source of loss/recovery events for the recovery path.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{FleetError, Result};
use crate::model::RobotStatus;
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::registry::RobotRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessEvent {
    /// Heartbeats stopped: the robot went Offline, possibly orphaning the
    /// task it held.
    RobotLost {
        robot_id: String,
        orphaned_task: Option<Uuid>,
    },
    /// Heartbeats resumed on an Offline robot: it is Idle again.
    RobotRecovered { robot_id: String },
}

/// Record a heartbeat from a robot. An Offline robot recovers to Idle and
/// the recovery event is returned.
pub fn record_heartbeat(
    registry: &mut RobotRegistry,
    robot_id: &str,
    timestamp: DateTime<Utc>,
) -> Result<Option<LivenessEvent>> {
    let robot = registry
        .get_mut(robot_id)
        .ok_or_else(|| FleetError::RobotNotFound(robot_id.to_string()))?;
    robot.last_heartbeat = timestamp;

    if robot.status == RobotStatus::Offline {
        robot.transition(RobotStatus::Idle)?;
        tracing::info!(robot_id, "Robot recovered");
        return Ok(Some(LivenessEvent::RobotRecovered {
            robot_id: robot_id.to_string(),
        }));
    }
    Ok(None)
}

/// Declare every robot whose last heartbeat is older than `timeout` Offline
/// and report the task each one held. Robots already Offline are skipped,
/// so repeating a sweep with the same `now` yields nothing.
pub fn sweep(
    registry: &mut RobotRegistry,
    queue: &TaskQueue,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Vec<LivenessEvent> {
    let mut events = Vec::new();

    for robot in registry.all_mut() {
        if robot.status == RobotStatus::Offline {
            continue;
        }
        if now - robot.last_heartbeat <= timeout {
            continue;
        }
        if let Err(e) = robot.transition(RobotStatus::Offline) {
            tracing::warn!(robot_id = %robot.robot_id, error = %e, "Could not take stale robot offline");
            continue;
        }
        let orphaned_task = queue
            .active_task_for_robot(&robot.robot_id)
            .map(|t| t.task_id);
        tracing::warn!(
            robot_id = %robot.robot_id,
            orphaned_task = ?orphaned_task,
            "Robot heartbeat timed out, marked offline"
        );
        events.push(LivenessEvent::RobotLost {
            robot_id: robot.robot_id.clone(),
            orphaned_task,
        });
    }

    events
}
