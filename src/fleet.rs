//! The fleet facade: one object owning the robot registry and the task
//! queue behind a single lock, so an assignment pass, a liveness sweep, and
//! concurrent submissions can never interleave inside the
//! read-match-commit sequence.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::location;
use crate::model::{FailureOutcome, Robot, RobotStatus, Task};
use crate::monitor::{self, LivenessEvent};
use crate::scheduler::{Assignment, RobotRegistry, TaskAssigner, TaskQueue};
use crate::stats::{self, BatteryStats, FleetStats};

struct FleetState {
    registry: RobotRegistry,
    queue: TaskQueue,
}

/// Entry point for external callers: registration, task submission, the
/// heartbeat feed, the scheduling/sweep triggers, and read-only queries.
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct Fleet {
    config: FleetConfig,
    assigner: TaskAssigner,
    state: Arc<Mutex<FleetState>>,
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new(FleetConfig::default())
    }
}

impl Fleet {
    pub fn new(config: FleetConfig) -> Self {
        Self {
            assigner: TaskAssigner::new(config.clone()),
            state: Arc::new(Mutex::new(FleetState {
                registry: RobotRegistry::new(),
                queue: TaskQueue::new(config.clone()),
            })),
            config,
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, FleetState> {
        // A poisoned lock means a panic mid-mutation; the state cannot be
        // trusted afterwards, so propagating the panic is the right move.
        self.state.lock().expect("fleet state lock poisoned")
    }

    /// Register a robot. Its position must satisfy the configured bounds.
    pub fn register_robot(&self, robot: Robot) -> Result<String> {
        if !location::is_within(robot.position, self.config.bounds.as_ref()) {
            return Err(FleetError::Validation(format!(
                "robot position {} is outside the configured bounds",
                robot.position
            )));
        }
        let robot_id = robot.robot_id.clone();
        self.state().registry.register(robot)?;
        Ok(robot_id)
    }

    /// Remove a robot from the fleet. An active task it held is requeued
    /// through the same retry-counted path as robot loss.
    pub fn deregister_robot(&self, robot_id: &str) -> Result<Robot> {
        let mut guard = self.state();
        let st = &mut *guard;
        if !st.registry.contains(robot_id) {
            return Err(FleetError::RobotNotFound(robot_id.to_string()));
        }
        if let Some(task_id) = st.queue.active_task_for_robot(robot_id).map(|t| t.task_id) {
            if let Err(e) = st.queue.mark_failed(&task_id, true) {
                tracing::warn!(robot_id, task_id = %task_id, error = %e, "Could not requeue task of departing robot");
            }
        }
        st.registry.deregister(robot_id)
    }

    pub fn submit_task(&self, task: Task) -> Result<Uuid> {
        self.state().queue.submit(task)
    }

    /// Cancel a task; legal from Pending/Assigned/InProgress. A robot bound
    /// to the task goes back to Idle.
    pub fn cancel_task(&self, task_id: &Uuid) -> Result<()> {
        let mut guard = self.state();
        let st = &mut *guard;
        let robot = st.queue.cancel(task_id)?;
        release_robot(&mut st.registry, robot.as_deref());
        Ok(())
    }

    /// The assigned robot reports it began work on the task.
    pub fn start_task(&self, task_id: &Uuid) -> Result<()> {
        self.state().queue.start(task_id)
    }

    /// Finish an in-progress task and free its robot.
    pub fn complete_task(&self, task_id: &Uuid) -> Result<()> {
        let mut guard = self.state();
        let st = &mut *guard;
        let robot = st.queue.mark_completed(task_id)?;
        release_robot(&mut st.registry, robot.as_deref());
        Ok(())
    }

    /// Report a failure on an active task, optionally requeuing it within
    /// the retry budget. The robot (if still reachable and Busy) goes back
    /// to Idle either way.
    pub fn fail_task(&self, task_id: &Uuid, requeue: bool) -> Result<FailureOutcome> {
        let mut guard = self.state();
        let st = &mut *guard;
        let (outcome, robot) = st.queue.mark_failed(task_id, requeue)?;
        release_robot(&mut st.registry, robot.as_deref());
        Ok(outcome)
    }

    /// Record a liveness signal from a robot. An Offline robot recovers to
    /// Idle and becomes eligible again on the next assignment pass.
    pub fn heartbeat(&self, robot_id: &str, timestamp: DateTime<Utc>) -> Result<()> {
        let mut guard = self.state();
        monitor::record_heartbeat(&mut guard.registry, robot_id, timestamp)?;
        Ok(())
    }

    /// Run one assignment pass: pending tasks in priority order against the
    /// available robots. Returns the bindings committed in this pass.
    pub fn run_assignment_pass(&self) -> Vec<Assignment> {
        let mut guard = self.state();
        let st = &mut *guard;
        self.assigner.run_pass(&mut st.registry, &mut st.queue)
    }

    /// Sweep for robots whose heartbeat is older than `timeout`: they go
    /// Offline and any task they held is requeued within the retry budget.
    /// Runs under one lock acquisition so a pass cannot interleave.
    pub fn sweep_liveness(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<LivenessEvent> {
        let mut guard = self.state();
        let st = &mut *guard;
        let events = monitor::sweep(&mut st.registry, &st.queue, now, timeout);
        for event in &events {
            if let LivenessEvent::RobotLost {
                robot_id,
                orphaned_task: Some(task_id),
            } = event
            {
                match st.queue.mark_failed(task_id, true) {
                    Ok((FailureOutcome::Requeued, _)) => {}
                    Ok((FailureOutcome::Failed, _)) => {
                        tracing::warn!(robot_id = %robot_id, task_id = %task_id, "Orphaned task exhausted its retries");
                    }
                    Err(e) => {
                        tracing::warn!(robot_id = %robot_id, task_id = %task_id, error = %e, "Could not requeue orphaned task");
                    }
                }
            }
        }
        events
    }

    pub fn get_robot(&self, robot_id: &str) -> Option<Robot> {
        self.state().registry.get(robot_id).cloned()
    }

    pub fn get_task(&self, task_id: &Uuid) -> Option<Task> {
        self.state().queue.get(task_id).cloned()
    }

    /// Pending tasks in the order the next pass will consider them.
    pub fn list_pending_tasks(&self) -> Vec<Task> {
        self.state()
            .queue
            .pending_by_priority()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.state().queue.all_tasks().into_iter().cloned().collect()
    }

    pub fn list_robots(&self, filter: Option<RobotStatus>) -> Vec<Robot> {
        self.state()
            .registry
            .list_by_status(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> FleetStats {
        let guard = self.state();
        stats::fleet_stats(&guard.registry, &guard.queue)
    }

    pub fn battery_stats(&self) -> Option<BatteryStats> {
        stats::battery_stats(&self.state().registry)
    }

    pub fn health_score(&self) -> f64 {
        let guard = self.state();
        let fleet = stats::fleet_stats(&guard.registry, &guard.queue);
        let battery = stats::battery_stats(&guard.registry);
        stats::health_score(&fleet, battery.as_ref())
    }

    /// Drop settled tasks (Completed/Cancelled/Failed). Returns the number
    /// removed.
    pub fn purge_finished(&self) -> usize {
        self.state().queue.purge_finished()
    }
}

/// Return a robot to Idle after its task unbound. Robots that are Offline
/// (or already gone) are left alone; the monitor owns their lifecycle.
fn release_robot(registry: &mut RobotRegistry, robot_id: Option<&str>) {
    let Some(robot_id) = robot_id else {
        return;
    };
    let Some(robot) = registry.get_mut(robot_id) else {
        return;
    };
    if robot.status == RobotStatus::Busy {
        if let Err(e) = robot.transition(RobotStatus::Idle) {
            tracing::warn!(robot_id, error = %e, "Could not release robot");
        }
    }
}
