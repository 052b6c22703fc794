//! Read-only fleet reporting: per-status counts, battery aggregates, and a
//! coarse 0-100 health score.

use serde::Serialize;

use crate::model::{RobotStatus, TaskStatus};
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::registry::RobotRegistry;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetStats {
    pub total_robots: usize,
    pub idle_robots: usize,
    pub busy_robots: usize,
    pub offline_robots: usize,
    pub error_robots: usize,
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub assigned_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatteryStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Robots reporting below 20%.
    pub low_count: usize,
}

pub fn fleet_stats(registry: &RobotRegistry, queue: &TaskQueue) -> FleetStats {
    let mut stats = FleetStats {
        total_robots: registry.len(),
        total_tasks: queue.len(),
        ..Default::default()
    };
    for robot in registry.all() {
        match robot.status {
            RobotStatus::Idle => stats.idle_robots += 1,
            RobotStatus::Busy => stats.busy_robots += 1,
            RobotStatus::Offline => stats.offline_robots += 1,
            RobotStatus::Error => stats.error_robots += 1,
        }
    }
    for task in queue.all_tasks() {
        match task.status {
            TaskStatus::Pending => stats.pending_tasks += 1,
            TaskStatus::Assigned => stats.assigned_tasks += 1,
            TaskStatus::InProgress => stats.in_progress_tasks += 1,
            TaskStatus::Completed => stats.completed_tasks += 1,
            TaskStatus::Failed => stats.failed_tasks += 1,
            TaskStatus::Cancelled => stats.cancelled_tasks += 1,
        }
    }
    stats
}

/// Battery aggregates over robots that report a level. `None` when no robot
/// does.
pub fn battery_stats(registry: &RobotRegistry) -> Option<BatteryStats> {
    let levels: Vec<f64> = registry.all().filter_map(|r| r.battery_level).collect();
    if levels.is_empty() {
        return None;
    }
    let sum: f64 = levels.iter().sum();
    let min = levels.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = levels.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some(BatteryStats {
        average: sum / levels.len() as f64,
        min,
        max,
        low_count: levels.iter().filter(|&&l| l < 20.0).count(),
    })
}

/// Weighted health score: availability 0.3, average battery 0.3,
/// completion-vs-failure 0.4. Zero for an empty fleet.
pub fn health_score(stats: &FleetStats, battery: Option<&BatteryStats>) -> f64 {
    if stats.total_robots == 0 {
        return 0.0;
    }

    let availability_rate =
        (stats.idle_robots + stats.busy_robots) as f64 / stats.total_robots as f64 * 100.0;
    let availability_score = availability_rate * 0.3;

    // A fleet without battery telemetry is not penalized for it.
    let battery_score = battery.map_or(100.0, |b| b.average.min(100.0)) * 0.3;

    let completion_score = if stats.total_tasks > 0 {
        let completion_rate = stats.completed_tasks as f64 / stats.total_tasks as f64 * 100.0;
        let failure_rate = stats.failed_tasks as f64 / stats.total_tasks as f64 * 100.0;
        (completion_rate - failure_rate / 2.0) * 0.4
    } else {
        0.0
    };

    (availability_score + battery_score + completion_score).clamp(0.0, 100.0)
}
