use std::collections::HashMap;

use chrono::Utc;
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use robofleet::config::{Bounds, FleetConfig};
use robofleet::location::{self, Position};
use robofleet::model::{Robot, Task};
use robofleet::stats::{BatteryStats, FleetStats};
use robofleet::Fleet;

const CAPABILITIES: &[&str] = &["lift", "scan", "clean"];
const ROBOT_SPEED: f64 = 5.0; // units per second

#[derive(Parser, Debug)]
#[command(name = "robofleet")]
#[command(version)]
#[command(about = "Simulation driver for the robofleet task scheduler")]
struct Args {
    /// Number of robots to register
    #[arg(long, default_value = "4")]
    robots: usize,

    /// Number of tasks to submit up front
    #[arg(long, default_value = "10")]
    tasks: usize,

    /// Simulation ticks to run
    #[arg(long, default_value = "30")]
    ticks: u64,

    /// Milliseconds between ticks
    #[arg(long, default_value = "100")]
    tick_interval_ms: u64,

    /// Heartbeat timeout for the liveness sweep, in milliseconds.
    /// Defaults to the fleet config value.
    #[arg(long)]
    heartbeat_timeout_ms: Option<u64>,

    /// Half-extent of the square deployment site
    #[arg(long, default_value = "100.0")]
    site_extent: f64,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    ticks: u64,
    assignments_committed: usize,
    robots_lost: usize,
    stats: FleetStats,
    battery: Option<BatteryStats>,
    health_score: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = FleetConfig::default().with_bounds(Bounds::symmetric(args.site_extent));
    let fleet = Fleet::new(config);
    let timeout_ms = args
        .heartbeat_timeout_ms
        .unwrap_or(fleet.config().heartbeat_timeout_ms);

    let mut rng = rand::thread_rng();

    // Register the fleet at random in-bounds positions.
    let mut robot_ids = Vec::new();
    for i in 0..args.robots {
        let position = Position::new(
            rng.gen_range(-args.site_extent..=args.site_extent),
            rng.gen_range(-args.site_extent..=args.site_extent),
        )?;
        let robot = Robot::new(format!("r{i:02}"), format!("unit-{i:02}"), position)?
            .with_capability(CAPABILITIES[i % CAPABILITIES.len()])
            .with_battery(rng.gen_range(15.0..=100.0))?;
        robot_ids.push(fleet.register_robot(robot)?);
    }

    // Submit the initial workload; roughly half the tasks require a tag.
    for _ in 0..args.tasks {
        let target = Position::new(
            rng.gen_range(-args.site_extent..=args.site_extent),
            rng.gen_range(-args.site_extent..=args.site_extent),
        )?;
        let mut task = Task::new(target).with_priority(rng.gen_range(0..5));
        if rng.gen_bool(0.5) {
            task = task.with_capability(CAPABILITIES[rng.gen_range(0..CAPABILITIES.len())]);
        }
        fleet.submit_task(task)?;
    }

    // One robot goes silent partway through to exercise the recovery path.
    let silent_after = args.ticks / 3;
    let silent_robot = robot_ids.first().cloned();

    let tick_secs = args.tick_interval_ms as f64 / 1000.0;
    let timeout = chrono::Duration::milliseconds(timeout_ms as i64);
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(args.tick_interval_ms));

    let mut due: HashMap<Uuid, u64> = HashMap::new();
    let mut assignments_committed = 0usize;
    let mut robots_lost = 0usize;

    for tick in 0..args.ticks {
        interval.tick().await;
        let now = Utc::now();

        for robot_id in &robot_ids {
            if Some(robot_id) == silent_robot.as_ref() && tick >= silent_after {
                continue;
            }
            fleet.heartbeat(robot_id, now)?;
        }

        for assignment in fleet.run_assignment_pass() {
            fleet.start_task(&assignment.task_id)?;
            let travel = location::travel_time(assignment.distance, ROBOT_SPEED)?;
            let ticks_needed = (travel / tick_secs).ceil().max(1.0) as u64;
            due.insert(assignment.task_id, tick + ticks_needed);
            assignments_committed += 1;
        }

        let finished: Vec<Uuid> = due
            .iter()
            .filter(|(_, &at)| at <= tick)
            .map(|(id, _)| *id)
            .collect();
        for task_id in finished {
            due.remove(&task_id);
            if fleet.complete_task(&task_id).is_err() {
                // The task was requeued after a robot loss; the next pass
                // picks it up again.
                tracing::debug!(task_id = %task_id, "Completion skipped, task no longer in progress");
            }
        }

        robots_lost += fleet.sweep_liveness(now, timeout).len();
    }

    let report = Report {
        ticks: args.ticks,
        assignments_committed,
        robots_lost,
        stats: fleet.stats(),
        battery: fleet.battery_stats(),
        health_score: fleet.health_score(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let s = &report.stats;
        println!("robofleet simulation finished after {} ticks", report.ticks);
        println!(
            "robots: {} total, {} idle, {} busy, {} offline, {} error",
            s.total_robots, s.idle_robots, s.busy_robots, s.offline_robots, s.error_robots
        );
        println!(
            "tasks: {} total, {} pending, {} assigned, {} in progress, {} completed, {} failed, {} cancelled",
            s.total_tasks,
            s.pending_tasks,
            s.assigned_tasks,
            s.in_progress_tasks,
            s.completed_tasks,
            s.failed_tasks,
            s.cancelled_tasks
        );
        println!("assignments committed: {}", report.assignments_committed);
        println!("loss events observed: {}", report.robots_lost);
        if let Some(b) = &report.battery {
            println!(
                "battery: avg {:.1}%, min {:.1}%, max {:.1}%, {} low",
                b.average, b.min, b.max, b.low_count
            );
        }
        println!("health score: {:.1}/100", report.health_score);
    }

    Ok(())
}
