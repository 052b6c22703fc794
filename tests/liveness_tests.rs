use chrono::{Duration, Utc};

use robofleet::config::FleetConfig;
use robofleet::location::Position;
use robofleet::model::{FailureOutcome, Robot, RobotStatus, Task, TaskStatus};
use robofleet::monitor::LivenessEvent;
use robofleet::Fleet;

fn pos(x: f64, y: f64) -> Position {
    Position::new(x, y).unwrap()
}

fn timeout() -> Duration {
    Duration::seconds(5)
}

#[test]
fn test_silent_robot_goes_offline_and_task_requeues() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let task_id = fleet.submit_task(Task::new(pos(3.0, 4.0))).unwrap();
    fleet.run_assignment_pass();
    assert_eq!(fleet.get_robot("r1").unwrap().status, RobotStatus::Busy);

    let t0 = Utc::now();
    fleet.heartbeat("r1", t0).unwrap();

    // Heartbeats stop; the sweep past the timeout declares the loss.
    let events = fleet.sweep_liveness(t0 + Duration::seconds(10), timeout());
    assert_eq!(
        events,
        vec![LivenessEvent::RobotLost {
            robot_id: "r1".to_string(),
            orphaned_task: Some(task_id),
        }]
    );

    assert_eq!(fleet.get_robot("r1").unwrap().status, RobotStatus::Offline);
    let task = fleet.get_task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.retry_count, 1);
    assert!(task.assigned_robot_id.is_none());
}

#[test]
fn test_orphaned_task_reassigned_to_surviving_robot() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    fleet.register_robot(Robot::new("r2", "b", pos(8.0, 8.0)).unwrap()).unwrap();
    let task_id = fleet.submit_task(Task::new(pos(1.0, 1.0))).unwrap();

    let assignments = fleet.run_assignment_pass();
    assert_eq!(assignments[0].robot_id, "r1");

    // r1 goes silent, r2 keeps heartbeating.
    let t0 = Utc::now();
    fleet.heartbeat("r1", t0).unwrap();
    let later = t0 + Duration::seconds(10);
    fleet.heartbeat("r2", later).unwrap();
    fleet.sweep_liveness(later, timeout());

    let assignments = fleet.run_assignment_pass();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].robot_id, "r2");
    let task = fleet.get_task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Assigned);
    assert_eq!(task.assigned_robot_id.as_deref(), Some("r2"));
    assert_eq!(task.retry_count, 1);
}

#[test]
fn test_sweep_is_idempotent() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let t0 = Utc::now();
    fleet.heartbeat("r1", t0).unwrap();

    let later = t0 + Duration::seconds(10);
    let first = fleet.sweep_liveness(later, timeout());
    assert_eq!(first.len(), 1);
    let robot_after_first = fleet.get_robot("r1").unwrap();

    // Same sweep again: no events, no further state change.
    let second = fleet.sweep_liveness(later, timeout());
    assert!(second.is_empty());
    let robot_after_second = fleet.get_robot("r1").unwrap();
    assert_eq!(robot_after_second.status, robot_after_first.status);
    assert_eq!(robot_after_second.last_heartbeat, robot_after_first.last_heartbeat);
}

#[test]
fn test_heartbeat_recovers_offline_robot() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let t0 = Utc::now();
    fleet.heartbeat("r1", t0).unwrap();
    fleet.sweep_liveness(t0 + Duration::seconds(10), timeout());
    assert_eq!(fleet.get_robot("r1").unwrap().status, RobotStatus::Offline);

    // Heartbeats resume: back to Idle and eligible on the next pass.
    fleet.heartbeat("r1", t0 + Duration::seconds(11)).unwrap();
    assert_eq!(fleet.get_robot("r1").unwrap().status, RobotStatus::Idle);

    fleet.submit_task(Task::new(pos(1.0, 0.0))).unwrap();
    let assignments = fleet.run_assignment_pass();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].robot_id, "r1");
}

#[test]
fn test_retries_exhaust_into_terminal_failure() {
    let config = FleetConfig::default().with_max_retries(1);
    let fleet = Fleet::new(config);
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let task_id = fleet.submit_task(Task::new(pos(1.0, 0.0))).unwrap();

    // First loss: requeued with retry_count 1.
    fleet.run_assignment_pass();
    let t0 = Utc::now();
    fleet.sweep_liveness(t0 + Duration::seconds(10), timeout());
    assert_eq!(fleet.get_task(&task_id).unwrap().retry_count, 1);

    // The robot recovers and picks the task up again, then is lost again:
    // the budget is spent, so the task settles in Failed.
    let t1 = t0 + Duration::seconds(20);
    fleet.heartbeat("r1", t1).unwrap();
    fleet.run_assignment_pass();
    fleet.sweep_liveness(t1 + Duration::seconds(10), timeout());

    let task = fleet.get_task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.retry_count, 1);

    // Terminal: nothing else may touch it.
    assert!(fleet.cancel_task(&task_id).is_err());
    assert!(fleet.start_task(&task_id).is_err());
    assert!(fleet.complete_task(&task_id).is_err());
}

#[test]
fn test_failure_requeue_increments_retry_exactly_once() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let task_id = fleet.submit_task(Task::new(pos(1.0, 0.0))).unwrap();
    fleet.run_assignment_pass();

    let outcome = fleet.fail_task(&task_id, true).unwrap();
    assert_eq!(outcome, FailureOutcome::Requeued);
    let task = fleet.get_task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.retry_count, 1);
    // The reporting robot is freed for other work.
    assert_eq!(fleet.get_robot("r1").unwrap().status, RobotStatus::Idle);
}

#[test]
fn test_heartbeat_for_unknown_robot_is_an_error() {
    let fleet = Fleet::default();
    let err = fleet.heartbeat("ghost", Utc::now()).unwrap_err();
    assert!(matches!(err, robofleet::FleetError::RobotNotFound(_)));
}

#[test]
fn test_idle_loss_emits_event_without_orphan() {
    let fleet = Fleet::default();
    fleet.register_robot(Robot::new("r1", "a", pos(0.0, 0.0)).unwrap()).unwrap();
    let t0 = Utc::now();
    fleet.heartbeat("r1", t0).unwrap();

    let events = fleet.sweep_liveness(t0 + Duration::seconds(10), timeout());
    assert_eq!(
        events,
        vec![LivenessEvent::RobotLost {
            robot_id: "r1".to_string(),
            orphaned_task: None,
        }]
    );
}
