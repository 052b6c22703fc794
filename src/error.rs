use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid position ({x}, {y})")]
    InvalidPosition { x: f64, y: f64 },

    #[error("Robot not found: {0}")]
    RobotNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Robot already registered: {0}")]
    DuplicateRobot(String),

    #[error("Task queue at capacity")]
    QueueAtCapacity,
}

pub type Result<T> = std::result::Result<T, FleetError>;
