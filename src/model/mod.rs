pub mod robot;
pub mod task;

pub use robot::{Robot, RobotStatus};
pub use task::{FailureOutcome, Task, TaskStatus};
