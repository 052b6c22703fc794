use std::collections::HashMap;

use crate::error::{FleetError, Result};
use crate::model::{Robot, RobotStatus};

/// Owns the registered robots. A plain collection: eligibility policy lives
/// in the assigner, liveness policy in the monitor.
#[derive(Debug, Default)]
pub struct RobotRegistry {
    robots: HashMap<String, Robot>,
}

impl RobotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, robot: Robot) -> Result<()> {
        if self.robots.contains_key(&robot.robot_id) {
            return Err(FleetError::DuplicateRobot(robot.robot_id));
        }
        tracing::info!(robot_id = %robot.robot_id, name = %robot.name, "Robot registered");
        self.robots.insert(robot.robot_id.clone(), robot);
        Ok(())
    }

    pub fn deregister(&mut self, robot_id: &str) -> Result<Robot> {
        let robot = self
            .robots
            .remove(robot_id)
            .ok_or_else(|| FleetError::RobotNotFound(robot_id.to_string()))?;
        tracing::info!(robot_id, "Robot deregistered");
        Ok(robot)
    }

    pub fn get(&self, robot_id: &str) -> Option<&Robot> {
        self.robots.get(robot_id)
    }

    pub(crate) fn get_mut(&mut self, robot_id: &str) -> Option<&mut Robot> {
        self.robots.get_mut(robot_id)
    }

    pub fn contains(&self, robot_id: &str) -> bool {
        self.robots.contains_key(robot_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Robot> {
        self.robots.values()
    }

    pub(crate) fn all_mut(&mut self) -> impl Iterator<Item = &mut Robot> {
        self.robots.values_mut()
    }

    /// Robots in the given status, or every robot when no filter is given.
    pub fn list_by_status(&self, filter: Option<RobotStatus>) -> Vec<&Robot> {
        let mut robots: Vec<&Robot> = self
            .robots
            .values()
            .filter(|r| filter.map_or(true, |s| r.status == s))
            .collect();
        robots.sort_by(|a, b| a.robot_id.cmp(&b.robot_id));
        robots
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}
