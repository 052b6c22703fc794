use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};
use crate::location::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotStatus {
    Idle,
    Busy,
    Offline,
    Error,
}

impl std::fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RobotStatus::Idle => write!(f, "idle"),
            RobotStatus::Busy => write!(f, "busy"),
            RobotStatus::Offline => write!(f, "offline"),
            RobotStatus::Error => write!(f, "error"),
        }
    }
}

impl RobotStatus {
    /// Legal lifecycle edges: Idle↔Busy, any→Offline, Offline→Idle on
    /// recovery, any→Error, Error→Idle on manual reset.
    pub fn can_transition_to(self, to: RobotStatus) -> bool {
        use RobotStatus::*;
        matches!(
            (self, to),
            (Idle, Busy) | (Busy, Idle) | (_, Offline) | (Offline, Idle) | (_, Error) | (Error, Idle)
        )
    }
}

/// A fleet agent capable of executing tasks at a location.
///
/// Mutated only through [`Robot::transition`] and heartbeat recording; every
/// status change goes through the legality check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub robot_id: String,
    pub name: String,
    pub position: Position,
    pub capabilities: BTreeSet<String>,
    pub status: RobotStatus,
    pub battery_level: Option<f64>,
    pub last_heartbeat: DateTime<Utc>,
}

impl Robot {
    /// Build an Idle robot. Fails with a validation error on an empty id or
    /// name. The heartbeat clock starts at construction.
    pub fn new(robot_id: impl Into<String>, name: impl Into<String>, position: Position) -> Result<Self> {
        let robot_id = robot_id.into();
        let name = name.into();
        if robot_id.trim().is_empty() {
            return Err(FleetError::Validation("robot id must not be empty".to_string()));
        }
        if name.trim().is_empty() {
            return Err(FleetError::Validation("robot name must not be empty".to_string()));
        }
        Ok(Self {
            robot_id,
            name,
            position,
            capabilities: BTreeSet::new(),
            status: RobotStatus::Idle,
            battery_level: None,
            last_heartbeat: Utc::now(),
        })
    }

    pub fn with_capability(mut self, tag: impl Into<String>) -> Self {
        self.capabilities.insert(tag.into());
        self
    }

    /// Attach battery telemetry. Fails outside 0–100.
    pub fn with_battery(mut self, level: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&level) {
            return Err(FleetError::Validation(format!(
                "battery level must be within 0-100, got {level}"
            )));
        }
        self.battery_level = Some(level);
        Ok(self)
    }

    /// Apply a status change, rejecting edges outside the lifecycle graph.
    pub fn transition(&mut self, to: RobotStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(FleetError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Eligible for assignment: Idle, and battery (when reported) at or
    /// above the configured threshold.
    pub fn is_available(&self, min_battery: f64) -> bool {
        self.status == RobotStatus::Idle
            && self.battery_level.map_or(true, |level| level >= min_battery)
    }
}
