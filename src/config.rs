/// Rectangular coordinate bounds for a deployment site.
///
/// When set on [`FleetConfig`], positions outside the rectangle are rejected
/// at the API boundary (robot registration, task submission).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Symmetric bounds of `±extent` on both axes.
    pub fn symmetric(extent: f64) -> Self {
        Self::new(-extent, extent, -extent, extent)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }
}

/// How a task's required capability is matched against a robot's capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityMatch {
    /// The required tag must be contained in the robot's set (tasks with no
    /// requirement match every robot).
    #[default]
    Subset,
    /// The robot's set must equal exactly the task's requirement set.
    Exact,
}

#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Requeue budget: a failed task re-enters the pending queue at most
    /// this many times before settling into terminal failure.
    pub max_retries: u32,
    /// Optional coordinate bounds; `None` accepts any finite position.
    pub bounds: Option<Bounds>,
    /// Capability matching policy used by the assignment pass.
    pub capability_match: CapabilityMatch,
    /// Robots reporting a battery level below this are not eligible for
    /// assignment. Robots without battery telemetry are always eligible.
    pub min_battery: f64,
    /// Default heartbeat timeout used by external drivers when invoking the
    /// liveness sweep.
    pub heartbeat_timeout_ms: u64,
    /// Maximum number of tasks the queue will hold.
    pub max_tasks: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            bounds: None,
            capability_match: CapabilityMatch::Subset,
            min_battery: 20.0,
            heartbeat_timeout_ms: 5000,
            max_tasks: 10_000,
        }
    }
}

impl FleetConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_capability_match(mut self, mode: CapabilityMatch) -> Self {
        self.capability_match = mode;
        self
    }

    pub fn with_min_battery(mut self, min_battery: f64) -> Self {
        self.min_battery = min_battery;
        self
    }

    pub fn with_heartbeat_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.heartbeat_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_config_default() {
        let cfg = FleetConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert!(cfg.bounds.is_none());
        assert_eq!(cfg.capability_match, CapabilityMatch::Subset);
        assert_eq!(cfg.min_battery, 20.0);
        assert_eq!(cfg.heartbeat_timeout_ms, 5000);
        assert_eq!(cfg.max_tasks, 10_000);
    }

    #[test]
    fn fleet_config_builders() {
        let cfg = FleetConfig::default()
            .with_max_retries(5)
            .with_bounds(Bounds::symmetric(100.0))
            .with_capability_match(CapabilityMatch::Exact)
            .with_min_battery(10.0)
            .with_heartbeat_timeout_ms(2000)
            .with_max_tasks(64);
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.bounds, Some(Bounds::symmetric(100.0)));
        assert_eq!(cfg.capability_match, CapabilityMatch::Exact);
        assert_eq!(cfg.min_battery, 10.0);
        assert_eq!(cfg.heartbeat_timeout_ms, 2000);
        assert_eq!(cfg.max_tasks, 64);
    }

    #[test]
    fn bounds_contains() {
        let bounds = Bounds::symmetric(1000.0);
        assert!(bounds.contains(0.0, 0.0));
        assert!(bounds.contains(-1000.0, 1000.0));
        assert!(!bounds.contains(1000.1, 0.0));
        assert!(!bounds.contains(0.0, -1000.1));
    }

    #[test]
    fn bounds_rejecting_negative_coordinates() {
        let bounds = Bounds::new(0.0, 500.0, 0.0, 500.0);
        assert!(bounds.contains(250.0, 250.0));
        assert!(!bounds.contains(-1.0, 250.0));
    }
}
