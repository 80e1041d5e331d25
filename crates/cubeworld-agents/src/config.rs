//! Tunable parameters for agent mechanics.
//!
//! These values correspond to the `energy`, `life`, `combat` and `motion`
//! sections of `cubeworld-config.yaml`. The [`AgentConfig`] struct bundles
//! every tunable so that callers (tick driver, tests) can override defaults.

/// Configuration for energy, life-cycle, combat and motion rules.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Energy above which males hunt and below which females and enbies
    /// forage (default: 50).
    pub energy_threshold: f32,

    /// Most energy drawn from a resource in one contact (default: 200).
    pub max_transfer: f32,

    /// Energy ceiling (default: 1000).
    pub energy_limit: f32,

    /// Idle burn per second per unit of scale factor (default: 0.01).
    pub energy_cost: f32,

    /// Motion burn per unit of velocity per second (default: 0.16).
    pub energy_factor: f32,

    /// Resources below this energy are retired by their strategy (default: 10).
    pub resource_retire: f32,

    /// Resources below this energy after a draw are exhausted (default: 0.001).
    pub exhausted: f32,

    /// Female refractory interval after mating, seconds (default: 30).
    pub mate_hold_seconds: f64,

    /// Youth interval after birth, seconds (default: 60).
    pub youth_hold_seconds: f64,

    /// Cap on the win threshold for enby prey (default: 0.2).
    pub enby_superpower: f32,

    /// Size ratio span over which prey's chance falls from 1 to 0 (default: 1.4).
    pub size_advantage_span: f32,

    /// Speed limit for remote moves (default: 5.0).
    pub velocity_max: f32,

    /// Length of a backup manoeuvre, seconds (default: 0.5).
    pub backup_seconds: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 50.0,
            max_transfer: 200.0,
            energy_limit: 1000.0,
            energy_cost: 0.01,
            energy_factor: 0.16,
            resource_retire: 10.0,
            exhausted: 0.001,
            mate_hold_seconds: 30.0,
            youth_hold_seconds: 60.0,
            enby_superpower: 0.2,
            size_advantage_span: 1.4,
            velocity_max: 5.0,
            backup_seconds: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract_constants() {
        let c = AgentConfig::default();
        assert!((c.velocity_max - 5.0).abs() < f32::EPSILON);
        assert!((c.energy_limit - 1000.0).abs() < f32::EPSILON);
        assert!((c.youth_hold_seconds - 60.0).abs() < f64::EPSILON);
        assert!((c.mate_hold_seconds - 30.0).abs() < f64::EPSILON);
    }
}
