//! Death conditions and consequences for cubes.
//!
//! A cube leaves the game when:
//! - its energy runs out from idling or moving
//! - it loses a fight
//! - it is a resource that has been drained or retired
//!
//! Death is a lifecycle event, not an error: the cube keeps its slot and
//! uuid. It leaves the game inactive, hidden and unbound from any client.

use crate::agent::Cube;

/// Why a cube left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Idle burn emptied the energy meter.
    Exhaustion,
    /// Motion cost emptied the energy meter.
    Exertion,
    /// Lost a fight.
    Defeated,
    /// A resource drained below the exhaustion level by feeding.
    Depleted,
    /// A resource retired itself below the retire level.
    Retired,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exhaustion => write!(f, "exhaustion"),
            Self::Exertion => write!(f, "exertion"),
            Self::Defeated => write!(f, "defeated"),
            Self::Depleted => write!(f, "depleted"),
            Self::Retired => write!(f, "retired"),
        }
    }
}

/// Take a cube out of the game: inactive, hidden, unbound, stopped, death
/// time set.
pub fn kill(cube: &mut Cube, cause: DeathCause, now: f64) {
    cube.active = false;
    cube.display = false;
    cube.remote = false;
    cube.velocity = 0.0;
    cube.life.death = now;
    tracing::info!(
        index = cube.index,
        uuid = %cube.uuid,
        kind = %cube.kind,
        cause = %cause,
        "cube left the game"
    );
}

#[cfg(test)]
mod tests {
    use cubeworld_types::PlayerKind;

    use super::*;
    use crate::agent::tests::make_cube;

    #[test]
    fn kill_hides_and_stops() {
        let mut cube = make_cube(0, PlayerKind::Male, 0.0, 0.0, 1.0);
        cube.velocity = 2.0;
        cube.remote = true;
        kill(&mut cube, DeathCause::Exhaustion, 42.0);
        assert!(!cube.active && !cube.display && !cube.remote);
        assert!(cube.velocity.abs() < f32::EPSILON);
        assert!((cube.life.death - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn causes_display_snake_case() {
        assert_eq!(DeathCause::Depleted.to_string(), "depleted");
    }
}
