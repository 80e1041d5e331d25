//! Players drawing energy from resources.

use crate::agent::{CaptureRecord, Cube};
use crate::config::AgentConfig;
use crate::death::{DeathCause, kill};

/// Energy moved by one feeding contact, or `None` if the player was already
/// over the limit.
///
/// The resource gives up to `max_transfer`; the player keeps at most
/// `energy_limit`, and the capture ledger records what the player actually
/// gained.
pub fn feed(player: &mut Cube, resource: &mut Cube, config: &AgentConfig, now: f64) -> Option<f32> {
    if player.energy > config.energy_limit {
        return None;
    }
    let drawn = resource.energy.min(config.max_transfer).max(0.0);
    resource.energy -= drawn;
    let before = player.energy;
    player.energy = (player.energy + drawn).min(config.energy_limit);
    let gained = player.energy - before;
    player.captures.push(CaptureRecord {
        resource: resource.uuid.clone(),
        time: now,
        energy: gained,
    });
    tracing::debug!(
        player = player.index,
        resource = resource.index,
        gained,
        energy = player.energy,
        "resource captured"
    );
    if resource.energy < config.exhausted {
        kill(resource, DeathCause::Depleted, now);
    }
    Some(gained)
}

#[cfg(test)]
mod tests {
    use cubeworld_types::PlayerKind;

    use super::*;
    use crate::agent::tests::make_cube;

    const EPS: f32 = 1e-4;

    #[test]
    fn transfer_is_capped_at_limit() {
        let config = AgentConfig::default();
        let mut player = make_cube(0, PlayerKind::Male, 0.0, 0.0, 900.0);
        let mut resource = make_cube(1, PlayerKind::Resource, 0.0, 0.0, 500.0);
        let gained = feed(&mut player, &mut resource, &config, 1.0);
        assert!((player.energy - 1000.0).abs() < EPS);
        assert!((resource.energy - 300.0).abs() < EPS);
        assert!((gained.unwrap_or_default() - 100.0).abs() < EPS);
        assert!(resource.active);
    }

    #[test]
    fn draining_retires_resource() {
        let config = AgentConfig::default();
        let mut player = make_cube(0, PlayerKind::Enby, 0.0, 0.0, 10.0);
        let mut resource = make_cube(1, PlayerKind::Resource, 0.0, 0.0, 150.0);
        let _ = feed(&mut player, &mut resource, &config, 4.0);
        assert!((player.energy - 160.0).abs() < EPS);
        assert!(!resource.active && !resource.display);
        assert!((resource.life.death - 4.0).abs() < f64::EPSILON);
        assert_eq!(player.captures.len(), 1);
    }

    #[test]
    fn over_limit_player_does_not_feed() {
        let config = AgentConfig::default();
        let mut player = make_cube(0, PlayerKind::Female, 0.0, 0.0, 1000.5);
        let mut resource = make_cube(1, PlayerKind::Resource, 0.0, 0.0, 500.0);
        assert!(feed(&mut player, &mut resource, &config, 1.0).is_none());
        assert!((resource.energy - 500.0).abs() < EPS);
    }
}
