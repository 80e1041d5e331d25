//! Fights between players and predators.
//!
//! A player bigger than the predator always wins. Otherwise the player's
//! odds fall linearly with the size ratio:
//!
//! - ratio 1.0 means the player always wins,
//! - ratio `1 + size_advantage_span` (2.4 by default) means it never does.
//!
//! Enby players have their threshold capped at `enby_superpower`. Sizes are
//! adult sizes (`scale_factor`), so a growing youth fights at full size.

use cubeworld_types::PlayerKind;

use crate::agent::{Cube, MatchRecord};
use crate::config::AgentConfig;
use crate::death::{DeathCause, kill};

/// Who survived a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The player eliminated the predator.
    PlayerWon,
    /// The predator ate the player.
    PredatorWon,
}

/// Threshold a uniform roll must beat for the player to win.
pub fn win_threshold(player: &Cube, predator: &Cube, config: &AgentConfig) -> f32 {
    if player.scale_factor <= 0.0 || config.size_advantage_span <= 0.0 {
        return 0.0;
    }
    let ratio = predator.scale_factor / player.scale_factor;
    let threshold = (ratio - 1.0) / config.size_advantage_span;
    if player.kind == PlayerKind::Enby {
        threshold.min(config.enby_superpower)
    } else {
        threshold
    }
}

/// Resolve a fight. `roll` is a uniform draw in `[0, 1)`.
pub fn attack(player: &mut Cube, predator: &mut Cube, roll: f32, config: &AgentConfig, now: f64) -> AttackOutcome {
    player.targets.matched = None;
    predator.targets.matched = None;

    let outright = player.scale_factor > predator.scale_factor;
    let threshold = win_threshold(player, predator, config);
    tracing::debug!(
        player = player.index,
        predator = predator.index,
        threshold,
        roll,
        outright,
        "fight"
    );

    if outright || roll > threshold {
        record(player, predator, predator.energy, true, now);
        record(predator, player, 0.0, false, now);
        predator.energy = 0.0;
        kill(predator, DeathCause::Defeated, now);
        tracing::info!(
            player = player.index,
            predator = predator.index,
            outright,
            "predator eliminated"
        );
        AttackOutcome::PlayerWon
    } else {
        let spoils = player.energy;
        predator.energy += spoils;
        record(predator, player, spoils, true, now);
        record(player, predator, 0.0, false, now);
        player.energy = 0.0;
        kill(player, DeathCause::Defeated, now);
        AttackOutcome::PredatorWon
    }
}

fn record(me: &mut Cube, opponent: &Cube, energy: f32, won: bool, now: f64) {
    me.matches.push(MatchRecord {
        opponent: opponent.uuid.clone(),
        time: now,
        energy,
        won,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::make_cube;

    const EPS: f32 = 1e-5;

    fn sized(kind: PlayerKind, index: usize, scale: f32, energy: f32) -> Cube {
        let mut cube = make_cube(index, kind, 0.0, 0.0, energy);
        cube.scale_factor = scale;
        cube.set_scale(scale);
        cube
    }

    #[test]
    fn bigger_player_wins_outright() {
        let config = AgentConfig::default();
        let mut player = sized(PlayerKind::Male, 0, 1.0, 100.0);
        let mut predator = sized(PlayerKind::Predator, 1, 0.8, 300.0);
        let outcome = attack(&mut player, &mut predator, 0.0, &config, 5.0);
        assert_eq!(outcome, AttackOutcome::PlayerWon);
        assert!(!predator.active && !predator.display);
        assert!((player.energy - 100.0).abs() < EPS);
        assert!((player.matches.first().map_or(0.0, |m| m.energy) - 300.0).abs() < EPS);
        assert_eq!(predator.matches.first().map(|m| m.won), Some(false));
    }

    #[test]
    fn lucky_small_prey_beats_predator() {
        let config = AgentConfig::default();
        let mut player = sized(PlayerKind::Female, 0, 0.5, 100.0);
        let mut predator = sized(PlayerKind::Predator, 1, 0.6, 300.0);
        let threshold = win_threshold(&player, &predator, &config);
        assert!((threshold - 0.2 / 1.4).abs() < 1e-4);
        let outcome = attack(&mut player, &mut predator, 0.99, &config, 5.0);
        assert_eq!(outcome, AttackOutcome::PlayerWon);
        assert!(!predator.active);
        assert!((player.energy - 100.0).abs() < EPS);
    }

    #[test]
    fn unlucky_prey_is_absorbed() {
        let config = AgentConfig::default();
        let mut player = sized(PlayerKind::Male, 0, 0.5, 100.0);
        let mut predator = sized(PlayerKind::Predator, 1, 1.0, 300.0);
        let outcome = attack(&mut player, &mut predator, 0.1, &config, 5.0);
        assert_eq!(outcome, AttackOutcome::PredatorWon);
        assert!(!player.active && player.energy.abs() < EPS);
        assert!((predator.energy - 400.0).abs() < EPS);
        assert!(predator.active);
        assert!((player.life.death - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn enby_threshold_is_capped() {
        let config = AgentConfig::default();
        let player = sized(PlayerKind::Enby, 0, 0.5, 100.0);
        let predator = sized(PlayerKind::Predator, 1, 1.2, 300.0);
        assert!((win_threshold(&player, &predator, &config) - 0.2).abs() < EPS);
    }

    #[test]
    fn fight_clears_match_targets() {
        let config = AgentConfig::default();
        let mut player = sized(PlayerKind::Male, 0, 1.0, 100.0);
        let mut predator = sized(PlayerKind::Predator, 1, 0.5, 300.0);
        player.targets.matched = Some(1);
        predator.targets.matched = Some(0);
        let _ = attack(&mut player, &mut predator, 0.5, &config, 1.0);
        assert!(player.targets.matched.is_none() && predator.targets.matched.is_none());
    }
}
