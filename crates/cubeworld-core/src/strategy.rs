//! Built-in policies for cubes no client is driving.
//!
//! Every policy decides *what to pursue*; motion is left to
//! [`motion::move_toward`]. Policies remember their targets between ticks
//! and keep chasing one while it stays active. A blocked cube first backs
//! out (see [`motion::backup_active`]) before its policy runs again.
//!
//! Predators and resources form the basic set; males, females and enbies
//! the extended set. Each set can be switched off in the configuration.

use rand::Rng;

use cubeworld_agents::death::{DeathCause, kill};
use cubeworld_agents::{AgentConfig, Cube, CubeRoster, Targets, family, motion};
use cubeworld_types::PlayerKind;
use cubeworld_world::kinematics;

use crate::config::SimulationSettings;
use crate::world::World;

/// What a policy decided for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    /// Targets to remember.
    targets: Targets,
    /// Cube to move toward; `None` means rest.
    pursue: Option<usize>,
}

/// Index of the target if it is still in the game.
fn still_active(roster: &CubeRoster, target: Option<usize>) -> Option<usize> {
    target.filter(|&i| roster.get(i).is_some_and(|c| c.active))
}

/// Nearest live cube of one of `wanted` kinds that `me` may pursue and that
/// passes `accept`.
pub fn find_nearest(
    roster: &CubeRoster,
    me: &Cube,
    wanted: &[PlayerKind],
    config: &AgentConfig,
    now: f64,
    accept: impl Fn(&Cube) -> bool,
) -> Option<usize> {
    roster
        .iter()
        .filter(|c| c.index != me.index && c.is_live() && wanted.contains(&c.kind))
        .filter(|c| family::may_pursue(me, c, now, config.youth_hold_seconds))
        .filter(|c| accept(c))
        .map(|c| (c.index, kinematics::planar_distance(me.position, c.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

fn plan_male(roster: &CubeRoster, me: &Cube, config: &AgentConfig, now: f64) -> Plan {
    let mut targets = me.targets;
    let mut pursue = None;

    if me.energy > config.energy_threshold {
        pursue = still_active(roster, targets.matched);
        if pursue.is_none() {
            pursue = find_nearest(roster, me, &[PlayerKind::Predator], config, now, |_| true);
            targets.matched = pursue;
            if let Some(t) = pursue {
                targets.resource = None;
                tracing::debug!(me = me.index, target = t, "hunting predator");
            }
        }
    }
    if pursue.is_none() && me.energy < config.energy_limit {
        pursue = still_active(roster, targets.resource);
        if pursue.is_none() {
            pursue = find_nearest(roster, me, &[PlayerKind::Resource], config, now, |_| true);
            targets.resource = pursue;
            targets.matched = None;
            if let Some(t) = pursue {
                tracing::debug!(me = me.index, target = t, energy = me.energy, "foraging");
            }
        }
    }
    Plan { targets, pursue }
}

fn plan_female(roster: &CubeRoster, me: &Cube, config: &AgentConfig, now: f64) -> Plan {
    let mut targets = me.targets;
    let recuperating = me.is_recuperating(now, config.mate_hold_seconds);
    let youth = me.is_youth(now, config.youth_hold_seconds);
    if recuperating {
        targets.male = None;
    }

    let mut pursue = None;
    if me.energy < config.energy_limit {
        pursue = still_active(roster, targets.resource);
    }
    if pursue.is_none()
        && me.energy < config.energy_limit
        && (recuperating || me.energy < config.energy_threshold)
    {
        pursue = find_nearest(roster, me, &[PlayerKind::Resource], config, now, |_| true);
        if let Some(t) = pursue {
            targets.resource = Some(t);
            targets.male = None;
            tracing::debug!(me = me.index, target = t, energy = me.energy, "low on energy, foraging");
        }
    }
    if pursue.is_none() && !recuperating {
        pursue = still_active(roster, targets.male);
    }
    if pursue.is_none() && !recuperating && !youth {
        pursue = find_nearest(roster, me, &[PlayerKind::Male], config, now, |_| true);
        targets.male = pursue;
        targets.resource = None;
        if let Some(t) = pursue {
            tracing::debug!(me = me.index, target = t, "courting");
        }
    }
    Plan { targets, pursue }
}

fn plan_enby(roster: &CubeRoster, me: &Cube, config: &AgentConfig, now: f64) -> Plan {
    let mut targets = me.targets;
    let mut pursue = still_active(roster, targets.resource);

    if pursue.is_none() && me.energy < config.energy_threshold {
        pursue = find_nearest(roster, me, &[PlayerKind::Resource], config, now, |_| true);
        if let Some(t) = pursue {
            targets.resource = Some(t);
            targets.matched = None;
            tracing::debug!(me = me.index, target = t, "low on energy, foraging");
        }
    }
    if pursue.is_none() {
        pursue = still_active(roster, targets.matched);
    }
    if pursue.is_none() {
        pursue = find_nearest(roster, me, &[PlayerKind::Predator], config, now, |_| true);
        targets.matched = pursue;
        if let Some(t) = pursue {
            tracing::debug!(me = me.index, target = t, "hunting predator");
        }
    }
    Plan { targets, pursue }
}

fn plan_predator(roster: &CubeRoster, me: &Cube, config: &AgentConfig, now: f64) -> Plan {
    let mut targets = me.targets;
    let mut pursue = still_active(roster, targets.matched);
    if pursue.is_none() {
        let prey = [PlayerKind::Male, PlayerKind::Female, PlayerKind::Enby];
        pursue = find_nearest(roster, me, &prey, config, now, |c| c.scale_factor < me.scale_factor);
        targets.matched = pursue;
        if let Some(t) = pursue {
            tracing::debug!(me = me.index, target = t, "stalking");
        }
    }
    Plan { targets, pursue }
}

/// Run the policy of the cube at `index` for one tick.
pub fn apply_strategy<R: Rng>(world: &mut World, index: usize, rng: &mut R, config: &AgentConfig, fps: f32, now: f64) {
    let Some(cube) = world.cubes.get_mut(index) else {
        return;
    };
    if cube.kind == PlayerKind::Resource {
        if cube.energy < config.resource_retire {
            kill(cube, DeathCause::Retired, now);
        }
        return;
    }
    if motion::backup_active(cube, config, rng, fps, now) {
        return;
    }

    let roster = &world.cubes;
    let Some(me) = roster.get(index) else {
        return;
    };
    let plan = match me.kind {
        PlayerKind::Male => plan_male(roster, me, config, now),
        PlayerKind::Female => plan_female(roster, me, config, now),
        PlayerKind::Enby => plan_enby(roster, me, config, now),
        PlayerKind::Predator => plan_predator(roster, me, config, now),
        PlayerKind::Resource => return,
    };
    let goal = plan.pursue.and_then(|t| roster.get(t)).map(|t| t.position);

    let Some(cube) = world.cubes.get_mut(index) else {
        return;
    };
    cube.targets = plan.targets;
    if let Some(position) = goal {
        motion::move_toward(cube, position);
    } else {
        if cube.velocity > 0.0 {
            tracing::debug!(me = index, kind = %cube.kind, "resting");
        }
        motion::rest(cube);
    }
}

/// Whether the configuration lets the server drive cubes of `kind`.
pub const fn is_driven(settings: &SimulationSettings, kind: PlayerKind) -> bool {
    if !settings.strategy_enabled {
        return false;
    }
    match kind {
        PlayerKind::Predator | PlayerKind::Resource => settings.strategy_basic,
        PlayerKind::Male | PlayerKind::Female | PlayerKind::Enby => settings.strategy_extended,
    }
}

/// Strategy pass: every active cube not bound to a client runs its policy.
pub fn run_strategies<R: Rng>(
    world: &mut World,
    settings: &SimulationSettings,
    rng: &mut R,
    config: &AgentConfig,
    fps: f32,
    now: f64,
) {
    for index in 0..world.cubes.len() {
        let Some(cube) = world.cubes.get(index) else {
            continue;
        };
        if !cube.active || cube.remote || !is_driven(settings, cube.kind) {
            continue;
        }
        apply_strategy(world, index, rng, config, fps, now);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::world::tests::{add_cube, make_world};

    const EPS: f32 = 1e-4;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(11)
    }

    #[test]
    fn strong_male_hunts_nearest_predator() {
        let mut world = make_world();
        let m = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 100.0);
        let near = add_cube(&mut world, PlayerKind::Predator, 3.0, 0.0, 10.0);
        add_cube(&mut world, PlayerKind::Predator, -6.0, 0.0, 10.0);
        add_cube(&mut world, PlayerKind::Resource, 0.0, 2.0, 10.0);

        apply_strategy(&mut world, m, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let male = world.cubes.get(m).unwrap();
        assert_eq!(male.targets.matched, Some(near));
        assert!((male.velocity - 0.3).abs() < EPS);
        assert!((male.yaw() - core::f32::consts::FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn weak_male_forages() {
        let mut world = make_world();
        let m = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 20.0);
        add_cube(&mut world, PlayerKind::Predator, 3.0, 0.0, 10.0);
        let r = add_cube(&mut world, PlayerKind::Resource, 0.0, 5.0, 100.0);

        apply_strategy(&mut world, m, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let male = world.cubes.get(m).unwrap();
        assert_eq!(male.targets.resource, Some(r));
        assert_eq!(male.targets.matched, None);
    }

    #[test]
    fn female_skips_father_and_youth() {
        let mut world = make_world();
        let f = add_cube(&mut world, PlayerKind::Female, 0.0, 0.0, 100.0);
        let dad = add_cube(&mut world, PlayerKind::Male, 1.0, 0.0, 100.0);
        let young = add_cube(&mut world, PlayerKind::Male, 2.0, 0.0, 100.0);
        let adult = add_cube(&mut world, PlayerKind::Male, 5.0, 0.0, 100.0);
        let father = world.cubes.get(dad).unwrap().uuid.clone();
        world.cubes.get_mut(f).unwrap().life.father = father;
        world.cubes.get_mut(young).unwrap().life.birth = 90.0;

        apply_strategy(&mut world, f, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        assert_eq!(world.cubes.get(f).unwrap().targets.male, Some(adult));
    }

    #[test]
    fn recuperating_female_forages_instead() {
        let mut world = make_world();
        let f = add_cube(&mut world, PlayerKind::Female, 0.0, 0.0, 500.0);
        add_cube(&mut world, PlayerKind::Male, 1.0, 0.0, 100.0);
        let r = add_cube(&mut world, PlayerKind::Resource, 0.0, 4.0, 100.0);
        world.cubes.get_mut(f).unwrap().life.mate_times.push(95.0);

        apply_strategy(&mut world, f, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let female = world.cubes.get(f).unwrap();
        assert_eq!(female.targets.resource, Some(r));
        assert_eq!(female.targets.male, None);
    }

    #[test]
    fn predator_only_stalks_smaller_prey() {
        let mut world = make_world();
        let p = add_cube(&mut world, PlayerKind::Predator, 0.0, 0.0, 100.0);
        let big = add_cube(&mut world, PlayerKind::Male, 1.0, 0.0, 100.0);
        let small = add_cube(&mut world, PlayerKind::Enby, 6.0, 0.0, 100.0);
        world.cubes.get_mut(p).unwrap().scale_factor = 0.9;
        world.cubes.get_mut(big).unwrap().scale_factor = 1.1;
        world.cubes.get_mut(small).unwrap().scale_factor = 0.5;

        apply_strategy(&mut world, p, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        assert_eq!(world.cubes.get(p).unwrap().targets.matched, Some(small));
    }

    #[test]
    fn predator_without_prey_rests() {
        let mut world = make_world();
        let p = add_cube(&mut world, PlayerKind::Predator, 0.0, 0.0, 100.0);
        world.cubes.get_mut(p).unwrap().velocity = 2.0;
        apply_strategy(&mut world, p, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let predator = world.cubes.get(p).unwrap();
        assert!(predator.velocity.abs() < EPS);
        assert_eq!(predator.targets, Targets::default());
    }

    #[test]
    fn depleted_resource_retires() {
        let mut world = make_world();
        let r = add_cube(&mut world, PlayerKind::Resource, 0.0, 0.0, 5.0);
        apply_strategy(&mut world, r, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let resource = world.cubes.get(r).unwrap();
        assert!(!resource.active && !resource.display);
    }

    #[test]
    fn blocked_cube_backs_up_first() {
        let mut world = make_world();
        let m = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 100.0);
        add_cube(&mut world, PlayerKind::Predator, 3.0, 0.0, 10.0);
        world.cubes.get_mut(m).unwrap().position_blocked = true;

        apply_strategy(&mut world, m, &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        let male = world.cubes.get(m).unwrap();
        assert!(male.backup_timer > 0);
        assert!(male.direction_active);
        assert_eq!(male.targets.matched, None);
    }

    #[test]
    fn remote_cubes_are_left_alone() {
        let mut world = make_world();
        let m = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 100.0);
        add_cube(&mut world, PlayerKind::Predator, 3.0, 0.0, 10.0);
        world.cubes.get_mut(m).unwrap().remote = true;

        run_strategies(&mut world, &SimulationSettings::default(), &mut rng(), &AgentConfig::default(), 6.5, 100.0);
        assert_eq!(world.cubes.get(m).unwrap().targets.matched, None);
    }

    #[test]
    fn switches_gate_kinds() {
        let settings = SimulationSettings {
            strategy_extended: false,
            ..SimulationSettings::default()
        };
        assert!(is_driven(&settings, PlayerKind::Predator));
        assert!(!is_driven(&settings, PlayerKind::Male));
        let off = SimulationSettings {
            strategy_enabled: false,
            ..SimulationSettings::default()
        };
        assert!(!is_driven(&off, PlayerKind::Resource));
    }
}
