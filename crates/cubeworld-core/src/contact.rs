//! Pairwise contact between cubes.
//!
//! Two live cubes touch when their XZ centres are closer than the sum of
//! their radii. Each tick runs two passes over the unordered pairs:
//!
//! 1. [`resolve_contacts`] dispatches the event for every touching pair
//!    (mate, attack, feed or stop) from [`CONTACT_TABLE`].
//! 2. [`block_overlaps`] rolls back every moving cube that still overlaps
//!    another once the events have been applied.
//!
//! A pair whose event removed one side no longer touches, so it is not
//! blocked. Newborns start at scale 0 and cannot overlap.

use rand::Rng;

use cubeworld_agents::reproduction::ChildTexture;
use cubeworld_agents::{AgentConfig, AttackOutcome, Cube, attack, feed, mate, motion};
use cubeworld_types::{ContactEvent, PlayerKind};
use cubeworld_world::kinematics;

use crate::world::World;

use ContactEvent::{Attack, Feed, Mate, Stop};

/// Event for every (kind, kind) pair, indexed by [`PlayerKind::index`].
pub const CONTACT_TABLE: [[ContactEvent; 5]; 5] = [
    // male    female  enby    predator resource
    [Stop, Mate, Stop, Attack, Feed],     // male
    [Mate, Stop, Stop, Attack, Feed],     // female
    [Stop, Stop, Stop, Attack, Feed],     // enby
    [Attack, Attack, Attack, Stop, Stop], // predator
    [Feed, Feed, Feed, Stop, Stop],       // resource
];

/// What the dispatch pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactReport {
    /// Children added to the roster.
    pub births: usize,
    /// Male/female contacts that were refused.
    pub refusals: usize,
    /// Fights resolved.
    pub fights: usize,
    /// Resource draws.
    pub feeds: usize,
}

/// Event for a pair of kinds.
pub fn contact_event(a: PlayerKind, b: PlayerKind) -> ContactEvent {
    CONTACT_TABLE
        .get(a.index())
        .and_then(|row| row.get(b.index()))
        .copied()
        .unwrap_or(Stop)
}

/// Whether two distinct live cubes overlap in XZ.
pub fn in_contact(a: &Cube, b: &Cube) -> bool {
    a.index != b.index
        && a.is_live()
        && b.is_live()
        && kinematics::planar_distance(a.position, b.position) < a.radius + b.radius
}

/// Dispatch contact events over all unordered pairs present at the start of
/// the pass.
pub fn resolve_contacts<R: Rng>(world: &mut World, rng: &mut R, config: &AgentConfig, now: f64) -> ContactReport {
    let mut report = ContactReport::default();
    let count = world.cubes.len();
    for i in 0..count {
        for j in i.saturating_add(1)..count {
            let roster_full = world.cubes.is_full();
            let Some((a, b)) = world.cubes.pair_mut(i, j) else {
                continue;
            };
            if !in_contact(a, b) {
                continue;
            }
            match contact_event(a.kind, b.kind) {
                Stop => {}
                Mate => {
                    let (male, female) = if a.kind == PlayerKind::Male { (a, b) } else { (b, a) };
                    match mate(male, female, roster_full, rng, config, now) {
                        Ok(birth) => {
                            if place_child(world, birth.child, birth.texture) {
                                report.births = report.births.saturating_add(1);
                            }
                        }
                        Err(reason) => {
                            tracing::debug!(first = i, second = j, %reason, "mating refused");
                            report.refusals = report.refusals.saturating_add(1);
                        }
                    }
                }
                Attack => {
                    let (player, predator) = if a.kind == PlayerKind::Predator { (b, a) } else { (a, b) };
                    let roll: f32 = rng.random();
                    if attack(player, predator, roll, config, now) == AttackOutcome::PredatorWon {
                        tracing::info!(predator = predator.index, prey = player.index, "prey eaten");
                    }
                    report.fights = report.fights.saturating_add(1);
                }
                Feed => {
                    let (player, resource) = if a.kind == PlayerKind::Resource { (b, a) } else { (a, b) };
                    if feed(player, resource, config, now).is_some() {
                        report.feeds = report.feeds.saturating_add(1);
                    }
                }
            }
        }
    }
    report
}

/// Add a newborn to the world, loading its face texture if it needs one.
fn place_child(world: &mut World, mut child: Cube, texture: ChildTexture) -> bool {
    if let ChildTexture::Load(file) = texture {
        match world.load_texture(&file).map(i32::try_from) {
            Ok(Ok(slot)) => child.texture_index = slot,
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(file = %file, "no texture slot for child, keeping mother's texture");
            }
        }
    }
    match world.cubes.push(child) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "child not placed");
            false
        }
    }
}

/// Roll back moving cubes that still overlap another. Returns the number
/// of overlapping pairs found.
pub fn block_overlaps(world: &mut World, now: f64) -> usize {
    let mut overlaps = 0_usize;
    let count = world.cubes.len();
    for i in 0..count {
        for j in i.saturating_add(1)..count {
            let Some((a, b)) = world.cubes.pair_mut(i, j) else {
                continue;
            };
            if !in_contact(a, b) {
                continue;
            }
            motion::block_position(a, now);
            motion::block_position(b, now);
            overlaps = overlaps.saturating_add(1);
        }
    }
    overlaps
}
