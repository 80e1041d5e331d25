//! Mating and the birth of children.
//!
//! A male and a female in contact produce one child when:
//! - neither is the other's parent,
//! - both are adults,
//! - the female has not mated within the hold interval,
//! - and the roster has a free slot.
//!
//! Each parent gives half its energy to the child. The child's kind is
//! drawn from the genes roll: male (p=0.475), female (p=0.475), enby (the
//! rest). Children start at size zero at the parents' midpoint and grow up
//! over the youth interval (see [`crate::vitals::grow`]).

use glam::{Vec3, Vec4};
use rand::Rng;

use cubeworld_types::{CubeUuid, PlayerKind};

use crate::agent::Cube;
use crate::config::AgentConfig;
use crate::family;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Genes roll at or below which the child is male.
const MALE_GENES: f32 = 0.475;

/// Genes roll at or below which the child is female (above [`MALE_GENES`]).
const FEMALE_GENES: f32 = 0.95;

/// Emoticon and first name presets for enby children.
pub const ENBY_PRESETS: [(&str, &str); 3] = [("1f60a", "Bailey"), ("1f61a", "Hunter"), ("1f633", "Justice")];

/// Colour of every enby child.
pub const ENBY_COLOR: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);

/// Six-pane texture coordinates used by enby children.
pub const SIX_PANE_TEXTURE_MAP: [f32; 48] = [
    0.0, 0.0, 0.16666, 0.0, 0.16666, 1.0, 0.0, 1.0, //
    0.33333, 0.0, 0.5, 0.0, 0.5, 1.0, 0.33333, 1.0, //
    0.83333, 0.0, 0.83333, 1.0, 0.66666, 1.0, 0.66666, 0.0, //
    1.0, 0.0, 1.0, 1.0, 0.83333, 1.0, 0.83333, 0.0, //
    0.16666, 1.0, 0.16666, 0.0, 0.33333, 0.0, 0.33333, 1.0, //
    0.66666, 0.0, 0.66666, 1.0, 0.5, 1.0, 0.5, 0.0,
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Why a contact between a male and a female produced no child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MateRefusal {
    /// Every roster slot is taken.
    RosterFull,
    /// One is the other's parent.
    Incest,
    /// One of them is under age.
    Youth,
    /// The female mated too recently.
    Recuperating,
}

impl core::fmt::Display for MateRefusal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RosterFull => write!(f, "no room for another cube"),
            Self::Incest => write!(f, "parent and child"),
            Self::Youth => write!(f, "too young"),
            Self::Recuperating => write!(f, "female recuperating"),
        }
    }
}

/// Where a newborn's face texture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildTexture {
    /// Use the slot already set on the child.
    Inherit,
    /// Load this file into the next free texture slot.
    Load(String),
}

/// A child ready to be placed in the roster.
#[derive(Debug, Clone)]
pub struct Birth {
    /// The newborn. Its `index` is assigned when it is pushed.
    pub child: Cube,
    /// Texture the child needs.
    pub texture: ChildTexture,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Why `male` and `female` cannot mate now, if they cannot.
pub fn refusal(male: &Cube, female: &Cube, roster_full: bool, config: &AgentConfig, now: f64) -> Option<MateRefusal> {
    if roster_full {
        return Some(MateRefusal::RosterFull);
    }
    if family::is_incestuous(male, female) {
        return Some(MateRefusal::Incest);
    }
    if male.is_youth(now, config.youth_hold_seconds) || female.is_youth(now, config.youth_hold_seconds) {
        return Some(MateRefusal::Youth);
    }
    if female.is_recuperating(now, config.mate_hold_seconds) {
        return Some(MateRefusal::Recuperating);
    }
    None
}

/// Kind of child for a genes roll in `[0, 1)`.
pub fn child_kind(genes: f32) -> PlayerKind {
    if genes <= MALE_GENES {
        PlayerKind::Male
    } else if genes <= FEMALE_GENES {
        PlayerKind::Female
    } else {
        PlayerKind::Enby
    }
}

/// Enby preset (emoticon, first name) for a selector roll in `[0, 1)`.
pub fn enby_preset(selector: f32) -> (&'static str, &'static str) {
    let [bailey, hunter, justice] = ENBY_PRESETS;
    if selector < 0.33 {
        bailey
    } else if selector <= 0.66 {
        hunter
    } else {
        justice
    }
}

/// Face texture file for an emoticon.
pub fn texture_file(emoticon: &str) -> String {
    format!("../assets/texture-{emoticon}-3072x512.png")
}

/// Mate two cubes and return their child.
///
/// # Errors
///
/// Returns the [`MateRefusal`] if the pair may not mate; neither parent is
/// changed in that case.
pub fn mate<R: Rng>(
    male: &mut Cube,
    female: &mut Cube,
    roster_full: bool,
    rng: &mut R,
    config: &AgentConfig,
    now: f64,
) -> Result<Birth, MateRefusal> {
    if let Some(reason) = refusal(male, female, roster_full, config, now) {
        return Err(reason);
    }

    let male_share = male.energy / 2.0;
    let female_share = female.energy / 2.0;
    male.energy -= male_share;
    female.energy -= female_share;
    record_mate(male, &female.uuid, male_share, now);
    record_mate(female, &male.uuid, female_share, now);

    let kind = child_kind(rng.random());
    let position = Vec3::new(
        (male.position.x + female.position.x) / 2.0,
        0.0,
        (male.position.z + female.position.z) / 2.0,
    );
    let mut child = Cube::new(
        0,
        CubeUuid::generate(),
        kind,
        (male.scale_factor + female.scale_factor) / 2.0,
        position,
        male_share + female_share,
        now,
    );
    child.position_previous = position;
    child.rotation = (male.rotation + female.rotation) / 2.0;
    child.set_scale(0.0);
    child.life.father = male.uuid.clone();
    child.life.mother = female.uuid.clone();

    let texture = match kind {
        PlayerKind::Male => {
            inherit_look(&mut child, male);
            ChildTexture::Inherit
        }
        PlayerKind::Female => {
            inherit_look(&mut child, female);
            ChildTexture::Inherit
        }
        _ => {
            let (emoticon, firstname) = enby_preset(rng.random());
            emoticon.clone_into(&mut child.emoticon);
            firstname.clone_into(&mut child.firstname);
            child.cube_type = female.cube_type;
            "p".clone_into(&mut child.color_class);
            child.color = ENBY_COLOR;
            child.material = female.material;
            child.texture_index = female.texture_index;
            child.texture_map = SIX_PANE_TEXTURE_MAP.to_vec();
            ChildTexture::Load(texture_file(emoticon))
        }
    };

    male.life.children.push(child.uuid.clone());
    female.life.children.push(child.uuid.clone());

    tracing::info!(
        father = male.index,
        mother = female.index,
        child = %child.uuid,
        kind = %kind,
        energy = child.energy,
        scale_factor = child.scale_factor,
        "child born"
    );

    Ok(Birth { child, texture })
}

fn record_mate(me: &mut Cube, partner: &CubeUuid, energy: f32, now: f64) {
    me.life.mates.push(partner.clone());
    me.life.mate_times.push(now);
    me.life.mate_energies.push(energy);
}

fn inherit_look(child: &mut Cube, parent: &Cube) {
    child.emoticon.clone_from(&parent.emoticon);
    child.firstname.clone_from(&parent.firstname);
    child.cube_type = parent.cube_type;
    child.color_class.clone_from(&parent.color_class);
    child.color = parent.color;
    child.material = parent.material;
    child.surface.clone_from(&parent.surface);
    child.texture_index = parent.texture_index;
    child.texture_map.clone_from(&parent.texture_map);
}
