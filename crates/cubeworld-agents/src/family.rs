//! Lineage rules between cubes.
//!
//! Lineage is held by uuid only, so these checks never follow references.
//! They compare a cube's recorded father and mother against the other
//! party's uuid.

use cubeworld_types::PlayerKind;

use crate::agent::Cube;

/// Whether `male` and `female` are parent and child.
pub fn is_incestuous(male: &Cube, female: &Cube) -> bool {
    (!male.life.mother.is_empty() && male.life.mother == female.uuid)
        || (!female.life.father.is_empty() && female.life.father == male.uuid)
}

/// Whether `me` may pick `prospect` as a pursuit target.
///
/// Only courting between the sexes is restricted: a female skips her
/// father and under-age males, and a male skips his mother and under-age
/// females.
pub fn may_pursue(me: &Cube, prospect: &Cube, now: f64, youth_hold_seconds: f64) -> bool {
    match (me.kind, prospect.kind) {
        (PlayerKind::Female, PlayerKind::Male) => {
            prospect.uuid != me.life.father && !prospect.is_youth(now, youth_hold_seconds)
        }
        (PlayerKind::Male, PlayerKind::Female) => {
            prospect.uuid != me.life.mother && !prospect.is_youth(now, youth_hold_seconds)
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::make_cube;

    #[test]
    fn father_and_daughter_are_incestuous() {
        let father = make_cube(0, PlayerKind::Male, 0.0, 0.0, 100.0);
        let mut daughter = make_cube(1, PlayerKind::Female, 0.0, 0.0, 100.0);
        assert!(!is_incestuous(&father, &daughter));
        daughter.life.father = father.uuid.clone();
        assert!(is_incestuous(&father, &daughter));
    }

    #[test]
    fn mother_and_son_are_incestuous() {
        let mother = make_cube(0, PlayerKind::Female, 0.0, 0.0, 100.0);
        let mut son = make_cube(1, PlayerKind::Male, 0.0, 0.0, 100.0);
        son.life.mother = mother.uuid.clone();
        assert!(is_incestuous(&son, &mother));
    }

    #[test]
    fn seeded_cubes_are_unrelated() {
        let male = make_cube(0, PlayerKind::Male, 0.0, 0.0, 100.0);
        let female = make_cube(1, PlayerKind::Female, 0.0, 0.0, 100.0);
        assert!(!is_incestuous(&male, &female));
    }

    #[test]
    fn pursuit_skips_parents_and_youth() {
        let mut daughter = make_cube(0, PlayerKind::Female, 0.0, 0.0, 100.0);
        let father = make_cube(1, PlayerKind::Male, 0.0, 0.0, 100.0);
        let mut young = make_cube(2, PlayerKind::Male, 0.0, 0.0, 100.0);
        young.life.birth = 80.0;
        daughter.life.father = father.uuid.clone();

        assert!(!may_pursue(&daughter, &father, 100.0, 60.0));
        assert!(!may_pursue(&daughter, &young, 100.0, 60.0));
        assert!(may_pursue(&daughter, &young, 141.0, 60.0));

        let predator = make_cube(3, PlayerKind::Predator, 0.0, 0.0, 100.0);
        assert!(may_pursue(&predator, &young, 100.0, 60.0));
    }
}
