//! Game rules applied by the orchestrator.

use crate::model::GamePhase;

/// New hit points of a controller whose orb just collided, or `None` when the
/// collision does not count: outside the active phase, or for the oni.
///
/// There is no floor. Hit points can go negative, saturating at `i32::MIN`.
pub fn collision_outcome(phase: GamePhase, is_oni: bool, hp: i32, damage: i32) -> Option<i32> {
    if !phase.is_active() || is_oni {
        return None;
    }
    Some(hp.saturating_sub(damage))
}
