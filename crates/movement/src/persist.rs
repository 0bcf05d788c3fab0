//! Save and restore of the movement state.
//!
//! Only what cannot be rebuilt on the next tick is saved: the active node,
//! the stats, and the session data of the few states that need it to resume.
//! Dead keeps its corpse timer, Ledge replays its enter from the saved grab.

use bincode::config;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::host::Host;
use crate::hsm::StateId;
use crate::machine::PlayerMovement;
use crate::request::FrameRequest;
use crate::states::dead::DeadSession;
use crate::states::ledge::LedgeGrab;
use crate::states::spectate::SpectatorMode;
use crate::states::{PendingEntry, Session};
use crate::stats::MovementStats;

/// Serializable movement state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub active: StateId,
    pub stats: MovementStats,
    pub dead: Option<DeadSession>,
    pub ledge: Option<LedgeGrab>,
    pub spectate: Option<SpectatorMode>,
}

impl PlayerMovement {
    pub fn snapshot(&self) -> MovementSnapshot {
        let mut snapshot = MovementSnapshot {
            active: self.hsm.active(),
            stats: self.stats.clone(),
            dead: None,
            ledge: None,
            spectate: None,
        };
        match &self.session {
            Some(Session::Dead(session)) => snapshot.dead = Some(*session),
            Some(Session::Ledge(session)) => snapshot.ledge = Some(session.grab),
            Some(Session::Spectate(session)) => snapshot.spectate = Some(session.mode),
            _ => {}
        }
        snapshot
    }

    /// Encode the current state.
    pub fn serialize_state(&self) -> Result<Vec<u8>, PersistError> {
        let bytes = bincode::serde::encode_to_vec(self.snapshot(), config::standard())?;
        Ok(bytes)
    }

    /// Decode and restore a state produced by [`serialize_state`](Self::serialize_state).
    pub fn deserialize_state(&mut self, host: &mut Host<'_>, bytes: &[u8]) -> Result<(), PersistError> {
        let (snapshot, _): (MovementSnapshot, usize) =
            bincode::serde::decode_from_slice(bytes, config::standard())?;
        self.restore(host, &snapshot)
    }

    /// Restart the tree and move it into the snapshot's state.
    ///
    /// Transient flags (jumping, sliding, sprinting) are cleared: the
    /// states that own them are rebuilt, not resumed.
    pub fn restore(&mut self, host: &mut Host<'_>, snapshot: &MovementSnapshot) -> Result<(), PersistError> {
        let entry = match snapshot.active {
            StateId::Dead => Some(PendingEntry::Dead(
                snapshot.dead.ok_or(PersistError::MissingSession(StateId::Dead))?,
            )),
            StateId::Ledge => Some(PendingEntry::Ledge(
                snapshot.ledge.ok_or(PersistError::MissingSession(StateId::Ledge))?,
            )),
            StateId::Spectate => Some(PendingEntry::Spectate(snapshot.spectate.unwrap_or_default())),
            _ => None,
        };
        let target = match snapshot.active {
            StateId::Dead | StateId::Ledge | StateId::Fly | StateId::Spectate | StateId::Intro => {
                Some(snapshot.active)
            }
            _ => None,
        };

        log::debug!(
            "entity {} restores movement in {:?}",
            host.entity.id(),
            snapshot.active
        );

        self.stop(host);
        self.stats = MovementStats {
            is_jumping: false,
            is_sliding: false,
            is_sprinting: false,
            ..snapshot.stats.clone()
        };
        self.start(host);

        if let Some(target) = target {
            self.pending = entry;
            let mut frame = FrameRequest::new();
            self.with_ctx(host, &mut frame, false, |hsm, ctx| hsm.transition(ctx, target));
            self.pending = None;
        }
        Ok(())
    }
}
