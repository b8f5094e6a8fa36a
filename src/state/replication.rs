//! Authority/observer split.
//!
//! Only the authoritative peer runs the phase graph. Observers see a coarse
//! summary of it through [`TurnSnapshot`]s and ask the authority to act on their
//! behalf with [`ClientRequest`]s.
//!
//! ```text
//!   authority                              observer
//! ┌─────────────┐   TurnSnapshot (seq)   ┌────────────┐
//! │ TurnArbiter │───────────────────────▶│ TurnMirror │
//! │             │◀───────────────────────│            │
//! └─────────────┘     ClientRequest      └────────────┘
//! ```

use serde::{Deserialize, Serialize};

use super::phases::PoolPhase;
use super::player::PlayerId;

/// Whether this peer may mutate turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Authority,
    Observer,
}

impl Role {
    pub fn is_authority(&self) -> bool {
        matches!(self, Self::Authority)
    }
}

/// Turn phase as observers see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarsePhase {
    /// Game not started yet
    #[default]
    None,
    /// A turn is being set up or played
    Starting,
    /// Waiting for the table to settle
    Ending,
    /// Handing the turn over
    Advancing,
}

impl CoarsePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Starting => "starting",
            Self::Ending => "ending",
            Self::Advancing => "advancing",
        }
    }

    pub fn from_phase(phase: Option<PoolPhase>) -> Self {
        match phase {
            None | Some(PoolPhase::Start) => Self::None,
            Some(PoolPhase::Rack) | Some(PoolPhase::InPlay) => Self::Starting,
            Some(PoolPhase::WaitForRest) => Self::Ending,
            Some(PoolPhase::EndTurn) => Self::Advancing,
        }
    }
}

/// Replicated summary of the authority's turn state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub seq: u64,
    pub phase: CoarsePhase,
    pub turn_player: Option<PlayerId>,
}

impl TurnSnapshot {
    /// Whether two snapshots describe the same turn state, ignoring sequence.
    pub fn same_state(&self, other: &TurnSnapshot) -> bool {
        self.phase == other.phase && self.turn_player == other.turn_player
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "seq": self.seq,
            "phase": self.phase.as_str(),
            "turn_player": self.turn_player
        })
    }
}

/// Observer-side read-only copy of the turn state.
#[derive(Debug, Clone, Default)]
pub struct TurnMirror {
    latest: Option<TurnSnapshot>,
}

impl TurnMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a snapshot unless it is older than, or the same as, the last one.
    pub fn apply(&mut self, snapshot: TurnSnapshot) -> bool {
        if let Some(latest) = &self.latest {
            if snapshot.seq <= latest.seq {
                tracing::debug!(
                    seq = snapshot.seq,
                    latest = latest.seq,
                    "ignoring stale turn snapshot"
                );
                return false;
            }
        }
        self.latest = Some(snapshot);
        true
    }

    pub fn seq(&self) -> u64 {
        self.latest.as_ref().map_or(0, |s| s.seq)
    }

    pub fn phase(&self) -> CoarsePhase {
        self.latest.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    pub fn turn_player(&self) -> Option<PlayerId> {
        self.latest.as_ref().and_then(|s| s.turn_player)
    }

    pub fn is_turn_of(&self, player_id: PlayerId) -> bool {
        self.turn_player() == Some(player_id)
    }
}

/// What an observer asks the authority to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    ConfirmRackPlacement,
    TakeShot,
}

impl RequestKind {
    /// Phase the request is valid in.
    pub fn phase(&self) -> PoolPhase {
        match self {
            Self::ConfirmRackPlacement => PoolPhase::Rack,
            Self::TakeShot => PoolPhase::InPlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub player: PlayerId,
    pub kind: RequestKind,
}

impl ClientRequest {
    pub fn new(player: PlayerId, kind: RequestKind) -> Self {
        Self { player, kind }
    }
}
