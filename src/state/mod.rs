//! Turn state for networked pool.
//!
//! This module provides the turn arbitration types:
//!
//! - `graph` - Generic phase graph (registration, ticking, validation)
//! - `player` - Players and the turn roster
//! - `phases` - Pool turn phases (start, rack, in play, wait for rest, end turn)
//! - `arbiter` - Authoritative turn controller
//! - `replication` - Authority/observer split, snapshots and client requests
//! - `config` - Turn rules loaded from TOML
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         TurnArbiter                              │
//! │                                                                  │
//! │  ┌──────────────────────┐        ┌────────────────────────────┐  │
//! │  │ TurnGraph<PoolPhase> │ ctx ──▶│        TurnContext         │  │
//! │  │                      │        │                            │  │
//! │  │ Start ─▶ [Rack] ─▶   │        │ Roster (turn order/index)  │  │
//! │  │ InPlay ─▶ WaitForRest│        │ TurnConfig                 │  │
//! │  │   ▲          │       │        │ GameDirector / PoolTable   │  │
//! │  │   └─ EndTurn ◀┘      │        │ notifications              │  │
//! │  └──────────────────────┘        └────────────────────────────┘  │
//! │                                                                  │
//! │        publish() ─▶ TurnSnapshot ─▶ TurnMirror (observers)       │
//! │        handle_request() ◀─ ClientRequest (observers)             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pool_turn_state::state::{
//!     arbiter::TurnArbiter,
//!     config::TurnConfig,
//!     replication::{Role, TurnMirror},
//! };
//!
//! let config = TurnConfig::load(Path::new("turns.toml"))?;
//! let mut arbiter = TurnArbiter::new(config, Role::Authority)
//!     .with_director(director)
//!     .with_table(table);
//!
//! // Every frame
//! arbiter.tick(dt);
//! for notification in arbiter.drain_notifications() {
//!     broadcast(notification);
//! }
//! if let Some(snapshot) = arbiter.publish() {
//!     replicate(snapshot);
//! }
//! ```

pub mod arbiter;
pub mod config;
pub mod graph;
pub mod phases;
pub mod player;
pub mod replication;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use arbiter::{
    ArbiterError, GameDirector, PoolTable, TurnArbiter, TurnContext, TurnNotification,
};
pub use config::{ConfigError, TurnConfig, DEFAULT_END_TURN_DELAY};
pub use graph::{
    check_edges, validate_edges, GraphError, Phase, TransitionConfig, TransitionEdge, TurnGraph,
    TurnState,
};
pub use phases::{default_transitions, PoolPhase, TurnEvent};
pub use player::{
    CueHandle, GamePlayer, PlayerId, Roster, RosterError, CUE_BALL, DEFAULT_MAX_PLAYERS,
};
pub use replication::{ClientRequest, CoarsePhase, RequestKind, Role, TurnMirror, TurnSnapshot};
