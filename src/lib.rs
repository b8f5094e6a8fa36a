//! Pool Turn State Library
//!
//! This crate decides whose turn it is in a networked game of pool, and when
//! that turn starts, ends and passes on.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Phase Graph** - A generic directed graph of turn phases with one active
//!   phase, declarative registration, and structural validation.
//!
//! - **Pool Phases** - Start, rack placement, in play, waiting for the balls to
//!   stop, and the end-of-turn delay.
//!
//! - **Turn Arbiter** - The authoritative owner of the roster and turn order,
//!   fed by physics and session callbacks from the host.
//!
//! - **Replication** - Coarse turn snapshots for observers and validated
//!   requests back to the authority.
//!
//! # Design Principles
//!
//! 1. **One authority** - Only the authoritative peer changes turn state.
//!    Observer calls are rejected with an error.
//!
//! 2. **Collaborators behind traits** - The game director and the table are
//!    injected; a missing one is logged, never a panic.
//!
//! 3. **No networking** - This crate is pure state, no sockets or physics.
//!
//! 4. **Serialization-ready** - Config, snapshots and requests are serde types.
//!
//! # Example
//!
//! ```rust
//! use pool_turn_state::{
//!     GameDirector, GamePlayer, PoolPhase, Role, TurnArbiter, TurnConfig, TurnNotification,
//! };
//!
//! struct Director;
//!
//! impl GameDirector for Director {
//!     fn has_game_started(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut arbiter = TurnArbiter::new(TurnConfig::default(), Role::Authority)
//!     .with_director(Director);
//! arbiter.add_player(GamePlayer::new(1, "Alice")).unwrap();
//! arbiter.add_player(GamePlayer::new(2, "Bob")).unwrap();
//!
//! // First tick enters Start, the second hands out the first turn
//! arbiter.tick(0.016);
//! arbiter.tick(0.016);
//!
//! assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
//! assert_eq!(
//!     arbiter.drain_notifications(),
//!     vec![TurnNotification::TurnStarted { player: 1 }]
//! );
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
