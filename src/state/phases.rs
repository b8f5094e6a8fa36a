//! Pool turn phases.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌─────────┐ director started,  ┌─────────┐ rack placed ┌──────────┐
//! │  Start  │───────────────────▶│  Rack   │────────────▶│  InPlay  │◀─────┐
//! └─────────┘ enough players,    └─────────┘             └────┬─────┘      │
//!      │      table at rest        (optional)                 │ launched   │
//!      │                                                      │ or gone    │
//!      └──────────────────── no rack ────────────────────────▶│            │
//!                                                             ▼            │
//!                                                      ┌─────────────┐     │
//!                                                      │ WaitForRest │     │
//!                                                      └──────┬──────┘     │
//!                                                             │ at rest    │
//!                                                             ▼            │
//!                                                      ┌─────────────┐     │
//!                                                      │   EndTurn   │─────┘
//!                                                      └─────────────┘
//!                                                        delay elapsed,
//!                                                        turn advanced
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::arbiter::{TurnContext, TurnNotification};
use super::graph::{Phase, TransitionConfig, TurnState};
use super::player::PlayerId;

/// Phase tags of a pool turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPhase {
    Start,
    Rack,
    InPlay,
    WaitForRest,
    EndTurn,
}

impl PoolPhase {
    pub const ALL: [PoolPhase; 5] = [
        Self::Start,
        Self::Rack,
        Self::InPlay,
        Self::WaitForRest,
        Self::EndTurn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Rack => "rack",
            Self::InPlay => "in_play",
            Self::WaitForRest => "wait_for_rest",
            Self::EndTurn => "end_turn",
        }
    }
}

impl fmt::Display for PoolPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events routed to the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// A player left the session
    PlayerGone { player: PlayerId },
    /// The cue ball was struck
    BallLaunched,
    /// The turn player confirmed the rack
    RackPlaced,
}

impl Phase for PoolPhase {
    type Context = TurnContext;
    type Event = TurnEvent;

    fn instantiate(self) -> Box<dyn TurnState<Self>> {
        match self {
            Self::Start => Box::new(StartPhase),
            Self::Rack => Box::new(RackPhase::default()),
            Self::InPlay => Box::new(InPlayPhase::default()),
            Self::WaitForRest => Box::new(WaitForRestPhase),
            Self::EndTurn => Box::new(EndTurnPhase::default()),
        }
    }
}

/// The standard pool turn graph.
pub fn default_transitions(rack_enabled: bool) -> Vec<TransitionConfig<PoolPhase>> {
    let mut transitions = Vec::with_capacity(5);
    if rack_enabled {
        transitions.push(TransitionConfig::new(PoolPhase::Start, PoolPhase::Rack));
        transitions.push(TransitionConfig::new(PoolPhase::Rack, PoolPhase::InPlay));
    } else {
        transitions.push(TransitionConfig::new(PoolPhase::Start, PoolPhase::InPlay));
    }
    transitions.push(TransitionConfig::new(PoolPhase::InPlay, PoolPhase::WaitForRest));
    transitions.push(TransitionConfig::new(PoolPhase::WaitForRest, PoolPhase::EndTurn));
    transitions.push(TransitionConfig::new(PoolPhase::EndTurn, PoolPhase::InPlay));
    transitions
}

/// Holds until the game has started with enough players and a still table.
#[derive(Debug, Default)]
pub struct StartPhase;

impl TurnState<PoolPhase> for StartPhase {
    fn enter(&mut self, _ctx: &mut TurnContext) {
        tracing::debug!("waiting for the game to start");
    }

    fn can_exit(&self, ctx: &TurnContext) -> bool {
        let Some(director) = ctx.director() else {
            tracing::warn!("no game director available, holding at start");
            return false;
        };

        if !director.has_game_started() {
            return false;
        }

        if ctx.roster().len() < ctx.config().min_players {
            return false;
        }

        !ctx.table().is_some_and(|table| table.balls_moving())
    }
}

/// The turn player positions the rack before the break.
#[derive(Debug, Default)]
pub struct RackPhase {
    placing: bool,
}

impl TurnState<PoolPhase> for RackPhase {
    fn enter(&mut self, ctx: &mut TurnContext) {
        self.placing = match ctx.director_mut() {
            Some(director) => director.start_rack_placement(),
            None => {
                tracing::warn!("no game director available, skipping rack placement");
                false
            }
        };
        tracing::info!(placing = self.placing, "rack placement started");
    }

    fn update(&mut self, ctx: &mut TurnContext, _dt: f32) {
        if !self.placing {
            return;
        }
        if let Some(director) = ctx.director() {
            self.placing = director.is_positioning_rack();
        }
    }

    fn exit(&mut self, ctx: &mut TurnContext) {
        match ctx.director_mut() {
            Some(director) => director.finish_rack_placement(),
            None => tracing::warn!("no game director available to end rack placement"),
        }
        if let Some(table) = ctx.table_mut() {
            table.set_balls_frozen(true);
        }
    }

    fn can_exit(&self, _ctx: &TurnContext) -> bool {
        !self.placing
    }

    fn on_event(&mut self, _ctx: &mut TurnContext, event: &TurnEvent) {
        if let TurnEvent::RackPlaced = event {
            tracing::debug!("rack placement confirmed");
            self.placing = false;
        }
    }
}

/// The turn player lines up and takes a shot.
#[derive(Debug, Default)]
pub struct InPlayPhase {
    /// Player who held the most recent turn through this phase
    turn_player: Option<PlayerId>,
    resolved: bool,
    launched: bool,
    player_gone: bool,
}

impl InPlayPhase {
    pub fn turn_player(&self) -> Option<PlayerId> {
        self.turn_player
    }

    /// Pick who plays this turn and hand them the turn.
    ///
    /// A player never gets two fresh turns in a row while anyone else is
    /// seated. Continued sub-turns are exempt.
    fn resolve_turn_player(&mut self, ctx: &mut TurnContext) -> bool {
        let Some(mut candidate) = ctx.roster().turn_player_id() else {
            tracing::warn!("no turn player available, waiting for players");
            return false;
        };

        let continuing = ctx.take_continuing();
        if !continuing && self.turn_player == Some(candidate) && ctx.roster().len() > 1 {
            if let Some(next) = ctx.roster().next_player_after(candidate) {
                tracing::debug!(
                    skipped = candidate,
                    next,
                    "player already had the last turn, moving on"
                );
                candidate = next;
            }
        }

        if let Some(index) = ctx.roster().index_of(candidate) {
            if let Err(err) = ctx.roster_mut().set_turn_index(index) {
                tracing::warn!(%err, "failed to assign turn index");
            }
        }

        ctx.clear_turn_vacated();
        if !continuing {
            ctx.reset_sub_turns();
        }

        ctx.notify(TurnNotification::TurnStarted { player: candidate });
        self.turn_player = Some(candidate);
        self.resolved = true;
        true
    }
}

impl TurnState<PoolPhase> for InPlayPhase {
    fn enter(&mut self, ctx: &mut TurnContext) {
        self.launched = false;
        self.player_gone = false;
        self.resolved = false;

        if ctx.table().is_none() {
            tracing::error!("no pool table available, the turn can only end if its player leaves");
        }

        self.resolve_turn_player(ctx);
    }

    fn update(&mut self, ctx: &mut TurnContext, _dt: f32) {
        if !self.resolved {
            self.resolve_turn_player(ctx);
        }
    }

    fn can_exit(&self, _ctx: &TurnContext) -> bool {
        self.launched || self.player_gone
    }

    fn on_event(&mut self, _ctx: &mut TurnContext, event: &TurnEvent) {
        match event {
            TurnEvent::PlayerGone { player } if self.turn_player == Some(*player) => {
                tracing::info!(player, "turn player left mid-turn");
                self.player_gone = true;
            }
            TurnEvent::BallLaunched => {
                tracing::debug!(player = ?self.turn_player, "shot taken");
                self.launched = true;
            }
            _ => {}
        }
    }
}

/// Waits for every ball to stop, then freezes the table.
#[derive(Debug, Default)]
pub struct WaitForRestPhase;

impl TurnState<PoolPhase> for WaitForRestPhase {
    fn can_exit(&self, ctx: &TurnContext) -> bool {
        ctx.table().map_or(true, |table| !table.balls_moving())
    }

    fn exit(&mut self, ctx: &mut TurnContext) {
        match ctx.table_mut() {
            Some(table) => table.set_balls_frozen(true),
            None => tracing::warn!("no pool table available to freeze"),
        }
    }
}

/// Lingers for the configured delay, then passes the turn on.
#[derive(Debug, Default)]
pub struct EndTurnPhase {
    timer: f32,
}

impl TurnState<PoolPhase> for EndTurnPhase {
    fn enter(&mut self, ctx: &mut TurnContext) {
        self.timer = ctx.config().end_turn_delay;
    }

    fn update(&mut self, _ctx: &mut TurnContext, dt: f32) {
        self.timer -= dt;
    }

    fn exit(&mut self, ctx: &mut TurnContext) {
        ctx.advance_turn();
    }

    fn can_exit(&self, _ctx: &TurnContext) -> bool {
        self.timer <= 0.0
    }
}
