//! Authoritative turn arbitration.
//!
//! [`TurnArbiter`] owns the roster and the pool phase graph and is the only
//! place turn state changes. The host drives it by calling [`TurnArbiter::tick`]
//! every frame, forwards physics and session callbacks into it, and drains
//! [`TurnNotification`]s to broadcast to players.
//!
//! The game director and the table are external collaborators reached through
//! the [`GameDirector`] and [`PoolTable`] traits. Either may be absent; phases
//! that need one log a warning and fall back to a safe default.

use std::fmt;

use serde::Serialize;

use super::config::TurnConfig;
use super::graph::TurnGraph;
use super::phases::{PoolPhase, TurnEvent};
use super::player::{GamePlayer, PlayerId, Roster, RosterError, CUE_BALL};
use super::replication::{ClientRequest, CoarsePhase, RequestKind, Role, TurnSnapshot};

/// Session-level game flow owned by the host.
pub trait GameDirector {
    fn has_game_started(&self) -> bool;

    /// Begin rack placement. Returns whether placement is now in progress.
    fn start_rack_placement(&mut self) -> bool {
        false
    }

    fn is_positioning_rack(&self) -> bool {
        false
    }

    /// End rack placement once the rack has been confirmed.
    fn finish_rack_placement(&mut self) {}
}

/// The physical table.
pub trait PoolTable {
    fn balls_moving(&self) -> bool;

    fn set_balls_frozen(&mut self, frozen: bool);

    fn reset_cue_ball(&mut self) {}
}

/// Turn changes the host should broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnNotification {
    TurnStarted { player: PlayerId },
    /// The player keeps the turn for another shot
    TurnContinued { player: PlayerId },
    TurnRelinquished { player: PlayerId },
}

/// Arbiter errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArbiterError {
    #[error("only the authoritative peer may change turn state")]
    NotAuthoritative,

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("cannot change the turn player while a shot is being played")]
    TurnUnderway,

    #[error("player {player} does not hold the turn")]
    NotTurnPlayer { player: PlayerId },

    #[error("no player holds the turn")]
    NoTurnPlayer,

    #[error("{kind:?} is not accepted during {phase:?}")]
    WrongPhase {
        kind: RequestKind,
        phase: Option<PoolPhase>,
    },
}

/// Everything the pool phases read and mutate.
pub struct TurnContext {
    roster: Roster,
    config: TurnConfig,
    director: Option<Box<dyn GameDirector>>,
    table: Option<Box<dyn PoolTable>>,
    notifications: Vec<TurnNotification>,
    /// Shots left before the turn passes
    sub_turns_remaining: u32,
    /// The last turn advance kept the same player
    continuing: bool,
    /// The turn holder left; the index already points at their successor
    turn_vacated: bool,
}

impl fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnContext")
            .field("roster", &self.roster)
            .field("config", &self.config)
            .field("has_director", &self.director.is_some())
            .field("has_table", &self.table.is_some())
            .field("notifications", &self.notifications)
            .field("sub_turns_remaining", &self.sub_turns_remaining)
            .field("continuing", &self.continuing)
            .field("turn_vacated", &self.turn_vacated)
            .finish()
    }
}

impl TurnContext {
    pub fn new(config: TurnConfig) -> Self {
        Self {
            roster: Roster::new(config.max_players),
            sub_turns_remaining: config.turns_per_player.max(1),
            config,
            director: None,
            table: None,
            notifications: Vec::new(),
            continuing: false,
            turn_vacated: false,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub(crate) fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut TurnConfig {
        &mut self.config
    }

    pub fn director(&self) -> Option<&(dyn GameDirector + 'static)> {
        self.director.as_deref()
    }

    pub fn director_mut(&mut self) -> Option<&mut (dyn GameDirector + 'static)> {
        self.director.as_deref_mut()
    }

    pub fn table(&self) -> Option<&(dyn PoolTable + 'static)> {
        self.table.as_deref()
    }

    pub fn table_mut(&mut self) -> Option<&mut (dyn PoolTable + 'static)> {
        self.table.as_deref_mut()
    }

    pub(crate) fn set_director(&mut self, director: Box<dyn GameDirector>) {
        self.director = Some(director);
    }

    pub(crate) fn set_table(&mut self, table: Box<dyn PoolTable>) {
        self.table = Some(table);
    }

    pub fn sub_turns_remaining(&self) -> u32 {
        self.sub_turns_remaining
    }

    pub(crate) fn notify(&mut self, notification: TurnNotification) {
        tracing::info!(?notification, "turn changed");
        self.notifications.push(notification);
    }

    pub(crate) fn drain_notifications(&mut self) -> Vec<TurnNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn take_continuing(&mut self) -> bool {
        std::mem::take(&mut self.continuing)
    }

    pub(crate) fn clear_turn_vacated(&mut self) {
        self.turn_vacated = false;
    }

    pub(crate) fn reset_sub_turns(&mut self) {
        self.sub_turns_remaining = self.config.turns_per_player.max(1);
    }

    /// Close out the current turn.
    ///
    /// The outgoing player keeps the turn while they have shots left. Otherwise
    /// the turn moves to the next player in order. A turn whose holder already
    /// left has been handed over by the roster and is left alone.
    pub(crate) fn advance_turn(&mut self) {
        if std::mem::take(&mut self.turn_vacated) {
            tracing::debug!(
                successor = ?self.roster.turn_player_id(),
                "turn holder left, successor keeps the turn"
            );
            return;
        }

        if let Some(player) = self.roster.turn_player_mut() {
            let pocketed = player.commit_turn_tally();
            tracing::debug!(player = player.player_id, pocketed, "turn tally committed");
        }

        let Some(outgoing) = self.roster.turn_player_id() else {
            tracing::warn!("cannot advance turn, roster is empty");
            return;
        };

        self.sub_turns_remaining = self.sub_turns_remaining.saturating_sub(1);
        if self.sub_turns_remaining > 0 {
            self.continuing = true;
            self.notify(TurnNotification::TurnContinued { player: outgoing });
            return;
        }

        if let Some(next_index) = self.roster.next_index() {
            if let Err(err) = self.roster.set_turn_index(next_index) {
                tracing::warn!(%err, "failed to advance turn index");
            }
        }

        if self.roster.turn_player_id() == Some(outgoing) {
            self.notify(TurnNotification::TurnContinued { player: outgoing });
        } else {
            self.notify(TurnNotification::TurnRelinquished { player: outgoing });
        }
    }
}

/// Authoritative owner of turn order and turn phases.
#[derive(Debug)]
pub struct TurnArbiter {
    role: Role,
    graph: TurnGraph<PoolPhase>,
    ctx: TurnContext,
    /// Last snapshot handed out by `publish`
    published: Option<TurnSnapshot>,
}

impl TurnArbiter {
    pub fn new(config: TurnConfig, role: Role) -> Self {
        let mut graph = TurnGraph::new();
        graph.init_from_config(&config.resolved_transitions());

        if graph.validate(true) {
            tracing::debug!(graph = %graph, "turn graph ready");
        } else {
            tracing::error!(graph = %graph, "invalid turn graph configuration, turns may stall");
        }

        Self {
            role,
            graph,
            ctx: TurnContext::new(config),
            published: None,
        }
    }

    pub fn with_director(mut self, director: impl GameDirector + 'static) -> Self {
        self.ctx.set_director(Box::new(director));
        self
    }

    pub fn with_table(mut self, table: impl PoolTable + 'static) -> Self {
        self.ctx.set_table(Box::new(table));
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn roster(&self) -> &Roster {
        self.ctx.roster()
    }

    pub fn config(&self) -> &TurnConfig {
        self.ctx.config()
    }

    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }

    pub fn graph(&self) -> &TurnGraph<PoolPhase> {
        &self.graph
    }

    pub fn current_phase(&self) -> Option<PoolPhase> {
        self.graph.current_phase()
    }

    pub fn turn_player(&self) -> Option<&GamePlayer> {
        self.ctx.roster().turn_player()
    }

    pub fn next_turn_player(&self) -> Option<&GamePlayer> {
        self.ctx.roster().next_player()
    }

    pub fn num_turn_players(&self) -> usize {
        self.ctx.roster().len()
    }

    fn ensure_authority(&self, action: &'static str) -> Result<(), ArbiterError> {
        if self.role.is_authority() {
            return Ok(());
        }
        tracing::warn!(action, "ignoring turn change on non-authoritative peer");
        Err(ArbiterError::NotAuthoritative)
    }

    pub fn add_player(&mut self, player: GamePlayer) -> Result<(), ArbiterError> {
        self.ensure_authority("add_player")?;

        let player_id = player.player_id;
        match self.ctx.roster_mut().add(player) {
            Ok(index) => {
                tracing::info!(player = player_id, index, "player joined turn order");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "rejected player join");
                Err(err.into())
            }
        }
    }

    /// Take a player out of the turn order.
    ///
    /// If they held the turn, the active phase is told they left and the turn
    /// passes to their successor once the current phase cycle finishes.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<GamePlayer, ArbiterError> {
        self.ensure_authority("remove_player")?;

        let (player, held_turn) = self.ctx.roster_mut().remove(player_id).map_err(|err| {
            tracing::warn!(%err, "rejected player removal");
            ArbiterError::from(err)
        })?;

        tracing::info!(player = player_id, held_turn, "player left turn order");

        if held_turn {
            self.ctx.continuing = false;
            self.ctx.turn_vacated = true;
            self.graph
                .send_event(&mut self.ctx, &TurnEvent::PlayerGone { player: player_id });
        }

        Ok(player)
    }

    /// Hand the turn to a specific player. Not allowed mid-shot.
    pub fn set_turn_player(&mut self, player_id: PlayerId) -> Result<(), ArbiterError> {
        self.ensure_authority("set_turn_player")?;

        if self.current_phase() == Some(PoolPhase::InPlay) {
            tracing::warn!(player = player_id, "cannot reassign the turn during play");
            return Err(ArbiterError::TurnUnderway);
        }

        let index = self.ctx.roster().index_of(player_id).ok_or_else(|| {
            tracing::warn!(player = player_id, "cannot give the turn to an absent player");
            ArbiterError::Roster(RosterError::NotPresent(player_id))
        })?;

        self.ctx.roster_mut().set_turn_index(index)?;
        tracing::info!(player = player_id, "turn player assigned");
        Ok(())
    }

    /// Advance the phase graph. A no-op on observers.
    pub fn tick(&mut self, dt: f32) {
        if !self.role.is_authority() {
            return;
        }
        self.graph.update(&mut self.ctx, dt);
    }

    /// The cue ball was struck.
    pub fn ball_launched(&mut self) -> Result<(), ArbiterError> {
        self.ensure_authority("ball_launched")?;

        if let Some(table) = self.ctx.table_mut() {
            table.set_balls_frozen(false);
        }
        self.graph.send_event(&mut self.ctx, &TurnEvent::BallLaunched);
        Ok(())
    }

    /// A ball dropped into a pocket.
    ///
    /// The cue ball goes back on the table. Object balls are credited to `by`,
    /// or to the turn player when no shooter is known.
    pub fn ball_pocketed(&mut self, ball: u8, by: Option<PlayerId>) -> Result<(), ArbiterError> {
        self.ensure_authority("ball_pocketed")?;

        if ball == CUE_BALL {
            match self.ctx.table_mut() {
                Some(table) => table.reset_cue_ball(),
                None => tracing::warn!("no pool table available to reset the cue ball"),
            }
            return Ok(());
        }

        let Some(player_id) = by.or_else(|| self.ctx.roster().turn_player_id()) else {
            tracing::warn!(ball, "pocketed ball has no player to credit");
            return Err(ArbiterError::NoTurnPlayer);
        };

        let Some(player) = self.ctx.roster_mut().get_mut(player_id) else {
            tracing::warn!(ball, player = player_id, "pocketed ball credited to absent player");
            return Err(ArbiterError::Roster(RosterError::NotPresent(player_id)));
        };

        player.record_pocket(ball);
        tracing::debug!(ball, player = player_id, score = player.score, "ball pocketed");
        Ok(())
    }

    /// Validate and apply a request from a player's peer.
    pub fn handle_request(&mut self, request: ClientRequest) -> Result<(), ArbiterError> {
        self.ensure_authority("handle_request")?;

        if self.ctx.roster().turn_player_id() != Some(request.player) {
            tracing::warn!(player = request.player, kind = ?request.kind, "request from player without the turn");
            return Err(ArbiterError::NotTurnPlayer {
                player: request.player,
            });
        }

        let phase = self.current_phase();
        if phase != Some(request.kind.phase()) {
            tracing::warn!(
                player = request.player,
                kind = ?request.kind,
                phase = ?phase,
                "request arrived in the wrong phase"
            );
            return Err(ArbiterError::WrongPhase {
                kind: request.kind,
                phase,
            });
        }

        match request.kind {
            RequestKind::ConfirmRackPlacement => {
                self.graph.send_event(&mut self.ctx, &TurnEvent::RackPlaced);
            }
            RequestKind::TakeShot => {
                tracing::debug!(player = request.player, "shot request accepted");
            }
        }
        Ok(())
    }

    pub fn drain_notifications(&mut self) -> Vec<TurnNotification> {
        self.ctx.drain_notifications()
    }

    /// Current coarse turn state, stamped with the last published sequence.
    pub fn snapshot(&self) -> TurnSnapshot {
        TurnSnapshot {
            seq: self.published.as_ref().map_or(0, |s| s.seq),
            phase: CoarsePhase::from_phase(self.current_phase()),
            turn_player: self.ctx.roster().turn_player_id(),
        }
    }

    /// Snapshot to replicate, if anything observers see has changed since the
    /// last one.
    pub fn publish(&mut self) -> Option<TurnSnapshot> {
        let mut snapshot = self.snapshot();
        if let Some(published) = &self.published {
            if published.same_state(&snapshot) {
                return None;
            }
        }

        snapshot.seq += 1;
        self.published = Some(snapshot.clone());
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{FakeDirector, FakeTable};
    use pretty_assertions::assert_eq;

    fn arbiter_with(config: TurnConfig, ids: &[PlayerId]) -> (TurnArbiter, FakeDirector, FakeTable) {
        let director = FakeDirector::started();
        let table = FakeTable::new();
        let mut arbiter = TurnArbiter::new(config, Role::Authority)
            .with_director(director.clone())
            .with_table(table.clone());

        for id in ids {
            arbiter
                .add_player(GamePlayer::new(*id, format!("Player{}", id)))
                .unwrap();
        }
        (arbiter, director, table)
    }

    fn config_for(max_players: usize) -> TurnConfig {
        TurnConfig {
            max_players,
            ..TurnConfig::default()
        }
    }

    /// Enter Start, then leave it for the first turn.
    fn start_game(arbiter: &mut TurnArbiter) {
        arbiter.tick(0.0);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
    }

    /// Shoot, let the table settle, and sit out the end-of-turn delay.
    fn play_shot(arbiter: &mut TurnArbiter) {
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        arbiter.ball_launched().unwrap();

        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::WaitForRest));

        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::EndTurn));

        let delay = arbiter.config().end_turn_delay;
        arbiter.tick(delay);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
    }

    fn turn_player_id(arbiter: &TurnArbiter) -> Option<PlayerId> {
        arbiter.turn_player().map(|p| p.player_id)
    }

    #[test]
    fn test_default_graph_is_valid() {
        let arbiter = TurnArbiter::new(TurnConfig::default(), Role::Authority);

        assert!(arbiter.graph().validate(true));
        assert_eq!(arbiter.graph().edges()[0].current, PoolPhase::Start);
        assert_eq!(arbiter.graph().position(PoolPhase::Rack), None);
        assert_eq!(arbiter.current_phase(), None);
    }

    #[test]
    fn test_start_holds_until_game_starts() {
        let (mut arbiter, director, _) = arbiter_with(config_for(2), &[1, 2]);
        director.started.set(false);

        arbiter.tick(0.0);
        arbiter.tick(1.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::Start));

        director.started.set(true);
        arbiter.tick(1.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![TurnNotification::TurnStarted { player: 1 }]
        );
    }

    #[test]
    fn test_start_without_director_stalls() {
        let mut arbiter = TurnArbiter::new(TurnConfig::default(), Role::Authority);
        arbiter.add_player(GamePlayer::new(1, "Alice")).unwrap();

        arbiter.tick(0.0);
        arbiter.tick(1.0);

        assert_eq!(arbiter.current_phase(), Some(PoolPhase::Start));
    }

    #[test]
    fn test_full_turn_passes_to_next_player() {
        let (mut arbiter, _, table) = arbiter_with(config_for(2), &[1, 2]);
        start_game(&mut arbiter);
        arbiter.drain_notifications();

        arbiter.ball_launched().unwrap();
        assert!(!table.frozen.get());

        arbiter.tick(0.0);
        table.moving.set(true);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::WaitForRest));

        table.moving.set(false);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::EndTurn));
        assert!(table.frozen.get());

        arbiter.tick(1.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::EndTurn));

        arbiter.tick(2.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(turn_player_id(&arbiter), Some(2));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![
                TurnNotification::TurnRelinquished { player: 1 },
                TurnNotification::TurnStarted { player: 2 },
            ]
        );
    }

    #[test]
    fn test_round_robin() {
        let (mut arbiter, _, _) = arbiter_with(config_for(4), &[1, 2, 3]);
        start_game(&mut arbiter);

        for _ in 0..4 {
            play_shot(&mut arbiter);
        }

        assert_eq!(arbiter.roster().turn_index(), Some(1));
        assert_eq!(turn_player_id(&arbiter), Some(2));

        let started: Vec<_> = arbiter
            .drain_notifications()
            .into_iter()
            .filter_map(|n| match n {
                TurnNotification::TurnStarted { player } => Some(player),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn test_no_back_to_back_turns() {
        let (mut arbiter, _, _) = arbiter_with(config_for(4), &[1, 2, 3]);
        start_game(&mut arbiter);

        arbiter.ball_launched().unwrap();
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::WaitForRest));

        // Advancing from player 3 would land on player 1 again
        arbiter.set_turn_player(3).unwrap();

        arbiter.tick(0.0);
        arbiter.tick(3.0);

        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(turn_player_id(&arbiter), Some(2));
    }

    #[test]
    fn test_sub_turns_keep_player() {
        let config = TurnConfig {
            turns_per_player: 2,
            ..config_for(2)
        };
        let (mut arbiter, _, _) = arbiter_with(config, &[1, 2]);
        start_game(&mut arbiter);
        arbiter.drain_notifications();

        play_shot(&mut arbiter);
        assert_eq!(turn_player_id(&arbiter), Some(1));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![
                TurnNotification::TurnContinued { player: 1 },
                TurnNotification::TurnStarted { player: 1 },
            ]
        );

        play_shot(&mut arbiter);
        assert_eq!(turn_player_id(&arbiter), Some(2));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![
                TurnNotification::TurnRelinquished { player: 1 },
                TurnNotification::TurnStarted { player: 2 },
            ]
        );
    }

    #[test]
    fn test_single_player_continues() {
        let (mut arbiter, _, _) = arbiter_with(config_for(2), &[1]);
        start_game(&mut arbiter);
        arbiter.drain_notifications();

        play_shot(&mut arbiter);

        assert_eq!(turn_player_id(&arbiter), Some(1));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![
                TurnNotification::TurnContinued { player: 1 },
                TurnNotification::TurnStarted { player: 1 },
            ]
        );
    }

    #[test]
    fn test_turn_player_leaves_mid_turn() {
        let (mut arbiter, _, _) = arbiter_with(config_for(2), &[1, 2]);
        start_game(&mut arbiter);
        arbiter.drain_notifications();

        let gone = arbiter.remove_player(1).unwrap();
        assert_eq!(gone.player_id, 1);
        assert_eq!(turn_player_id(&arbiter), Some(2));

        // No shot was taken, but the turn still winds down
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::WaitForRest));
        arbiter.tick(0.0);
        arbiter.tick(3.0);

        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(turn_player_id(&arbiter), Some(2));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![TurnNotification::TurnStarted { player: 2 }]
        );
    }

    #[test]
    fn test_turn_player_leaves_during_end_turn() {
        let (mut arbiter, _, _) = arbiter_with(config_for(2), &[1, 2]);
        start_game(&mut arbiter);

        arbiter.ball_launched().unwrap();
        arbiter.tick(0.0);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::EndTurn));
        arbiter.drain_notifications();

        arbiter.remove_player(1).unwrap();
        assert_eq!(turn_player_id(&arbiter), Some(2));

        arbiter.tick(3.0);

        // Successor already holds the turn, so nothing is relinquished
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(turn_player_id(&arbiter), Some(2));
        assert_eq!(
            arbiter.drain_notifications(),
            vec![TurnNotification::TurnStarted { player: 2 }]
        );
    }

    #[test]
    fn test_other_player_leaving_keeps_turn() {
        let (mut arbiter, _, _) = arbiter_with(config_for(3), &[1, 2, 3]);
        start_game(&mut arbiter);

        arbiter.remove_player(2).unwrap();
        arbiter.tick(0.0);

        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(turn_player_id(&arbiter), Some(1));
        assert_eq!(arbiter.next_turn_player().map(|p| p.player_id), Some(3));
    }

    #[test]
    fn test_roster_rejections() {
        let (mut arbiter, _, _) = arbiter_with(config_for(2), &[1]);

        assert_eq!(
            arbiter.add_player(GamePlayer::new(1, "Again")),
            Err(ArbiterError::Roster(RosterError::AlreadyPresent(1)))
        );
        assert!(matches!(
            arbiter.remove_player(42),
            Err(ArbiterError::Roster(RosterError::NotPresent(42)))
        ));

        arbiter.add_player(GamePlayer::new(2, "Bob")).unwrap();
        assert_eq!(
            arbiter.add_player(GamePlayer::new(3, "Carol")),
            Err(ArbiterError::Roster(RosterError::Full { max: 2 }))
        );
        assert_eq!(arbiter.num_turn_players(), 2);
    }

    #[test]
    fn test_set_turn_player() {
        let (mut arbiter, director, _) = arbiter_with(config_for(2), &[1, 2]);
        director.started.set(false);
        arbiter.tick(0.0);

        arbiter.set_turn_player(2).unwrap();
        assert_eq!(turn_player_id(&arbiter), Some(2));
        assert_eq!(
            arbiter.set_turn_player(9),
            Err(ArbiterError::Roster(RosterError::NotPresent(9)))
        );

        director.started.set(true);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(arbiter.set_turn_player(1), Err(ArbiterError::TurnUnderway));
        assert_eq!(turn_player_id(&arbiter), Some(2));
    }

    #[test]
    fn test_observer_cannot_mutate() {
        let mut arbiter = TurnArbiter::new(TurnConfig::default(), Role::Observer)
            .with_director(FakeDirector::started());

        assert_eq!(
            arbiter.add_player(GamePlayer::new(1, "Alice")),
            Err(ArbiterError::NotAuthoritative)
        );
        assert_eq!(arbiter.ball_launched(), Err(ArbiterError::NotAuthoritative));
        assert_eq!(
            arbiter.handle_request(ClientRequest::new(1, RequestKind::TakeShot)),
            Err(ArbiterError::NotAuthoritative)
        );

        arbiter.tick(1.0);
        assert_eq!(arbiter.current_phase(), None);
        assert_eq!(arbiter.num_turn_players(), 0);
    }

    #[test]
    fn test_rack_placement_flow() {
        let config = TurnConfig {
            rack_enabled: true,
            ..config_for(2)
        };
        let (mut arbiter, director, _) = arbiter_with(config, &[1, 2]);

        arbiter.tick(0.0);
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::Rack));
        assert_eq!(director.racks_started.get(), 1);

        arbiter.tick(1.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::Rack));

        assert_eq!(
            arbiter.handle_request(ClientRequest::new(2, RequestKind::ConfirmRackPlacement)),
            Err(ArbiterError::NotTurnPlayer { player: 2 })
        );
        assert_eq!(
            arbiter.handle_request(ClientRequest::new(1, RequestKind::TakeShot)),
            Err(ArbiterError::WrongPhase {
                kind: RequestKind::TakeShot,
                phase: Some(PoolPhase::Rack)
            })
        );

        arbiter
            .handle_request(ClientRequest::new(1, RequestKind::ConfirmRackPlacement))
            .unwrap();
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
        assert_eq!(director.racks_finished.get(), 1);
        assert!(!director.positioning.get());

        arbiter
            .handle_request(ClientRequest::new(1, RequestKind::TakeShot))
            .unwrap();
    }

    #[test]
    fn test_pocketed_balls() {
        let (mut arbiter, _, table) = arbiter_with(config_for(2), &[1, 2]);
        start_game(&mut arbiter);

        arbiter.ball_pocketed(3, None).unwrap();
        arbiter.ball_pocketed(CUE_BALL, None).unwrap();
        arbiter.ball_pocketed(9, Some(2)).unwrap();
        assert_eq!(table.cue_resets.get(), 1);
        assert!(arbiter.ball_pocketed(4, Some(77)).is_err());

        let player = arbiter.roster().get(1).unwrap();
        assert_eq!(player.score, 1);
        assert_eq!(player.turn_tally, vec![3]);

        play_shot(&mut arbiter);

        let player = arbiter.roster().get(1).unwrap();
        assert!(player.turn_tally.is_empty());
        assert!(player.pocketed.contains(&3));
        assert_eq!(arbiter.roster().get(2).unwrap().score, 1);
    }

    #[test]
    fn test_publish_only_on_change() {
        let (mut arbiter, _, _) = arbiter_with(config_for(2), &[1, 2]);

        let first = arbiter.publish().unwrap();
        assert_eq!(
            first,
            TurnSnapshot {
                seq: 1,
                phase: CoarsePhase::None,
                turn_player: Some(1)
            }
        );
        assert_eq!(arbiter.publish(), None);

        start_game(&mut arbiter);
        let second = arbiter.publish().unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.phase, CoarsePhase::Starting);
        assert_eq!(arbiter.snapshot(), second);
    }

    #[test]
    fn test_invalid_graph_still_runs() {
        let config = TurnConfig {
            transitions: vec![crate::state::graph::TransitionConfig::new(
                PoolPhase::Start,
                PoolPhase::InPlay,
            )],
            ..config_for(2)
        };
        let (mut arbiter, _, _) = arbiter_with(config, &[1]);

        assert!(!arbiter.graph().validate(true));
        start_game(&mut arbiter);

        // InPlay is terminal here
        arbiter.ball_launched().unwrap();
        arbiter.tick(0.0);
        assert_eq!(arbiter.current_phase(), Some(PoolPhase::InPlay));
    }
}
