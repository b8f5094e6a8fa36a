//! Turn roster.
//!
//! Players are kept in join order. The turn index points into that order and
//! advances round-robin, wrapping at the end of the roster.
//!
//! # Removal
//!
//! ```text
//!  before   [A, B, C]   turn = B (1)
//!  remove A [B, C]      turn = B (0)   index shifts down
//!  remove B [C]         turn = C (0)   successor inherits the slot
//!  remove C []          turn = none
//! ```

use std::collections::BTreeSet;

/// Network identity of a participant.
pub type PlayerId = u64;

/// Handle to the cue actor owned by a player.
pub type CueHandle = u64;

/// Ball number of the cue ball.
pub const CUE_BALL: u8 = 0;

/// Default roster capacity.
pub const DEFAULT_MAX_PLAYERS: usize = 2;

/// A participant taking turns at the table.
#[derive(Debug, Clone)]
pub struct GamePlayer {
    pub player_id: PlayerId,
    pub username: String,
    pub is_ready: bool,
    pub score: i32,
    /// Balls pocketed during the current turn
    pub turn_tally: Vec<u8>,
    /// Every ball this player has pocketed
    pub pocketed: BTreeSet<u8>,
    pub cue: Option<CueHandle>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl GamePlayer {
    pub fn new(player_id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player_id,
            username: username.into(),
            is_ready: false,
            score: 0,
            turn_tally: Vec::new(),
            pocketed: BTreeSet::new(),
            cue: None,
            joined_at: chrono::Utc::now(),
        }
    }

    pub fn with_cue(mut self, cue: CueHandle) -> Self {
        self.cue = Some(cue);
        self
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.is_ready = ready;
    }

    /// Credit a pocketed object ball to this player's current turn.
    pub fn record_pocket(&mut self, ball: u8) {
        self.turn_tally.push(ball);
        self.score += 1;
    }

    /// Move the current turn's tally into the lifetime set. Returns how many
    /// balls the turn pocketed.
    pub fn commit_turn_tally(&mut self) -> usize {
        let count = self.turn_tally.len();
        self.pocketed.extend(self.turn_tally.drain(..));
        count
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "player_id": self.player_id,
            "username": self.username,
            "is_ready": self.is_ready,
            "score": self.score,
            "turn_tally": self.turn_tally,
            "pocketed": self.pocketed.iter().collect::<Vec<_>>(),
            "joined_at": self.joined_at.to_rfc3339()
        })
    }
}

/// Roster errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("player {0} is already in the roster")]
    AlreadyPresent(PlayerId),

    #[error("player {0} is not in the roster")]
    NotPresent(PlayerId),

    #[error("roster is full ({max} players)")]
    Full { max: usize },

    #[error("turn index {index} is out of range for {len} players")]
    NoSuchIndex { index: usize, len: usize },
}

/// Ordered players plus the index of whoever holds the turn.
#[derive(Debug, Clone)]
pub struct Roster {
    players: Vec<GamePlayer>,
    turn_index: Option<usize>,
    max_players: usize,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAYERS)
    }
}

impl Roster {
    pub fn new(max_players: usize) -> Self {
        Self {
            players: Vec::new(),
            turn_index: None,
            max_players,
        }
    }

    /// Append a player. The first player in an empty roster takes the turn.
    pub fn add(&mut self, player: GamePlayer) -> Result<usize, RosterError> {
        if self.contains(player.player_id) {
            return Err(RosterError::AlreadyPresent(player.player_id));
        }

        if self.is_full() {
            return Err(RosterError::Full {
                max: self.max_players,
            });
        }

        self.players.push(player);
        let index = self.players.len() - 1;
        if self.turn_index.is_none() {
            self.turn_index = Some(0);
        }

        Ok(index)
    }

    /// Remove a player, returning them and whether they held the turn.
    ///
    /// The turn index keeps pointing at the same player when someone earlier in
    /// the order leaves, and at the departed player's successor when the turn
    /// holder leaves.
    pub fn remove(&mut self, player_id: PlayerId) -> Result<(GamePlayer, bool), RosterError> {
        let index = self
            .index_of(player_id)
            .ok_or(RosterError::NotPresent(player_id))?;

        let player = self.players.remove(index);
        let held_turn = self.turn_index == Some(index);

        self.turn_index = match self.turn_index {
            _ if self.players.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current => Some(current % self.players.len()),
            other => other,
        };

        Ok((player, held_turn))
    }

    pub fn index_of(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.player_id == player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.index_of(player_id).is_some()
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn get_mut(&mut self, player_id: PlayerId) -> Option<&mut GamePlayer> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn at(&self, index: usize) -> Option<&GamePlayer> {
        self.players.get(index)
    }

    pub fn turn_index(&self) -> Option<usize> {
        self.turn_index
    }

    pub fn turn_player(&self) -> Option<&GamePlayer> {
        self.turn_index.and_then(|index| self.players.get(index))
    }

    pub fn turn_player_mut(&mut self) -> Option<&mut GamePlayer> {
        self.turn_index.and_then(|index| self.players.get_mut(index))
    }

    pub fn turn_player_id(&self) -> Option<PlayerId> {
        self.turn_player().map(|p| p.player_id)
    }

    /// Index that follows `index` in turn order, wrapping around.
    pub fn next_index_after(&self, index: usize) -> Option<usize> {
        if self.players.is_empty() {
            return None;
        }
        Some((index + 1) % self.players.len())
    }

    /// Index of whoever plays after the current turn holder.
    pub fn next_index(&self) -> Option<usize> {
        self.next_index_after(self.turn_index?)
    }

    pub fn next_player(&self) -> Option<&GamePlayer> {
        self.next_index().and_then(|index| self.players.get(index))
    }

    /// Player that follows `player_id` in turn order.
    pub fn next_player_after(&self, player_id: PlayerId) -> Option<PlayerId> {
        let index = self.index_of(player_id)?;
        self.next_index_after(index)
            .and_then(|next| self.players.get(next))
            .map(|p| p.player_id)
    }

    pub fn set_turn_index(&mut self, index: usize) -> Result<(), RosterError> {
        if index >= self.players.len() {
            return Err(RosterError::NoSuchIndex {
                index,
                len: self.players.len(),
            });
        }
        self.turn_index = Some(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn iter(&self) -> impl Iterator<Item = &GamePlayer> {
        self.players.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players.iter().map(|p| p.to_json()).collect();

        serde_json::json!({
            "players": players,
            "max_players": self.max_players,
            "turn_player": self.turn_player_id()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_of(ids: &[PlayerId]) -> Roster {
        let mut roster = Roster::new(8);
        for id in ids {
            roster.add(GamePlayer::new(*id, format!("Player{}", id))).unwrap();
        }
        roster
    }

    #[test]
    fn test_first_player_takes_turn() {
        let mut roster = Roster::new(4);
        assert_eq!(roster.turn_index(), None);

        roster.add(GamePlayer::new(7, "Alice")).unwrap();
        assert_eq!(roster.turn_player_id(), Some(7));

        // Later joins don't steal the turn
        roster.add(GamePlayer::new(8, "Bob")).unwrap();
        assert_eq!(roster.turn_player_id(), Some(7));
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let mut roster = roster_of(&[1, 2]);

        let result = roster.add(GamePlayer::new(2, "Again"));
        assert_eq!(result, Err(RosterError::AlreadyPresent(2)));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_add_rejects_when_full() {
        let mut roster = Roster::new(2);
        roster.add(GamePlayer::new(1, "A")).unwrap();
        roster.add(GamePlayer::new(2, "B")).unwrap();

        let result = roster.add(GamePlayer::new(3, "C"));
        assert_eq!(result, Err(RosterError::Full { max: 2 }));
    }

    #[test]
    fn test_remove_absent() {
        let mut roster = roster_of(&[1]);

        assert!(matches!(roster.remove(9), Err(RosterError::NotPresent(9))));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_remove_before_turn_holder() {
        let mut roster = roster_of(&[1, 2, 3]);
        roster.set_turn_index(1).unwrap();

        let (player, held_turn) = roster.remove(1).unwrap();

        assert_eq!(player.player_id, 1);
        assert!(!held_turn);
        assert_eq!(roster.turn_player_id(), Some(2));
    }

    #[test]
    fn test_remove_turn_holder_passes_to_successor() {
        let mut roster = roster_of(&[1, 2, 3]);
        roster.set_turn_index(1).unwrap();

        let (_, held_turn) = roster.remove(2).unwrap();
        assert!(held_turn);
        assert_eq!(roster.turn_player_id(), Some(3));

        // Last in order wraps to the front
        let (_, held_turn) = roster.remove(3).unwrap();
        assert!(held_turn);
        assert_eq!(roster.turn_player_id(), Some(1));

        roster.remove(1).unwrap();
        assert_eq!(roster.turn_index(), None);
    }

    #[test]
    fn test_remove_after_turn_holder() {
        let mut roster = roster_of(&[1, 2, 3]);

        let (_, held_turn) = roster.remove(3).unwrap();

        assert!(!held_turn);
        assert_eq!(roster.turn_index(), Some(0));
    }

    #[test]
    fn test_next_index_wraps() {
        let mut roster = roster_of(&[1, 2, 3]);

        assert_eq!(roster.next_index(), Some(1));
        roster.set_turn_index(2).unwrap();
        assert_eq!(roster.next_index(), Some(0));
        assert_eq!(roster.next_player().map(|p| p.player_id), Some(1));
        assert_eq!(roster.next_player_after(2), Some(3));
    }

    #[test]
    fn test_set_turn_index_out_of_range() {
        let mut roster = roster_of(&[1, 2]);

        let result = roster.set_turn_index(2);
        assert_eq!(result, Err(RosterError::NoSuchIndex { index: 2, len: 2 }));
        assert_eq!(roster.turn_index(), Some(0));
    }

    #[test]
    fn test_turn_tally_commit() {
        let mut player = GamePlayer::new(1, "Alice").with_cue(40);
        player.record_pocket(3);
        player.record_pocket(11);

        assert_eq!(player.score, 2);
        assert_eq!(player.commit_turn_tally(), 2);
        assert!(player.turn_tally.is_empty());
        assert_eq!(player.pocketed.iter().copied().collect::<Vec<_>>(), vec![3, 11]);
        assert_eq!(player.cue, Some(40));
    }

    #[test]
    fn test_roster_json() {
        let mut roster = roster_of(&[1, 2]);
        roster.get_mut(2).unwrap().set_ready(true);

        let json = roster.to_json();

        assert_eq!(json["turn_player"], 1);
        assert_eq!(json["players"][1]["username"], "Player2");
        assert_eq!(json["players"][1]["is_ready"], true);
    }
}
