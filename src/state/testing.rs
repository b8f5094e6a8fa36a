//! Collaborator fakes shared by unit tests.
//!
//! Each fake hands out clones that share their flags, so a test can keep a
//! handle and flip state after the fake has been moved into an arbiter.

use std::cell::Cell;
use std::rc::Rc;

use super::arbiter::{GameDirector, PoolTable};

#[derive(Debug, Clone, Default)]
pub struct FakeDirector {
    pub started: Rc<Cell<bool>>,
    pub positioning: Rc<Cell<bool>>,
    pub racks_started: Rc<Cell<u32>>,
    pub racks_finished: Rc<Cell<u32>>,
}

impl FakeDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started() -> Self {
        let director = Self::default();
        director.started.set(true);
        director
    }
}

impl GameDirector for FakeDirector {
    fn has_game_started(&self) -> bool {
        self.started.get()
    }

    fn start_rack_placement(&mut self) -> bool {
        self.racks_started.set(self.racks_started.get() + 1);
        self.positioning.set(true);
        true
    }

    fn is_positioning_rack(&self) -> bool {
        self.positioning.get()
    }

    fn finish_rack_placement(&mut self) {
        self.racks_finished.set(self.racks_finished.get() + 1);
        self.positioning.set(false);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub moving: Rc<Cell<bool>>,
    pub frozen: Rc<Cell<bool>>,
    pub cue_resets: Rc<Cell<u32>>,
}

impl FakeTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolTable for FakeTable {
    fn balls_moving(&self) -> bool {
        self.moving.get()
    }

    fn set_balls_frozen(&mut self, frozen: bool) {
        self.frozen.set(frozen);
    }

    fn reset_cue_ball(&mut self) {
        self.cue_resets.set(self.cue_resets.get() + 1);
    }
}
