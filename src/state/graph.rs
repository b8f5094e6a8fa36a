//! Turn phase graph.
//!
//! A directed graph of turn phases where exactly one phase is active at a time.
//! Each edge pairs a phase with the phase that follows it once the active phase
//! reports it can exit. The graph knows nothing about the game being played;
//! phases are identified by a tag type implementing [`Phase`].
//!
//! # Traversal
//!
//! ```text
//!                 update(dt)
//!                     │
//!        not entered? │ entered
//!        ┌────────────┴────────────┐
//!        ▼                         ▼
//! ┌─────────────┐          ┌──────────────┐   can_exit   ┌──────────────┐
//! │ enter edge 0│          │ current.update│────────────▶│ exit current │
//! └─────────────┘          └──────────────┘   && next    │ enter next   │
//!                                                        └──────────────┘
//! ```
//!
//! State objects are created once per tag, on first registration, and reused on
//! every traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// A phase tag that can build the state object backing it.
pub trait Phase: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Data the phases read and mutate while active.
    type Context;

    /// Event delivered to the active phase.
    type Event: fmt::Debug;

    /// Build the state object for this tag. Called at most once per graph.
    fn instantiate(self) -> Box<dyn TurnState<Self>>;
}

/// Behavior of a single phase.
pub trait TurnState<P: Phase> {
    fn enter(&mut self, _ctx: &mut P::Context) {}

    fn update(&mut self, _ctx: &mut P::Context, _dt: f32) {}

    fn exit(&mut self, _ctx: &mut P::Context) {}

    /// Whether the graph may leave this phase on the current tick.
    fn can_exit(&self, _ctx: &P::Context) -> bool {
        true
    }

    fn on_event(&mut self, _ctx: &mut P::Context, _event: &P::Event) {}
}

/// One entry of the graph: a phase and the phase that follows it.
///
/// `next == None` marks a terminal phase. `next == Some(current)` re-enters the
/// same phase every time it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEdge<P> {
    pub current: P,
    pub next: Option<P>,
}

impl<P> TransitionEdge<P> {
    pub fn new(current: P, next: Option<P>) -> Self {
        Self { current, next }
    }

    pub fn terminal(current: P) -> Self {
        Self {
            current,
            next: None,
        }
    }
}

/// Declarative `from -> to` entry, as read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig<P> {
    pub from: P,
    pub to: Option<P>,
}

impl<P> TransitionConfig<P> {
    pub fn new(from: P, to: P) -> Self {
        Self { from, to: Some(to) }
    }
}

/// Graph configuration and traversal errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("phase {phase} has more than one entry")]
    DuplicatePhase { phase: String },

    #[error("phase {from} leads to {next}, which has no entry")]
    DanglingNext { from: String, next: String },

    #[error("only {reachable} of {total} phases are reachable from the entry phase")]
    Disconnected { reachable: usize, total: usize },

    #[error("phase graph never loops back")]
    Acyclic,

    #[error("transition index {index} is out of range for {len} phases")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Check an edge list for structural problems.
///
/// Every `next` must resolve to some edge's `current`, each phase may appear as
/// `current` only once, and walking `next` pointers from the first edge must
/// reach every phase. With `require_cycle`, the walk must also come back to a
/// phase it already visited.
pub fn check_edges<P: Phase>(
    edges: &[TransitionEdge<P>],
    require_cycle: bool,
) -> Result<(), GraphError> {
    let mut successors: HashMap<P, Option<P>> = HashMap::with_capacity(edges.len());
    for edge in edges {
        if successors.insert(edge.current, edge.next).is_some() {
            return Err(GraphError::DuplicatePhase {
                phase: format!("{:?}", edge.current),
            });
        }
    }

    for edge in edges {
        if let Some(next) = edge.next {
            if !successors.contains_key(&next) {
                return Err(GraphError::DanglingNext {
                    from: format!("{:?}", edge.current),
                    next: format!("{:?}", next),
                });
            }
        }
    }

    let mut reachable = HashSet::with_capacity(edges.len());
    let mut cycled = false;
    let mut cursor = edges.first().map(|edge| edge.current);
    while let Some(phase) = cursor {
        if !reachable.insert(phase) {
            cycled = true;
            break;
        }
        cursor = successors.get(&phase).copied().flatten();
    }

    if reachable.len() != edges.len() {
        return Err(GraphError::Disconnected {
            reachable: reachable.len(),
            total: edges.len(),
        });
    }

    if require_cycle && !cycled {
        return Err(GraphError::Acyclic);
    }

    Ok(())
}

/// [`check_edges`] as a lint: logs the problem and reports pass/fail.
pub fn validate_edges<P: Phase>(edges: &[TransitionEdge<P>], require_cycle: bool) -> bool {
    match check_edges(edges, require_cycle) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "turn graph failed validation");
            false
        }
    }
}

/// Directed graph of turn phases with a single active phase.
pub struct TurnGraph<P: Phase> {
    edges: Vec<TransitionEdge<P>>,
    states: HashMap<P, Box<dyn TurnState<P>>>,
    /// Index into `edges`; `None` until the first update.
    current: Option<usize>,
}

impl<P: Phase> Default for TurnGraph<P> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            states: HashMap::new(),
            current: None,
        }
    }
}

impl<P: Phase> fmt::Debug for TurnGraph<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnGraph")
            .field("edges", &self.edges)
            .field("current", &self.current)
            .finish()
    }
}

impl<P: Phase> fmt::Display for TurnGraph<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in &self.edges {
            match edge.next {
                Some(next) => writeln!(f, "{:?} -> {:?}", edge.current, next)?,
                None => writeln!(f, "{:?} -> none", edge.current)?,
            }
        }
        Ok(())
    }
}

impl<P: Phase> TurnGraph<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[TransitionEdge<P>] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The active phase, or `None` before the first update.
    pub fn current_phase(&self) -> Option<P> {
        self.current
            .and_then(|index| self.edges.get(index))
            .map(|edge| edge.current)
    }

    /// Index of the edge whose `current` is `phase`.
    pub fn position(&self, phase: P) -> Option<usize> {
        self.edges.iter().position(|edge| edge.current == phase)
    }

    pub fn state(&self, phase: P) -> Option<&dyn TurnState<P>> {
        self.states.get(&phase).map(|state| state.as_ref())
    }

    /// Register `from -> to`.
    ///
    /// If `from` already has an edge only its `next` changes. A new `from` edge
    /// is placed just before a freshly added `to` entry, so the first phase
    /// registered stays the entry phase. `register(p, p)` only makes sure `p`
    /// has an entry.
    pub fn register(&mut self, from: P, to: P) -> TransitionEdge<P> {
        self.ensure_state(from);
        self.ensure_state(to);

        if from == to {
            let edge = match self.position(from) {
                Some(index) => self.edges[index],
                None => {
                    let edge = TransitionEdge::terminal(from);
                    self.edges.push(edge);
                    edge
                }
            };
            tracing::debug!(phase = ?from, "registered turn phase");
            return edge;
        }

        let fresh_next = self.position(to).is_none();
        if fresh_next {
            self.edges.push(TransitionEdge::terminal(to));
        }

        let edge = match self.position(from) {
            Some(index) => {
                self.edges[index].next = Some(to);
                self.edges[index]
            }
            None => {
                let edge = TransitionEdge::new(from, Some(to));
                if fresh_next {
                    let at = self.edges.len() - 1;
                    self.insert_edge(at, edge);
                } else {
                    self.edges.push(edge);
                }
                edge
            }
        };

        tracing::debug!(from = ?from, to = ?to, "registered turn transition");
        edge
    }

    /// Register every entry that names a target phase.
    pub fn init_from_config(&mut self, entries: &[TransitionConfig<P>]) {
        for entry in entries {
            match entry.to {
                Some(to) => {
                    self.register(entry.from, to);
                }
                None => {
                    tracing::debug!(from = ?entry.from, "skipping transition with no target");
                }
            }
        }
    }

    /// Advance the graph by one tick.
    ///
    /// The first call only enters the entry phase. Later calls update the
    /// active phase and move to its successor once it can exit.
    pub fn update(&mut self, ctx: &mut P::Context, dt: f32) {
        let Some(index) = self.current else {
            if self.edges.is_empty() {
                tracing::warn!("turn graph has no phases, no transitions will occur");
                return;
            }
            if let Err(err) = self.transition(ctx, 0) {
                tracing::error!(%err, "failed to enter the entry phase");
            }
            return;
        };

        let Some(edge) = self.edges.get(index).copied() else {
            tracing::warn!(index, "active turn phase index has no entry");
            return;
        };

        let Some(state) = self.states.get_mut(&edge.current) else {
            tracing::error!(phase = ?edge.current, "turn phase has no state object");
            return;
        };

        state.update(ctx, dt);
        if !state.can_exit(ctx) {
            return;
        }

        let Some(next) = edge.next else {
            return;
        };

        match self.position(next) {
            Some(next_index) => {
                if let Err(err) = self.transition(ctx, next_index) {
                    tracing::error!(%err, from = ?edge.current, "failed to enter next turn phase");
                }
            }
            None => {
                tracing::warn!(
                    from = ?edge.current,
                    next = ?next,
                    "next turn phase has no entry, staying put"
                );
            }
        }
    }

    /// Exit the active phase and enter the phase at `index`.
    pub fn transition(&mut self, ctx: &mut P::Context, index: usize) -> Result<(), GraphError> {
        let Some(next) = self.edges.get(index).map(|edge| edge.current) else {
            tracing::warn!(
                index,
                len = self.edges.len(),
                "rejected turn phase transition to missing entry"
            );
            return Err(GraphError::IndexOutOfRange {
                index,
                len: self.edges.len(),
            });
        };

        let previous = self.current_phase();
        if let Some(state) = previous.and_then(|phase| self.states.get_mut(&phase)) {
            state.exit(ctx);
        }

        self.current = Some(index);

        match self.states.get_mut(&next) {
            Some(state) => state.enter(ctx),
            None => tracing::error!(phase = ?next, "turn phase has no state object"),
        }

        tracing::debug!(from = ?previous, to = ?next, "turn phase transitioned");
        Ok(())
    }

    /// Deliver an event to the active phase. Returns whether a phase received it.
    pub fn send_event(&mut self, ctx: &mut P::Context, event: &P::Event) -> bool {
        let Some(phase) = self.current_phase() else {
            tracing::debug!(?event, "no active turn phase to receive event");
            return false;
        };

        match self.states.get_mut(&phase) {
            Some(state) => {
                state.on_event(ctx, event);
                true
            }
            None => false,
        }
    }

    /// Run [`check_edges`] against this graph's edges, logging failures.
    pub fn validate(&self, require_cycle: bool) -> bool {
        validate_edges(&self.edges, require_cycle)
    }

    fn ensure_state(&mut self, phase: P) {
        self.states
            .entry(phase)
            .or_insert_with(|| phase.instantiate());
    }

    fn insert_edge(&mut self, at: usize, edge: TransitionEdge<P>) {
        self.edges.insert(at, edge);
        if let Some(current) = self.current.as_mut() {
            if at <= *current {
                *current += 1;
            }
        }
    }
}
