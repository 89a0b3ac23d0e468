//! Function-pointer finite state machine engine.
//!
//! One state per training phase:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────────┬──────────┬─────────┬────────────────┐  │
//! │  │ TrainingPhase    │ on_enter │ on_exit │ on_update      │  │
//! │  ├──────────────────┼──────────┼─────────┼────────────────┤  │
//! │  │ Discovery        │ fn(ctx)  │  None   │ fn(ctx)        │  │
//! │  │ RewardOnArrival  │ fn(ctx)  │  None   │ fn(ctx)        │  │
//! │  │ DepositAssisted  │ fn(ctx)  │  None   │ fn(ctx)        │  │
//! │  │ DepositSolo      │ fn(ctx)  │  None   │ fn(ctx)        │  │
//! │  └──────────────────┴──────────┴─────────┴────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** phase.
//! Handlers never pick the next phase themselves: the only way out of a
//! phase is the operator's button, delivered through [`Fsm::advance`],
//! which runs `on_exit` for the current phase and `on_enter` for the
//! next.  All functions receive `&mut FsmContext`.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::error::FatalError;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// The four selectable training protocols.  Discriminants are the values
/// persisted to storage and blinked on the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrainingPhase {
    /// Lid held open; the subject learns where the food is.
    Discovery = 1,
    /// Landing on the perch opens the lid.
    RewardOnArrival = 2,
    /// A deposited token opens the lid; a trainer may help.
    DepositAssisted = 3,
    /// A deposited token opens the lid; no help.
    DepositSolo = 4,
}

impl TrainingPhase {
    /// Total number of phases, used to size the table array.
    pub const COUNT: usize = 4;

    /// Decode a stored byte.  Anything outside 1–4 is fatal.
    pub fn from_u8(raw: u8) -> Result<Self, FatalError> {
        match raw {
            1 => Ok(Self::Discovery),
            2 => Ok(Self::RewardOnArrival),
            3 => Ok(Self::DepositAssisted),
            4 => Ok(Self::DepositSolo),
            _ => Err(FatalError::InvalidPhase),
        }
    }

    /// The stored / displayed number (1–4).
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// The next phase in the cycle, wrapping 4 → 1.
    pub const fn next(self) -> Self {
        match self {
            Self::Discovery => Self::RewardOnArrival,
            Self::RewardOnArrival => Self::DepositAssisted,
            Self::DepositAssisted => Self::DepositSolo,
            Self::DepositSolo => Self::Discovery,
        }
    }

    /// Position in the state table.
    const fn index(self) -> usize {
        self as usize - 1
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each phase change.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
pub type StateUpdateFn = fn(&mut FsmContext);

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single phase.
/// Stored in a fixed-size array, without heap or `dyn`.
pub struct StateDescriptor {
    pub id: TrainingPhase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The protocol state machine.
pub struct Fsm {
    /// Fixed-size table indexed by `TrainingPhase::index()`.
    table: [StateDescriptor; TrainingPhase::COUNT],
    /// Index of the currently active phase.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given table, starting in `initial`.
    pub fn new(table: [StateDescriptor; TrainingPhase::COUNT], initial: TrainingPhase) -> Self {
        Self {
            table,
            current: initial.index(),
        }
    }

    /// Run the initial `on_enter` for the starting phase.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in phase: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run the current phase's policy for one control iteration.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        (self.table[self.current].on_update)(ctx);
    }

    /// Move to the next phase (4 wraps to 1).  Returns `(from, to)`.
    pub fn advance(&mut self, ctx: &mut FsmContext) -> (TrainingPhase, TrainingPhase) {
        let from = self.current_phase();
        let to = from.next();
        self.transition(to, ctx);
        (from, to)
    }

    /// The current phase.
    pub fn current_phase(&self) -> TrainingPhase {
        self.table[self.current].id
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: TrainingPhase, ctx: &mut FsmContext) {
        let next_idx = next.index();

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
