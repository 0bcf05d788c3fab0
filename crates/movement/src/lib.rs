//! Strider Player Movement
//!
//! A hierarchical state machine deciding, once per pre-physics tick, how a
//! player moves: walking, jumping, falling, sliding, swimming, hanging off
//! ledges, climbing ladders, flying, spectating, lying dead or sitting
//! through a level intro.
//!
//! # Architecture
//!
//! - **Tree**: [`hsm`] holds a closed set of nodes with fixed parents. Events
//!   bubble from the active leaf to the root; transitions exit up to the
//!   common ancestor and enter down to the target's default leaf.
//! - **States**: each node's behaviour lives in its own module and writes
//!   the tick's [`MovementRequest`] through a single [`FrameRequest`] slot.
//! - **Utilities**: [`util`] is the shared pre-physics pipeline (speed
//!   adjustment, slope handling, jump and sprint decisions, fall damage,
//!   physics resync, request finalization).
//! - **Host**: the entity, animation layer and world are reached through the
//!   traits in [`host`], lent to the machine for one call at a time.
//!
//! # Design Principles
//!
//! 1. **One writer**: exactly one state produces the request per tick
//! 2. **Explicit ordering**: events, pre-physics, physics, resync, update
//! 3. **Injected tuning**: every constant comes from [`MovementParams`]
//! 4. **No hidden state**: per-state data lives in a session dropped on exit

pub mod config;
pub mod error;
pub mod host;
pub mod hsm;
pub mod machine;
pub mod persist;
pub mod physics;
pub mod request;
pub mod stats;
pub mod util;
pub mod water;

mod states;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::MovementParams;
pub use error::{ConfigError, PersistError};
pub use host::{
    AnimationAction, AnimationController, ControlMethod, Controller, EmptyWorld, FallDamage,
    Host, ItemStatus, LadderExit, LadderMount, LedgeFlags, LedgeId, LedgeInfo, LedgeQuery,
    LedgeTransition, MovementFeedback, PlayerEntity, Stance, SwimCue, WaterQuery,
};
pub use hsm::{DispatchOutcome, Locomotion, StateId, Transition};
pub use machine::{PlayerMovement, MAX_PREPHYSICS_PASSES};
pub use persist::MovementSnapshot;
pub use physics::{ActorPhysics, EntityId, LivingStatus, PhysicsFlags, PhysicsParams, UP};
pub use request::{FrameMovementParams, FrameRequest, MovementRequest, RequestKind};
pub use states::dead::{CorpseStatus, DeadSession};
pub use states::jump::{JumpKind, JumpRequest};
pub use states::ledge::{try_ledge_grab, LedgeGrab};
pub use states::slide::{SlideController, SlideStep};
pub use states::spectate::SpectatorMode;
pub use states::MovementEvent;
pub use stats::MovementStats;
pub use water::WaterProxy;
