//! Hierarchical state machine core.
//!
//! The movement tree is a closed enum. Each node knows its parent and its
//! default child, so the tree shape is fixed at compile time and a transition
//! target outside the tree cannot be expressed.
//!
//! ```text
//! Root
//! ├── MovementRoot
//! │   ├── GroundMovement
//! │   │   └── SwimTest
//! │   │       ├── GroundFallTest
//! │   │       │   ├── Ground      (default)
//! │   │       │   └── GroundFall
//! │   │       ├── SlideFallTest
//! │   │       │   ├── Slide       (default)
//! │   │       │   └── SlideFall
//! │   │       └── Jump
//! │   │           └── Fall
//! │   ├── Swim
//! │   └── Ladder
//! ├── Dead
//! ├── Ledge
//! ├── Fly
//! ├── Spectate
//! └── Intro
//! ```

use serde::{Deserialize, Serialize};

/// Upper bound on tree depth (root included).
const MAX_DEPTH: usize = 8;

/// Transitions requested from enter hooks before giving up.
pub const MAX_TRANSITION_HOPS: usize = 16;

/// Node of the movement tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateId {
    Root,
    MovementRoot,
    GroundMovement,
    SwimTest,
    GroundFallTest,
    Ground,
    GroundFall,
    SlideFallTest,
    Slide,
    SlideFall,
    Jump,
    Fall,
    Swim,
    Ladder,
    Dead,
    Ledge,
    Fly,
    Spectate,
    Intro,
}

impl StateId {
    pub const ALL: [StateId; 19] = [
        StateId::Root,
        StateId::MovementRoot,
        StateId::GroundMovement,
        StateId::SwimTest,
        StateId::GroundFallTest,
        StateId::Ground,
        StateId::GroundFall,
        StateId::SlideFallTest,
        StateId::Slide,
        StateId::SlideFall,
        StateId::Jump,
        StateId::Fall,
        StateId::Swim,
        StateId::Ladder,
        StateId::Dead,
        StateId::Ledge,
        StateId::Fly,
        StateId::Spectate,
        StateId::Intro,
    ];

    pub const fn parent(self) -> Option<StateId> {
        use StateId::*;
        match self {
            Root => None,
            MovementRoot | Dead | Ledge | Fly | Spectate | Intro => Some(Root),
            GroundMovement | Swim | Ladder => Some(MovementRoot),
            SwimTest => Some(GroundMovement),
            GroundFallTest | SlideFallTest | Jump => Some(SwimTest),
            Ground | GroundFall => Some(GroundFallTest),
            Slide | SlideFall => Some(SlideFallTest),
            Fall => Some(Jump),
        }
    }

    /// Child entered implicitly when this node is the transition target.
    pub const fn default_child(self) -> Option<StateId> {
        use StateId::*;
        match self {
            Root => Some(MovementRoot),
            MovementRoot => Some(GroundMovement),
            GroundMovement => Some(SwimTest),
            SwimTest => Some(GroundFallTest),
            GroundFallTest => Some(Ground),
            SlideFallTest => Some(Slide),
            _ => None,
        }
    }

    /// Number of ancestors.
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut state = self;
        while let Some(parent) = state.parent() {
            depth += 1;
            state = parent;
        }
        depth
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(self, other: StateId) -> bool {
        let mut state = Some(other);
        while let Some(current) = state {
            if current == self {
                return true;
            }
            state = current.parent();
        }
        false
    }

    /// Whether this node can stay active (no default child to descend into).
    pub const fn is_leaf(self) -> bool {
        self.default_child().is_none()
    }

    /// Root-to-self path.
    fn path(self) -> ([StateId; MAX_DEPTH], usize) {
        let mut path = [StateId::Root; MAX_DEPTH];
        let len = self.depth() + 1;
        let mut state = self;
        for slot in path[..len].iter_mut().rev() {
            *slot = state;
            state = state.parent().unwrap_or(StateId::Root);
        }
        (path, len)
    }

    /// Deepest node containing both `self` and `other`.
    pub fn common_ancestor(self, other: StateId) -> StateId {
        let (a, a_len) = self.path();
        let (b, b_len) = other.path();
        let mut common = StateId::Root;
        for (x, y) in a[..a_len].iter().zip(&b[..b_len]) {
            if x != y {
                break;
            }
            common = *x;
        }
        common
    }
}

/// Logical locomotion mode of an active leaf.
///
/// Several tree nodes share a mode: GroundFall and SlideFall are both
/// falling, for instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locomotion {
    Ground,
    Jump,
    Fall,
    Slide,
    Swim,
    Ladder,
    Ledge,
    Fly,
    Spectate,
    Dead,
    Intro,
}

impl Locomotion {
    /// Mode of an active leaf, `None` for interior nodes.
    pub const fn from_leaf(state: StateId) -> Option<Locomotion> {
        use StateId::*;
        Some(match state {
            Ground => Locomotion::Ground,
            Jump => Locomotion::Jump,
            Fall | GroundFall | SlideFall => Locomotion::Fall,
            Slide => Locomotion::Slide,
            Swim => Locomotion::Swim,
            Ladder => Locomotion::Ladder,
            Ledge => Locomotion::Ledge,
            Fly => Locomotion::Fly,
            Spectate => Locomotion::Spectate,
            Dead => Locomotion::Dead,
            Intro => Locomotion::Intro,
            Root | MovementRoot | GroundMovement | SwimTest | GroundFallTest | SlideFallTest => {
                return None
            }
        })
    }
}

/// Result of offering an event to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Offer the event to the parent.
    Continue,
    /// Stop dispatching this event.
    Done,
    /// Transition to another node.
    To(StateId),
}

/// Result of a full dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every node passed the event on.
    Ignored,
    /// A node consumed the event.
    Handled,
    /// A node requested a transition; the state it settled in.
    Transitioned(StateId),
}

/// Per-node behaviour plugged into [`Hsm`].
pub trait StateHandler {
    type Event;

    /// Called root-to-leaf when a node becomes active. Returning
    /// [`Transition::To`] redirects the transition.
    fn on_enter(&mut self, _state: StateId) -> Transition {
        Transition::Continue
    }

    /// Called leaf-to-root when a node stops being active.
    fn on_exit(&mut self, _state: StateId) {}

    /// Offer `event` to `state`, an ancestor-or-self of the active leaf.
    fn handle(&mut self, state: StateId, active: StateId, event: &Self::Event) -> Transition;
}

/// Active-leaf bookkeeping and the dispatch/transition algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hsm {
    active: StateId,
    started: bool,
}

impl Default for Hsm {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm {
    pub fn new() -> Self {
        Self {
            active: StateId::Root,
            started: false,
        }
    }

    /// Currently active leaf.
    #[inline]
    pub fn active(&self) -> StateId {
        self.active
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `state` is the active leaf or one of its ancestors.
    #[inline]
    pub fn is_in(&self, state: StateId) -> bool {
        self.started && state.contains(self.active)
    }

    /// Enter the root and its default chain.
    pub fn start<H: StateHandler>(&mut self, handler: &mut H) {
        if self.started {
            return;
        }
        self.started = true;
        self.active = StateId::Root;
        let redirect = match handler.on_enter(StateId::Root) {
            Transition::To(target) => Some(target),
            _ => self.descend(handler),
        };
        if let Some(target) = redirect {
            self.transition(handler, target);
        }
    }

    /// Exit every active node, root included.
    pub fn stop<H: StateHandler>(&mut self, handler: &mut H) {
        if !self.started {
            return;
        }
        let mut state = Some(self.active);
        while let Some(current) = state {
            handler.on_exit(current);
            state = current.parent();
        }
        self.active = StateId::Root;
        self.started = false;
    }

    /// Offer `event` to the active leaf, then to each ancestor in turn.
    pub fn dispatch<H: StateHandler>(&mut self, handler: &mut H, event: &H::Event) -> DispatchOutcome {
        if !self.started {
            self.start(handler);
        }

        let active = self.active;
        let mut state = Some(active);
        while let Some(current) = state {
            match handler.handle(current, active, event) {
                Transition::Continue => state = current.parent(),
                Transition::Done => return DispatchOutcome::Handled,
                Transition::To(target) => {
                    self.transition(handler, target);
                    return DispatchOutcome::Transitioned(self.active);
                }
            }
        }
        DispatchOutcome::Ignored
    }

    /// Transition to `target`, following redirects from enter hooks until
    /// the machine settles.
    ///
    /// # Panics
    ///
    /// If enter hooks keep redirecting for more than
    /// [`MAX_TRANSITION_HOPS`] transitions.
    pub fn transition<H: StateHandler>(&mut self, handler: &mut H, target: StateId) {
        let mut target = target;
        for _ in 0..MAX_TRANSITION_HOPS {
            match self.transition_once(handler, target) {
                Some(next) => {
                    log::trace!("transition redirected to {:?}", next);
                    target = next;
                }
                None => return,
            }
        }
        panic!(
            "movement transitions did not settle after {} hops (last target {:?})",
            MAX_TRANSITION_HOPS, target
        );
    }

    fn transition_once<H: StateHandler>(&mut self, handler: &mut H, target: StateId) -> Option<StateId> {
        // Transitioning to an active node re-enters it.
        let lca = if target.contains(self.active) {
            target.parent()
        } else {
            Some(self.active.common_ancestor(target))
        };

        let mut state = Some(self.active);
        while let Some(current) = state {
            if Some(current) == lca {
                break;
            }
            handler.on_exit(current);
            state = current.parent();
        }

        let (path, len) = target.path();
        let first = lca.map_or(0, |lca| lca.depth() + 1);
        for &state in &path[first..len] {
            self.active = state;
            if let Transition::To(next) = handler.on_enter(state) {
                return Some(next);
            }
        }

        self.descend(handler)
    }

    fn descend<H: StateHandler>(&mut self, handler: &mut H) -> Option<StateId> {
        while let Some(child) = self.active.default_child() {
            self.active = child;
            if let Transition::To(next) = handler.on_enter(child) {
                return Some(next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Probe {
        Poke,
        Go(StateId),
        GoFrom(StateId, StateId),
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        redirect_on_enter: Vec<(StateId, StateId)>,
        consume_at: Option<StateId>,
    }

    impl StateHandler for Recorder {
        type Event = Probe;

        fn on_enter(&mut self, state: StateId) -> Transition {
            self.log.push(format!("enter {:?}", state));
            match self.redirect_on_enter.iter().position(|(from, _)| *from == state) {
                Some(index) => Transition::To(self.redirect_on_enter.remove(index).1),
                None => Transition::Continue,
            }
        }

        fn on_exit(&mut self, state: StateId) {
            self.log.push(format!("exit {:?}", state));
        }

        fn handle(&mut self, state: StateId, _active: StateId, event: &Probe) -> Transition {
            self.log.push(format!("handle {:?}", state));
            match *event {
                Probe::Go(target) => Transition::To(target),
                Probe::GoFrom(at, target) if at == state => Transition::To(target),
                _ if self.consume_at == Some(state) => Transition::Done,
                _ => Transition::Continue,
            }
        }
    }

    fn started() -> (Hsm, Recorder) {
        let mut hsm = Hsm::new();
        let mut recorder = Recorder::default();
        hsm.start(&mut recorder);
        recorder.log.clear();
        (hsm, recorder)
    }

    #[test]
    fn tree_is_consistent() {
        for state in StateId::ALL {
            if let Some(child) = state.default_child() {
                assert_eq!(child.parent(), Some(state));
            }
            if state != StateId::Root {
                assert!(StateId::Root.contains(state));
            }
            assert!(state.depth() < MAX_DEPTH);
        }
    }

    #[test]
    fn every_leaf_has_a_locomotion() {
        for state in StateId::ALL {
            assert_eq!(state.is_leaf(), Locomotion::from_leaf(state).is_some(), "{:?}", state);
        }
    }

    #[test]
    fn start_enters_default_chain() {
        let mut hsm = Hsm::new();
        let mut recorder = Recorder::default();
        hsm.start(&mut recorder);

        assert_eq!(hsm.active(), StateId::Ground);
        assert_eq!(
            recorder.log,
            vec![
                "enter Root",
                "enter MovementRoot",
                "enter GroundMovement",
                "enter SwimTest",
                "enter GroundFallTest",
                "enter Ground",
            ]
        );
    }

    #[test]
    fn dispatch_walks_leaf_to_root() {
        let (mut hsm, mut recorder) = started();
        let outcome = hsm.dispatch(&mut recorder, &Probe::Poke);

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(recorder.log.first().map(String::as_str), Some("handle Ground"));
        assert_eq!(recorder.log.last().map(String::as_str), Some("handle Root"));
        assert_eq!(recorder.log.len(), 6);
    }

    #[test]
    fn done_stops_dispatch() {
        let (mut hsm, mut recorder) = started();
        recorder.consume_at = Some(StateId::SwimTest);
        let outcome = hsm.dispatch(&mut recorder, &Probe::Poke);

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(recorder.log, vec!["handle Ground", "handle GroundFallTest", "handle SwimTest"]);
    }

    #[test]
    fn transition_exits_to_common_ancestor() {
        let (mut hsm, mut recorder) = started();
        hsm.transition(&mut recorder, StateId::Jump);

        assert_eq!(hsm.active(), StateId::Jump);
        assert_eq!(recorder.log, vec!["exit Ground", "exit GroundFallTest", "enter Jump"]);
    }

    #[test]
    fn transition_into_child_keeps_parent() {
        let (mut hsm, mut recorder) = started();
        hsm.transition(&mut recorder, StateId::Jump);
        recorder.log.clear();

        hsm.transition(&mut recorder, StateId::Fall);
        assert_eq!(hsm.active(), StateId::Fall);
        assert!(hsm.is_in(StateId::Jump));
        assert_eq!(recorder.log, vec!["enter Fall"]);
    }

    #[test]
    fn transition_to_ancestor_reenters_it() {
        let (mut hsm, mut recorder) = started();
        hsm.transition(&mut recorder, StateId::GroundMovement);

        assert_eq!(hsm.active(), StateId::Ground);
        assert_eq!(
            recorder.log,
            vec![
                "exit Ground",
                "exit GroundFallTest",
                "exit SwimTest",
                "exit GroundMovement",
                "enter GroundMovement",
                "enter SwimTest",
                "enter GroundFallTest",
                "enter Ground",
            ]
        );
    }

    #[test]
    fn cross_branch_transition_exits_every_sibling() {
        let (mut hsm, mut recorder) = started();
        let outcome = hsm.dispatch(&mut recorder, &Probe::Go(StateId::Dead));

        assert_eq!(outcome, DispatchOutcome::Transitioned(StateId::Dead));
        assert!(!hsm.is_in(StateId::MovementRoot));
        assert!(recorder.log.contains(&"exit MovementRoot".to_string()));
        assert_eq!(recorder.log.last().map(String::as_str), Some("enter Dead"));
    }

    #[test]
    fn ancestor_transition_supersedes_leaf() {
        let (mut hsm, mut recorder) = started();
        let outcome = hsm.dispatch(&mut recorder, &Probe::GoFrom(StateId::MovementRoot, StateId::Ledge));

        assert_eq!(outcome, DispatchOutcome::Transitioned(StateId::Ledge));
        assert_eq!(hsm.active(), StateId::Ledge);
    }

    #[test]
    fn enter_redirects_are_followed_until_stable() {
        let (mut hsm, mut recorder) = started();
        recorder.redirect_on_enter = vec![(StateId::GroundFall, StateId::Ground)];

        hsm.transition(&mut recorder, StateId::GroundFall);
        assert_eq!(hsm.active(), StateId::Ground);
        assert_eq!(
            recorder.log,
            vec!["exit Ground", "enter GroundFall", "exit GroundFall", "enter Ground"]
        );
    }

    #[test]
    #[should_panic(expected = "did not settle")]
    fn endless_redirects_panic() {
        let (mut hsm, mut recorder) = started();
        recorder.redirect_on_enter = (0..MAX_TRANSITION_HOPS + 1)
            .flat_map(|_| [(StateId::Fly, StateId::Spectate), (StateId::Spectate, StateId::Fly)])
            .collect();
        hsm.transition(&mut recorder, StateId::Fly);
    }

    #[test]
    fn redirects_just_under_the_hop_limit_settle() {
        let (mut hsm, mut recorder) = started();
        recorder.redirect_on_enter = (0..MAX_TRANSITION_HOPS - 1)
            .map(|hop| {
                if hop % 2 == 0 {
                    (StateId::Fly, StateId::Spectate)
                } else {
                    (StateId::Spectate, StateId::Fly)
                }
            })
            .collect();

        hsm.transition(&mut recorder, StateId::Fly);
        assert!(recorder.redirect_on_enter.is_empty());
        assert_eq!(hsm.active(), StateId::Spectate);
    }

    #[test]
    fn stop_exits_everything() {
        let (mut hsm, mut recorder) = started();
        hsm.stop(&mut recorder);

        assert!(!hsm.is_started());
        assert_eq!(recorder.log.len(), 6);
        assert_eq!(recorder.log.last().map(String::as_str), Some("exit Root"));
    }

    #[test]
    fn common_ancestor() {
        assert_eq!(StateId::Ground.common_ancestor(StateId::Slide), StateId::SwimTest);
        assert_eq!(StateId::Fall.common_ancestor(StateId::Swim), StateId::MovementRoot);
        assert_eq!(StateId::Ledge.common_ancestor(StateId::Ground), StateId::Root);
        assert_eq!(StateId::Fall.common_ancestor(StateId::Jump), StateId::Jump);
    }
}
