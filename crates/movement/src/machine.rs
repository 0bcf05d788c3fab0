//! The per-player movement state machine.
//!
//! [`PlayerMovement`] owns the tree position, the per-entity stats and the
//! physics snapshot. Hosts drive it once per frame in this order:
//!
//! 1. [`handle_event`](PlayerMovement::handle_event) for inputs and gameplay events
//! 2. [`pre_physics_update`](PlayerMovement::pre_physics_update) to produce the tick's request
//! 3. the host's physics step
//! 4. [`update_physics_stats`](PlayerMovement::update_physics_stats) with the frame id
//! 5. [`update`](PlayerMovement::update) for post-physics timers

use std::sync::Arc;

use crate::config::MovementParams;
use crate::host::{AnimationController, Host};
use crate::hsm::{DispatchOutcome, Hsm, Locomotion, StateId};
use crate::physics::ActorPhysics;
use crate::request::{FrameMovementParams, FrameRequest, MovementRequest};
use crate::states::{MovementEvent, PendingEntry, Session, StateCtx};
use crate::stats::MovementStats;
use crate::util;
use crate::water::WaterProxy;

/// Dispatch passes per pre-physics tick.
///
/// A pass that ends in a transition is discarded and the tick is offered to
/// the new state, so a state that leaves mid-tick never commits a request.
pub const MAX_PREPHYSICS_PASSES: usize = 4;

/// Movement state of one player.
pub struct PlayerMovement {
    pub(crate) params: Arc<MovementParams>,
    pub(crate) hsm: Hsm,
    pub(crate) session: Option<Session>,
    pub(crate) pending: Option<PendingEntry>,
    pub(crate) physics: ActorPhysics,
    pub(crate) stats: MovementStats,
    pub(crate) water: WaterProxy,
}

impl PlayerMovement {
    pub fn new(params: Arc<MovementParams>) -> Self {
        Self {
            params,
            hsm: Hsm::new(),
            session: None,
            pending: None,
            physics: ActorPhysics::default(),
            stats: MovementStats::default(),
            water: WaterProxy::default(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn params(&self) -> &MovementParams {
        &self.params
    }

    /// Active leaf of the tree.
    #[inline]
    pub fn active_state(&self) -> StateId {
        self.hsm.active()
    }

    /// Logical locomotion mode, `None` before the machine started.
    pub fn locomotion(&self) -> Option<Locomotion> {
        if self.hsm.is_started() {
            Locomotion::from_leaf(self.hsm.active())
        } else {
            None
        }
    }

    /// Whether `state` is the active leaf or one of its ancestors.
    pub fn is_in(&self, state: StateId) -> bool {
        self.hsm.is_in(state)
    }

    pub fn is_started(&self) -> bool {
        self.hsm.is_started()
    }

    pub fn physics(&self) -> &ActorPhysics {
        &self.physics
    }

    pub fn stats(&self) -> &MovementStats {
        &self.stats
    }

    pub fn water(&self) -> &WaterProxy {
        &self.water
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Enter the default chain. Dispatching starts the machine implicitly.
    pub fn start(&mut self, host: &mut Host<'_>) {
        let mut frame = FrameRequest::new();
        self.with_ctx(host, &mut frame, false, |hsm, ctx| hsm.start(ctx));
    }

    /// Exit every state, root included.
    pub fn stop(&mut self, host: &mut Host<'_>) {
        let mut frame = FrameRequest::new();
        self.with_ctx(host, &mut frame, false, |hsm, ctx| hsm.stop(ctx));
        self.session = None;
        self.pending = None;
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Offer an event to the tree.
    ///
    /// Events never produce a movement request; only
    /// [`pre_physics_update`](Self::pre_physics_update) does.
    pub fn handle_event(&mut self, host: &mut Host<'_>, event: &MovementEvent) -> DispatchOutcome {
        debug_assert!(
            !matches!(event, MovementEvent::PrePhysicsUpdate { .. }),
            "pre-physics ticks go through pre_physics_update"
        );
        let mut frame = FrameRequest::new();
        let outcome = self.with_ctx(host, &mut frame, false, |hsm, ctx| hsm.dispatch(ctx, event));
        debug_assert!(!frame.is_written(), "{:?} wrote a movement request", event);
        outcome
    }

    /// Run the pre-physics tick and commit its request.
    ///
    /// Returns the committed request, or `None` when no state produced one
    /// (dead, intro, or a tick that never settled).
    pub fn pre_physics_update(
        &mut self,
        host: &mut Host<'_>,
        frame_time: f32,
        movement: &FrameMovementParams,
    ) -> Option<MovementRequest> {
        self.stats.stance = host.entity.stance();
        self.stats.sprint_stamina = host.entity.sprint_stamina();
        self.stats.cinematic_restricted = host.entity.cinematic_restricted();

        let event = MovementEvent::PrePhysicsUpdate {
            frame_time,
            movement: *movement,
        };
        let mut frame = FrameRequest::new();
        let mut settled = false;
        for pass in 0..MAX_PREPHYSICS_PASSES {
            frame.discard();
            let outcome = self.with_ctx(host, &mut frame, pass > 0, |hsm, ctx| hsm.dispatch(ctx, &event));
            if !matches!(outcome, DispatchOutcome::Transitioned(_)) {
                settled = true;
                break;
            }
        }
        if !settled {
            log::warn!(
                "entity {} pre-physics did not settle after {} passes (in {:?})",
                host.entity.id(),
                MAX_PREPHYSICS_PASSES,
                self.hsm.active()
            );
            frame.discard();
        }

        if !frame.is_written() {
            return None;
        }
        let request = *frame.get();
        let animation = host
            .animation
            .as_mut()
            .map(|animation| &mut **animation as &mut dyn AnimationController);
        util::finalize_movement_request(animation, frame.request_mut());
        Some(request)
    }

    /// Refresh the physics snapshot after the host's physics step.
    ///
    /// Idempotent per `frame_id`.
    pub fn update_physics_stats(&mut self, host: &mut Host<'_>, frame_id: u64) -> bool {
        util::update_player_physics_stats(&mut self.physics, host.entity, frame_id)
    }

    /// Post-physics update: stats timers, corpse swap, spectator fade.
    pub fn update(&mut self, host: &mut Host<'_>, frame_time: f32) -> DispatchOutcome {
        let event = MovementEvent::Update { frame_time };
        let mut frame = FrameRequest::new();
        let outcome = self.with_ctx(host, &mut frame, false, |hsm, ctx| hsm.dispatch(ctx, &event));
        debug_assert!(!frame.is_written(), "update wrote a movement request");
        outcome
    }

    /// Lend the split borrows of `self` to one dispatch.
    pub(crate) fn with_ctx<'h, R>(
        &mut self,
        host: &mut Host<'h>,
        frame: &mut FrameRequest,
        repeat: bool,
        f: impl FnOnce(&mut Hsm, &mut StateCtx<'_, 'h>) -> R,
    ) -> R {
        let Self {
            params,
            hsm,
            session,
            pending,
            physics,
            stats,
            water,
        } = self;
        let mut ctx = StateCtx {
            params: &**params,
            physics,
            stats,
            water,
            session,
            pending,
            host,
            frame,
            repeat,
        };
        f(hsm, &mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::host::{
        AnimationAction, ControlMethod, LadderExit, LadderMount, LedgeFlags, LedgeInfo,
        LedgeTransition, SwimCue,
    };
    use crate::physics::LivingStatus;
    use crate::request::RequestKind;
    use crate::states::ledge::LedgeGrab;
    use crate::states::spectate::SpectatorMode;
    use crate::test_support::{TestAnimation, TestEntity, TestFeedback, TestWorld};

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        entity: TestEntity,
        animation: TestAnimation,
        feedback: TestFeedback,
        world: TestWorld,
        movement: PlayerMovement,
        frame_id: u64,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                entity: TestEntity::default(),
                animation: TestAnimation::default(),
                feedback: TestFeedback::default(),
                world: TestWorld::default(),
                movement: PlayerMovement::new(Arc::new(MovementParams::default())),
                frame_id: 0,
            }
        }

        fn pre_physics(&mut self, input: FrameMovementParams) -> Option<MovementRequest> {
            let Rig {
                entity,
                animation,
                feedback,
                world,
                movement,
                ..
            } = self;
            let mut host = Host {
                entity,
                animation: Some(animation),
                ledges: &*world,
                water: &*world,
                feedback: Some(feedback),
            };
            movement.pre_physics_update(&mut host, DT, &input)
        }

        fn event(&mut self, event: MovementEvent) -> DispatchOutcome {
            let Rig {
                entity,
                animation,
                feedback,
                world,
                movement,
                ..
            } = self;
            let mut host = Host {
                entity,
                animation: Some(animation),
                ledges: &*world,
                water: &*world,
                feedback: Some(feedback),
            };
            movement.handle_event(&mut host, &event)
        }

        /// Resync physics from the entity's status and run the post update.
        fn post_physics(&mut self) {
            self.frame_id += 1;
            let frame_id = self.frame_id;
            let Rig {
                entity,
                animation,
                feedback,
                world,
                movement,
                ..
            } = self;
            let mut host = Host {
                entity,
                animation: Some(animation),
                ledges: &*world,
                water: &*world,
                feedback: Some(feedback),
            };
            movement.update_physics_stats(&mut host, frame_id);
            movement.update(&mut host, DT);
        }

        fn tick(&mut self, input: FrameMovementParams) -> Option<MovementRequest> {
            let request = self.pre_physics(input);
            self.post_physics();
            request
        }

        fn active(&self) -> StateId {
            self.movement.active_state()
        }
    }

    fn idle() -> FrameMovementParams {
        FrameMovementParams::default()
    }

    fn jump() -> FrameMovementParams {
        FrameMovementParams {
            jump: true,
            ..Default::default()
        }
    }

    #[test]
    fn starts_on_the_ground() {
        let mut rig = Rig::new();
        assert_eq!(rig.movement.locomotion(), None);

        let request = rig.tick(FrameMovementParams::walking(0.0, 1.0)).expect("request");
        assert_eq!(rig.active(), StateId::Ground);
        assert_eq!(rig.movement.locomotion(), Some(Locomotion::Ground));
        assert!(rig.movement.is_in(StateId::GroundMovement));
        assert!(!rig.movement.is_in(StateId::Swim));

        assert_eq!(request.kind, RequestKind::Normal);
        assert!((request.velocity.y - rig.movement.params().speed.stand_max_speed).abs() < 1e-4);
        assert_eq!(rig.animation.control_methods.first(), Some(&ControlMethod::Entity));
    }

    #[test]
    fn every_tick_commits_one_request() {
        let mut rig = Rig::new();
        for i in 1..=30 {
            rig.tick(FrameMovementParams::walking(0.3, 1.0));
            assert_eq!(rig.animation.movements.len(), i);
        }
    }

    #[test]
    fn jump_needs_ground_dwell() {
        let mut rig = Rig::new();
        rig.tick(idle());
        rig.tick(jump());
        assert_eq!(rig.active(), StateId::Ground);

        for _ in 0..15 {
            rig.tick(idle());
        }
        let committed = rig.animation.movements.len();
        let request = rig.pre_physics(jump()).expect("jump request");

        assert_eq!(rig.active(), StateId::Jump);
        assert!(rig.movement.stats().is_jumping);
        // The ground request of the first pass was superseded.
        assert_eq!(rig.animation.movements.len(), committed + 1);
        assert_eq!(request.kind, RequestKind::JumpAccumulate);

        let params = rig.movement.params();
        let expected = crate::config::JumpParams::launch_speed(params.jump.height, params.body.gravity);
        assert!((request.velocity.z - expected).abs() < 1e-4);
    }

    #[test]
    fn jump_lands_back_on_ground() {
        let mut rig = Rig::new();
        for _ in 0..15 {
            rig.tick(idle());
        }
        rig.pre_physics(jump());
        assert_eq!(rig.active(), StateId::Jump);

        // Airborne and still rising.
        rig.entity.position.z = 0.5;
        rig.entity.set_status(Vec3::new(0.0, 0.0, 2.0), true);
        rig.post_physics();
        let request = rig.pre_physics(idle()).expect("air request");
        assert_eq!(request.kind, RequestKind::Normal);
        assert_eq!(rig.active(), StateId::Jump);

        // Past the apex.
        rig.entity.set_status(Vec3::new(0.0, 0.0, -1.0), true);
        rig.post_physics();
        rig.pre_physics(idle());
        assert_eq!(rig.active(), StateId::Fall);
        assert_eq!(rig.movement.locomotion(), Some(Locomotion::Fall));

        // Touchdown.
        rig.entity.position.z = 0.0;
        rig.entity.set_status(Vec3::ZERO, false);
        rig.post_physics();
        let request = rig.pre_physics(idle()).expect("ground request");
        assert_eq!(rig.active(), StateId::Ground);
        assert_eq!(request.kind, RequestKind::Normal);
        assert!(!rig.movement.stats().is_jumping);
        assert_eq!(rig.entity.damage_taken(), 0.0);
    }

    #[test]
    fn fall_and_ground_events() {
        let mut rig = Rig::new();
        rig.tick(idle());

        assert_eq!(rig.event(MovementEvent::Fall), DispatchOutcome::Transitioned(StateId::GroundFall));
        assert_eq!(rig.event(MovementEvent::Fall), DispatchOutcome::Handled);
        assert_eq!(rig.event(MovementEvent::Ground), DispatchOutcome::Transitioned(StateId::Ground));
        assert_eq!(rig.event(MovementEvent::StopSpectate), DispatchOutcome::Ignored);
    }

    #[test]
    fn sustained_air_time_falls() {
        let mut rig = Rig::new();
        rig.tick(idle());
        rig.entity.set_status(Vec3::new(0.0, 0.0, -1.0), true);

        let ticks_needed = (rig.movement.params().ground.fall_test_time / DT).ceil() as usize + 2;
        for _ in 0..ticks_needed {
            rig.tick(idle());
        }
        assert_eq!(rig.active(), StateId::GroundFall);
    }

    #[test]
    fn stuck_actor_does_not_fall() {
        let mut rig = Rig::new();
        rig.tick(idle());
        rig.entity.status = Some(LivingStatus {
            velocity: Vec3::new(0.0, 0.0, -1.0),
            flying: true,
            stuck: true,
            ..Default::default()
        });

        let ticks_needed = (rig.movement.params().ground.fall_test_time / DT).ceil() as usize + 2;
        for _ in 0..ticks_needed {
            rig.tick(idle());
        }
        assert_eq!(rig.active(), StateId::Ground);
        assert!(rig.movement.physics().flags.stuck());
    }

    #[test]
    fn dead_blocks_movement_until_revive() {
        let mut rig = Rig::new();
        rig.tick(idle());

        rig.event(MovementEvent::Dead);
        assert_eq!(rig.active(), StateId::Dead);
        let committed = rig.animation.movements.len();
        assert!(rig.tick(FrameMovementParams::walking(0.0, 1.0)).is_none());
        assert_eq!(rig.animation.movements.len(), committed);

        // Dead ignores movement events.
        assert_eq!(rig.event(MovementEvent::Jump), DispatchOutcome::Handled);
        assert_eq!(rig.event(MovementEvent::Fly(true)), DispatchOutcome::Handled);

        let delay = rig.movement.params().dead.corpse_swap_delay;
        for _ in 0..((delay / DT) as usize + 2) {
            rig.tick(idle());
        }
        assert_eq!(rig.entity.corpse_swaps, 1);

        rig.event(MovementEvent::Revive);
        assert_eq!(rig.active(), StateId::Ground);
        assert!(rig.tick(idle()).is_some());
    }

    #[test]
    fn deep_water_swims_and_shallow_water_walks() {
        let mut rig = Rig::new();
        rig.world.water_level = Some(2.0);
        rig.world.ground_level = Some(0.0);

        let request = rig.tick(FrameMovementParams::walking(0.0, 1.0)).expect("swim request");
        assert_eq!(rig.active(), StateId::Swim);
        assert_eq!(request.kind, RequestKind::Fly);
        assert_eq!(rig.animation.movements.len(), 1);
        assert_eq!(rig.feedback.cues.first(), Some(&SwimCue::EnterWater));
        assert!(rig.movement.water().swimming);
        assert!(rig.entity.physics_params.expect("fly params").swimming);

        rig.world.water_level = Some(0.5);
        let request = rig.tick(idle()).expect("ground request");
        assert_eq!(rig.active(), StateId::Ground);
        assert_eq!(request.kind, RequestKind::Normal);
        assert!(rig.feedback.cues.contains(&SwimCue::ExitWater));
        assert!(!rig.movement.water().swimming);
    }

    #[test]
    fn surfacing_fast_dolphin_jumps() {
        let mut rig = Rig::new();
        rig.world.water_level = Some(2.0);
        rig.tick(idle());
        assert_eq!(rig.active(), StateId::Swim);

        // Head breaks the surface at speed.
        rig.entity.position.z = 0.7;
        let speed = rig.movement.params().swim.dolphin_jump_threshold + 1.0;
        rig.entity.set_status(Vec3::new(0.0, 0.0, speed), true);
        rig.post_physics();

        let request = rig.pre_physics(idle()).expect("dolphin request");
        assert_eq!(rig.active(), StateId::Jump);
        assert_eq!(request.kind, RequestKind::JumpAccumulate);
        let modifier = rig.movement.params().swim.dolphin_jump_modifier;
        assert!((request.velocity.z - speed * (modifier - 1.0)).abs() < 1e-4);

        // Still rising over the water: not pulled back into Swim.
        rig.post_physics();
        rig.pre_physics(idle());
        assert_eq!(rig.active(), StateId::Jump);
    }

    #[test]
    fn spectate_fades_in_and_holds_during_migration() {
        let mut rig = Rig::new();
        rig.tick(idle());

        rig.event(MovementEvent::Spectate(SpectatorMode::Fixed));
        assert_eq!(rig.active(), StateId::Spectate);
        assert_eq!(rig.feedback.fades, vec![1.0]);

        let request = rig.tick(FrameMovementParams::walking(0.0, 1.0)).expect("fixed request");
        assert_eq!(request.kind, RequestKind::Fly);
        assert_eq!(request.velocity, Vec3::ZERO);
        assert!(*rig.feedback.fades.last().expect("fade") < 1.0);

        rig.event(MovementEvent::HostMigrationPause(true));
        for _ in 0..30 {
            rig.tick(idle());
            assert_eq!(rig.feedback.fades.last(), Some(&1.0));
        }

        rig.event(MovementEvent::Spectate(SpectatorMode::Free));
        let request = rig.tick(FrameMovementParams::walking(0.0, 1.0)).expect("free request");
        assert!(request.velocity.y > 0.0);

        rig.event(MovementEvent::StopSpectate);
        assert_eq!(rig.active(), StateId::Ground);
        assert_eq!(rig.feedback.fades.last(), Some(&0.0));
    }

    #[test]
    fn ledge_grab_hands_control_to_animation() {
        let mut rig = Rig::new();
        let ledge = rig.world.add_ledge(LedgeInfo {
            position: Vec3::new(0.0, 1.0, 1.5),
            facing: -Vec3::Y,
            flags: LedgeFlags::default(),
        });
        rig.tick(idle());

        rig.event(MovementEvent::Ledge(LedgeGrab {
            ledge,
            transition: LedgeTransition::PullUp,
        }));
        assert_eq!(rig.active(), StateId::Ledge);
        assert_eq!(rig.animation.control_methods.last(), Some(&ControlMethod::Animation));
        assert!(matches!(
            rig.animation.actions.last(),
            Some(AnimationAction::LedgeGrab {
                transition: LedgeTransition::PullUp,
                ..
            })
        ));

        let request = rig.tick(idle()).expect("ledge request");
        assert_eq!(request.kind, RequestKind::Fly);

        rig.event(MovementEvent::LedgeAnimFinished);
        assert_eq!(rig.active(), StateId::Ground);
        assert_eq!(rig.animation.control_methods.last(), Some(&ControlMethod::Entity));
    }

    fn grab_ledge(rig: &mut Rig, flags: LedgeFlags, transition: LedgeTransition) {
        let ledge = rig.world.add_ledge(LedgeInfo {
            position: Vec3::new(0.0, 1.0, 1.5),
            facing: -Vec3::Y,
            flags,
        });
        rig.tick(idle());
        rig.event(MovementEvent::Ledge(LedgeGrab { ledge, transition }));
        assert_eq!(rig.active(), StateId::Ledge);
    }

    #[test]
    fn ledges_ending_in_air_finish_falling() {
        for transition in LedgeTransition::ALL {
            for ends_in_air in [false, true] {
                let flags = if ends_in_air {
                    LedgeFlags::default().with(LedgeFlags::ENDS_IN_AIR)
                } else {
                    LedgeFlags::default()
                };
                let mut rig = Rig::new();
                grab_ledge(&mut rig, flags, transition);
                rig.tick(idle());

                rig.event(MovementEvent::LedgeAnimFinished);
                let expected = if ends_in_air || transition == LedgeTransition::VaultOverIntoFall {
                    StateId::GroundFall
                } else {
                    StateId::Ground
                };
                assert_eq!(rig.active(), expected, "{transition:?} ends_in_air={ends_in_air}");
            }
        }
    }

    #[test]
    fn vault_into_fall_carries_exit_velocity() {
        let mut rig = Rig::new();
        let flags = LedgeFlags::default()
            .with(LedgeFlags::HIGH_VAULT)
            .with(LedgeFlags::ENDS_IN_AIR);
        grab_ledge(&mut rig, flags, LedgeTransition::HighVaultOver);
        rig.tick(idle());

        rig.event(MovementEvent::LedgeAnimFinished);
        assert_eq!(rig.active(), StateId::GroundFall);

        // Ledge space -Y is over the wall, world +Y here.
        let request = rig.pre_physics(idle()).expect("fall request");
        assert_eq!(request.kind, RequestKind::JumpAccumulate);
        let expected = Vec3::new(0.0, 3.5, 0.0);
        assert!(request.velocity.distance(expected) < 1e-4, "{:?}", request.velocity);
    }

    #[test]
    fn ledge_grab_rides_a_moving_ledge() {
        let mut still = Rig::new();
        let mut moving = Rig::new();
        for rig in [&mut still, &mut moving] {
            grab_ledge(rig, LedgeFlags::default(), LedgeTransition::PullUp);
            rig.tick(idle());
        }

        moving.world.set_ledge_position(0, Vec3::new(1.0, 1.0, 1.5));
        let a = still.tick(idle()).expect("still request");
        let b = moving.tick(idle()).expect("moving request");

        // The blend shifts by the whole ledge delta in one tick.
        let shift = (b.velocity - a.velocity) * DT;
        assert!(shift.distance(Vec3::X) < 1e-3, "{shift:?}");
        assert_eq!(moving.active(), StateId::Ledge);
    }

    #[test]
    fn close_combat_target_overrides_input() {
        let mut rig = Rig::new();
        rig.tick(idle());
        let strafe = FrameMovementParams::walking(1.0, 0.0);

        rig.entity.close_combat_target = Some(Vec3::new(0.0, 0.1, 0.0));
        let request = rig.tick(strafe).expect("aligned request");
        assert!(request.velocity.distance(Vec3::new(0.0, 0.1 / DT, 0.0)) < 1e-3);
        let physics = rig.entity.physics_params.expect("inertia override");
        assert_eq!(physics.inertia, 0.0);
        assert_eq!(physics.inertia_accel, 0.0);

        // Far targets are approached at the capped speed.
        rig.entity.close_combat_target = Some(Vec3::new(0.0, 5.0, 0.0));
        let request = rig.tick(strafe).expect("capped request");
        let max = rig.movement.params().ground.close_combat_max_speed;
        assert!((request.velocity.length() - max).abs() < 1e-3);

        rig.entity.close_combat_target = None;
        let request = rig.tick(strafe).expect("ground request");
        assert!(request.velocity.x > 0.0);
        let physics = rig.entity.physics_params.expect("restored");
        assert_eq!(physics.inertia, rig.movement.params().body.inertia);
    }

    #[test]
    fn diving_and_surfacing_cue_the_head() {
        let mut rig = Rig::new();
        rig.world.water_level = Some(1.5);
        rig.tick(idle());
        assert_eq!(rig.active(), StateId::Swim);
        assert_eq!(rig.feedback.cues, vec![SwimCue::EnterWater]);

        rig.entity.position.z = -1.0;
        rig.tick(idle());
        rig.tick(idle());
        assert_eq!(rig.feedback.cues.len(), 2);
        assert_eq!(rig.feedback.cues[1], SwimCue::HeadUnderwater);

        rig.entity.position.z = 0.0;
        rig.tick(idle());
        assert_eq!(rig.active(), StateId::Swim);
        assert_eq!(rig.feedback.cues.len(), 3);
        match rig.feedback.cues[2] {
            SwimCue::HeadAboveWater { underwater_time } => {
                assert!((underwater_time - 2.0 * DT).abs() < 1e-5);
            }
            cue => panic!("unexpected cue {cue:?}"),
        }
    }

    #[test]
    fn slide_fall_lands_back_into_slide_at_speed() {
        for (speed, expected) in [(6.0, StateId::Slide), (0.5, StateId::Ground)] {
            let mut rig = Rig::new();
            let sprint = FrameMovementParams {
                sprint_pressed: true,
                ..FrameMovementParams::walking(0.0, 1.0)
            };
            rig.entity.set_status(Vec3::new(0.0, 6.0, 0.0), false);
            rig.tick(sprint);
            rig.tick(sprint);
            rig.event(MovementEvent::Slide);
            assert_eq!(rig.active(), StateId::Slide);

            rig.event(MovementEvent::Fall);
            assert_eq!(rig.active(), StateId::SlideFall);

            rig.entity.set_status(Vec3::new(0.0, speed, -1.0), true);
            rig.post_physics();
            rig.pre_physics(sprint);
            assert_eq!(rig.active(), StateId::SlideFall);

            rig.entity.set_status(Vec3::new(0.0, speed, 0.0), false);
            rig.post_physics();
            rig.pre_physics(sprint);
            assert_eq!(rig.active(), expected, "landing at {speed} m/s");
            assert_eq!(rig.movement.stats().is_sliding, expected == StateId::Slide);
        }
    }

    #[test]
    fn ladder_drop_falls_and_bottom_dismount_walks() {
        let mount = LadderMount {
            bottom: Vec3::new(0.0, 1.0, 0.0),
            height: 4.0,
            facing: -Vec3::Y,
        };

        let mut rig = Rig::new();
        rig.tick(idle());
        rig.event(MovementEvent::Ladder(mount));
        assert_eq!(rig.active(), StateId::Ladder);
        assert_eq!(rig.animation.actions.last(), Some(&AnimationAction::LadderEnter));

        rig.event(MovementEvent::LeaveLadder(LadderExit::Drop));
        assert_eq!(rig.active(), StateId::GroundFall);
        assert!(rig.animation.actions.contains(&AnimationAction::LadderExit(LadderExit::Drop)));

        let mut rig = Rig::new();
        rig.tick(idle());
        rig.event(MovementEvent::Ladder(mount));
        // Climbing down from the bottom rung steps off.
        rig.tick(FrameMovementParams::walking(0.0, -1.0));
        assert_eq!(rig.active(), StateId::Ground);
        assert!(rig.animation.actions.contains(&AnimationAction::LadderExit(LadderExit::Bottom)));
    }

    #[test]
    fn sprint_slide_and_forced_exit() {
        let mut rig = Rig::new();
        let sprint = FrameMovementParams {
            sprint_pressed: true,
            ..FrameMovementParams::walking(0.0, 1.0)
        };
        rig.entity.set_status(Vec3::new(0.0, 6.0, 0.0), false);
        rig.tick(sprint);
        rig.tick(sprint);
        assert!(rig.movement.stats().is_sprinting);

        rig.event(MovementEvent::Slide);
        assert_eq!(rig.active(), StateId::Slide);
        assert!(rig.movement.stats().is_sliding);
        assert_eq!(rig.animation.actions.last(), Some(&AnimationAction::SlideStart));

        let request = rig.pre_physics(sprint).expect("slide request");
        assert!(request.velocity.y > rig.movement.params().slide.exit_speed);

        rig.event(MovementEvent::ForceExitSlide);
        assert_eq!(rig.active(), StateId::Ground);
        assert!(!rig.movement.stats().is_sliding);
        assert_eq!(rig.animation.actions.last(), Some(&AnimationAction::SlideEnd));
    }

    #[test]
    fn fly_toggles() {
        let mut rig = Rig::new();
        rig.tick(idle());

        rig.event(MovementEvent::Fly(true));
        assert_eq!(rig.active(), StateId::Fly);
        let request = rig.tick(FrameMovementParams::walking(0.0, 1.0)).expect("fly request");
        assert_eq!(request.kind, RequestKind::Fly);
        assert!((request.velocity.y - rig.movement.params().fly.speed).abs() < 1e-4);

        rig.event(MovementEvent::Fly(false));
        assert_eq!(rig.active(), StateId::Ground);
    }

    #[test]
    fn intro_locks_until_finished() {
        let mut rig = Rig::new();
        rig.tick(idle());

        rig.event(MovementEvent::IntroStart);
        assert_eq!(rig.active(), StateId::Intro);
        assert_eq!(rig.animation.actions.last(), Some(&AnimationAction::Intro));
        assert!(rig.tick(FrameMovementParams::walking(0.0, 1.0)).is_none());
        assert_eq!(rig.event(MovementEvent::Jump), DispatchOutcome::Handled);

        rig.event(MovementEvent::IntroFinished);
        assert_eq!(rig.active(), StateId::Ground);
    }

    #[test]
    fn states_are_exclusive() {
        let mut rig = Rig::new();
        rig.tick(idle());
        let events = [
            MovementEvent::Fall,
            MovementEvent::Ground,
            MovementEvent::Fly(true),
            MovementEvent::Fly(false),
            MovementEvent::Spectate(SpectatorMode::Free),
            MovementEvent::StopSpectate,
            MovementEvent::Dead,
            MovementEvent::Revive,
            MovementEvent::IntroStart,
            MovementEvent::IntroFinished,
        ];
        for event in events {
            rig.event(event);
            let active = rig.active();
            assert!(active.is_leaf(), "{event:?} left {active:?} active");
            let modes = StateId::ALL
                .iter()
                .filter(|state| state.is_leaf() && rig.movement.is_in(**state))
                .count();
            assert_eq!(modes, 1);
        }
    }
}
