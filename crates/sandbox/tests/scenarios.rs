//! End-to-end scenarios: the movement core driving a kinematic body.

use glam::{Vec2, Vec3};
use strider_movement::{
    AnimationAction, FrameMovementParams, LadderExit, LadderMount, MovementEvent, RequestKind,
    StateId, SwimCue,
};
use strider_sandbox::{Level, Simulation, SimulationConfig};

fn idle() -> FrameMovementParams {
    FrameMovementParams::default()
}

fn forward() -> FrameMovementParams {
    FrameMovementParams::walking(0.0, 1.0)
}

fn sim_on(level: Level, spawn: Vec3) -> Simulation {
    Simulation::new(SimulationConfig::default(), level, spawn)
}

#[test]
fn jump_arcs_and_lands_without_damage() {
    let mut sim = sim_on(Level::flat(), Vec3::ZERO);
    sim.run(&idle(), 30);

    let report = sim.tick(
        &FrameMovementParams {
            jump: true,
            ..Default::default()
        },
        &[],
    );
    assert_eq!(report.state, StateId::Jump);
    assert_eq!(report.request.map(|request| request.kind), Some(RequestKind::JumpAccumulate));

    let mut peak: f32 = 0.0;
    let mut saw_fall = false;
    for _ in 0..120 {
        let report = sim.tick(&idle(), &[]);
        peak = peak.max(sim.actor.position.z);
        saw_fall |= report.state == StateId::Fall;
        if report.state == StateId::Ground {
            break;
        }
    }

    assert_eq!(sim.state(), StateId::Ground);
    assert!(saw_fall);
    assert!((0.7..1.2).contains(&peak), "peak {peak}");
    assert!(sim.actor.damage_log.is_empty());
    assert!(!sim.movement.stats().is_jumping);
}

#[test]
fn long_drop_hurts_on_landing() {
    let mut sim = sim_on(Level::flat(), Vec3::new(0.0, 0.0, 9.0));

    let mut saw_fall = false;
    let landed = sim.run_until(&idle(), 300, |sim| {
        saw_fall |= sim.state() == StateId::GroundFall;
        saw_fall && sim.state() == StateId::Ground
    });
    assert!(landed.is_some());

    assert_eq!(sim.actor.damage_log.len(), 1);
    let damage = sim.actor.damage_log[0];
    assert!(!damage.fatal);
    assert!(damage.fall_height > 8.0, "fall height {}", damage.fall_height);
    assert!(sim.actor.health < 100.0 && sim.actor.health > 50.0, "health {}", sim.actor.health);
}

#[test]
fn wading_into_deep_water_swims_and_back_out_walks() {
    let mut level = Level::flat();
    level.add_pool(Vec2::new(-5.0, 2.0), Vec2::new(5.0, 20.0), 2.0);
    let mut sim = sim_on(level, Vec3::ZERO);

    assert!(sim
        .run_until(&forward(), 120, |sim| sim.state() == StateId::Swim)
        .is_some());
    assert_eq!(sim.feedback.cues.first(), Some(&SwimCue::EnterWater));
    assert!(sim.actor.physics.swimming);
    assert_eq!(sim.actor.physics.gravity, Vec3::ZERO);

    let report = sim.tick(&forward(), &[]);
    assert_eq!(report.request.map(|request| request.kind), Some(RequestKind::Fly));

    let backward = FrameMovementParams::walking(0.0, -1.0);
    assert!(sim
        .run_until(&backward, 600, |sim| sim.state() == StateId::Ground)
        .is_some());
    assert!(sim.feedback.cues.contains(&SwimCue::ExitWater));
    assert!(!sim.actor.physics.swimming);
    assert!(sim.actor.damage_log.is_empty());
}

#[test]
fn ladder_climbs_onto_the_roof() {
    let mut level = Level::flat();
    level.add_platform(Vec2::new(-3.0, 1.0), Vec2::new(3.0, 5.0), 3.0);
    let mount = LadderMount {
        bottom: Vec3::new(0.0, 1.0, 0.0),
        height: 3.0,
        facing: -Vec3::Y,
    };
    level.add_ladder(mount);

    let mut sim = sim_on(level, Vec3::new(0.0, 0.5, 0.0));
    sim.run(&idle(), 5);

    let event = sim.ladder_event().expect("standing at the ladder");
    let report = sim.tick(&idle(), &[event]);
    assert_eq!(report.state, StateId::Ladder);
    assert!(sim.animation.actions.contains(&AnimationAction::LadderEnter));

    assert!(sim
        .run_until(&forward(), 600, |sim| sim.state() == StateId::Ground)
        .is_some());
    assert!(sim
        .animation
        .actions
        .contains(&AnimationAction::LadderExit(LadderExit::Top)));

    sim.run(&idle(), 30);
    assert_eq!(sim.state(), StateId::Ground);
    assert!((sim.actor.position.z - 3.0).abs() < 0.01, "z {}", sim.actor.position.z);
    assert!(sim.actor.position.y > 1.0);
    assert!(sim.actor.physics.gravity.z < 0.0);
    assert!(sim.actor.damage_log.is_empty());
}

#[test]
fn jumping_at_a_wall_pulls_up_onto_it() {
    let mut sim = Simulation::test();
    sim.run(&idle(), 30);

    let report = sim.tick(
        &FrameMovementParams {
            jump: true,
            ..forward()
        },
        &[],
    );
    assert_eq!(report.state, StateId::Ledge);
    assert!(sim
        .animation
        .actions
        .iter()
        .any(|action| matches!(action, AnimationAction::LedgeGrab { .. })));

    assert!(sim
        .run_until(&idle(), 120, |sim| sim.state() == StateId::Ground)
        .is_some());
    sim.run(&idle(), 10);
    assert!((sim.actor.position.z - 1.5).abs() < 0.01, "z {}", sim.actor.position.z);
    assert!(sim.actor.position.y > 1.0);
}

#[test]
fn saved_corpse_stays_dead() {
    let mut sim = sim_on(Level::flat(), Vec3::ZERO);
    sim.run(&idle(), 5);
    sim.tick(&idle(), &[MovementEvent::Dead]);
    assert_eq!(sim.state(), StateId::Dead);

    let bytes = sim.save().expect("save");

    let mut restored = sim_on(Level::flat(), Vec3::ZERO);
    restored.load(&bytes).expect("load");
    assert_eq!(restored.state(), StateId::Dead);

    let committed = restored.animation.movements.len();
    let report = restored.tick(&forward(), &[]);
    assert!(report.request.is_none());
    assert_eq!(restored.animation.movements.len(), committed);

    restored.tick(&idle(), &[MovementEvent::Revive]);
    assert_eq!(restored.state(), StateId::Ground);
}
