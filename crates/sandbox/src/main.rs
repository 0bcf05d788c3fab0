//! Strider Sandbox - scripted walk through the test course.
//!
//! Run with `RUST_LOG=info` (or `debug` for every animation action and cue).

use strider_movement::{FrameMovementParams, MovementEvent, StateId};
use strider_sandbox::Simulation;

/// Give up on a phase after this many ticks.
const PHASE_LIMIT: usize = 60 * 20;

fn forward() -> FrameMovementParams {
    FrameMovementParams::walking(0.0, 1.0)
}

fn phase(name: &str, reached: Option<usize>) {
    match reached {
        Some(ticks) => log::info!("{name}: done in {ticks} ticks"),
        None => log::warn!("{name}: not reached after {PHASE_LIMIT} ticks"),
    }
}

fn main() {
    env_logger::init();

    let mut sim = Simulation::test();
    let idle = FrameMovementParams::default();

    // Settle on the floor long enough to be allowed to jump.
    sim.run(&idle, 30);

    // Jump at the wall in front of the spawn: the ledge is grabbed and
    // pulled up onto.
    let jump = FrameMovementParams {
        jump: true,
        ..forward()
    };
    sim.tick(&jump, &[]);
    phase(
        "ledge",
        sim.run_until(&idle, PHASE_LIMIT, |sim| sim.state() == StateId::Ground),
    );

    // Walk off the far side of the wall and on into the pool.
    phase(
        "swim",
        sim.run_until(&forward(), PHASE_LIMIT, |sim| sim.state() == StateId::Swim),
    );
    phase(
        "shore",
        sim.run_until(&forward(), PHASE_LIMIT, |sim| sim.state() == StateId::Ground),
    );

    // On to the foot of the tower ladder.
    phase(
        "ladder foot",
        sim.run_until(&forward(), PHASE_LIMIT, |sim| sim.ladder_event().is_some()),
    );
    let mount: Vec<MovementEvent> = sim.ladder_event().into_iter().collect();
    sim.tick(&idle, &mount);
    phase(
        "climb",
        sim.run_until(&forward(), PHASE_LIMIT, |sim| sim.state() == StateId::Ground),
    );

    // Walk off the back of the tower.
    sim.run(&forward(), 120);

    let actor = &sim.actor;
    log::info!(
        "finished in {:?} at ({:.2}, {:.2}, {:.2}) after {} frames, health {:.1}, {} requests, {} actions",
        sim.state(),
        actor.position.x,
        actor.position.y,
        actor.position.z,
        sim.frame,
        actor.health,
        sim.animation.movements.len(),
        sim.animation.actions.len()
    );
    log::info!("stats: {:?}", sim.movement.stats());
}
