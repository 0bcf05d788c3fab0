//! Animation and feedback layers that only record what they receive.

use strider_movement::{
    AnimationAction, AnimationController, ControlMethod, MovementFeedback, MovementRequest,
    SwimCue,
};

#[derive(Debug, Clone)]
pub struct RecordingAnimation {
    /// Committed requests, one per tick that produced one.
    pub movements: Vec<MovementRequest>,
    pub actions: Vec<AnimationAction>,
    pub control: ControlMethod,
}

impl Default for RecordingAnimation {
    fn default() -> Self {
        Self {
            movements: Vec::new(),
            actions: Vec::new(),
            control: ControlMethod::Entity,
        }
    }
}

impl AnimationController for RecordingAnimation {
    fn add_movement(&mut self, request: &MovementRequest) {
        self.movements.push(*request);
    }

    fn queue_action(&mut self, action: AnimationAction) {
        log::debug!("animation action {:?}", action);
        self.actions.push(action);
    }

    fn set_movement_control_method(&mut self, method: ControlMethod) {
        if method != self.control {
            log::debug!("control method {:?} -> {:?}", self.control, method);
        }
        self.control = method;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    pub cues: Vec<SwimCue>,

    /// Current screen fade alpha.
    pub fade: f32,
}

impl MovementFeedback for RecordingFeedback {
    fn swim_cue(&mut self, cue: SwimCue) {
        log::debug!("swim cue {:?}", cue);
        self.cues.push(cue);
    }

    fn screen_fade(&mut self, alpha: f32) {
        self.fade = alpha;
    }
}
