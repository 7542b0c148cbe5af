//! Input provider fed by the UI thread

use crate::mailbox::Mailbox;
use crate::provider::InputProvider;
use crate::types::{ControlInput, FunctionBits};

/// [`InputProvider`] backed by a [`Mailbox`].
///
/// The UI (joystick poller, keyboard handler) writes through one clone while
/// the control sender reads through another.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    input: Mailbox<ControlInput>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole input.
    pub fn set(&self, input: ControlInput) {
        self.input.post(input);
    }

    pub fn set_axes(&self, steering: f32, throttle: f32, brake: f32) {
        self.input.update(|input| {
            input.steering = steering;
            input.throttle = throttle;
            input.brake = brake;
        });
    }

    /// Gear is passed through unclamped; the vehicle decides what it accepts.
    pub fn set_gear(&self, gear: i8) {
        self.input.update(|input| input.gear = gear);
    }

    pub fn set_functions(&self, functions: FunctionBits) {
        self.input.update(|input| input.functions = functions);
    }

    pub fn toggle_lights(&self) {
        self.input.update(|input| {
            input.functions = input.functions.with_lights(!input.functions.lights());
        });
    }

    /// Back to neutral gear, centred steering, no pedals, functions unchanged.
    pub fn release(&self) {
        self.input.update(|input| {
            *input = ControlInput { functions: input.functions, ..ControlInput::default() };
        });
    }
}

impl InputProvider for SharedInput {
    fn current(&self) -> ControlInput {
        self.input.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ControlFrame;

    #[test]
    fn writes_are_visible_through_clones() {
        let ui = SharedInput::new();
        let sender = ui.clone();

        ui.set_gear(2);
        ui.set_axes(0.5, 0.8, 0.0);
        ui.toggle_lights();

        let frame = ControlFrame::from_input(&sender.current());
        assert_eq!(frame.gear, 2);
        assert_eq!(frame.steering, 64);
        assert_eq!(frame.throttle, 80);
        assert!(frame.function_bits.lights());
    }

    #[test]
    fn release_keeps_functions() {
        let ui = SharedInput::new();
        ui.set(ControlInput {
            gear: 3,
            steering: -1.0,
            throttle: 1.0,
            brake: 0.2,
            functions: FunctionBits::NONE.with_horn(true),
        });
        ui.release();

        let input = ui.current();
        assert_eq!(input.gear, 0);
        assert_eq!(input.throttle, 0.0);
        assert!(input.functions.horn());
    }
}
