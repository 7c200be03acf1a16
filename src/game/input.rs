use std::collections::HashSet;

use crate::game::vehicle::{Control, Vehicle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard,
    Touch,
}

/// Maps a keyboard `key` identifier to a control, covering QWERTY and AZERTY.
pub fn control_for_key(key: &str) -> Option<Control> {
    match key.to_lowercase().as_str() {
        "arrowleft" | "a" | "q" => Some(Control::Left),
        "arrowright" | "d" => Some(Control::Right),
        "arrowup" | "w" | "z" => Some(Control::Accelerate),
        "arrowdown" | "s" => Some(Control::Brake),
        _ => None,
    }
}

pub fn control_for_button(button: &str) -> Option<Control> {
    match button {
        "left" => Some(Control::Left),
        "right" => Some(Control::Right),
        "up" => Some(Control::Accelerate),
        "down" => Some(Control::Brake),
        _ => None,
    }
}

/// Tracks which controls each source is holding so key auto-repeat cannot
/// trigger extra lane changes and a latch stays on while any source holds it.
#[derive(Default)]
pub struct InputRouter {
    held: HashSet<(InputSource, Control)>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, control: Control) -> bool {
        self.held.iter().any(|(_, c)| *c == control)
    }

    /// Returns false for identifiers that map to no control.
    pub fn key(&mut self, key: &str, pressed: bool, vehicle: &mut Vehicle) -> bool {
        match control_for_key(key) {
            Some(control) => {
                self.apply(InputSource::Keyboard, control, pressed, vehicle);
                true
            }
            None => false,
        }
    }

    pub fn button(&mut self, button: &str, pressed: bool, vehicle: &mut Vehicle) -> bool {
        match control_for_button(button) {
            Some(control) => {
                self.apply(InputSource::Touch, control, pressed, vehicle);
                true
            }
            None => {
                log::warn!("unknown touch button {:?}", button);
                false
            }
        }
    }

    pub fn apply(&mut self, source: InputSource, control: Control, pressed: bool, vehicle: &mut Vehicle) {
        let changed = if pressed {
            self.held.insert((source, control))
        } else {
            self.held.remove(&(source, control))
        };
        match control {
            Control::Left | Control::Right => {
                if pressed && changed {
                    vehicle.handle_input(control, true);
                }
            }
            Control::Accelerate | Control::Brake => {
                vehicle.handle_input(control, self.is_held(control));
            }
        }
    }

    /// Re-asserts the accelerate and brake latches from what is held.
    pub fn sync(&self, vehicle: &mut Vehicle) {
        for control in [Control::Accelerate, Control::Brake] {
            vehicle.handle_input(control, self.is_held(control));
        }
    }

    pub fn release_all(&mut self, vehicle: &mut Vehicle) {
        self.held.clear();
        self.sync(vehicle);
    }
}
