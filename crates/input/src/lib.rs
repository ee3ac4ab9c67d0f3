//! Input handling: the primary button and the current aim direction.
//!
//! The throw loop only needs two discrete events, "primary pressed" and
//! "primary released", each carrying the aim direction at that moment.
//! Window-layer events are fed in through the `process_*` methods.

use glam::{Quat, Vec3};
use std::collections::HashSet;

/// Discrete primary-button event with the aim direction captured at that instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryEvent {
    Pressed { aim: Vec3 },
    Released { aim: Vec3 },
}

/// Manages input state for the current frame.
#[derive(Debug)]
pub struct InputState {
    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,
    /// Mouse buttons released this frame.
    mouse_released: HashSet<MouseButton>,

    /// Look orientation as yaw (around +Y) and pitch (around local X), radians.
    yaw: f32,
    pitch: f32,
    /// Radians per pixel of mouse motion.
    sensitivity: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            mouse_held: HashSet::new(),
            mouse_pressed: HashSet::new(),
            mouse_released: HashSet::new(),
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.002,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.mouse_pressed.clear();
        self.mouse_released.clear();
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                if self.mouse_held.remove(&button) {
                    self.mouse_released.insert(button);
                }
            }
        }
    }

    /// Process raw mouse movement into yaw/pitch.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.yaw -= delta.0 as f32 * self.sensitivity;
        self.pitch -= delta.1 as f32 * self.sensitivity;
        self.clamp_pitch();
    }

    /// Point the view directly (scripted players, tests).
    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.clamp_pitch();
    }

    /// Set mouse sensitivity multiplier (1.0 = default).
    pub fn set_sensitivity(&mut self, multiplier: f32) {
        self.sensitivity = 0.002 * multiplier;
    }

    /// Look rotation: yaw first, then pitch about the local X axis.
    pub fn look_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Unit aim vector (forward is -Z in right-handed coordinates).
    pub fn aim_direction(&self) -> Vec3 {
        self.look_rotation() * -Vec3::Z
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Check if a mouse button was released this frame.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Primary events this frame, press before release.
    pub fn primary_events(&self) -> Vec<PrimaryEvent> {
        let aim = self.aim_direction();
        let mut events = Vec::new();
        if self.is_mouse_pressed(MouseButton::Left) {
            events.push(PrimaryEvent::Pressed { aim });
        }
        if self.is_mouse_released(MouseButton::Left) {
            events.push(PrimaryEvent::Released { aim });
        }
        events
    }

    fn clamp_pitch(&mut self) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = self.pitch.clamp(-limit, limit);
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_yields_press_then_release_in_separate_frames() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(matches!(input.primary_events()[..], [PrimaryEvent::Pressed { .. }]));

        input.begin_frame();
        assert!(input.primary_events().is_empty());
        assert!(input.is_mouse_held(MouseButton::Left));

        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(matches!(input.primary_events()[..], [PrimaryEvent::Released { .. }]));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(input.primary_events().is_empty());
    }

    #[test]
    fn aim_follows_yaw_and_stays_unit_length() {
        let mut input = InputState::new();
        assert!((input.aim_direction() - Vec3::NEG_Z).length() < 1e-6);

        input.set_look(std::f32::consts::FRAC_PI_2, 0.0);
        assert!((input.aim_direction() - Vec3::NEG_X).length() < 1e-5);

        input.set_look(0.3, 10.0);
        assert!((input.aim_direction().length() - 1.0).abs() < 1e-5);
        assert!(input.aim_direction().y > 0.99);
    }
}
