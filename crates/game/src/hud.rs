//! HUD (Heads-Up Display) data for the throw loop.
//! Produces the power meter and creature health bar; drawing is left to the UI layer.

use crate::charge::ChargeReading;

pub const YELLOW: [f32; 4] = [1.0, 0.92, 0.016, 1.0];
pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
/// #22eeff
pub const HEALTH_CYAN: [f32; 4] = [0x22 as f32 / 255.0, 0xee as f32 / 255.0, 1.0, 1.0];

/// A horizontal bar widget: fill fraction in `0..=1` plus colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiBar {
    pub fraction: f32,
    pub color: [f32; 4],
    pub visible: bool,
}

impl UiBar {
    pub fn set_fraction(&mut self, fraction: f32) {
        self.fraction = fraction.clamp(0.0, 1.0);
    }
}

/// All HUD data for a frame
#[derive(Debug, Clone)]
pub struct Hud {
    pub power: UiBar,
    pub health: UiBar,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            power: UiBar {
                fraction: 0.0,
                color: YELLOW,
                visible: false,
            },
            health: UiBar {
                fraction: 1.0,
                color: HEALTH_CYAN,
                visible: true,
            },
        }
    }

    /// Show the power bar at the start of a charge session.
    pub fn begin_charge(&mut self) {
        self.power.visible = true;
        self.power.set_fraction(0.0);
        self.power.color = YELLOW;
    }

    pub fn update_power(&mut self, reading: ChargeReading) {
        self.power.set_fraction(reading.level / 100.0);
        self.power.color = if reading.urgent { RED } else { YELLOW };
    }

    /// Charge released: the bar drops back to empty.
    pub fn end_charge(&mut self) {
        self.power.set_fraction(0.0);
        self.power.visible = false;
    }

    /// Width tracks whole health points while the creature is hurt but alive.
    /// At or below zero the bar is empty; at full health it is left as is.
    pub fn update_health(&mut self, health: f32) {
        if health > 0.0 && health < 100.0 {
            self.health.fraction = health.floor() / 100.0;
        } else if health <= 0.0 {
            self.health.fraction = 0.0;
        }
    }
}
