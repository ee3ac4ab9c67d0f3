//! Charge meter: turns how long the primary button is held into a launch force.

use crate::config::ChargeConfig;

/// Level sample emitted on every tick of an active session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeReading {
    /// Current charge in meter units (nominally 0..100).
    pub level: f32,
    /// Above the urgent level; the meter is drawn in its warning colour.
    pub urgent: bool,
}

impl ChargeReading {
    /// Meter fill in `0..=1`.
    pub fn fraction(&self) -> f32 {
        (self.level / 100.0).clamp(0.0, 1.0)
    }
}

/// Oscillating charge controller. Rises until it passes the upper threshold,
/// then falls until it drops under the lower one, and so on.
#[derive(Debug, Clone)]
pub struct ChargeMeter {
    config: ChargeConfig,
    level: f32,
    rising: bool,
    active: bool,
}

impl ChargeMeter {
    pub fn new(config: ChargeConfig) -> Self {
        Self {
            level: 0.0,
            rising: true,
            active: false,
            config,
        }
    }

    /// Start a session from the configured minimum, rising.
    pub fn begin(&mut self) {
        self.level = self.config.start;
        self.rising = true;
        self.active = true;
    }

    /// Advance the meter by `dt` seconds. Direction flips are decided on the
    /// level before this tick's movement, so the value can overshoot a
    /// threshold by one tick's worth before turning around.
    pub fn tick(&mut self, dt: f32) -> Option<ChargeReading> {
        if !self.active {
            return None;
        }

        if self.level < self.config.lower_threshold {
            self.rising = true;
        } else if self.level > self.config.upper_threshold {
            self.rising = false;
        }

        if self.rising {
            self.level += dt * self.config.rising_rate();
        } else {
            self.level -= dt * self.config.rate;
        }

        Some(ChargeReading {
            level: self.level,
            urgent: self.level > self.config.urgent_level,
        })
    }

    /// Close the session and hand back the level at this instant.
    pub fn end(&mut self) -> Option<f32> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.level)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter() -> ChargeMeter {
        ChargeMeter::new(ChargeConfig::default())
    }

    #[test]
    fn rises_linearly_at_the_faster_rate() {
        let mut m = meter();
        m.begin();
        let t = 0.25;
        let reading = m.tick(t).unwrap();
        let expected = 1.0 + 150.0 * 1.1 * t;
        assert!((reading.level - expected).abs() < 1e-4);
        assert!(m.is_rising());
        assert!(!reading.urgent);
    }

    #[test]
    fn turns_around_one_tick_after_passing_the_upper_threshold() {
        let mut m = meter();
        m.begin();
        let dt = 0.1;
        let mut peak = 0.0f32;
        for _ in 0..7 {
            peak = peak.max(m.tick(dt).unwrap().level);
        }
        // 1 + 16.5 * 6 = 100 after six ticks, so the seventh tick falls.
        assert!(!m.is_rising());
        assert!(peak > 99.0);
        assert!(peak < 99.0 + 16.5 + 1e-3);
        assert!(m.level() < peak);
    }

    #[test]
    fn falls_back_to_rising_below_the_lower_threshold() {
        let mut m = meter();
        m.begin();
        // Up past 99, then down past 1.
        for _ in 0..2000 {
            m.tick(0.01);
            if !m.is_rising() && m.level() < 1.0 {
                break;
            }
        }
        assert!(m.level() < 1.0);
        m.tick(0.01);
        assert!(m.is_rising());
    }

    #[test]
    fn end_closes_the_session() {
        let mut m = meter();
        assert_eq!(m.end(), None);
        m.begin();
        m.tick(0.2);
        let level = m.end().unwrap();
        assert!((level - 34.0).abs() < 1e-3);
        assert!(!m.is_active());
        assert_eq!(m.tick(0.2), None);
    }

    #[test]
    fn urgent_above_eighty() {
        let mut m = meter();
        m.begin();
        let reading = m.tick(0.5).unwrap();
        assert!(reading.level > 80.0);
        assert!(reading.urgent);
        assert!((reading.fraction() - reading.level / 100.0).abs() < 1e-6);
    }
}
