use std::sync::atomic::{AtomicBool, AtomicU32, Ordering::Relaxed};

/// Where the roll angle comes from.
///
/// Implementations may be fed from another thread; the simulation reads
/// each value once per tick.
pub trait TiltSource: Send + Sync {
    /// Degrees in `[-90, 90]`, 0 while disabled.
    fn current_roll(&self) -> f32;

    /// Whether the user is holding the bubbles in place.
    fn held(&self) -> bool {
        false
    }

    fn enable(&self);
    fn disable(&self);
    fn is_enabled(&self) -> bool;
}

/// Tilt state written by input handlers, read by the simulation.
#[derive(Debug, Default)]
pub struct SharedTilt {
    roll_bits: AtomicU32,
    held: AtomicBool,
    enabled: AtomicBool,
}

impl SharedTilt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_roll(&self, degrees: f32) {
        let degrees = if degrees.is_finite() {
            degrees.clamp(-90.0, 90.0)
        } else {
            0.0
        };

        self.roll_bits.store(degrees.to_bits(), Relaxed);
    }

    /// Raw roll, regardless of whether the sensor is enabled.
    pub fn roll(&self) -> f32 {
        f32::from_bits(self.roll_bits.load(Relaxed))
    }

    pub fn nudge(&self, degrees: f32) {
        self.set_roll(self.roll() + degrees);
    }

    pub fn set_held(&self, held: bool) {
        self.held.store(held, Relaxed);
    }
}

impl TiltSource for SharedTilt {
    fn current_roll(&self) -> f32 {
        if !self.is_enabled() {
            return 0.0;
        }

        self.roll()
    }

    fn held(&self) -> bool {
        self.held.load(Relaxed)
    }

    fn enable(&self) {
        self.enabled.store(true, Relaxed);
    }

    fn disable(&self) {
        self.enabled.store(false, Relaxed);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_reads_zero() {
        let tilt = SharedTilt::new();
        tilt.set_roll(30.0);
        assert_eq!(tilt.current_roll(), 0.0);

        tilt.enable();
        assert_eq!(tilt.current_roll(), 30.0);

        tilt.disable();
        assert_eq!(tilt.current_roll(), 0.0);
    }

    #[test]
    fn roll_is_clamped() {
        let tilt = SharedTilt::new();
        tilt.enable();

        tilt.set_roll(120.0);
        assert_eq!(tilt.current_roll(), 90.0);

        tilt.nudge(-200.0);
        assert_eq!(tilt.current_roll(), -90.0);

        tilt.set_roll(f32::NAN);
        assert_eq!(tilt.current_roll(), 0.0);
    }

    #[test]
    fn hold_is_independent_of_enable() {
        let tilt = SharedTilt::new();
        tilt.set_held(true);
        assert!(tilt.held());
    }
}
