use rand::Rng;

use super::Rgb;

/// Channels above this are pushed back down once the average gets too bright.
pub const BRIGHT: u8 = 0xD0;

/// Channels below this are pushed back up once the average gets too dark.
pub const DARK: u8 = 0x20;

const MAX_COUNTDOWN: i32 = 200;

/// The drift runs roughly this many times slower than the frame rate.
const CADENCE_DIVISOR: u32 = 20;

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    value: u8,
    direction: i8,
    countdown: i32,
}

impl Channel {
    fn redirect<R: Rng + ?Sized>(&mut self, force: i8, rng: &mut R) {
        let pushed = (force < 0 && self.value > BRIGHT) || (force > 0 && self.value < DARK);

        if pushed {
            self.direction = force;
            self.countdown = 0;
        } else if self.countdown <= 0 {
            self.direction = rng.random_range(-1..=1);
            self.countdown = rng.random_range(0..MAX_COUNTDOWN);
        }
    }

    fn advance(&mut self) {
        self.value = match self.direction {
            d if d > 0 => self.value.saturating_add(1),
            d if d < 0 => self.value.saturating_sub(1),
            _ => self.value,
        };

        self.countdown -= 1;
    }
}

/// Slowly wandering background color.
#[derive(Debug, Clone)]
pub struct BackgroundDrift {
    channels: [Channel; 3],
    frame: u32,
}

/// Frames between two evaluations at the given target rate.
pub fn cadence(target_fps: u32) -> u32 {
    target_fps.div_ceil(CADENCE_DIVISOR).max(1)
}

impl BackgroundDrift {
    pub fn new(seed: Rgb) -> Self {
        let mut drift = Self {
            channels: [Channel::default(); 3],
            frame: 0,
        };

        drift.set_color(seed);
        drift
    }

    /// Jumps to a new color. Directions and countdowns are kept.
    pub fn set_color(&mut self, color: Rgb) {
        for (channel, value) in self.channels.iter_mut().zip(color.channels()) {
            channel.value = value;
        }
    }

    pub fn color(&self) -> Rgb {
        Rgb::from_channels(self.channels.map(|c| c.value))
    }

    /// Called once per rendered frame; only every [`cadence`] frames
    /// actually moves the color.
    pub fn step<R: Rng + ?Sized>(&mut self, color_shift: bool, target_fps: u32, rng: &mut R) -> Rgb {
        self.frame = self.frame.saturating_add(1);

        if color_shift && self.frame >= cadence(target_fps) {
            self.frame = 0;
            self.evaluate(rng);
        }

        self.color()
    }

    /// One drift evaluation, independent of the frame cadence.
    pub fn evaluate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let sum: u32 = self.channels.iter().map(|c| c.value as u32).sum();
        let avg = sum / 3;

        let force = if avg > BRIGHT as u32 {
            -1
        } else if avg < DARK as u32 {
            1
        } else {
            0
        };

        for channel in self.channels.iter_mut() {
            channel.redirect(force, rng);
            channel.advance();
        }
    }
}
