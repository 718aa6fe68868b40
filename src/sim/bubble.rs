use rand::Rng;

use crate::math::rng::{random_int, random_step};

/// The frame rate the growth constants were tuned at.
pub const NOMINAL_FPS: f32 = 25.0;

pub const MIN_MAX_RADIUS: i32 = 3;

pub const ALPHA_RANGE: (i32, i32) = (100, 250);

/// Recycled bubbles spawn this many pixels around the bottom edge.
pub const SPAWN_JITTER: i32 = 10;

/// A bubble only counts as gone from the top once it is this far above it.
pub const TOP_MARGIN: f32 = 20.0;

/// Per-tick inputs shared by every bubble.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    /// Frame rate as measured by the scheduler.
    pub fps: f32,
    pub speed_factor: f32,
    /// Roll angle in degrees.
    pub roll: f32,
    /// Whether the roll biases the drift at all.
    pub tilt: bool,
}

/// What the renderer needs to know to draw one bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Bubble {
    x: f32,
    y: f32,
    radius: f32,
    max_radius: f32,
    alpha: u8,
    popped: bool,
}

impl Bubble {
    /// Creates a bubble already in flight somewhere on the canvas.
    pub fn new<R: Rng + ?Sized>(width: u32, height: u32, max_size_bound: u32, rng: &mut R) -> Self {
        let mut bubble = Self {
            x: 0.0,
            y: 0.0,
            radius: 1.0,
            max_radius: MIN_MAX_RADIUS as f32,
            alpha: ALPHA_RANGE.0 as u8,
            popped: false,
        };

        bubble.recycle(true, width, height, max_size_bound, rng);
        bubble
    }

    /// Brings the bubble back to life in place.
    ///
    /// An `initial` bubble lands anywhere on the canvas. Otherwise it
    /// starts just below the bottom edge so it visibly enters the screen.
    pub fn recycle<R: Rng + ?Sized>(
        &mut self,
        initial: bool,
        width: u32,
        height: u32,
        max_size_bound: u32,
        rng: &mut R,
    ) {
        let w = width.max(1) as i32;
        let h = height.max(1) as i32;

        self.y = if initial {
            random_int(rng, 0, h) as f32
        } else {
            (height as i32 + random_int(rng, -SPAWN_JITTER, SPAWN_JITTER + 1)) as f32
        };

        self.x = random_int(rng, 0, w) as f32;
        self.radius = 1.0;
        self.max_radius = random_int(rng, MIN_MAX_RADIUS, max_size_bound as i32) as f32;
        self.alpha = random_int(rng, ALPHA_RANGE.0, ALPHA_RANGE.1) as u8;
        self.popped = false;
    }

    /// Advances one tick.
    ///
    /// Growth is inversely proportional to the current radius and rise
    /// speed grows with `ln(radius)`; both are scaled by the measured fps so
    /// the apparent speed does not depend on the achieved frame rate.
    pub fn update<R: Rng + ?Sized>(&mut self, motion: &Motion, rng: &mut R) {
        if self.popped {
            return;
        }

        let fps = motion.fps.max(f32::EPSILON);
        let scale = fps / NOMINAL_FPS;

        if self.radius < self.max_radius {
            self.radius += self.max_radius / (scale * self.radius);
            self.radius = self.radius.min(self.max_radius);
        }

        let speed = self.radius.ln() * motion.speed_factor / fps;

        let mut rise = speed;
        let mut drift = random_step(rng) as f32;

        if motion.tilt {
            let lean = motion.roll.clamp(-90.0, 90.0) / 90.0;
            drift += speed * lean;
            rise -= speed * lean.abs();
        }

        self.x += drift;
        self.y -= rise;
    }

    /// Whether the bounding circle has fully left the canvas on any side.
    pub fn is_offscreen(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as f32, height as f32);

        self.y + self.radius <= -TOP_MARGIN
            || self.y - self.radius >= h
            || self.x + self.radius <= 0.0
            || self.x - self.radius >= w
    }

    pub fn pop(&mut self) {
        self.popped = true;
    }

    #[cfg(test)]
    pub fn is_popped(&self) -> bool {
        self.popped
    }

    #[cfg(test)]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[cfg(test)]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[cfg(test)]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[cfg(test)]
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    #[cfg(test)]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn sprite(&self) -> Sprite {
        Sprite {
            x: self.x,
            y: self.y,
            radius: self.radius,
            alpha: self.alpha,
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, x: f32, y: f32, radius: f32) {
        self.x = x;
        self.y = y;
        self.radius = radius;
        self.max_radius = self.max_radius.max(radius);
    }

    #[cfg(test)]
    pub(crate) fn force_max_radius(&mut self, max_radius: f32) {
        self.max_radius = max_radius;
        self.radius = self.radius.min(max_radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::rng::seeded;
    use proptest::prelude::*;

    const NOMINAL: Motion = Motion {
        fps: NOMINAL_FPS,
        speed_factor: 25.0,
        roll: 0.0,
        tilt: false,
    };

    proptest! {
        #[test]
        fn recycle_stays_in_bounds(
            seed in any::<u64>(),
            initial in any::<bool>(),
            width in 1u32..4000,
            height in 1u32..4000,
            bound in 4u32..64,
        ) {
            let mut rng = seeded(Some(seed));
            let mut b = Bubble::new(width, height, bound, &mut rng);
            b.recycle(initial, width, height, bound, &mut rng);

            prop_assert!(1.0 <= b.radius() && b.radius() <= b.max_radius());
            prop_assert!(b.max_radius() < bound as f32);
            prop_assert!(b.max_radius() >= MIN_MAX_RADIUS as f32);
            prop_assert!((100..250).contains(&b.alpha()));
            prop_assert!(0.0 <= b.x() && b.x() < width as f32);
            prop_assert!(!b.is_popped());

            if initial {
                prop_assert!(0.0 <= b.y() && b.y() < height as f32);
            } else {
                let h = height as f32;
                prop_assert!(h - 10.0 <= b.y() && b.y() <= h + 10.0);
            }
        }

        #[test]
        fn radius_never_shrinks_or_overshoots(seed in any::<u64>(), fps in 1.0f32..240.0) {
            let mut rng = seeded(Some(seed));
            let mut b = Bubble::new(100, 100, 30, &mut rng);
            let motion = Motion { fps, ..NOMINAL };

            let mut last = b.radius();
            for _ in 0..200 {
                b.update(&motion, &mut rng);
                prop_assert!(b.radius() >= last);
                prop_assert!(b.radius() <= b.max_radius());
                last = b.radius();
            }
        }
    }

    #[test]
    fn grows_fast_when_small() {
        let mut rng = seeded(Some(3));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.force_max_radius(10.0);
        b.place(50.0, 50.0, 2.0);

        // 10 / (1.0 * 2) at the nominal rate.
        b.update(&NOMINAL, &mut rng);
        assert!((b.radius() - 7.0).abs() < 1e-5);

        // 10 / 7 is less than the remaining gap of 3.
        b.update(&NOMINAL, &mut rng);
        assert!((b.radius() - (7.0 + 10.0 / 7.0)).abs() < 1e-5);
    }

    #[test]
    fn growth_clamps_to_target() {
        let mut rng = seeded(Some(4));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.force_max_radius(5.0);

        b.update(&NOMINAL, &mut rng);
        assert_eq!(b.radius(), 5.0);
    }

    #[test]
    fn rise_is_logarithmic_in_radius() {
        let mut rng = seeded(Some(5));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.force_max_radius(8.0);
        b.place(50.0, 50.0, 8.0);

        b.update(&NOMINAL, &mut rng);

        let expected = 50.0 - 8.0f32.ln() * 25.0 / NOMINAL_FPS;
        assert!((b.y() - expected).abs() < 1e-5);
        assert!((b.x() - 50.0).abs() <= 1.0);
    }

    #[test]
    fn rise_scales_with_measured_fps() {
        let mut rng = seeded(Some(6));
        let mut slow = Bubble::new(100, 100, 11, &mut rng);
        slow.force_max_radius(8.0);
        slow.place(50.0, 50.0, 8.0);
        let mut fast = slow;

        slow.update(&Motion { fps: 25.0, ..NOMINAL }, &mut rng);
        fast.update(&Motion { fps: 50.0, ..NOMINAL }, &mut rng);

        let slow_rise = 50.0 - slow.y();
        let fast_rise = 50.0 - fast.y();
        assert!((slow_rise - 2.0 * fast_rise).abs() < 1e-4);
    }

    #[test]
    fn tilt_leans_sideways_and_slows_rise() {
        let mut rng = seeded(Some(8));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.force_max_radius(8.0);
        b.place(50.0, 50.0, 8.0);

        let tilted = Motion {
            roll: 90.0,
            tilt: true,
            ..NOMINAL
        };
        b.update(&tilted, &mut rng);

        let speed = 8.0f32.ln();
        assert!((b.y() - 50.0).abs() < 1e-5);
        assert!(b.x() >= 50.0 + speed - 1.0 - 1e-4);
    }

    #[test]
    fn tilt_ignored_when_disabled() {
        let mut rng = seeded(Some(9));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.force_max_radius(8.0);
        b.place(50.0, 50.0, 8.0);

        b.update(&Motion { roll: 90.0, ..NOMINAL }, &mut rng);

        assert!((b.y() - (50.0 - 8.0f32.ln())).abs() < 1e-5);
    }

    #[test]
    fn popped_bubble_stays_put() {
        let mut rng = seeded(Some(10));
        let mut b = Bubble::new(100, 100, 11, &mut rng);
        b.place(20.0, 30.0, 2.0);
        b.pop();

        b.update(&NOMINAL, &mut rng);
        assert_eq!((b.x(), b.y(), b.radius()), (20.0, 30.0, 2.0));
    }

    #[test]
    fn offscreen_edges() {
        let mut rng = seeded(Some(11));
        let mut b = Bubble::new(100, 100, 11, &mut rng);

        let cases = [
            // top, with the margin
            ((50.0, -25.0, 5.0), true),
            ((50.0, -24.0, 5.0), false),
            // bottom
            ((50.0, 105.0, 5.0), true),
            ((50.0, 104.0, 5.0), false),
            // left
            ((-5.0, 50.0, 5.0), true),
            ((-4.0, 50.0, 5.0), false),
            // right
            ((105.0, 50.0, 5.0), true),
            ((104.0, 50.0, 5.0), false),
        ];

        for ((x, y, r), expected) in cases {
            b.place(x, y, r);
            assert_eq!(b.is_offscreen(100, 100), expected, "at ({x}, {y}) r={r}");
        }
    }
}
