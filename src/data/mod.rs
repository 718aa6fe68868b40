pub mod config;
pub mod log;
pub mod scheduler;
pub mod sensor;

use std::{sync::Arc, time::Instant};

use ::log::{debug, info, trace, warn};

use crate::{
    graphics::{Canvas, Surface},
    math::rng::SimRng,
    sim::{BackgroundDrift, BubbleField, Motion, Rgb},
};
use config::{Config, Preferences, SettingKey, MAX_BUBBLES};
use scheduler::FrameScheduler;
use sensor::TiltSource;

pub const BUBBLE_COLOR: Rgb = Rgb::WHITE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Invisible; nothing ran and nothing was scheduled.
    Hidden,
    /// No canvas this time around.
    Skipped,
    /// Drawn but lost on the way to the screen.
    Dropped,
    Drawn,
}

#[derive(Debug, Clone, PartialEq)]
enum Reload {
    All,
    Keys(Vec<SettingKey>),
}

/// Main program struct.
///
/// Owns the simulation and reacts to the host: visibility, resizes,
/// configuration changes and frame ticks. Configuration changes are only
/// queued by [`Program::on_config_changed`] and picked up at the start of
/// the next frame.
pub struct Program {
    prefs: Box<dyn Preferences>,
    config: Config,
    pending: Option<Reload>,

    field: BubbleField,
    drift: BackgroundDrift,
    scheduler: FrameScheduler,

    tilt: Arc<dyn TiltSource>,
    rng: SimRng,

    visible: bool,
    size: (u32, u32),
    frames: u64,
}

impl Program {
    pub fn new(mut prefs: Box<dyn Preferences>, tilt: Arc<dyn TiltSource>, rng: SimRng) -> Self {
        let config = Config::load(prefs.as_mut());

        Self {
            scheduler: FrameScheduler::new(config.target_fps),
            drift: BackgroundDrift::new(config.background),
            field: BubbleField::new(),
            config,
            prefs,
            pending: None,
            tilt,
            rng,
            visible: false,
            size: (0, 0),
            frames: 0,
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub fn field(&self) -> &BubbleField {
        &self.field
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn print_startup_info(&self) {
        info!(
            "Bubbles: {} bubbles up to {}px, {} fps, speed {}.",
            self.config.bubble_count,
            self.config.max_bubble_size,
            self.config.target_fps,
            self.config.speed_factor
        );

        info!(
            "Background {}, color shift {}, blur {}, tilt {}.",
            self.config.background,
            on_off(self.config.color_shift),
            on_off(self.config.blur),
            on_off(self.config.tilt)
        );
    }

    pub fn on_became_visible(&mut self) {
        self.visible = true;

        if self.config.tilt && !self.tilt.is_enabled() {
            self.tilt.enable();
        }

        self.scheduler.arm_now(Instant::now());
    }

    pub fn on_became_hidden(&mut self) {
        debug!("Hidden after {} frames.", self.frames);
        self.scheduler.cancel();
        self.visible = false;
        self.tilt.disable();
    }

    pub fn on_surface_resized(&mut self, width: u32, height: u32) {
        debug!("Surface resized to {}x{}.", width, height);
        self.size = (width, height);

        if self.visible {
            self.scheduler.arm_now(Instant::now());
        }
    }

    /// `None` means every setting may have changed.
    pub fn on_config_changed(&mut self, key: Option<&str>) {
        let Some(name) = key else {
            self.pending = Some(Reload::All);
            return;
        };

        let Some(key) = SettingKey::from_name(name) else {
            debug!("Ignoring change to unknown setting `{}`.", name);
            return;
        };

        match self.pending.get_or_insert(Reload::Keys(Vec::new())) {
            Reload::All => {}
            Reload::Keys(keys) => {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
    }

    /// Stores a setting and queues it for the next frame.
    pub fn set_preference(&mut self, key: SettingKey, value: impl Into<String>) {
        self.prefs.set(key.name(), value.into());
        self.on_config_changed(Some(key.name()));
    }

    /// Flips an on/off setting and returns its new value. Changes still
    /// waiting for the next frame count.
    pub fn toggle_setting(&mut self, key: SettingKey) -> Option<bool> {
        let staged = self.staged(key);

        let current = match key {
            SettingKey::ColorShift => staged.color_shift,
            SettingKey::Blur => staged.blur,
            SettingKey::Sensor => staged.tilt,
            _ => return None,
        };

        self.set_preference(key, (!current).to_string());
        Some(!current)
    }

    /// Rescales the bubble count, starting from any count not yet applied.
    pub fn rescale_bubbles(&mut self, f: impl FnOnce(usize) -> usize) -> usize {
        let current = self.staged(SettingKey::BubbleCount).bubble_count;
        let count = f(current).clamp(1, MAX_BUBBLES);

        self.set_preference(SettingKey::BubbleCount, count.to_string());
        count
    }

    /// The config as it will be once `key` is reloaded.
    fn staged(&mut self, key: SettingKey) -> Config {
        let mut staged = self.config.clone();
        staged.apply(self.prefs.as_mut(), key);
        staged
    }

    fn apply_pending(&mut self) {
        let keys = match self.pending.take() {
            None => return,
            Some(Reload::All) => SettingKey::RELOAD_ALL.to_vec(),
            Some(Reload::Keys(keys)) => keys,
        };

        for key in keys {
            self.config.apply(self.prefs.as_mut(), key);

            match key {
                SettingKey::Fps => self.scheduler.set_target_fps(self.config.target_fps),

                SettingKey::ColorEnter | SettingKey::ColorSelect => {
                    self.drift.set_color(self.config.background)
                }

                SettingKey::Sensor if self.visible => {
                    if self.config.tilt {
                        self.tilt.enable();
                    } else {
                        self.tilt.disable();
                    }
                }

                _ => {}
            }

            debug!("Reloaded `{}`.", key.name());
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn is_frame_due(&self, now: Instant) -> bool {
        self.scheduler.is_due(now)
    }

    /// Runs one tick: update, draw, commit, then arm the next tick.
    pub fn draw_frame<S: Surface>(&mut self, surface: &mut S, frame_start: Instant) -> FrameOutcome {
        if !self.visible {
            return FrameOutcome::Hidden;
        }

        self.apply_pending();

        let outcome = match surface.begin_frame() {
            None => {
                debug!("Skipping frame, no canvas available.");
                FrameOutcome::Skipped
            }

            Some(mut canvas) => {
                self.render(&mut canvas);

                match surface.commit(canvas) {
                    Ok(()) => {
                        self.scheduler.frame_committed(Instant::now());
                        self.frames += 1;
                        FrameOutcome::Drawn
                    }

                    Err(e) => {
                        warn!("Dropping frame: {e}.");
                        FrameOutcome::Dropped
                    }
                }
            }
        };

        self.scheduler.schedule_next(frame_start, Instant::now());

        outcome
    }

    fn render<C: Canvas>(&mut self, canvas: &mut C) {
        let (w, h) = canvas.size();
        self.size = (w, h);

        let bound = self.config.max_bubble_size;

        self.field
            .ensure_size(self.config.bubble_count, w, h, bound, &mut self.rng);

        let background = self
            .drift
            .step(self.config.color_shift, self.config.target_fps, &mut self.rng);

        canvas.draw_background(background);
        canvas.set_blur(self.config.blur);

        let motion = Motion {
            fps: self.scheduler.current_fps(),
            speed_factor: self.config.speed_factor as f32,
            roll: self.tilt.current_roll(),
            tilt: self.config.tilt,
        };
        let held = self.tilt.held();

        for s in self.field.tick(&motion, w, h, bound, held, &mut self.rng) {
            canvas.draw_circle(s.x, s.y, s.radius, BUBBLE_COLOR, s.alpha);
        }

        trace!("{} bubbles recycled.", self.field.recycled_last_tick());
    }
}

fn on_off(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{config::MemoryPreferences, sensor::SharedTilt},
        graphics::SurfaceError,
        math::rng::seeded,
    };

    #[derive(Default)]
    struct Recorder {
        size: (u32, u32),
        background: Option<Rgb>,
        circles: Vec<(f32, f32, f32, u8)>,
        blur: bool,
    }

    impl Canvas for Recorder {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn draw_background(&mut self, color: Rgb) {
            self.background = Some(color);
        }

        fn draw_circle(&mut self, x: f32, y: f32, radius: f32, _color: Rgb, alpha: u8) {
            self.circles.push((x, y, radius, alpha));
        }

        fn set_blur(&mut self, enabled: bool) {
            self.blur = enabled;
        }
    }

    struct TestSurface {
        size: (u32, u32),
        available: bool,
        fail_commit: bool,
        committed: Vec<Recorder>,
        handed_out: usize,
    }

    impl TestSurface {
        fn new(w: u32, h: u32) -> Self {
            Self {
                size: (w, h),
                available: true,
                fail_commit: false,
                committed: Vec::new(),
                handed_out: 0,
            }
        }
    }

    impl Surface for TestSurface {
        type Canvas = Recorder;

        fn begin_frame(&mut self) -> Option<Recorder> {
            if !self.available {
                return None;
            }

            self.handed_out += 1;
            Some(Recorder {
                size: self.size,
                ..Recorder::default()
            })
        }

        fn commit(&mut self, canvas: Recorder) -> Result<(), SurfaceError> {
            self.handed_out -= 1;

            if self.fail_commit {
                return Err(SurfaceError::Gone);
            }

            self.committed.push(canvas);
            Ok(())
        }
    }

    fn program(prefs: MemoryPreferences) -> (Program, Arc<SharedTilt>) {
        let tilt = Arc::new(SharedTilt::new());
        let prog = Program::new(Box::new(prefs), tilt.clone(), seeded(Some(99)));
        (prog, tilt)
    }

    #[test]
    fn hidden_program_does_not_tick() {
        let (mut prog, _) = program(MemoryPreferences::new());
        let mut surface = TestSurface::new(100, 100);

        assert_eq!(prog.draw_frame(&mut surface, Instant::now()), FrameOutcome::Hidden);
        assert!(surface.committed.is_empty());
        assert_eq!(prog.next_deadline(), None);
    }

    #[test]
    fn visible_frame_draws_background_then_bubbles() {
        let (mut prog, _) = program(
            MemoryPreferences::new()
                .with("bubble_count", "7")
                .with("blur", "true"),
        );
        let mut surface = TestSurface::new(120, 80);

        prog.on_became_visible();
        assert!(prog.is_frame_due(Instant::now()));

        assert_eq!(prog.draw_frame(&mut surface, Instant::now()), FrameOutcome::Drawn);

        let frame = &surface.committed[0];
        assert_eq!(frame.background, Some(Rgb::new(0x11, 0x22, 0x55)));
        assert_eq!(frame.circles.len(), 7);
        assert!(frame.blur);
        assert_eq!(prog.size(), (120, 80));
        assert_eq!(prog.frames(), 1);
        assert!(prog.next_deadline().is_some());
    }

    #[test]
    fn missing_canvas_skips_but_keeps_scheduling() {
        let (mut prog, _) = program(MemoryPreferences::new());
        let mut surface = TestSurface::new(100, 100);
        surface.available = false;

        prog.on_became_visible();
        let start = Instant::now();
        assert_eq!(prog.draw_frame(&mut surface, start), FrameOutcome::Skipped);

        let deadline = prog.next_deadline().unwrap();
        assert!(deadline > start);
        assert_eq!(prog.frames(), 0);
    }

    #[test]
    fn failed_commit_is_not_fatal() {
        let (mut prog, _) = program(MemoryPreferences::new().with("bubble_count", "3"));
        let mut surface = TestSurface::new(100, 100);
        surface.fail_commit = true;

        prog.on_became_visible();
        assert_eq!(prog.draw_frame(&mut surface, Instant::now()), FrameOutcome::Dropped);
        assert_eq!(surface.handed_out, 0);
        assert!(prog.next_deadline().is_some());

        surface.fail_commit = false;
        assert_eq!(prog.draw_frame(&mut surface, Instant::now()), FrameOutcome::Drawn);
        assert_eq!(surface.committed.len(), 1);
    }

    #[test]
    fn config_change_waits_for_next_frame() {
        let (mut prog, _) = program(MemoryPreferences::new().with("bubble_count", "4"));
        let mut surface = TestSurface::new(100, 100);
        prog.on_became_visible();
        prog.draw_frame(&mut surface, Instant::now());
        assert_eq!(prog.field().len(), 4);

        prog.set_preference(SettingKey::BubbleCount, "9");
        assert_eq!(prog.config().bubble_count, 4);
        assert_eq!(prog.field().len(), 4);

        prog.draw_frame(&mut surface, Instant::now());
        assert_eq!(prog.config().bubble_count, 9);
        assert_eq!(prog.field().len(), 9);
        assert_eq!(surface.committed[1].circles.len(), 9);
        assert_eq!(prog.field().rebuilds(), 2);
    }

    #[test]
    fn same_count_does_not_rebuild() {
        let (mut prog, _) = program(MemoryPreferences::new().with("bubble_count", "4"));
        let mut surface = TestSurface::new(100, 100);
        prog.on_became_visible();

        prog.set_preference(SettingKey::BubbleCount, "4");
        prog.on_config_changed(None);
        for _ in 0..3 {
            prog.draw_frame(&mut surface, Instant::now());
        }

        assert_eq!(prog.field().rebuilds(), 1);
    }

    #[test]
    fn fps_change_retargets_scheduler() {
        let (mut prog, _) = program(MemoryPreferences::new());
        let mut surface = TestSurface::new(100, 100);
        prog.on_became_visible();

        prog.set_preference(SettingKey::Fps, "50");
        prog.draw_frame(&mut surface, Instant::now());

        assert_eq!(prog.scheduler().target_fps(), 50);
        assert_eq!(prog.scheduler().current_fps(), 50.0);
    }

    #[test]
    fn color_change_resets_background() {
        let (mut prog, _) = program(MemoryPreferences::new());
        let mut surface = TestSurface::new(100, 100);
        prog.on_became_visible();

        prog.set_preference(SettingKey::ColorEnter, "204060");
        prog.draw_frame(&mut surface, Instant::now());

        assert_eq!(surface.committed[0].background, Some(Rgb::new(0x20, 0x40, 0x60)));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (mut prog, _) = program(MemoryPreferences::new());
        prog.on_config_changed(Some("wallpaper_mode"));
        assert_eq!(prog.pending, None);

        prog.on_config_changed(Some("fps"));
        prog.on_config_changed(Some("fps"));
        assert_eq!(prog.pending, Some(Reload::Keys(vec![SettingKey::Fps])));

        prog.on_config_changed(None);
        prog.on_config_changed(Some("blur"));
        assert_eq!(prog.pending, Some(Reload::All));
    }

    #[test]
    fn visibility_toggles_scheduling_and_sensor() {
        let (mut prog, tilt) = program(MemoryPreferences::new().with("enable_sensor", "Enable"));

        prog.on_became_visible();
        assert!(tilt.is_enabled());
        assert!(prog.next_deadline().is_some());

        prog.on_became_hidden();
        assert!(!tilt.is_enabled());
        assert_eq!(prog.next_deadline(), None);
        assert!(!prog.is_visible());
    }

    #[test]
    fn resize_requests_a_refresh() {
        let (mut prog, _) = program(MemoryPreferences::new());
        prog.on_surface_resized(640, 480);
        assert_eq!(prog.next_deadline(), None);

        prog.on_became_visible();
        let mut surface = TestSurface::new(640, 480);
        prog.draw_frame(&mut surface, Instant::now());

        prog.on_surface_resized(320, 240);
        assert!(prog.is_frame_due(Instant::now()));
        assert_eq!(prog.size(), (320, 240));
    }

    #[test]
    fn double_toggle_within_a_frame_cancels_out() {
        let (mut prog, _) = program(MemoryPreferences::new());
        prog.on_became_visible();

        assert_eq!(prog.toggle_setting(SettingKey::ColorShift), Some(true));
        assert_eq!(prog.toggle_setting(SettingKey::ColorShift), Some(false));
        assert_eq!(prog.toggle_setting(SettingKey::Fps), None);

        let mut surface = TestSurface::new(50, 50);
        prog.draw_frame(&mut surface, Instant::now());
        assert!(!prog.config().color_shift);

        assert_eq!(prog.toggle_setting(SettingKey::Blur), Some(true));
        prog.draw_frame(&mut surface, Instant::now());
        assert!(prog.config().blur);
    }

    #[test]
    fn rescaling_builds_on_pending_count() {
        let (mut prog, _) = program(MemoryPreferences::new().with("bubble_count", "10"));
        prog.on_became_visible();

        assert_eq!(prog.rescale_bubbles(|n| n * 2), 20);
        assert_eq!(prog.rescale_bubbles(|n| n * 2), 40);
        assert_eq!(prog.rescale_bubbles(|_| 0), 1);
        assert_eq!(prog.rescale_bubbles(|_| usize::MAX), MAX_BUBBLES);

        let mut surface = TestSurface::new(50, 50);
        prog.draw_frame(&mut surface, Instant::now());
        assert_eq!(prog.field().len(), MAX_BUBBLES);
    }
}
