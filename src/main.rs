mod data;
mod graphics;
mod math;
mod modes;
mod sim;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;

use data::{
    config::{MemoryPreferences, Preferences, SettingKey},
    sensor::SharedTilt,
    Program,
};
use modes::windowed_mode::{winit_main, WindowOptions};

/// Rising, growing, popping bubbles over a slowly drifting background.
#[derive(Parser, Debug)]
#[command(name = "bubbles", version, about)]
struct Args {
    /// Number of bubbles on screen.
    #[arg(long)]
    count: Option<usize>,

    /// Upper bound (exclusive) for bubble radii, in pixels. Must exceed 3.
    #[arg(long)]
    size: Option<u32>,

    /// Target frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Rise speed factor.
    #[arg(long)]
    speed: Option<u32>,

    /// Soft bubble edges.
    #[arg(long)]
    blur: bool,

    /// Let the background color wander.
    #[arg(long)]
    color_shift: bool,

    /// Background color, e.g. `#112255`.
    #[arg(long)]
    color: Option<String>,

    /// Let the roll angle (arrow keys) lean the bubbles.
    #[arg(long)]
    tilt: bool,

    /// Seed for a reproducible animation.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 480)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Lock the window size.
    #[arg(long)]
    fixed_size: bool,

    /// Only print warnings and errors.
    #[arg(long, short)]
    quiet: bool,

    /// Raw setting, e.g. `--set bubble_speed=40`. May be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_setting)]
    settings: Vec<(String, String)>,
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;

    Ok((key.trim().to_owned(), value.trim().to_owned()))
}

impl Args {
    fn preferences(&self) -> MemoryPreferences {
        let mut prefs = MemoryPreferences::new();

        for (key, value) in &self.settings {
            if SettingKey::from_name(key).is_none() {
                log::warn!("Unknown setting `{key}`; it will be ignored.");
            }
            prefs.set(key, value.clone());
        }

        let typed = [
            (SettingKey::BubbleCount, self.count.map(|v| v.to_string())),
            (SettingKey::BubbleSize, self.size.map(|v| v.to_string())),
            (SettingKey::Fps, self.fps.map(|v| v.to_string())),
            (SettingKey::BubbleSpeed, self.speed.map(|v| v.to_string())),
            (SettingKey::ColorEnter, self.color.clone()),
            (SettingKey::Blur, self.blur.then(|| "true".to_owned())),
            (SettingKey::ColorShift, self.color_shift.then(|| "true".to_owned())),
            (SettingKey::Sensor, self.tilt.then(|| "true".to_owned())),
        ];

        for (key, value) in typed {
            if let Some(value) = value {
                prefs.set(key.name(), value);
            }
        }

        prefs
    }

    fn window_options(&self) -> WindowOptions {
        WindowOptions {
            width: self.width.max(1),
            height: self.height.max(1),
            resizable: !self.fixed_size,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = data::log::init(args.quiet) {
        eprintln!("bubbles: unable to set up logging: {e}");
    }

    let tilt = Arc::new(SharedTilt::new());
    let prog = Program::new(
        Box::new(args.preferences()),
        tilt.clone(),
        math::rng::seeded(args.seed),
    );

    match winit_main(prog, tilt, args.window_options()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Bubbles stopped: {e}.");
            ExitCode::FAILURE
        }
    }
}
