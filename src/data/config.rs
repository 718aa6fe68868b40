use std::{collections::HashMap, num::ParseIntError};

use log::{debug, warn};
use thiserror::Error;

use crate::sim::Rgb;

pub const DEFAULT_FPS: u32 = 25;
pub const DEFAULT_BUBBLES: usize = 128;
pub const DEFAULT_BUBBLE_SIZE: u32 = 10;
pub const DEFAULT_SPEED: u32 = 25;
/// What a malformed speed falls back to. Deliberately not the default.
pub const SPEED_FALLBACK: u32 = 60;
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x11, 0x22, 0x55);

pub const MAX_FPS: u32 = 1000;
pub const MAX_BUBBLES: usize = u16::MAX as usize;
pub const MAX_BUBBLE_SIZE: u32 = 1000;

/// String-keyed settings store, the way the host persists them.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_owned(), value.into());
        self
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_owned(), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Fps,
    BubbleCount,
    BubbleSize,
    BubbleSpeed,
    Blur,
    ColorShift,
    /// The background color as typed in.
    ColorEnter,
    /// A color picked from the palette; copied into [`SettingKey::ColorEnter`].
    ColorSelect,
    Sensor,
}

impl SettingKey {
    /// Everything a full reload reads. The palette key is only an input
    /// for `col_enter` and is not part of it.
    pub const RELOAD_ALL: [SettingKey; 8] = [
        SettingKey::Fps,
        SettingKey::Sensor,
        SettingKey::ColorEnter,
        SettingKey::BubbleCount,
        SettingKey::BubbleSize,
        SettingKey::ColorShift,
        SettingKey::BubbleSpeed,
        SettingKey::Blur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::Fps => "fps",
            SettingKey::BubbleCount => "bubble_count",
            SettingKey::BubbleSize => "bubble_size",
            SettingKey::BubbleSpeed => "bubble_speed",
            SettingKey::Blur => "blur",
            SettingKey::ColorShift => "col_shift",
            SettingKey::ColorEnter => "col_enter",
            SettingKey::ColorSelect => "col_select",
            SettingKey::Sensor => "enable_sensor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::RELOAD_ALL
            .into_iter()
            .chain([SettingKey::ColorSelect])
            .find(|k| k.name() == name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{key}` = {value:?} is not a number")]
    Malformed {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("`{key}` = {value} is out of range {min}..={max}")]
    OutOfRange {
        key: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("`{key}` = {value:?} is not a color")]
    Color { key: &'static str, value: String },

    #[error("`{key}` = {value:?} is not a switch")]
    Switch { key: &'static str, value: String },
}

/// Snapshot the simulation reads from. Only changes between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bubble_count: usize,
    pub max_bubble_size: u32,
    pub target_fps: u32,
    pub speed_factor: u32,
    pub blur: bool,
    pub color_shift: bool,
    pub background: Rgb,
    pub tilt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bubble_count: DEFAULT_BUBBLES,
            max_bubble_size: DEFAULT_BUBBLE_SIZE,
            target_fps: DEFAULT_FPS,
            speed_factor: DEFAULT_SPEED,
            blur: false,
            color_shift: false,
            background: DEFAULT_BACKGROUND,
            tilt: false,
        }
    }
}

fn parse_int(key: SettingKey, raw: &str, min: i64, max: i64) -> Result<i64, ConfigError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|source| ConfigError::Malformed {
            key: key.name(),
            value: raw.to_owned(),
            source,
        })?;

    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            key: key.name(),
            value,
            min,
            max,
        });
    }

    Ok(value)
}

fn parse_switch(key: SettingKey, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enable" => Ok(true),
        "false" | "0" | "no" | "off" | "disable" => Ok(false),
        _ => Err(ConfigError::Switch {
            key: key.name(),
            value: raw.to_owned(),
        }),
    }
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("darkgray", 0x444444),
    ("gray", 0x888888),
    ("grey", 0x888888),
    ("lightgray", 0xCCCCCC),
    ("white", 0xFFFFFF),
    ("red", 0xFF0000),
    ("green", 0x00FF00),
    ("blue", 0x0000FF),
    ("yellow", 0xFFFF00),
    ("cyan", 0x00FFFF),
    ("magenta", 0xFF00FF),
];

/// Accepts `#RRGGBB`, `#AARRGGBB` (alpha is dropped), the same without the
/// leading `#`, and a handful of color names.
pub fn parse_color(raw: &str) -> Option<Rgb> {
    let raw = raw.trim();

    if let Some(&(_, c)) = NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
    {
        return Some(Rgb::from_argb(c));
    }

    let hex = raw.strip_prefix('#').unwrap_or(raw);

    if !matches!(hex.len(), 6 | 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(hex, 16).ok().map(Rgb::from_argb)
}

impl Config {
    pub fn load(prefs: &mut dyn Preferences) -> Self {
        let mut config = Self::default();
        config.reload(prefs, None);
        config
    }

    /// Rereads one setting, or every setting for `None`.
    pub fn reload(&mut self, prefs: &mut dyn Preferences, key: Option<SettingKey>) {
        match key {
            Some(key) => self.apply(prefs, key),
            None => SettingKey::RELOAD_ALL
                .into_iter()
                .for_each(|key| self.apply(prefs, key)),
        }
    }

    /// Rereads a single setting, falling back to its default when the stored
    /// value does not make sense.
    pub fn apply(&mut self, prefs: &mut dyn Preferences, key: SettingKey) {
        let stored = prefs.get(key.name());

        match key {
            SettingKey::Fps => {
                let raw = stored.unwrap_or_else(|| DEFAULT_FPS.to_string());
                self.target_fps = parse_int(key, &raw, 1, MAX_FPS as i64)
                    .map(|v| v as u32)
                    .unwrap_or_else(|e| fallback(e, DEFAULT_FPS));
            }

            SettingKey::BubbleCount => {
                let raw = stored.unwrap_or_else(|| DEFAULT_BUBBLES.to_string());
                match parse_int(key, &raw, 0, MAX_BUBBLES as i64) {
                    Ok(0) => debug!("Ignoring a bubble count of 0."),
                    Ok(v) => self.bubble_count = v as usize,
                    Err(e) => self.bubble_count = fallback(e, DEFAULT_BUBBLES),
                }
            }

            SettingKey::BubbleSize => {
                let raw = stored.unwrap_or_else(|| DEFAULT_BUBBLE_SIZE.to_string());
                self.max_bubble_size = parse_int(key, &raw, 4, MAX_BUBBLE_SIZE as i64)
                    .map(|v| v as u32)
                    .unwrap_or_else(|e| fallback(e, DEFAULT_BUBBLE_SIZE));
            }

            SettingKey::BubbleSpeed => {
                let raw = stored.unwrap_or_else(|| DEFAULT_SPEED.to_string());
                self.speed_factor = parse_int(key, &raw, 1, u16::MAX as i64)
                    .map(|v| v as u32)
                    .unwrap_or_else(|e| fallback(e, SPEED_FALLBACK));
            }

            SettingKey::Blur => {
                self.blur = stored
                    .map(|raw| parse_switch(key, &raw).unwrap_or_else(|e| fallback(e, false)))
                    .unwrap_or(false);
            }

            SettingKey::ColorShift => {
                self.color_shift = stored
                    .map(|raw| parse_switch(key, &raw).unwrap_or_else(|e| fallback(e, false)))
                    .unwrap_or(false);
            }

            SettingKey::Sensor => {
                self.tilt = stored
                    .map(|raw| parse_switch(key, &raw).unwrap_or_else(|e| fallback(e, false)))
                    .unwrap_or(false);
            }

            SettingKey::ColorEnter => {
                self.background = match stored {
                    None => DEFAULT_BACKGROUND,
                    Some(raw) => parse_color(&raw).unwrap_or_else(|| {
                        fallback(
                            ConfigError::Color {
                                key: key.name(),
                                value: raw,
                            },
                            DEFAULT_BACKGROUND,
                        )
                    }),
                };
            }

            SettingKey::ColorSelect => {
                if let Some(picked) = stored {
                    prefs.set(SettingKey::ColorEnter.name(), picked);
                    self.apply(prefs, SettingKey::ColorEnter);
                }
            }
        }
    }
}

fn fallback<T: std::fmt::Debug>(err: ConfigError, default: T) -> T {
    warn!("{err}, using {default:?} instead.");
    default
}
