//! Configuration loading and hot reload.
//!
//! The config file is JSON; every field carries a serde default, so a
//! reload re-parses from scratch and fields absent in the new file revert
//! to their defaults rather than keeping their previous values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::{MouseButton, WheelDirection};

const SOUND_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    pub enabled: bool,
    pub sounds_dir: String,
    pub left_down: String,
    pub left_up: String,
    pub right_down: String,
    pub right_up: String,
    pub middle_down: String,
    pub middle_up: String,
    pub x1_down: String,
    pub x1_up: String,
    pub x2_down: String,
    pub x2_up: String,
    pub wheel_up: String,
    pub wheel_down: String,
    pub enable_side_buttons: bool,
    pub enable_scroll_wheel: bool,
    pub scroll_wheel_debounce_ms: u64,
    pub volume: f32,
    pub enable_fade_out: bool,
    pub fade_out_duration_ms: u64,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sounds_dir: "sounds".to_string(),
            left_down: String::new(),
            left_up: String::new(),
            right_down: String::new(),
            right_up: String::new(),
            middle_down: String::new(),
            middle_up: String::new(),
            x1_down: String::new(),
            x1_up: String::new(),
            x2_down: String::new(),
            x2_up: String::new(),
            wheel_up: String::new(),
            wheel_down: String::new(),
            enable_side_buttons: true,
            enable_scroll_wheel: true,
            scroll_wheel_debounce_ms: 50,
            volume: 1.0,
            enable_fade_out: false,
            fade_out_duration_ms: 150,
        }
    }
}

impl MouseConfig {
    /// Full path of the sound for a button transition, or `None` when no
    /// file is configured.
    pub fn button_sound(&self, button: MouseButton, down: bool) -> Option<PathBuf> {
        let name = match (button, down) {
            (MouseButton::Left, true) => &self.left_down,
            (MouseButton::Left, false) => &self.left_up,
            (MouseButton::Right, true) => &self.right_down,
            (MouseButton::Right, false) => &self.right_up,
            (MouseButton::Middle, true) => &self.middle_down,
            (MouseButton::Middle, false) => &self.middle_up,
            (MouseButton::X1, true) => &self.x1_down,
            (MouseButton::X1, false) => &self.x1_up,
            (MouseButton::X2, true) => &self.x2_down,
            (MouseButton::X2, false) => &self.x2_up,
        };
        self.join(name)
    }

    pub fn wheel_sound(&self, direction: WheelDirection) -> Option<PathBuf> {
        let name = match direction {
            WheelDirection::Up => &self.wheel_up,
            WheelDirection::Down => &self.wheel_down,
        };
        self.join(name)
    }

    fn join(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            None
        } else {
            Some(Path::new(&self.sounds_dir).join(name))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub enabled: bool,
    pub sounds_dir: String,
    /// Scan `sounds_dir` for sound files instead of using the explicit
    /// `sounds` list.
    pub random_sounds: bool,
    /// Re-roll the sound whenever a different key is pressed, instead of
    /// keeping a stable per-key assignment.
    pub totally_random_keypresses: bool,
    pub disable_repeat: bool,
    pub no_repeat_keys: Vec<String>,
    pub excluded_keys: Vec<String>,
    pub key_repeat_debounce_ms: u64,
    pub sounds: Vec<String>,
    pub volume: f32,
    pub enable_fade_out: bool,
    pub fade_out_duration_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sounds_dir: "sounds".to_string(),
            random_sounds: true,
            totally_random_keypresses: false,
            disable_repeat: false,
            no_repeat_keys: Vec::new(),
            excluded_keys: Vec::new(),
            key_repeat_debounce_ms: 30,
            sounds: Vec::new(),
            volume: 1.0,
            enable_fade_out: false,
            fade_out_duration_ms: 150,
        }
    }
}

impl KeyboardConfig {
    /// The pool of keyboard sounds: a directory scan in random mode, the
    /// explicit list otherwise.
    pub fn sound_paths(&self) -> Vec<PathBuf> {
        if self.random_sounds {
            sounds_from_directory(Path::new(&self.sounds_dir))
        } else {
            self.sounds
                .iter()
                .filter(|name| !name.is_empty())
                .map(|name| Path::new(&self.sounds_dir).join(name))
                .collect()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    pub enabled: bool,
    pub wetness: f32,
    pub room_size: f32,
    pub damping: f32,
    pub width: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            wetness: 0.5,
            room_size: 0.5,
            damping: 0.5,
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    pub enabled: bool,
    pub delay_seconds: f32,
    pub decay: f32,
    pub taps: u32,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_seconds: 0.3,
            decay: 0.4,
            taps: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatializerConfig {
    pub enabled: bool,
    pub spread: f32,
    pub distance: f32,
    pub randomize: bool,
}

impl Default for SpatializerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spread: 1.0,
            distance: 1.0,
            randomize: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub reverb: ReverbConfig,
    pub echo: EchoConfig,
    pub spatializer: SpatializerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub async_playback: bool,
    pub max_concurrent_sounds: usize,
    pub master_volume: f32,
    pub effects: EffectsConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            async_playback: true,
            max_concurrent_sounds: 32,
            master_volume: 1.0,
            effects: EffectsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mouse: MouseConfig,
    pub keyboard: KeyboardConfig,
    pub audio: AudioConfig,

    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Load configuration from `path`. A missing file yields defaults with
    /// a warning; malformed JSON is an error so a typo cannot silently wipe
    /// the settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            let mut config = Config::default();
            config.path = path.to_path_buf();
            return Ok(config);
        }

        let mut config = Self::parse_file(path)?;
        config.path = path.to_path_buf();
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Re-parse from the original file. Fields absent in the new file
    /// revert to defaults; on failure the previous configuration stays in
    /// place.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let mut fresh = Self::parse_file(&self.path)?;
        fresh.path = self.path.clone();
        *self = fresh;
        tracing::info!("Reloaded config from {}", self.path.display());
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Collect playable sound files from a directory, sorted for a stable
/// per-key assignment across runs.
pub fn sounds_from_directory(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Sound directory {} not readable: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut sounds: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SOUND_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    sounds.sort();
    sounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.mouse.enabled);
        assert!(config.keyboard.enabled);
        assert!(config.audio.async_playback);
        assert_eq!(config.audio.max_concurrent_sounds, 32);
        assert_eq!(config.audio.master_volume, 1.0);
        assert!(!config.audio.effects.reverb.enabled);
        assert!(!config.audio.effects.echo.enabled);
        assert!(!config.audio.effects.spatializer.enabled);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"audio": {"master_volume": 0.5}}"#).unwrap();

        assert_eq!(config.audio.master_volume, 0.5);
        // Everything else reverts to defaults, not previous values.
        assert_eq!(config.audio.max_concurrent_sounds, 32);
        assert!(config.mouse.enabled);
        assert_eq!(config.keyboard.key_repeat_debounce_ms, 30);
    }

    #[test]
    fn test_effects_round_trip() {
        let mut config = Config::default();
        config.audio.effects.reverb.enabled = true;
        config.audio.effects.reverb.room_size = 0.8;
        config.audio.effects.echo.enabled = true;
        config.audio.effects.echo.delay_seconds = 0.25;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert!(parsed.audio.effects.reverb.enabled);
        assert_eq!(parsed.audio.effects.reverb.room_size, 0.8);
        assert_eq!(parsed.audio.effects.echo.delay_seconds, 0.25);
    }

    #[test]
    fn test_button_sound_paths() {
        let mut mouse = MouseConfig::default();
        mouse.sounds_dir = "clicks".to_string();
        mouse.left_down = "left_down.wav".to_string();

        assert_eq!(
            mouse.button_sound(MouseButton::Left, true),
            Some(PathBuf::from("clicks/left_down.wav"))
        );
        // Unconfigured transitions have no sound.
        assert_eq!(mouse.button_sound(MouseButton::Left, false), None);
        assert_eq!(mouse.button_sound(MouseButton::X2, true), None);
    }

    #[test]
    fn test_explicit_keyboard_sound_list() {
        let mut keyboard = KeyboardConfig::default();
        keyboard.random_sounds = false;
        keyboard.sounds_dir = "keys".to_string();
        keyboard.sounds = vec!["clack.wav".to_string(), String::new()];

        let paths = keyboard.sound_paths();
        assert_eq!(paths, vec![PathBuf::from("keys/clack.wav")]);
    }

    #[test]
    fn test_sounds_from_directory_filters_extensions() {
        let dir = std::env::temp_dir().join("clicksounds_cfg_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.wav"), b"x").unwrap();
        fs::write(dir.join("a.MP3"), b"x").unwrap();
        fs::write(dir.join("notes.txt"), b"x").unwrap();

        let sounds = sounds_from_directory(&dir);
        assert_eq!(sounds.len(), 2);
        // Sorted for stable assignment.
        assert!(sounds[0].ends_with("a.MP3"));
        assert!(sounds[1].ends_with("b.wav"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let sounds = sounds_from_directory(Path::new("/nonexistent/clicksounds"));
        assert!(sounds.is_empty());
    }
}
