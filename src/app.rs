//! Event handling: maps input transitions onto engine calls.
//!
//! Holds the per-key sound assignments, repeat/debounce bookkeeping and the
//! ids of sounds armed for release fade-outs. Input hooks and the config
//! watcher both call in here, so the state sits behind its own lock,
//! separate from the engine's.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use rdev::Key;

use crate::audio::{AudioEngine, SoundId, NO_SOUND};
use crate::config::Config;
use crate::input::{InputEvent, MouseButton, WheelDirection};
use crate::key_mapping;

struct AppState {
    config: Config,
    keyboard_sounds: Vec<PathBuf>,
    excluded_keys: HashSet<Key>,
    no_repeat_keys: HashSet<Key>,
    /// Stable sound assignment per key; cleared on reload so new sound
    /// lists take effect.
    key_sound_map: HashMap<Key, usize>,
    pressed_keys: HashSet<Key>,
    last_key_pressed: Option<Key>,
    last_key_press_time: HashMap<Key, Instant>,
    last_scroll_time: Option<Instant>,
    /// Live ids armed for a fade on release.
    active_key_sounds: HashMap<Key, SoundId>,
    active_mouse_sounds: HashMap<MouseButton, SoundId>,
}

impl AppState {
    fn new(config: Config) -> Self {
        let keyboard_sounds = config.keyboard.sound_paths();
        let excluded_keys = key_mapping::resolve_key_set(&config.keyboard.excluded_keys);
        let no_repeat_keys = key_mapping::resolve_key_set(&config.keyboard.no_repeat_keys);
        tracing::info!("{} keyboard sounds available", keyboard_sounds.len());

        Self {
            config,
            keyboard_sounds,
            excluded_keys,
            no_repeat_keys,
            key_sound_map: HashMap::new(),
            pressed_keys: HashSet::new(),
            last_key_pressed: None,
            last_key_press_time: HashMap::new(),
            last_scroll_time: None,
            active_key_sounds: HashMap::new(),
            active_mouse_sounds: HashMap::new(),
        }
    }
}

pub struct App {
    engine: Arc<AudioEngine>,
    state: Mutex<AppState>,
}

impl App {
    pub fn new(engine: Arc<AudioEngine>, config: Config) -> Self {
        Self::apply_audio_settings(&engine, &config);
        Self {
            engine,
            state: Mutex::new(AppState::new(config)),
        }
    }

    fn apply_audio_settings(engine: &AudioEngine, config: &Config) {
        engine.set_max_concurrent_sounds(config.audio.max_concurrent_sounds);
        engine.set_master_volume(config.audio.master_volume);
        engine.set_audio_effects(&config.audio.effects);
    }

    pub fn config_path(&self) -> PathBuf {
        self.state.lock().config.file_path().to_path_buf()
    }

    /// Re-parse the config file and apply it. A failed parse keeps the
    /// previous settings.
    pub fn reload_config(&self) {
        let mut state = self.state.lock();
        if let Err(e) = state.config.reload() {
            tracing::error!("Config reload failed, keeping previous settings: {e}");
            return;
        }

        Self::apply_audio_settings(&self.engine, &state.config);
        let fresh = AppState::new(state.config.clone());
        *state = fresh;
        tracing::info!("Config hot reload completed");
    }

    pub fn handle_event(&self, event: InputEvent) {
        match event {
            InputEvent::KeyPress(key) => self.handle_key_press(key),
            InputEvent::KeyRelease(key) => self.handle_key_release(key),
            InputEvent::ButtonPress(button) => self.handle_button(button, true),
            InputEvent::ButtonRelease(button) => self.handle_button(button, false),
            InputEvent::Wheel(direction) => self.handle_wheel(direction),
        }
    }

    fn handle_key_press(&self, key: Key) {
        let mut state = self.state.lock();
        if !state.config.keyboard.enabled || state.excluded_keys.contains(&key) {
            return;
        }

        let now = Instant::now();
        let debounce = Duration::from_millis(state.config.keyboard.key_repeat_debounce_ms);
        if let Some(&last) = state.last_key_press_time.get(&key) {
            if now.duration_since(last) < debounce {
                return;
            }
        }

        let suppress_repeat =
            state.config.keyboard.disable_repeat || state.no_repeat_keys.contains(&key);
        if suppress_repeat && state.pressed_keys.contains(&key) {
            return;
        }

        state.last_key_press_time.insert(key, now);
        state.pressed_keys.insert(key);

        if state.keyboard_sounds.is_empty() {
            return;
        }

        let index = if state.config.keyboard.totally_random_keypresses {
            // Re-roll when switching keys; repeats of the same key keep
            // their sound.
            if state.last_key_pressed != Some(key) {
                let index = rand::thread_rng().gen_range(0..state.keyboard_sounds.len());
                state.key_sound_map.insert(key, index);
                state.last_key_pressed = Some(key);
            }
            state.key_sound_map[&key]
        } else {
            match state.key_sound_map.get(&key) {
                Some(&index) => index,
                None => {
                    let index = rand::thread_rng().gen_range(0..state.keyboard_sounds.len());
                    state.key_sound_map.insert(key, index);
                    index
                }
            }
        };

        let path = state.keyboard_sounds[index].clone();
        let volume = state.config.keyboard.volume;
        let async_playback = state.config.audio.async_playback;
        let id = self
            .engine
            .play_with_id_and_volume(&path, volume, async_playback);

        if state.config.keyboard.enable_fade_out && id > NO_SOUND {
            state.active_key_sounds.insert(key, id);
        }
    }

    fn handle_key_release(&self, key: Key) {
        let mut state = self.state.lock();
        if !state.config.keyboard.enabled || state.excluded_keys.contains(&key) {
            return;
        }

        state.pressed_keys.remove(&key);
        state.last_key_press_time.remove(&key);

        if state.config.keyboard.enable_fade_out {
            if let Some(id) = state.active_key_sounds.remove(&key) {
                self.engine
                    .fade_out_sound(id, state.config.keyboard.fade_out_duration_ms);
            }
        }
    }

    fn handle_button(&self, button: MouseButton, down: bool) {
        let mut state = self.state.lock();
        if !state.config.mouse.enabled {
            return;
        }

        // A release fades the tracked press sound instead of playing the
        // up sound.
        if state.config.mouse.enable_fade_out && !down {
            if let Some(id) = state.active_mouse_sounds.remove(&button) {
                self.engine
                    .fade_out_sound(id, state.config.mouse.fade_out_duration_ms);
                return;
            }
        }

        if matches!(button, MouseButton::X1 | MouseButton::X2)
            && !state.config.mouse.enable_side_buttons
        {
            return;
        }

        let Some(path) = state.config.mouse.button_sound(button, down) else {
            return;
        };
        let volume = state.config.mouse.volume;
        let async_playback = state.config.audio.async_playback;
        let id = self
            .engine
            .play_with_id_and_volume(&path, volume, async_playback);

        if state.config.mouse.enable_fade_out && down && id > NO_SOUND {
            state.active_mouse_sounds.insert(button, id);
        }
    }

    fn handle_wheel(&self, direction: WheelDirection) {
        let mut state = self.state.lock();
        if !state.config.mouse.enabled || !state.config.mouse.enable_scroll_wheel {
            return;
        }

        let now = Instant::now();
        let debounce = Duration::from_millis(state.config.mouse.scroll_wheel_debounce_ms);
        if let Some(last) = state.last_scroll_time {
            if now.duration_since(last) < debounce {
                return;
            }
        }
        state.last_scroll_time = Some(now);

        let Some(path) = state.config.mouse.wheel_sound(direction) else {
            return;
        };
        let volume = state.config.mouse.volume;
        let async_playback = state.config.audio.async_playback;
        self.engine
            .play_with_id_and_volume(&path, volume, async_playback);
    }
}
