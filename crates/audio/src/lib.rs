//! Audio system using Kira for spatial sound.
//!
//! Clips are registered by name and played either once or looping, with or
//! without a world position. Every playing instance is tracked under its clip
//! name so a whole clip can be stopped in one call.

use anyhow::Result;
use engine_core::Vec3;
use kira::{
    manager::{AudioManager, AudioManagerSettings, backend::DefaultBackend},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    spatial::{
        emitter::{EmitterHandle, EmitterSettings},
        listener::{ListenerHandle, ListenerSettings},
        scene::{SpatialSceneHandle, SpatialSceneSettings},
    },
    tween::Tween,
};
use std::collections::HashMap;
use std::path::Path;

/// One playing instance. Positional sounds keep their emitter alive.
struct Voice {
    handle: StaticSoundHandle,
    _emitter: Option<EmitterHandle>,
}

/// Main audio system managing sounds and spatial audio.
pub struct AudioSystem {
    manager: AudioManager,
    spatial_scene: SpatialSceneHandle,
    listener: ListenerHandle,
    sounds: HashMap<String, StaticSoundData>,
    voices: HashMap<String, Vec<Voice>>,
}

impl AudioSystem {
    /// Create a new audio system on the default output device.
    pub fn new() -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;

        let mut spatial_scene = manager.add_spatial_scene(SpatialSceneSettings::default())?;

        let listener = spatial_scene.add_listener(
            mint::Vector3 { x: 0.0, y: 0.0, z: 0.0 },
            mint::Quaternion { v: mint::Vector3 { x: 0.0, y: 0.0, z: 0.0 }, s: 1.0 },
            ListenerSettings::default(),
        )?;

        Ok(Self {
            manager,
            spatial_scene,
            listener,
            sounds: HashMap::new(),
            voices: HashMap::new(),
        })
    }

    /// Load a sound from a file.
    pub fn load_sound(&mut self, name: &str, path: &Path) -> Result<()> {
        let sound_data = StaticSoundData::from_file(path)?;
        self.sounds.insert(name.to_string(), sound_data);
        Ok(())
    }

    /// Load every `(name, file)` pair under `dir`, logging the ones that fail.
    /// Returns how many loaded.
    pub fn load_sounds(&mut self, dir: &Path, clips: &[(&str, &str)]) -> usize {
        let mut loaded = 0;
        for (name, file) in clips {
            let path = dir.join(file);
            match self.load_sound(name, &path) {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("Could not load sound '{}' from {:?}: {}", name, path, e),
            }
        }
        loaded
    }

    /// Play a clip once. `at` places it in the spatial scene.
    pub fn play_once(&mut self, name: &str, at: Option<Vec3>) -> Result<()> {
        self.start(name, at, false)
    }

    /// Play a clip on loop until stopped.
    pub fn play_looping(&mut self, name: &str, at: Option<Vec3>) -> Result<()> {
        self.start(name, at, true)
    }

    /// Stop every playing instance of a clip.
    pub fn stop(&mut self, name: &str) {
        if let Some(voices) = self.voices.get_mut(name) {
            for voice in voices.iter_mut() {
                let _ = voice.handle.stop(Tween::default());
            }
            voices.clear();
        }
    }

    /// Create a spatial emitter at a position.
    fn create_emitter(&mut self, position: Vec3) -> Result<EmitterHandle> {
        let emitter = self.spatial_scene.add_emitter(
            mint::Vector3 { x: position.x, y: position.y, z: position.z },
            EmitterSettings::default(),
        )?;
        Ok(emitter)
    }

    /// Update listener position and orientation (call each frame).
    pub fn update_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        // Compute orientation quaternion from forward and up vectors
        let right = forward.cross(up).normalize();
        let corrected_up = right.cross(forward).normalize();

        let rotation = glam::Mat3::from_cols(right, corrected_up, -forward);
        let quat = glam::Quat::from_mat3(&rotation);

        self.listener.set_position(
            mint::Vector3 { x: position.x, y: position.y, z: position.z },
            Tween::default(),
        );
        self.listener.set_orientation(
            mint::Quaternion {
                v: mint::Vector3 { x: quat.x, y: quat.y, z: quat.z },
                s: quat.w,
            },
            Tween::default(),
        );
    }

    /// Clean up finished sounds.
    pub fn cleanup(&mut self) {
        for voices in self.voices.values_mut() {
            voices.retain(|voice| voice.handle.state() != kira::sound::PlaybackState::Stopped);
        }
    }

    /// Stop all sounds.
    pub fn stop_all(&mut self) {
        for voices in self.voices.values_mut() {
            for voice in voices.iter_mut() {
                let _ = voice.handle.stop(Tween::default());
            }
            voices.clear();
        }
    }

    fn start(&mut self, name: &str, at: Option<Vec3>, looping: bool) -> Result<()> {
        // Unknown clips are silent.
        let Some(sound_data) = self.sounds.get(name).cloned() else {
            log::debug!("sound '{}' not loaded, skipping", name);
            return Ok(());
        };

        let mut settings = StaticSoundSettings::new();
        if looping {
            settings = settings.loop_region(..);
        }
        let emitter = match at {
            Some(position) => {
                let emitter = self.create_emitter(position)?;
                settings = settings.output_destination(&emitter);
                Some(emitter)
            }
            None => None,
        };

        let handle = self.manager.play(sound_data.with_settings(settings))?;
        self.voices.entry(name.to_string()).or_default().push(Voice {
            handle,
            _emitter: emitter,
        });
        Ok(())
    }
}

// Re-export for convenience
pub use kira;
