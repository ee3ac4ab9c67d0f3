//! Presentation cues: sounds and animation clips requested by the game logic.
//!
//! Gameplay code never talks to the audio device or the animation player
//! directly. It pushes [`Cue`]s, and the frame loop drains them once per tick
//! into whatever backends are available (or drops them in headless tests).

use engine_core::{Entity, Vec3};

/// Every sound clip the game knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    Music,
    PickUp,
    Throw,
    HitGround1,
    HitGround2,
    HitGround3,
    Splat,
    CreatureIdle,
    MouthOpen,
    MouthClose,
    Chewing,
    Dying,
}

impl SoundId {
    pub const ALL: [SoundId; 12] = [
        SoundId::Music,
        SoundId::PickUp,
        SoundId::Throw,
        SoundId::HitGround1,
        SoundId::HitGround2,
        SoundId::HitGround3,
        SoundId::Splat,
        SoundId::CreatureIdle,
        SoundId::MouthOpen,
        SoundId::MouthClose,
        SoundId::Chewing,
        SoundId::Dying,
    ];

    /// Impact variants, one picked at random per bounce.
    pub const HIT_GROUND: [SoundId; 3] =
        [SoundId::HitGround1, SoundId::HitGround2, SoundId::HitGround3];

    /// Key the audio backend registers the clip under.
    pub fn name(self) -> &'static str {
        match self {
            SoundId::Music => "music",
            SoundId::PickUp => "pumpkin_pick_up",
            SoundId::Throw => "pumpkin_throw",
            SoundId::HitGround1 => "pumpkin_hit_ground_01",
            SoundId::HitGround2 => "pumpkin_hit_ground_02",
            SoundId::HitGround3 => "pumpkin_hit_ground_03",
            SoundId::Splat => "pumpkin_splat",
            SoundId::CreatureIdle => "monster_idle",
            SoundId::MouthOpen => "monster_mouth_open",
            SoundId::MouthClose => "monster_mouth_close",
            SoundId::Chewing => "monster_chewing",
            SoundId::Dying => "monster_dying",
        }
    }

    /// File name relative to the sounds directory.
    pub fn file(self) -> &'static str {
        match self {
            SoundId::Music => "sounds/music.mp3",
            SoundId::PickUp => "sounds/pumpkinPickUp.mp3",
            SoundId::Throw => "sounds/pumpkinThrow.mp3",
            SoundId::HitGround1 => "sounds/pumpkinHitGround01.mp3",
            SoundId::HitGround2 => "sounds/pumpkinHitGround02.mp3",
            SoundId::HitGround3 => "sounds/pumpkinHitGround03.mp3",
            SoundId::Splat => "sounds/pumpkinSplat.mp3",
            SoundId::CreatureIdle => "sounds/monsterIdle.mp3",
            SoundId::MouthOpen => "sounds/monsterMouthOpen.mp3",
            SoundId::MouthClose => "sounds/monsterMouthClose.mp3",
            SoundId::Chewing => "sounds/monsterChewing.mp3",
            SoundId::Dying => "sounds/monsterDying.mp3",
        }
    }

    /// Sounds the creature owns; all of them are silenced on every stage change.
    pub fn is_creature(self) -> bool {
        matches!(
            self,
            SoundId::CreatureIdle
                | SoundId::MouthOpen
                | SoundId::MouthClose
                | SoundId::Chewing
                | SoundId::Dying
        )
    }

    /// `(name, file)` pairs for bulk loading.
    pub fn clip_table() -> Vec<(&'static str, &'static str)> {
        Self::ALL.iter().map(|s| (s.name(), s.file())).collect()
    }
}

/// One presentation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Start a sound, positioned when `at` is set.
    PlaySound {
        sound: SoundId,
        at: Option<Vec3>,
        looping: bool,
    },
    /// Stop every playing instance of a sound.
    StopSound(SoundId),
    PlayClip {
        entity: Entity,
        clip: &'static str,
        looping: bool,
    },
    StopClip {
        entity: Entity,
        clip: &'static str,
    },
}

/// Cues raised during the current tick, in order.
#[derive(Debug, Default)]
pub struct CueQueue {
    cues: Vec<Cue>,
}

impl CueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub fn play_once(&mut self, sound: SoundId, at: Option<Vec3>) {
        self.push(Cue::PlaySound {
            sound,
            at,
            looping: false,
        });
    }

    pub fn play_looping(&mut self, sound: SoundId, at: Option<Vec3>) {
        self.push(Cue::PlaySound {
            sound,
            at,
            looping: true,
        });
    }

    pub fn stop_sound(&mut self, sound: SoundId) {
        self.push(Cue::StopSound(sound));
    }

    /// Take everything queued so far.
    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Sounds started by a batch of cues, in order.
pub fn sounds_started(cues: &[Cue]) -> Vec<SoundId> {
    cues.iter()
        .filter_map(|cue| match cue {
            Cue::PlaySound { sound, .. } => Some(*sound),
            _ => None,
        })
        .collect()
}

/// Clips started by a batch of cues, in order.
pub fn clips_started(cues: &[Cue]) -> Vec<&'static str> {
    cues.iter()
        .filter_map(|cue| match cue {
            Cue::PlayClip { clip, .. } => Some(*clip),
            _ => None,
        })
        .collect()
}
