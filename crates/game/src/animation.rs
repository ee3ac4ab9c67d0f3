//! Clip bookkeeping with stop-before-play.
//!
//! The clip player this talks to does not reliably start a clip while another
//! is still running on the same model, so every play first stops whatever
//! this animator started.

use engine_core::Entity;

use crate::cues::{Cue, CueQueue};

/// A named clip authored on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipSpec {
    pub name: &'static str,
    pub looping: bool,
}

impl ClipSpec {
    pub const fn once(name: &'static str) -> Self {
        Self {
            name,
            looping: false,
        }
    }

    pub const fn looping(name: &'static str) -> Self {
        Self {
            name,
            looping: true,
        }
    }
}

/// Per-entity animator component.
#[derive(Debug, Clone)]
pub struct Animator {
    entity: Entity,
    clips: &'static [ClipSpec],
    playing: Vec<&'static str>,
}

impl Animator {
    pub fn new(entity: Entity, clips: &'static [ClipSpec]) -> Self {
        Self {
            entity,
            clips,
            playing: Vec::new(),
        }
    }

    /// Stop everything, then start `clip`. Unknown clip names are logged and skipped.
    pub fn play_exclusive(&mut self, clip: &str, cues: &mut CueQueue) {
        let Some(spec) = self.clips.iter().find(|c| c.name == clip).copied() else {
            log::warn!("{:?} has no clip named '{}'", self.entity, clip);
            return;
        };
        self.stop_all(cues);
        cues.push(Cue::PlayClip {
            entity: self.entity,
            clip: spec.name,
            looping: spec.looping,
        });
        self.playing.push(spec.name);
    }

    /// Stop every clip this animator has started.
    pub fn stop_all(&mut self, cues: &mut CueQueue) {
        for clip in self.playing.drain(..) {
            cues.push(Cue::StopClip {
                entity: self.entity,
                clip,
            });
        }
    }

    pub fn is_playing(&self, clip: &str) -> bool {
        self.playing.iter().any(|c| *c == clip)
    }

    pub fn playing(&self) -> &[&'static str] {
        &self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::World;

    const CLIPS: &[ClipSpec] = &[ClipSpec::looping("Idle"), ClipSpec::once("Jump")];

    #[test]
    fn play_stops_the_previous_clip_first() {
        let mut world = World::new();
        let entity = world.spawn(());
        let mut animator = Animator::new(entity, CLIPS);
        let mut cues = CueQueue::new();

        animator.play_exclusive("Idle", &mut cues);
        animator.play_exclusive("Jump", &mut cues);

        let cues = cues.drain();
        assert_eq!(
            cues,
            vec![
                Cue::PlayClip { entity, clip: "Idle", looping: true },
                Cue::StopClip { entity, clip: "Idle" },
                Cue::PlayClip { entity, clip: "Jump", looping: false },
            ]
        );
        assert_eq!(animator.playing(), &["Jump"]);
    }

    #[test]
    fn unknown_clip_leaves_current_clip_running() {
        let mut world = World::new();
        let entity = world.spawn(());
        let mut animator = Animator::new(entity, CLIPS);
        let mut cues = CueQueue::new();

        animator.play_exclusive("Idle", &mut cues);
        animator.play_exclusive("Backflip", &mut cues);
        assert!(animator.is_playing("Idle"));
        assert_eq!(cues.len(), 1);
    }
}
