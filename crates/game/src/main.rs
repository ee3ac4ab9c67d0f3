//! Headless pumpkin toss: a scripted player feeds the monster until it dies
//! or time runs out. Sound plays when an output device is available.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use audio::AudioSystem;
use engine_core::{Time, Vec3};
use game::{Autoplay, Cue, GameConfig, Session, SoundId};
use input::{InputState, PrimaryEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seconds to keep running after the monster starts dying, so its clip and sound finish.
const DYING_GRACE: f32 = 3.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                          Pumpkin Toss                            ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Hold to charge, release to throw. Land it in the monster's      ║");
    println!("║  mouth to make it chew; ten good meals and it's done for.        ║");
    println!("║  This build plays itself. RUST_LOG=debug for the details.        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let config = GameConfig::load();
    let seed = config.autoplay.seed;
    let (session_rng, pilot_rng) = match seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };
    log::info!("Starting Pumpkin Toss (seed {:?})", seed);

    let mut audio = match AudioSystem::new() {
        Ok(mut audio) => {
            let table = SoundId::clip_table();
            let loaded = audio.load_sounds(Path::new(&config.scene.assets_dir), &table);
            log::info!("Loaded {}/{} sounds", loaded, table.len());
            Some(audio)
        }
        Err(e) => {
            log::warn!("No audio device ({}), running silent", e);
            None
        }
    };

    let mut session = Session::new(config.clone(), session_rng);
    let mut pilot = Autoplay::new(config.autoplay.clone(), pilot_rng);
    let mut input = InputState::new();
    input.set_sensitivity(config.autoplay.sensitivity);

    let mut time = Time::new();
    let frame = Duration::from_millis(config.autoplay.frame_ms.max(1));
    let hitch = Duration::from_millis(config.autoplay.hitch_ms);
    let mut dying_since: Option<f32> = None;

    loop {
        if config.autoplay.realtime {
            std::thread::sleep(frame);
            time.update();
        } else {
            let every = u64::from(config.autoplay.hitch_every);
            let dt = if every > 0 && time.frame_count() % every == every - 1 {
                hitch
            } else {
                frame
            };
            time.advance(dt);
        }

        input.begin_frame();
        pilot.drive(&mut session, &mut input);
        session.actor_mut().look = input.look_rotation();
        for event in input.primary_events() {
            match event {
                PrimaryEvent::Pressed { .. } => session.press_primary(),
                PrimaryEvent::Released { aim } => session.release_primary(aim),
            }
        }
        session.tick(time.delta());

        let cues = session.drain_cues();
        if let Some(audio) = audio.as_mut() {
            let actor = *session.actor();
            let forward = actor.look * -Vec3::Z;
            audio.update_listener(actor.eye(), forward, Vec3::Y);
            play_cues(audio, &cues);
            audio.cleanup();
        }

        let now = time.elapsed_seconds();
        if session.creature().is_dying() {
            let since = *dying_since.get_or_insert(now);
            if now - since >= DYING_GRACE {
                break;
            }
        }
        if now >= config.autoplay.max_seconds {
            log::warn!("Time limit reached with the monster still standing");
            break;
        }
    }

    let stats = session.stats();
    log::info!(
        "Session over after {:.1}s: {} pickups, {} throws, {} swallowed, {} smashed, {} bounced, monster health {:.1}",
        time.elapsed_seconds(),
        stats.pickups,
        stats.throws,
        stats.swallowed,
        stats.smashes,
        stats.bounces,
        session.creature().health(),
    );

    if let Some(audio) = audio.as_mut() {
        audio.stop_all();
    }
    Ok(())
}

/// Route sound cues to kira. Clip cues have no consumer without a renderer.
fn play_cues(audio: &mut AudioSystem, cues: &[Cue]) {
    for cue in cues {
        let result = match cue {
            Cue::PlaySound {
                sound,
                at,
                looping: true,
            } => audio.play_looping(sound.name(), *at),
            Cue::PlaySound { sound, at, .. } => audio.play_once(sound.name(), *at),
            Cue::StopSound(sound) => {
                audio.stop(sound.name());
                Ok(())
            }
            Cue::PlayClip { entity, clip, .. } => {
                log::trace!("clip {} on {:?}", clip, entity);
                Ok(())
            }
            Cue::StopClip { .. } => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("Audio cue {:?} failed: {}", cue, e);
        }
    }
}
