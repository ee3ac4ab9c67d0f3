//! Pumpkin toss: pick up a pumpkin, charge a throw and feed it to the monster.
//!
//! The library holds the whole game loop minus windowing and rendering; the
//! `pumpkin_toss` binary drives it headlessly with a scripted player.

pub mod animation;
pub mod autoplay;
pub mod charge;
pub mod config;
pub mod creature;
pub mod cues;
pub mod hud;
pub mod scene;
pub mod session;
pub mod spawner;
pub mod throwable;

pub use autoplay::Autoplay;
pub use charge::{ChargeMeter, ChargeReading};
pub use config::{ConfigError, GameConfig};
pub use creature::{BodySet, CreatureStage, TargetCreature};
pub use cues::{Cue, CueQueue, SoundId};
pub use hud::{Hud, UiBar};
pub use scene::{Scene, TimerSlot};
pub use session::{Actor, PickTarget, Session, SessionStats};
pub use spawner::RespawnSpawner;
pub use throwable::{ContactOutcome, Throwable, ThrowableState};
