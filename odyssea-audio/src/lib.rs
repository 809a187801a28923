// Audio capabilities plugged into the odyssea-core speech and lip-sync traits

// Shared audio utilities
pub(crate) mod utils;

pub mod elevenlabs;
pub mod rhubarb;
pub mod system_voice;

pub use elevenlabs::{ElevenLabsConfig, ElevenLabsSynthesizer};
pub use rhubarb::{RhubarbConfig, RhubarbLipSync};
pub use system_voice::{SystemVoiceConfig, SystemVoiceSynthesizer, VoiceEngine};
