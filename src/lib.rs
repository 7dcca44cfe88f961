//! Academy: avatar response pipeline for the Academy of Talents tutors.
//!
//! A learner's message becomes one playable unit for an animated tutor:
//! Message → LLM → TTS → lip-sync → expression → [`UnifiedResponse`]
//!
//! # Architecture
//!
//! - **Persona**: static tutor records (prompt, voice, repertoire)
//! - **LLM**: one generation call per message (Gemini or OpenAI-compatible)
//! - **TTS**: remote synthesis with placeholder and silence fallbacks
//! - **Lip-sync**: `ffmpeg` transcode, then `rhubarb` phoneme recognition
//! - **Pipeline**: the assembler that runs the stages in order
//! - **Server**: axum HTTP front end
//! - **Playback**: client-side queue that voices one response at a time

pub mod academy_dirs;
pub mod client;
pub mod config;
pub mod error;
pub mod expression;
pub mod lipsync;
pub mod llm;
pub mod logging;
pub mod persona;
pub mod pipeline;
pub mod playback;
pub mod scratch;
pub mod server;
pub mod tts;
pub mod viseme;

pub use client::{ChatClient, ChatSession};
pub use config::AcademyConfig;
pub use error::{AcademyError, Result};
pub use persona::{Expression, Persona, PersonaId};
pub use pipeline::{ChatRequest, ResponseAssembler, UnifiedResponse};
pub use playback::{PlaybackQueue, PlaybackScheduler, PlaybackState};
pub use server::ChatServer;
