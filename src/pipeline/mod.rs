//! Avatar response pipeline.
//!
//! ```text
//! message ─▶ TextGenerator ─▶ SpeechSynthesizer ─▶ LipSyncExtractor ─┐
//!                   └──────────▶ expression::select ──────────────────┴▶ UnifiedResponse
//! ```

pub mod assembler;
pub mod messages;

pub use assembler::ResponseAssembler;
pub use messages::{ChatRequest, ErrorBody, UnifiedResponse};
