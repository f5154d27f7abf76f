//! Gemini chat client for GeoMind
//!
//! Shapes a conversation plus mode and optional location into a
//! `generateContent` request, and narrows the response into text and
//! grounding citations.

pub mod client;
pub mod error;
pub mod types;
mod wire;

pub use client::{ChatBackend, ChatRequest, GeminiClient, NO_TEXT_FALLBACK};
pub use error::ServiceError;
pub use types::{ChatReply, GroundingChunk, Message, Mode, ParseModeError, Role};
