//! Mood-based movie recommendations
//!
//! Captures a short mood description (text, dictation, and an optional image
//! or short video), asks a multimodal Gemini model for structured movie
//! picks, and renders them as cards with best-effort posters.

pub mod ai;
pub mod app;
pub mod capture;
pub mod error;
pub mod media;
pub mod models;
pub mod poster;
pub mod prompts;
pub mod render;

pub use error::{Error, Result};
