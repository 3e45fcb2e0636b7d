//! botrot: turn text into brainrot and read it aloud, one sentence at a time.

pub mod api;
pub mod config;
pub mod repl;
pub mod segmenter;
pub mod shell;
pub mod speech;
pub mod transform;
pub mod voice;
