//! Speech playback: utterances, the sink seam, and the sequential queue.
//!
//! - `queue`: session state machine that plays sentences one at a time
//! - `espeak`: espeak-ng process sink and voice listing

pub mod espeak;
pub mod queue;

use crate::voice::Voice;

pub use queue::{PlaybackController, PlaybackError, PlaybackSession, PlaybackStatus, Progress};

/// Pitch for every utterance (1.0 is the engine default).
pub const PITCH: f32 = 0.8;
/// Rate for every utterance (1.0 is the engine default).
pub const RATE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Correlates a completion notification with the unit that was dispatched.
/// Sinks hand it back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtteranceTicket {
    pub session: SessionId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Voice,
    pub pitch: f32,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: Voice) -> Self {
        Self {
            text: text.into(),
            voice,
            pitch: PITCH,
            rate: RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Completed,
    Failed(String),
}

/// Exactly one per dispatched utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEvent {
    pub ticket: UtteranceTicket,
    pub outcome: SpeechOutcome,
}

impl SpeechEvent {
    pub fn completed(ticket: UtteranceTicket) -> Self {
        Self {
            ticket,
            outcome: SpeechOutcome::Completed,
        }
    }
}

/// A speech engine that accepts one utterance at a time and later reports
/// its completion as a `SpeechEvent` carrying the same ticket.
pub trait SpeechSink {
    fn speak(&mut self, ticket: UtteranceTicket, utterance: Utterance);
}
