//! Sequential playback of a sentence list through a `SpeechSink`.
//!
//! Session lifecycle: IDLE → PLAYING → FINISHED
//!
//! The next sentence is dispatched only when the completion for the current
//! one arrives. A new `play` supersedes the running session; completions
//! still in flight for the old one are recognised by their ticket and
//! dropped. The old utterance itself is not stopped.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{SessionId, SpeechEvent, SpeechOutcome, SpeechSink, Utterance, UtteranceTicket};
use crate::segmenter::segment;
use crate::voice::Voice;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no voices available for speech synthesis")]
    NoVoiceAvailable,
    #[error("nothing to speak")]
    EmptyInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Finished,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub sentences: Vec<String>,
    pub current_index: usize,
    pub status: PlaybackStatus,
    pub voice: Voice,
}

/// What a completion notification did to playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Stale, duplicate, or from a superseded session.
    Ignored,
    /// Dispatched the sentence at this index.
    Advanced(usize),
    Finished,
}

pub struct PlaybackController<S> {
    sink: S,
    session: Option<PlaybackSession>,
    last_id: u64,
}

impl<S: SpeechSink> PlaybackController<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            session: None,
            last_id: 0,
        }
    }

    /// Start speaking `sentences` from the top, superseding any running
    /// session. On error nothing changes.
    pub fn play(
        &mut self,
        sentences: Vec<String>,
        voice: Option<&Voice>,
    ) -> Result<SessionId, PlaybackError> {
        let voice = voice.ok_or(PlaybackError::NoVoiceAvailable)?.clone();
        if sentences.is_empty() {
            return Err(PlaybackError::EmptyInput);
        }

        self.last_id += 1;
        let id = SessionId(self.last_id);

        if let Some(old) = self.session.as_ref().filter(|s| s.status == PlaybackStatus::Playing) {
            info!(
                "Session {} superseded by {id} at sentence {}/{}",
                old.id,
                old.current_index + 1,
                old.sentences.len()
            );
        }

        info!("Session {id}: {} sentence(s) with voice {voice}", sentences.len());
        self.session = Some(PlaybackSession {
            id,
            sentences,
            current_index: 0,
            status: PlaybackStatus::Playing,
            voice,
        });
        self.dispatch_current();

        Ok(id)
    }

    /// Re-segment `text` and play it from the start. Empty text is a no-op.
    pub fn replay(
        &mut self,
        text: &str,
        voice: Option<&Voice>,
    ) -> Result<Option<SessionId>, PlaybackError> {
        if text.is_empty() {
            return Ok(None);
        }
        self.play(segment(text), voice).map(Some)
    }

    /// Advance on a completion notification from the sink.
    pub fn on_speech_event(&mut self, event: &SpeechEvent) -> Progress {
        let Some(session) = self.session.as_mut() else {
            debug!("Completion for {:?} with no session", event.ticket);
            return Progress::Ignored;
        };

        let current = UtteranceTicket {
            session: session.id,
            index: session.current_index,
        };
        if session.status != PlaybackStatus::Playing || event.ticket != current {
            debug!(
                "Ignoring completion for session {} sentence {} (current: {} sentence {})",
                event.ticket.session, event.ticket.index, session.id, session.current_index
            );
            return Progress::Ignored;
        }

        if let SpeechOutcome::Failed(reason) = &event.outcome {
            warn!(
                "Sentence {}/{} of session {} failed: {reason}",
                session.current_index + 1,
                session.sentences.len(),
                session.id
            );
        }

        session.current_index += 1;
        if session.current_index >= session.sentences.len() {
            session.status = PlaybackStatus::Finished;
            info!("Session {}: PLAYING → FINISHED", session.id);
            return Progress::Finished;
        }

        let index = session.current_index;
        self.dispatch_current();
        Progress::Advanced(index)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session
            .as_ref()
            .map_or(PlaybackStatus::Idle, |s| s.status)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn dispatch_current(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let ticket = UtteranceTicket {
            session: session.id,
            index: session.current_index,
        };
        let text = &session.sentences[session.current_index];
        debug!(
            "Session {} speaking {}/{}: {text:?}",
            session.id,
            session.current_index + 1,
            session.sentences.len()
        );
        self.sink
            .speak(ticket, Utterance::new(text.clone(), session.voice.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{PITCH, RATE};

    #[derive(Default)]
    struct RecordingSink {
        dispatched: Vec<(UtteranceTicket, Utterance)>,
    }

    impl SpeechSink for RecordingSink {
        fn speak(&mut self, ticket: UtteranceTicket, utterance: Utterance) {
            self.dispatched.push((ticket, utterance));
        }
    }

    fn texts(controller: &PlaybackController<RecordingSink>) -> Vec<&str> {
        controller
            .sink()
            .dispatched
            .iter()
            .map(|(_, u)| u.text.as_str())
            .collect()
    }

    fn last_ticket(controller: &PlaybackController<RecordingSink>) -> UtteranceTicket {
        controller.sink().dispatched.last().unwrap().0
    }

    fn sentences(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn voice() -> Voice {
        Voice::new("Alex", "en-US")
    }

    #[test]
    fn dispatches_one_sentence_per_completion() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller
            .play(sentences(&["One.", " Two.", " Three."]), Some(&voice()))
            .unwrap();

        assert_eq!(texts(&controller), vec!["One."]);

        let first = last_ticket(&controller);
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(first)),
            Progress::Advanced(1)
        );
        assert_eq!(texts(&controller), vec!["One.", " Two."]);

        let second = last_ticket(&controller);
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(second)),
            Progress::Advanced(2)
        );
        let third = last_ticket(&controller);
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(third)),
            Progress::Finished
        );

        assert_eq!(texts(&controller), vec!["One.", " Two.", " Three."]);
        assert_eq!(controller.status(), PlaybackStatus::Finished);
    }

    #[test]
    fn utterances_carry_voice_pitch_and_rate() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller.play(sentences(&["Hi."]), Some(&voice())).unwrap();

        let (_, utterance) = &controller.sink().dispatched[0];
        assert_eq!(utterance.voice, voice());
        assert_eq!(utterance.pitch, PITCH);
        assert_eq!(utterance.rate, RATE);
    }

    #[test]
    fn no_voice_leaves_state_untouched() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        assert_eq!(
            controller.play(sentences(&["Hi."]), None),
            Err(PlaybackError::NoVoiceAvailable)
        );
        assert!(controller.sink().dispatched.is_empty());
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn failed_play_does_not_supersede_running_session() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        let id = controller
            .play(sentences(&["A1.", " A2."]), Some(&voice()))
            .unwrap();

        assert_eq!(controller.play(Vec::new(), Some(&voice())), Err(PlaybackError::EmptyInput));
        assert_eq!(controller.play(sentences(&["B."]), None), Err(PlaybackError::NoVoiceAvailable));

        let ticket = last_ticket(&controller);
        assert_eq!(ticket.session, id);
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(ticket)),
            Progress::Advanced(1)
        );
    }

    #[test]
    fn superseded_completion_is_ignored() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller
            .play(sentences(&["A1.", " A2.", " A3."]), Some(&voice()))
            .unwrap();
        let stale = last_ticket(&controller);

        let b = controller
            .play(sentences(&["B1.", " B2."]), Some(&voice()))
            .unwrap();
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(stale)),
            Progress::Ignored
        );
        assert_eq!(texts(&controller), vec!["A1.", "B1."]);

        let current = last_ticket(&controller);
        assert_eq!(current.session, b);
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(current)),
            Progress::Advanced(1)
        );
        assert_eq!(texts(&controller), vec!["A1.", "B1.", " B2."]);
    }

    #[test]
    fn duplicate_completion_does_not_skip_ahead() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller
            .play(sentences(&["One.", " Two.", " Three."]), Some(&voice()))
            .unwrap();
        let first = last_ticket(&controller);

        controller.on_speech_event(&SpeechEvent::completed(first));
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(first)),
            Progress::Ignored
        );
        assert_eq!(controller.session().unwrap().current_index, 1);
    }

    #[test]
    fn failed_utterance_still_advances() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller
            .play(sentences(&["One.", " Two."]), Some(&voice()))
            .unwrap();
        let first = last_ticket(&controller);

        let event = SpeechEvent {
            ticket: first,
            outcome: SpeechOutcome::Failed("exit status 1".into()),
        };
        assert_eq!(controller.on_speech_event(&event), Progress::Advanced(1));
    }

    #[test]
    fn completion_after_finish_is_ignored() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        controller.play(sentences(&["Only."]), Some(&voice())).unwrap();
        let ticket = last_ticket(&controller);

        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(ticket)),
            Progress::Finished
        );
        assert_eq!(
            controller.on_speech_event(&SpeechEvent::completed(ticket)),
            Progress::Ignored
        );
        assert_eq!(controller.sink().dispatched.len(), 1);
    }

    #[test]
    fn replay_resegments_and_restarts() {
        let mut controller = PlaybackController::new(RecordingSink::default());
        assert_eq!(controller.replay("", Some(&voice())), Ok(None));
        assert!(controller.sink().dispatched.is_empty());

        let id = controller.replay("Yo. Fr fr", Some(&voice())).unwrap();
        assert!(id.is_some());
        assert_eq!(controller.session().unwrap().sentences, vec!["Yo.", " Fr fr"]);
        assert_eq!(texts(&controller), vec!["Yo."]);
    }
}
