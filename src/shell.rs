//! Application shell: owns the voice catalog, playback, and the last result.
//!
//! Everything that mutates state happens on the task running `Shell::run`.
//! Front ends, the speech sink, the voice watcher and transform requests talk
//! to it through channels.
//!
//! READY → TRANSFORMING → READY

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::segmenter::segment;
use crate::speech::{PlaybackController, PlaybackError, PlaybackStatus, SpeechEvent, SpeechSink};
use crate::transform::{TransformClient, TransformOutcome};
use crate::voice::{Voice, VoiceCatalog};

/// Status text shown before anything has been transformed.
pub const EMPTY_DISPLAY: &str = "Loading goofy chaos...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Replay,
    SelectVoice(String),
    ListVoices,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceEntry {
    #[serde(flatten)]
    pub voice: Voice,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub status: PlaybackStatus,
    pub sentence: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub display_text: String,
    pub busy: bool,
    pub selected_voice: Option<String>,
    pub playback: PlaybackReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Ok,
    /// A transform is already in flight.
    Busy,
    /// Blank input or nothing to replay.
    Empty,
    NoVoice,
    Displayed {
        text: String,
        fallback: bool,
        spoken: bool,
    },
    Voices {
        voices: Vec<VoiceEntry>,
    },
    Status(StatusReport),
}

pub struct Request {
    pub command: Command,
    pub reply: Option<oneshot::Sender<Reply>>,
}

/// Cloneable sender used by the front ends.
#[derive(Clone)]
pub struct ShellHandle {
    tx: mpsc::Sender<Request>,
}

impl ShellHandle {
    pub fn new(tx: mpsc::Sender<Request>) -> Self {
        Self { tx }
    }

    /// Send a command and wait for its reply. None if the shell has stopped.
    pub async fn call(&self, command: Command) -> Option<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request {
            command,
            reply: Some(reply_tx),
        };
        self.tx.send(request).await.ok()?;
        reply_rx.await.ok()
    }
}

pub struct Shell<S> {
    catalog: VoiceCatalog,
    playback: PlaybackController<S>,
    client: TransformClient,
    display_text: String,
    transforming: bool,
    /// Reply for the submit whose transform is in flight.
    pending_reply: Option<oneshot::Sender<Reply>>,
    transform_tx: mpsc::Sender<TransformOutcome>,
    transform_rx: mpsc::Receiver<TransformOutcome>,
}

impl<S: SpeechSink> Shell<S> {
    pub fn new(sink: S, client: TransformClient, preferred_voice: Option<String>) -> Self {
        let mut catalog = VoiceCatalog::new();
        if let Some(name) = preferred_voice {
            catalog.select(name);
        }
        let (transform_tx, transform_rx) = mpsc::channel(1);

        Self {
            catalog,
            playback: PlaybackController::new(sink),
            client,
            display_text: String::new(),
            transforming: false,
            pending_reply: None,
            transform_tx,
            transform_rx,
        }
    }

    /// Process events until a `Quit` command arrives or every command sender
    /// is dropped.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Request>,
        mut speech: mpsc::Receiver<SpeechEvent>,
        mut voices: mpsc::Receiver<Vec<Voice>>,
    ) {
        info!("Shell ready");

        loop {
            tokio::select! {
                request = commands.recv() => {
                    let Some(request) = request else {
                        debug!("Command channel closed");
                        break;
                    };
                    if !self.handle_command(request.command, request.reply) {
                        break;
                    }
                }
                Some(event) = speech.recv() => self.handle_speech(&event),
                Some(list) = voices.recv() => self.handle_voices(list),
                Some(outcome) = self.transform_rx.recv() => self.handle_transformed(outcome),
            }
        }

        info!("Shell stopped");
    }

    /// Returns false when the shell should stop.
    pub fn handle_command(&mut self, command: Command, reply: Option<oneshot::Sender<Reply>>) -> bool {
        debug!("Command: {command:?}");

        let response = match command {
            Command::Submit(text) => {
                self.submit(text, reply);
                return true;
            }
            Command::Replay => self.replay(),
            Command::SelectVoice(name) => {
                info!("Voice selected: {name}");
                self.catalog.select(name);
                Reply::Ok
            }
            Command::ListVoices => Reply::Voices {
                voices: self.voice_entries(),
            },
            Command::Status => Reply::Status(self.status()),
            Command::Quit => {
                send_reply(reply, Reply::Ok);
                return false;
            }
        };

        send_reply(reply, response);
        true
    }

    pub fn handle_speech(&mut self, event: &SpeechEvent) {
        self.playback.on_speech_event(event);
    }

    pub fn handle_voices(&mut self, voices: Vec<Voice>) {
        info!("Loaded {} voice(s)", voices.len());
        self.catalog.refresh(voices);
    }

    pub fn handle_transformed(&mut self, outcome: TransformOutcome) {
        self.transforming = false;
        let reply = self.pending_reply.take();

        let (text, fallback) = match outcome {
            TransformOutcome::Empty => {
                send_reply(reply, Reply::Empty);
                return;
            }
            TransformOutcome::Converted(text) => (text, false),
            TransformOutcome::Fallback { text, error } => {
                debug!("Using fallback text after: {error}");
                (text, true)
            }
        };

        info!("State: TRANSFORMING → READY");
        info!("Result: {text}");
        self.display_text = text.clone();
        let spoken = self.speak(&text);

        send_reply(
            reply,
            Reply::Displayed {
                text,
                fallback,
                spoken,
            },
        );
    }

    /// Wait for the in-flight transform to finish.
    pub async fn next_transformed(&mut self) -> Option<TransformOutcome> {
        self.transform_rx.recv().await
    }

    pub fn is_busy(&self) -> bool {
        self.transforming
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn playback(&self) -> &PlaybackController<S> {
        &self.playback
    }

    pub fn status(&self) -> StatusReport {
        let playback = match self.playback.session() {
            Some(session) => PlaybackReport {
                status: session.status,
                sentence: (session.current_index + 1).min(session.sentences.len()),
                total: session.sentences.len(),
            },
            None => PlaybackReport {
                status: PlaybackStatus::Idle,
                sentence: 0,
                total: 0,
            },
        };

        StatusReport {
            display_text: if self.display_text.is_empty() {
                EMPTY_DISPLAY.to_string()
            } else {
                self.display_text.clone()
            },
            busy: self.is_busy(),
            selected_voice: self.catalog.resolve().map(|v| v.name.clone()),
            playback,
        }
    }

    /// The reply is deferred until the transform finishes.
    fn submit(&mut self, text: String, reply: Option<oneshot::Sender<Reply>>) {
        if text.trim().is_empty() {
            debug!("Ignoring blank submit");
            send_reply(reply, Reply::Empty);
            return;
        }
        if self.transforming {
            info!("Submit ignored, transform already in flight");
            send_reply(reply, Reply::Busy);
            return;
        }

        info!("State: READY → TRANSFORMING ({} chars)", text.chars().count());
        self.transforming = true;
        self.pending_reply = reply;

        let client = self.client.clone();
        let tx = self.transform_tx.clone();
        tokio::spawn(async move {
            let outcome = client.transform(&text).await;
            if tx.send(outcome).await.is_err() {
                debug!("Shell gone before transform finished");
            }
        });
    }

    fn replay(&mut self) -> Reply {
        match self.playback.replay(&self.display_text, self.catalog.resolve()) {
            Ok(Some(_)) => Reply::Ok,
            Ok(None) | Err(PlaybackError::EmptyInput) => Reply::Empty,
            Err(PlaybackError::NoVoiceAvailable) => {
                warn!("No voices available for speech synthesis");
                Reply::NoVoice
            }
        }
    }

    fn speak(&mut self, text: &str) -> bool {
        match self.playback.play(segment(text), self.catalog.resolve()) {
            Ok(_) => true,
            Err(e) => {
                warn!("Not speaking result: {e}");
                false
            }
        }
    }

    fn voice_entries(&self) -> Vec<VoiceEntry> {
        let selected = self.catalog.resolve().map(|v| v.name.as_str());
        self.catalog
            .voices()
            .iter()
            .map(|voice| VoiceEntry {
                voice: voice.clone(),
                selected: Some(voice.name.as_str()) == selected,
            })
            .collect()
    }
}

fn send_reply(reply: Option<oneshot::Sender<Reply>>, response: Reply) {
    if let Some(tx) = reply {
        let _ = tx.send(response);
    }
}
