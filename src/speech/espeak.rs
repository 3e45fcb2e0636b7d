//! espeak-ng platform adapters.
//!
//! `EspeakSink` runs one espeak-ng process per utterance and reports its exit
//! as a `SpeechEvent`. `list_voices`/`watch_voices` turn `espeak-ng --voices`
//! into catalog refreshes.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{SpeechEvent, SpeechOutcome, SpeechSink, Utterance, UtteranceTicket};
use crate::config::SpeechConfig;
use crate::voice::Voice;

// espeak-ng rejects rates below this
const MIN_WORDS_PER_MINUTE: f32 = 80.0;
const MAX_PITCH: f32 = 99.0;

pub struct EspeakSink {
    program: String,
    words_per_minute: u32,
    base_pitch: u32,
    events: mpsc::Sender<SpeechEvent>,
}

impl EspeakSink {
    pub fn new(config: &SpeechConfig, events: mpsc::Sender<SpeechEvent>) -> Self {
        Self {
            program: config.program.clone(),
            words_per_minute: config.words_per_minute,
            base_pitch: config.base_pitch,
            events,
        }
    }

    fn args(&self, utterance: &Utterance) -> Vec<String> {
        let pitch = (self.base_pitch as f32 * utterance.pitch)
            .round()
            .clamp(0.0, MAX_PITCH) as u32;
        let wpm = (self.words_per_minute as f32 * utterance.rate)
            .round()
            .max(MIN_WORDS_PER_MINUTE) as u32;

        vec![
            "-v".into(),
            utterance.voice.engine_id.clone(),
            "-p".into(),
            pitch.to_string(),
            "-s".into(),
            wpm.to_string(),
            "--stdin".into(),
        ]
    }
}

impl SpeechSink for EspeakSink {
    fn speak(&mut self, ticket: UtteranceTicket, utterance: Utterance) {
        let program = self.program.clone();
        let args = self.args(&utterance);
        let events = self.events.clone();

        tokio::spawn(async move {
            let outcome = match run_espeak(&program, &args, &utterance.text).await {
                Ok(()) => SpeechOutcome::Completed,
                Err(e) => {
                    warn!("{program} failed: {e}");
                    SpeechOutcome::Failed(e)
                }
            };
            if events.send(SpeechEvent { ticket, outcome }).await.is_err() {
                debug!("Speech event receiver dropped");
            }
        });
    }
}

/// Text goes over stdin so sentences starting with `-` are not read as flags.
async fn run_espeak(program: &str, args: &[String], text: &str) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn {program}: {e}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| format!("Failed to write to {program}: {e}"))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("{program} did not finish: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{program} exited with {}: {}", output.status, stderr.trim()));
    }

    Ok(())
}

/// Parse the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
///
/// VoiceName has its spaces printed as `_`; they are put back for display.
/// The File column is what `-v` accepts, so it becomes the engine id.
/// Duplicate names keep their first occurrence.
pub fn parse_voice_listing(listing: &str) -> Vec<Voice> {
    let mut voices: Vec<Voice> = Vec::new();

    for line in listing.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 5 || cols[0] == "Pty" {
            continue;
        }

        let (language, name, file) = (cols[1], cols[3].replace('_', " "), cols[4]);
        if voices.iter().any(|v| v.name == name) {
            continue;
        }
        voices.push(Voice::new(name, language).with_engine_id(file));
    }

    voices
}

pub async fn list_voices(program: &str) -> Result<Vec<Voice>, String> {
    let output = Command::new(program)
        .arg("--voices")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("Failed to run {program} --voices: {e}"))?;

    if !output.status.success() {
        return Err(format!("{program} --voices exited with {}", output.status));
    }

    Ok(parse_voice_listing(&String::from_utf8_lossy(&output.stdout)))
}

/// Poll the voice list and send it whenever it differs from the last one
/// sent. The first successful listing is always sent. Runs until the
/// receiver is dropped.
pub async fn watch_voices(program: String, interval: Duration, tx: mpsc::Sender<Vec<Voice>>) {
    watch_listing(interval, tx, || list_voices(&program)).await
}

async fn watch_listing<F, Fut>(interval: Duration, tx: mpsc::Sender<Vec<Voice>>, mut list: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Voice>, String>>,
{
    let mut last: Option<Vec<Voice>> = None;
    let mut warned = false;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        match list().await {
            Ok(voices) => {
                warned = false;
                if last.as_ref() == Some(&voices) {
                    continue;
                }
                info!("Voice list changed: {} voice(s)", voices.len());
                last = Some(voices.clone());
                if tx.send(voices).await.is_err() {
                    debug!("Voice watcher stopping, receiver dropped");
                    return;
                }
            }
            Err(e) if !warned => {
                warn!("Cannot list voices: {e}");
                warned = true;
            }
            Err(e) => debug!("Cannot list voices: {e}"),
        }
    }
}
