//! Interactive stdin front end.
//!
//! A plain line is submitted for transformation; lines starting with `/`
//! are commands.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::shell::{Command, Reply, ShellHandle};

const HELP: &str = "\
Type text to brainrot it. Commands:
  /replay          speak the last result again
  /voice <name>    pick a voice for the next playback
  /voices          list available voices
  /status          show the current result and playback state
  /quit            exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Unknown(String),
    Blank,
}

pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Blank;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Input::Command(Command::Submit(line.to_string()));
    };

    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (rest, ""),
    };

    match word {
        "replay" | "again" => Input::Command(Command::Replay),
        "voice" if !arg.is_empty() => Input::Command(Command::SelectVoice(arg.to_string())),
        "voices" => Input::Command(Command::ListVoices),
        "status" => Input::Command(Command::Status),
        "quit" | "exit" => Input::Command(Command::Quit),
        "help" => Input::Help,
        _ => Input::Unknown(trimmed.to_string()),
    }
}

pub fn render(reply: &Reply) -> String {
    match reply {
        Reply::Ok => "ok".into(),
        Reply::Busy => "Still converting, hold up...".into(),
        Reply::Empty => "Nothing to say.".into(),
        Reply::NoVoice => "No voices available for speech synthesis.".into(),
        Reply::Displayed { text, spoken, .. } => {
            if *spoken {
                format!("🗣️  {text}")
            } else {
                format!("{text}\n(no voice available, not speaking)")
            }
        }
        Reply::Voices { voices } if voices.is_empty() => "No voices loaded yet.".into(),
        Reply::Voices { voices } => voices
            .iter()
            .map(|entry| {
                let marker = if entry.selected { "*" } else { " " };
                format!("{marker} {}", entry.voice)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Reply::Status(status) => format!(
            "{}\nbusy: {} | voice: {} | playback: {} {}/{}",
            status.display_text,
            status.busy,
            status.selected_voice.as_deref().unwrap_or("none"),
            status.playback.status,
            status.playback.sentence,
            status.playback.total,
        ),
    }
}

/// Read stdin until EOF or `/quit`. EOF sends `Quit` to the shell.
pub async fn run(shell: ShellHandle) {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read stdin: {e}");
                break;
            }
        };

        let command = match parse_line(&line) {
            Input::Command(command) => command,
            Input::Help => {
                println!("{HELP}");
                continue;
            }
            Input::Unknown(input) => {
                println!("Unknown command: {input} (try /help)");
                continue;
            }
            Input::Blank => continue,
        };

        let quitting = command == Command::Quit;
        if matches!(command, Command::Submit(_)) {
            println!("Converting...");
        }

        match shell.call(command).await {
            Some(reply) if !quitting => println!("{}", render(&reply)),
            Some(_) => return,
            None => return,
        }
    }

    let _ = shell.call(Command::Quit).await;
}
