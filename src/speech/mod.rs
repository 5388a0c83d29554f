//! Speech output adapter. TTS and audio playback are external collaborators;
//! the daemon only depends on the [`Speaker`] trait.

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const RENDER_TIMEOUT_SECS: u64 = 30;
const PLAYBACK_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), SpeechError>;
}

/// Logs the message instead of speaking it. Used when speech is disabled and
/// in tests.
pub struct NullSpeaker;

#[async_trait]
impl Speaker for NullSpeaker {
    async fn speak(&self, text: &str, _voice: Option<&str>) -> Result<(), SpeechError> {
        tracing::info!("[speech disabled] {text}");
        Ok(())
    }
}

/// Shells out to a TTS engine to render audio, then to a player. Mirrors the
/// edge-tts / piper + ffplay pipeline.
pub struct CommandSpeaker {
    engine: String,
    default_voice: String,
    player: String,
    scratch_dir: PathBuf,
}

impl CommandSpeaker {
    pub fn new(config: &SpeechConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: config.engine.clone(),
            default_voice: config.voice.clone(),
            player: config.player.clone(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn audio_path(&self) -> PathBuf {
        self.scratch_dir.join("vigil_speech.mp3")
    }

    async fn render(&self, text: &str, voice: &str) -> Result<(), SpeechError> {
        let audio = self.audio_path();
        match self.engine.as_str() {
            "edge-tts" => {
                let mut cmd = Command::new("edge-tts");
                cmd.args(["--voice", voice, "--text", text, "--write-media"])
                    .arg(&audio);
                run_to_completion(cmd, "edge-tts", RENDER_TIMEOUT_SECS, None).await
            }
            "piper" => {
                let mut cmd = Command::new("piper");
                cmd.args(["--model", voice, "--output_file"]).arg(&audio);
                run_to_completion(cmd, "piper", RENDER_TIMEOUT_SECS, Some(text)).await
            }
            other => {
                // Unknown engine: degrade to log-only output.
                tracing::info!("[tts:{other}] {text}");
                Ok(())
            }
        }
    }

    async fn play(&self) -> Result<(), SpeechError> {
        let audio = self.audio_path();
        if !audio.exists() {
            return Ok(());
        }
        let mut cmd = Command::new(&self.player);
        cmd.args(["-nodisp", "-autoexit"]).arg(&audio);
        let result = run_to_completion(cmd, &self.player, PLAYBACK_TIMEOUT_SECS, None).await;
        let _ = std::fs::remove_file(&audio);
        result
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), SpeechError> {
        let voice = voice.unwrap_or(&self.default_voice);
        self.render(text, voice).await?;
        self.play().await
    }
}

async fn run_to_completion(
    mut cmd: Command,
    name: &str,
    timeout_secs: u64,
    stdin_text: Option<&str>,
) -> Result<(), SpeechError> {
    cmd.stdin(if stdin_text.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::null())
    .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| SpeechError::Spawn {
        command: name.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(text) = stdin_text {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(text.as_bytes()).await;
        }
    }

    let status = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait())
        .await
        .map_err(|_| SpeechError::Timeout {
            command: name.to_string(),
            secs: timeout_secs,
        })?
        .map_err(|e| SpeechError::Spawn {
            command: name.to_string(),
            reason: e.to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(SpeechError::Failed {
            command: name.to_string(),
            status: status.to_string(),
        })
    }
}
