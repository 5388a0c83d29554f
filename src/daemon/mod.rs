//! The daemon loop: a single-threaded poll that drains the outbox every
//! iteration and fires a heartbeat tick when the interval elapses. All work
//! inside one iteration is sequential; a slow generation call delays the next
//! drain, which is acceptable at minute-scale intervals.

mod heartbeat;
pub mod lock;

pub use heartbeat::{Heartbeat, HeartbeatSchedule, SILENCE_SENTINEL, TickOutcome, is_silence};

use crate::Config;
use crate::error::Result;
use crate::outbox::{Outbox, Outcome, QueueId, QueuedMessage};
use crate::providers::{OllamaProvider, ThoughtProvider};
use crate::speech::{CommandSpeaker, NullSpeaker, Speaker};
use crate::vault::Vault;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const POLL_INTERVAL_SECS: u64 = 1;

pub async fn run(config: Arc<Config>, interval_override: Option<u64>) -> Result<()> {
    let interval_secs = interval_override
        .unwrap_or(config.heartbeat.interval_secs)
        .max(1);

    lock::acquire(&config.lock_path())?;

    let outbox = Outbox::open(config.outbox_dir())?;
    let provider: Arc<dyn ThoughtProvider> = Arc::new(OllamaProvider::new(
        Some(&config.generator.base_url),
        Duration::from_secs(config.generator.timeout_secs),
    ));
    let speaker: Arc<dyn Speaker> = if config.speech.enabled {
        Arc::new(CommandSpeaker::new(&config.speech, std::env::temp_dir()))
    } else {
        Arc::new(NullSpeaker)
    };
    let hb = Heartbeat::new(
        config.instance_name.clone(),
        config.generator.model.clone(),
        config.modes.clone(),
        Arc::clone(&provider),
        Vault::new(config.vault_dir()),
    );
    let mut schedule = HeartbeatSchedule::new(interval_secs, Utc::now());

    println!("◆ vigil daemon started");
    println!("   heartbeat: every {interval_secs}s");
    println!(
        "   speech:    {}",
        if config.speech.enabled {
            &config.speech.engine
        } else {
            "disabled"
        }
    );
    println!("   generator: {} @ {}", config.generator.model, config.generator.base_url);
    println!("   stop with Ctrl+C");

    let mut poll = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
    // A slow tick should delay the next poll, not cause a burst of them.
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = poll.tick() => {
                drain_outbox(&outbox, speaker.as_ref()).await;

                if config.heartbeat.enabled {
                    if let Some(tick_no) = schedule.poll(Utc::now()) {
                        match hb.tick(tick_no).await {
                            TickOutcome::Silent => {}
                            TickOutcome::Thought { mode_name, text, note } => {
                                if let Some(path) = note {
                                    tracing::info!(mode = %mode_name, note = %path.display(), "thought recorded");
                                }
                                if config.heartbeat.speak_thoughts {
                                    if let Err(e) = outbox.enqueue(&QueuedMessage::to_user(text)) {
                                        tracing::warn!("failed to queue thought for speech: {e}");
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    lock::release(&config.lock_path());
    println!("◆ vigil daemon stopped");
    Ok(())
}

/// Drain the outbox once: speak each well-formed entry and move it to
/// `processed`, quarantine corrupt entries and failed handoffs in `error`.
/// Nothing is ever retried.
pub async fn drain_outbox(outbox: &Outbox, speaker: &dyn Speaker) {
    let entries = match outbox.drain() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("outbox drain failed: {e}");
            return;
        }
    };

    for entry in entries {
        match entry.message {
            Ok(msg) if !msg.play_local => {
                tracing::debug!(id = %entry.id, "entry not addressed to local playback");
                acknowledge(outbox, &entry.id, Outcome::Processed);
            }
            Ok(msg) => {
                tracing::info!(id = %entry.id, to = %msg.to, "speaking queued message");
                let outcome = match speaker.speak(&msg.message, msg.voice.as_deref()).await {
                    Ok(()) => Outcome::Processed,
                    Err(e) => {
                        tracing::warn!(id = %entry.id, "speech failed: {e}");
                        Outcome::Error
                    }
                };
                acknowledge(outbox, &entry.id, outcome);
            }
            Err(e) => {
                tracing::warn!(id = %entry.id, "quarantining corrupt entry: {e}");
                acknowledge(outbox, &entry.id, Outcome::Error);
            }
        }
    }
}

fn acknowledge(outbox: &Outbox, id: &QueueId, outcome: Outcome) {
    if let Err(e) = outbox.acknowledge(id, outcome) {
        tracing::warn!(%id, "failed to acknowledge entry: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpeechError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct RefusingSpeaker;

    #[async_trait]
    impl Speaker for RefusingSpeaker {
        async fn speak(&self, _text: &str, _voice: Option<&str>) -> std::result::Result<(), SpeechError> {
            Err(SpeechError::Failed {
                command: "test".into(),
                status: "exit status: 1".into(),
            })
        }
    }

    #[tokio::test]
    async fn drained_messages_end_up_processed() {
        let tmp = TempDir::new().unwrap();
        let outbox = Outbox::open(tmp.path().join("outbox")).unwrap();
        let id = outbox.enqueue(&QueuedMessage::to_user("hello")).unwrap();

        drain_outbox(&outbox, &NullSpeaker).await;

        assert_eq!(outbox.pending_count().unwrap(), 0);
        assert!(tmp
            .path()
            .join("outbox/processed")
            .join(format!("{id}.json"))
            .exists());
    }

    #[tokio::test]
    async fn speech_failure_routes_to_error_not_processed() {
        let tmp = TempDir::new().unwrap();
        let outbox = Outbox::open(tmp.path().join("outbox")).unwrap();
        let id = outbox.enqueue(&QueuedMessage::to_user("doomed")).unwrap();

        drain_outbox(&outbox, &RefusingSpeaker).await;

        assert!(tmp
            .path()
            .join("outbox/error")
            .join(format!("{id}.json"))
            .exists());
        // Never retried: a second drain sees nothing.
        drain_outbox(&outbox, &RefusingSpeaker).await;
        assert_eq!(outbox.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupt_entries_are_quarantined() {
        let tmp = TempDir::new().unwrap();
        let outbox = Outbox::open(tmp.path().join("outbox")).unwrap();
        std::fs::write(tmp.path().join("outbox/message_bad.json"), "not json").unwrap();

        drain_outbox(&outbox, &NullSpeaker).await;

        assert!(tmp.path().join("outbox/error/message_bad.json").exists());
        assert_eq!(outbox.pending_count().unwrap(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unwritable_lock_fails_run_with_a_daemon_error() {
        use crate::error::VigilError;
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        std::fs::create_dir_all(&ws).unwrap();
        std::fs::set_permissions(&ws, std::fs::Permissions::from_mode(0o444)).unwrap();

        let config = Config {
            workspace_dir: ws.clone(),
            ..Config::default()
        };
        let err = run(Arc::new(config), Some(1)).await.unwrap_err();
        assert!(matches!(err, VigilError::Daemon(_)));

        std::fs::set_permissions(&ws, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn non_local_entries_skip_the_speaker() {
        let tmp = TempDir::new().unwrap();
        let outbox = Outbox::open(tmp.path().join("outbox")).unwrap();
        let mut msg = QueuedMessage::to_user("remote");
        msg.play_local = false;
        let id = outbox.enqueue(&msg).unwrap();

        // RefusingSpeaker would fail the entry if it were consulted.
        drain_outbox(&outbox, &RefusingSpeaker).await;

        assert!(tmp
            .path()
            .join("outbox/processed")
            .join(format!("{id}.json"))
            .exists());
    }
}
