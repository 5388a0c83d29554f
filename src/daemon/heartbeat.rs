//! Heartbeat: the periodic autonomous tick. Schedule bookkeeping is pure
//! state driven by injected `now` values, so interval behavior is testable
//! against a simulated clock.

use crate::modes::{HeartbeatMode, TimeBucket, select_mode};
use crate::providers::ThoughtProvider;
use crate::vault::Vault;
use chrono::{DateTime, Duration, Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Literal token the generator may emit to opt out of producing output.
/// Matched case-insensitively as a substring of the response.
pub const SILENCE_SENTINEL: &str = "[SILENCE]";

pub fn is_silence(response: &str) -> bool {
    response.trim().is_empty() || response.to_uppercase().contains(SILENCE_SENTINEL)
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// Tracks when the next tick is due. Owned exclusively by the daemon loop.
///
/// The first interval is measured from construction; a tick is due when a
/// full interval has elapsed since the last fire. `poll` advances the state
/// unconditionally when it fires, so a failed tick never causes a tight
/// retry loop.
#[derive(Debug)]
pub struct HeartbeatSchedule {
    interval: Duration,
    last_fire: DateTime<Utc>,
    tick_count: u64,
}

impl HeartbeatSchedule {
    pub fn new(interval_secs: u64, started_at: DateTime<Utc>) -> Self {
        // Duration::seconds panics past its i64-milliseconds bound, and the
        // interval arrives unvalidated from config or --interval. Clamp:
        // an absurdly large interval simply never fires.
        let interval = i64::try_from(interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            interval,
            last_fire: started_at,
            tick_count: 0,
        }
    }

    /// Returns the tick number when a tick is due at `now`, advancing the
    /// schedule; `None` otherwise.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<u64> {
        if now.signed_duration_since(self.last_fire) >= self.interval {
            self.tick_count += 1;
            self.last_fire = now;
            Some(self.tick_count)
        } else {
            None
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

// ─── Tick execution ──────────────────────────────────────────────────────────

/// Result of one heartbeat tick. Failures are absorbed here: an unavailable
/// generator means a silent tick, and a failed vault write is logged while
/// the thought itself survives.
#[derive(Debug)]
pub enum TickOutcome {
    Silent,
    Thought {
        mode_name: String,
        text: String,
        note: Option<PathBuf>,
    },
}

pub struct Heartbeat {
    instance_name: String,
    model: String,
    modes: Vec<HeartbeatMode>,
    provider: Arc<dyn ThoughtProvider>,
    vault: Vault,
}

impl Heartbeat {
    pub fn new(
        instance_name: String,
        model: String,
        modes: Vec<HeartbeatMode>,
        provider: Arc<dyn ThoughtProvider>,
        vault: Vault,
    ) -> Self {
        Self {
            instance_name,
            model,
            modes,
            provider,
            vault,
        }
    }

    pub async fn tick(&self, tick_no: u64) -> TickOutcome {
        let now = Local::now();
        let bucket = TimeBucket::current(&now);
        let Some(mode) = select_mode(&self.modes, bucket, &mut rand::rng()) else {
            tracing::warn!(%bucket, "no mode has a nonzero weight; skipping tick");
            return TickOutcome::Silent;
        };

        tracing::info!(tick = tick_no, mode = %mode.name, %bucket, "heartbeat tick");
        let prompt = build_prompt(&self.instance_name, mode, &now);

        let text = match self.provider.generate(&prompt, &self.model).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(tick = tick_no, "generation failed, staying silent: {e}");
                return TickOutcome::Silent;
            }
        };

        if is_silence(&text) {
            tracing::debug!(tick = tick_no, "generator chose silence");
            return TickOutcome::Silent;
        }

        let note = match self.vault.record_thought(&mode.name, &text, now) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(tick = tick_no, "failed to record thought: {e}");
                None
            }
        };

        TickOutcome::Thought {
            mode_name: mode.name.clone(),
            text,
            note,
        }
    }
}

fn build_prompt(instance_name: &str, mode: &HeartbeatMode, now: &DateTime<Local>) -> String {
    format!(
        "You are {instance_name}, an assistant with a persistent background presence.\n\
         It's {} on {}.\n\n\
         {}\n\n\
         Keep your response under 2 sentences. If nothing feels right to say, \
         respond with just: {SILENCE_SENTINEL}",
        now.format("%I:%M %p"),
        now.format("%A"),
        mode.prompt,
    )
}
