use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `vigil`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum VigilError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Outbox queue ────────────────────────────────────────────────────
    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    // ── Thought generator ───────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Vault ───────────────────────────────────────────────────────────
    #[error("vault: {0}")]
    Vault(#[from] VaultError),

    // ── Working memory ──────────────────────────────────────────────────
    #[error("memory: {0}")]
    Memory(#[from] MemoryError),

    // ── Speech ──────────────────────────────────────────────────────────
    #[error("speech: {0}")]
    Speech(#[from] SpeechError),

    // ── Daemon lifecycle ────────────────────────────────────────────────
    #[error("daemon: {0}")]
    Daemon(#[from] DaemonError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Outbox queue errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueueError {
    /// The entry file exists but does not parse as a queued message.
    /// Routed to the `error` partition; never fatal to the drain loop.
    #[error("corrupt queue entry {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("queue entry not found: {0}")]
    NotFound(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Thought generator errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Endpoint unreachable or timed out. The tick is treated as silent.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator returned status {status}")]
    Status { status: u16 },

    #[error("malformed generator response: {0}")]
    Malformed(String),
}

// ─── Vault errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum VaultError {
    /// Storage unwritable. Fatal for the tick, logged, loop continues.
    #[error("vault unwritable at {path}: {source}")]
    Unwritable {
        path: String,
        source: std::io::Error,
    },
}

// ─── Working memory errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryError {
    /// The store file exists but does not parse as a key-value map.
    #[error("corrupt memory store at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Speech errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("{command} exited with {status}")]
    Failed { command: String, status: String },

    #[error("{command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
}

// ─── Daemon lifecycle errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DaemonError {
    /// The liveness marker could not be written. Fatal at startup.
    #[error("cannot write lock file {path}: {reason}")]
    LockUnwritable { path: String, reason: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = VigilError::Config(ConfigError::Validation("no mode has weight".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn corrupt_entry_displays_id() {
        let err = VigilError::Queue(QueueError::Corrupt {
            id: "message_20240101_000000_000000_ab12".into(),
            reason: "expected value at line 1".into(),
        });
        assert!(err.to_string().contains("message_20240101"));
    }

    #[test]
    fn provider_unavailable_displays_reason() {
        let err = VigilError::Provider(ProviderError::Unavailable("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let vigil_err: VigilError = anyhow_err.into();
        assert!(vigil_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn corrupt_memory_store_displays_path() {
        let err = VigilError::Memory(MemoryError::Corrupt {
            path: "/tmp/ws/memory/working_memory.json".into(),
            reason: "expected value at line 1".into(),
        });
        assert!(err.to_string().contains("working_memory.json"));
    }

    #[test]
    fn speech_timeout_displays_budget() {
        let err = VigilError::Speech(SpeechError::Timeout {
            command: "ffplay".into(),
            secs: 60,
        });
        assert!(err.to_string().contains("60s"));
        assert!(err.to_string().contains("ffplay"));
    }
}
