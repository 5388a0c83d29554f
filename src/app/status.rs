use crate::Config;
use crate::daemon::lock::{self, LockFile};
use crate::outbox::Outbox;
use crate::providers::OllamaProvider;
use std::time::Duration;

/// Snapshot of everything `vigil status` reports.
#[derive(Debug)]
pub struct StatusReport {
    pub daemon: Option<LockFile>,
    pub outbox_pending: usize,
    pub generator_reachable: bool,
    pub vault_present: bool,
}

pub async fn collect(config: &Config) -> StatusReport {
    let outbox_pending = Outbox::open(config.outbox_dir())
        .and_then(|q| q.pending_count())
        .unwrap_or(0);

    let provider = OllamaProvider::new(Some(&config.generator.base_url), Duration::from_secs(5));

    StatusReport {
        daemon: lock::read(&config.lock_path()),
        outbox_pending,
        generator_reachable: provider.is_reachable().await,
        vault_present: config.vault_dir().exists(),
    }
}

pub fn render(report: &StatusReport) -> String {
    let daemon_line = match &report.daemon {
        Some(lock) => format!(
            "running (pid {}, since {})",
            lock.pid,
            lock.started.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "not running".to_string(),
    };

    format!(
        "◆ vigil status\n   daemon:    {daemon_line}\n   outbox:    {} pending\n   generator: {}\n   vault:     {}\n",
        report.outbox_pending,
        if report.generator_reachable { "ok" } else { "unreachable" },
        if report.vault_present { "present" } else { "empty" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn render_shows_running_daemon_with_pid() {
        let report = StatusReport {
            daemon: Some(LockFile {
                pid: 4321,
                started: chrono::Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            }),
            outbox_pending: 2,
            generator_reachable: true,
            vault_present: true,
        };
        let text = render(&report);
        assert!(text.contains("running (pid 4321"));
        assert!(text.contains("2 pending"));
        assert!(text.contains("generator: ok"));
        assert!(text.contains("vault:     present"));
    }

    #[test]
    fn render_shows_everything_down() {
        let report = StatusReport {
            daemon: None,
            outbox_pending: 0,
            generator_reachable: false,
            vault_present: false,
        };
        let text = render(&report);
        assert!(text.contains("not running"));
        assert!(text.contains("0 pending"));
        assert!(text.contains("unreachable"));
        assert!(text.contains("empty"));
    }
}
