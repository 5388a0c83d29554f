use crate::Config;
use crate::app::status;
use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::memory::WorkingMemory;
use crate::outbox::{Outbox, QueuedMessage};
use crate::providers::{OllamaProvider, ThoughtProvider};
use anyhow::Context;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Daemon {
            interval,
            background,
        } => {
            if background {
                return respawn_detached(interval);
            }
            crate::daemon::run(Arc::new(config), interval).await
        }

        Commands::Say { message, voice } => {
            let outbox = Outbox::open(config.outbox_dir())?;
            let mut msg = QueuedMessage::to_user(message);
            if let Some(voice) = voice {
                msg = msg.with_voice(voice);
            }
            let id = outbox.enqueue(&msg)?;
            println!("◆ queued {id}");
            Ok(())
        }

        Commands::Think { prompt, model } => {
            let provider = OllamaProvider::new(
                Some(&config.generator.base_url),
                Duration::from_secs(config.generator.timeout_secs),
            );
            let model = model.as_deref().unwrap_or(&config.generator.model);
            let text = provider.generate(&prompt, model).await?;
            println!("{text}");
            Ok(())
        }

        Commands::Remember { key, value } => {
            WorkingMemory::new(config.memory_path()).remember(&key, &value)?;
            println!("◆ remembered {key}");
            Ok(())
        }

        Commands::Recall { key } => {
            let memory = WorkingMemory::new(config.memory_path());
            match key {
                Some(key) => match memory.recall(&key)? {
                    Some(entry) => println!("{}", entry.value),
                    None => println!("◆ no memory of {key}"),
                },
                None => {
                    let entries = memory.recall_all()?;
                    if entries.is_empty() {
                        println!("◆ working memory is empty");
                    }
                    for (key, entry) in entries {
                        println!(
                            "{key} = {}  ({})",
                            entry.value,
                            entry.timestamp.format("%Y-%m-%d %H:%M UTC")
                        );
                    }
                }
            }
            Ok(())
        }

        Commands::Forget { key } => {
            if WorkingMemory::new(config.memory_path()).forget(&key)? {
                println!("◆ forgot {key}");
            } else {
                println!("◆ no memory of {key}");
            }
            Ok(())
        }

        Commands::Status => {
            let report = status::collect(&config).await;
            print!("{}", status::render(&report));
            Ok(())
        }
    }
}

/// The portable equivalent of the classic double-fork: re-exec ourselves in
/// the foreground daemon mode with the std streams detached, and return so
/// the parent exits immediately.
fn respawn_detached(interval: Option<u64>) -> Result<()> {
    let exe = std::env::current_exe().context("could not resolve current executable")?;
    let mut cmd = std::process::Command::new(exe);
    cmd.arg("daemon");
    if let Some(secs) = interval {
        cmd.arg("--interval").arg(secs.to_string());
    }
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn background daemon")?;
    println!("◆ vigil daemon running in background (pid {})", child.id());
    Ok(())
}
