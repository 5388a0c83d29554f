use clap::{Parser, Subcommand};

/// `vigil` - always-on background presence daemon.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version = "0.1.0")]
#[command(about = "An always-on background presence with a heartbeat and an outbox.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the background daemon (outbox watcher + heartbeat)
    Daemon {
        /// Override the heartbeat interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Detach and run in the background
        #[arg(long)]
        background: bool,
    },

    /// Queue a message for the daemon to speak
    Say {
        /// Message text
        message: String,

        /// Voice override for this message
        #[arg(long)]
        voice: Option<String>,
    },

    /// One-shot prompt to the local generator
    Think {
        /// Prompt text
        prompt: String,

        /// Model override
        #[arg(long)]
        model: Option<String>,
    },

    /// Store a fact in working memory
    Remember {
        /// Key to file the fact under
        key: String,

        /// The fact itself
        value: String,
    },

    /// Look up working memory (one key, or everything)
    Recall {
        /// Key to look up; omit to list all entries
        key: Option<String>,
    },

    /// Remove a fact from working memory
    Forget {
        /// Key to remove
        key: String,
    },

    /// Show daemon, outbox, generator, and vault health
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_flags_parse() {
        let cli = Cli::try_parse_from(["vigil", "daemon", "--interval", "60", "--background"])
            .unwrap();
        match cli.command {
            Commands::Daemon {
                interval,
                background,
            } => {
                assert_eq!(interval, Some(60));
                assert!(background);
            }
            _ => panic!("expected daemon command"),
        }
    }

    #[test]
    fn say_takes_message_and_optional_voice() {
        let cli = Cli::try_parse_from(["vigil", "say", "hello there", "--voice", "v2"]).unwrap();
        match cli.command {
            Commands::Say { message, voice } => {
                assert_eq!(message, "hello there");
                assert_eq!(voice.as_deref(), Some("v2"));
            }
            _ => panic!("expected say command"),
        }
    }

    #[test]
    fn memory_subcommands_parse() {
        let cli = Cli::try_parse_from(["vigil", "remember", "nas_host", "//mynas"]).unwrap();
        match cli.command {
            Commands::Remember { key, value } => {
                assert_eq!(key, "nas_host");
                assert_eq!(value, "//mynas");
            }
            _ => panic!("expected remember command"),
        }

        let cli = Cli::try_parse_from(["vigil", "recall"]).unwrap();
        assert!(matches!(cli.command, Commands::Recall { key: None }));

        let cli = Cli::try_parse_from(["vigil", "forget", "nas_host"]).unwrap();
        assert!(matches!(cli.command, Commands::Forget { key } if key == "nas_host"));
    }

    #[test]
    fn status_takes_no_arguments() {
        let cli = Cli::try_parse_from(["vigil", "status"]).unwrap();
        assert!(matches!(cli.command, Commands::Status));
    }
}
