use clap::Parser;
use std::path::PathBuf;

/// Discord bot built on the Erisa middleware client.
#[derive(Parser)]
#[command(name = "erisa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.  Defaults to ~/.config/erisa/config.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the name of every event as it is dispatched
    #[arg(long)]
    pub trace_events: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_optional() {
        let cli = Cli::parse_from(["erisa"]);
        assert!(cli.config.is_none());
        assert!(!cli.trace_events);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["erisa", "--config", "/etc/erisa.toml", "--trace-events"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/erisa.toml")));
        assert!(cli.trace_events);
    }
}
