use crate::{
    commands::{self, Prefix},
    logger::{DefaultListener, Listeners},
};
use anyhow::{anyhow, Result};
use regex::Regex;
use serenity::all::UserId;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/erisa/config.toml";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub commands: Commands,
    #[serde(default)]
    pub logger: Logger,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    /// User id of the bot owner, for owner-only commands
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// Regex prefixes.  The first capture group, if any, is the command text.
    #[serde(default)]
    pub prefix_patterns: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Commands {
    pub directory: PathBuf,
    pub auto_load: bool,
    pub default_help: bool,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(commands::DEFAULT_COMMAND_DIRECTORY),
            auto_load: true,
            default_help: true,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Logger {
    pub enabled: bool,
    /// Lifecycle events to log.  Empty logs all of them.
    pub events: Vec<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enabled: true,
            events: Vec::new(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    /// Load from `path`, or from the default location in the home directory.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.general.prefixes.is_empty() && config.general.prefix_patterns.is_empty() {
            return Err(anyhow!("At least one command prefix is required"));
        }
        Ok(config)
    }

    pub fn owner(&self) -> Result<Option<UserId>> {
        let Some(owner) = &self.general.owner else {
            return Ok(None);
        };
        match owner.parse::<u64>() {
            Ok(id) if id != 0 => Ok(Some(UserId::new(id))),
            _ => Err(anyhow!("Invalid owner user id `{}`", owner)),
        }
    }

    /// Literal prefixes first, then patterns, each in the order given.
    pub fn prefixes(&self) -> Result<Vec<Prefix>> {
        let literal = self
            .general
            .prefixes
            .iter()
            .map(|prefix| Ok(Prefix::from(prefix.as_str())));
        let patterns = self.general.prefix_patterns.iter().map(|pattern| {
            Regex::new(pattern)
                .map(Prefix::from)
                .map_err(|e| anyhow!("Invalid prefix pattern `{}`: {}", pattern, e))
        });
        literal.chain(patterns).collect()
    }

    pub fn listeners(&self) -> Result<Listeners> {
        if !self.logger.enabled {
            return Ok(Listeners::None);
        }
        if self.logger.events.is_empty() {
            return Ok(Listeners::All);
        }
        self.logger
            .events
            .iter()
            .map(|name| name.parse::<DefaultListener>())
            .collect::<Result<Vec<_>>>()
            .map(Listeners::Only)
    }

    pub fn command_options(&self) -> Result<commands::Options> {
        Ok(commands::Options {
            command_directory: self.commands.directory.clone(),
            auto_load: self.commands.auto_load,
            default_help: self.commands.default_help,
            owner: self.owner()?,
            prefixes: self.prefixes()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[general]
discord_token = "token"
prefixes = ["!"]
"#;

    #[test]
    fn optional_sections_have_defaults() {
        let config = Config::parse(MINIMAL).unwrap();

        assert_eq!(config.commands.directory, PathBuf::from("./commands"));
        assert!(config.commands.auto_load);
        assert!(config.commands.default_help);
        assert_eq!(config.listeners().unwrap(), Listeners::All);
        assert_eq!(config.owner().unwrap(), None);
    }

    #[test]
    fn full_configuration() {
        let config = Config::parse(
            r#"
[general]
discord_token = "token"
owner = "96269247411400704"
prefixes = ["!", "?"]
prefix_patterns = ['^<@!?\d+> (.+)']

[commands]
directory = "/srv/bot/commands"
auto_load = false

[logger]
events = ["ready", "guild_create"]
"#,
        )
        .unwrap();

        assert_eq!(config.owner().unwrap(), Some(UserId::new(96269247411400704)));
        let prefixes = config.prefixes().unwrap();
        assert_eq!(prefixes.len(), 3);
        assert_eq!(prefixes[0], Prefix::from("!"));
        assert_eq!(prefixes[2].strip("<@1234> help"), Some("help"));
        assert_eq!(
            config.listeners().unwrap(),
            Listeners::Only(vec![DefaultListener::Ready, DefaultListener::GuildCreate])
        );

        let options = config.command_options().unwrap();
        assert!(!options.auto_load);
        assert!(options.default_help);
        assert_eq!(options.command_directory, PathBuf::from("/srv/bot/commands"));
    }

    #[test]
    fn disabled_logger_listens_to_nothing() {
        let config = Config::parse(&format!("{}\n[logger]\nenabled = false\n", MINIMAL)).unwrap();
        assert_eq!(config.listeners().unwrap(), Listeners::None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("[general]\ndiscord_token = \"token\"\n").is_err());

        let bad_owner = Config::parse(&MINIMAL.replace("token\"", "token\"\nowner = \"me\"")).unwrap();
        assert!(bad_owner.owner().is_err());

        let bad_pattern =
            Config::parse(&format!("{}prefix_patterns = [\"(\"]\n", MINIMAL)).unwrap();
        assert!(bad_pattern.prefixes().is_err());

        let bad_event = Config::parse(&format!("{}\n[logger]\nevents = [\"typing\"]\n", MINIMAL)).unwrap();
        assert!(bad_event.listeners().is_err());
    }
}
