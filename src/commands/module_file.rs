//! Command modules written as TOML files, each command replying with fixed text.
//!
//! ```toml
//! [[command]]
//! name = "ping"
//! overview = "Replies with pong."
//! response = "Pong, {author}! You said: {suffix}"
//! aliases = ["p"]
//!
//! [command.permissions]
//! self = ["SEND_MESSAGES"]
//! ```

use super::{
    command::{Command, DEFAULT_CATEGORY},
    context::{CommandContext, Destination},
    permissions::{parse_names, CommandPermissions},
};
use crate::error::ModuleError;
use anyhow::Result;
use serde::Deserialize;
use serenity::all::Mentionable;
use std::{path::Path, sync::Arc};

#[derive(Deserialize)]
struct ModuleFile {
    #[serde(default, rename = "command")]
    commands: Vec<CommandEntry>,
}

#[derive(Deserialize)]
struct CommandEntry {
    name: String,
    #[serde(default)]
    overview: String,
    response: String,
    #[serde(default)]
    aliases: Vec<String>,
    category: Option<String>,
    usage: Option<String>,
    description: Option<String>,
    #[serde(default)]
    owner_only: bool,
    #[serde(default)]
    guild_only: bool,
    #[serde(default)]
    hidden: bool,
    /// Reply in the author's DMs instead of the channel
    #[serde(default)]
    dm: bool,
    permissions: Option<PermissionEntry>,
}

#[derive(Deserialize)]
struct PermissionEntry {
    #[serde(default, rename = "self")]
    self_: Vec<String>,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    both: Vec<String>,
}

/// A command replying with a template.  `{suffix}` and `{author}` are filled in per invocation.
pub struct TextCommand {
    name: String,
    overview: String,
    response: String,
    aliases: Vec<String>,
    category: String,
    usage: Option<String>,
    description: Option<String>,
    owner_only: bool,
    guild_only: bool,
    hidden: bool,
    destination: Destination,
    permissions: Option<CommandPermissions>,
}

impl TextCommand {
    pub fn render(&self, ctx: &CommandContext) -> String {
        self.response
            .replace("{suffix}", &ctx.suffix)
            .replace("{author}", &ctx.author_id.mention().to_string())
    }
}

#[serenity::async_trait]
impl Command for TextCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn overview(&self) -> &str {
        &self.overview
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    fn owner_only(&self) -> bool {
        self.owner_only
    }

    fn guild_only(&self) -> bool {
        self.guild_only
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn permissions(&self) -> Option<&CommandPermissions> {
        self.permissions.as_ref()
    }

    async fn main(&self, ctx: &CommandContext) -> Result<()> {
        ctx.send_to(self.render(ctx), self.destination).await
    }
}

/// The commands in a module file, plus warnings about anything that was skipped.
pub fn parse(path: &Path, text: &str) -> Result<(Vec<Arc<dyn Command>>, Vec<String>), ModuleError> {
    let file: ModuleFile = toml::from_str(text).map_err(|source| ModuleError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut warnings = Vec::new();
    let mut commands: Vec<Arc<dyn Command>> = Vec::new();
    for entry in file.commands {
        let permissions = match entry.permissions {
            Some(names) => {
                let mut parse = |names: &[String]| {
                    let (parsed, unknown) = parse_names(names);
                    for name in unknown {
                        warnings.push(format!(
                            "Unknown permission \"{}\" on command '{}' in `{}`",
                            name,
                            entry.name,
                            path.display()
                        ));
                    }
                    parsed
                };
                let permissions = CommandPermissions {
                    self_: parse(&names.self_),
                    author: parse(&names.author),
                    both: parse(&names.both),
                };
                Some(permissions).filter(|permissions| !permissions.is_empty())
            }
            None => None,
        };

        commands.push(Arc::new(TextCommand {
            name: entry.name,
            overview: entry.overview,
            response: entry.response,
            aliases: entry.aliases,
            category: entry.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
            usage: entry.usage,
            description: entry.description,
            owner_only: entry.owner_only,
            guild_only: entry.guild_only,
            hidden: entry.hidden,
            destination: if entry.dm {
                Destination::Author
            } else {
                Destination::Channel
            },
            permissions,
        }));
    }

    Ok((commands, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{context::testing::*, Holder};
    use serenity::all::Permissions;

    const MODULE: &str = r#"
[[command]]
name = "ping"
overview = "Replies with pong."
response = "Pong, {author}! {suffix}"
aliases = ["p"]

[[command]]
name = "secret"
overview = "Whispers."
response = "psst"
category = "Fun"
dm = true
hidden = true

[command.permissions]
self = ["SEND_MESSAGES", "FLY"]
both = ["manage_messages"]
"#;

    #[test]
    fn parses_commands() {
        let (commands, warnings) = parse(Path::new("fun.toml"), MODULE).unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name(), "ping");
        assert_eq!(commands[0].aliases(), ["p"]);
        assert_eq!(commands[0].category(), DEFAULT_CATEGORY);
        assert!(commands[0].permissions().is_none());

        assert_eq!(commands[1].category(), "Fun");
        assert!(commands[1].hidden());
        let permissions = commands[1].permissions().unwrap();
        assert_eq!(permissions.self_, vec![Permissions::SEND_MESSAGES]);
        assert_eq!(permissions.both, vec![Permissions::MANAGE_MESSAGES]);
        assert!(permissions.author.is_empty());

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"FLY\""), "{}", warnings[0]);
    }

    #[test]
    fn permission_tables_without_known_names_are_dropped() {
        let module = r#"
[[command]]
name = "open"
overview = "Open to everyone."
response = "ok"

[command.permissions]
author = ["SWIM"]
"#;
        let (commands, warnings) = parse(Path::new("open.toml"), module).unwrap();

        assert!(commands[0].permissions().is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn rejects_malformed_files() {
        let Err(err) = parse(Path::new("bad.toml"), "[[command]]\nname = 5") else {
            panic!("a numeric name should not parse");
        };
        assert!(matches!(err, ModuleError::Parse { .. }));
    }

    #[tokio::test]
    async fn fills_in_the_template() {
        let holder = Arc::new(Holder::new(vec!["!".into()], None));
        let (commands, _) = parse(Path::new("fun.toml"), MODULE).unwrap();
        let (ctx, outbox) = context(&holder, invocation("!ping how are you"));

        commands[0].main(&ctx).await.unwrap();

        assert_eq!(
            outbox.contents(),
            vec![format!("Pong, <@{}>! how are you", AUTHOR)]
        );
    }

    #[tokio::test]
    async fn dm_commands_reply_privately() {
        let holder = Arc::new(Holder::new(vec!["!".into()], None));
        let (commands, _) = parse(Path::new("fun.toml"), MODULE).unwrap();
        let (ctx, outbox) = context(&holder, invocation("!secret"));

        commands[1].main(&ctx).await.unwrap();

        assert_eq!(
            outbox.sent.lock()[0].0,
            crate::commands::context::Recipient::User(serenity::all::UserId::new(AUTHOR))
        );
    }
}
