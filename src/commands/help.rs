use super::{
    command::{fold_name, Command},
    context::{CommandContext, Destination},
    paginator::Paginator,
};
use anyhow::Result;

pub const DM_REFUSAL: &str =
    "I am unable to send you DMs. Perhaps you have me blocked or have DMs disabled?";

/// Longest overview shown in the listing
const OVERVIEW_WIDTH: usize = 80;

/// Lists commands, or details one.
pub struct Help {
    aliases: Vec<String>,
}

impl Help {
    pub fn new() -> Self {
        Self {
            aliases: vec!["commands".to_owned()],
        }
    }

    /// Category-grouped listing of the commands `ctx`'s author may see.
    fn listing(ctx: &CommandContext) -> Paginator {
        let mut paginator = Paginator::with_prefix("```yaml\n");
        let visible = |cmd: &&std::sync::Arc<dyn Command>| {
            !(cmd.owner_only() || cmd.hidden()) || ctx.is_bot_owner()
        };

        for (category, commands) in ctx.holder.commands_by_category() {
            let mut commands: Vec<_> = commands.iter().filter(visible).collect();
            if commands.is_empty() {
                continue;
            }
            commands.sort_by(|a, b| a.name().cmp(b.name()));

            let opener = if paginator.lines().is_empty() { '┍' } else { '┝' };
            paginator.add_line(format!("{}━ # {} ━", opener, category), false);
            for cmd in commands {
                let overview: String = cmd.overview().chars().take(OVERVIEW_WIDTH).collect();
                paginator.add_line(format!("│ {}: {}", cmd.name(), overview), false);
            }
        }

        paginator
    }

    fn details(cmd: &dyn Command) -> Paginator {
        let mut paginator = Paginator::with_prefix("```yaml\n");
        paginator.add_line(format!("# {}", cmd.name()), false);

        if let Some(usage) = cmd.usage() {
            paginator.add_line(format!("Usage: {}", usage), false);
        }
        if !cmd.aliases().is_empty() {
            paginator.add_line(format!("Aliases: {}", cmd.aliases().join(", ")), false);
        }

        paginator.add_line("", false);
        paginator.add_line(format!("  {}", cmd.overview()), true);

        if !cmd.subcommands().is_empty() {
            paginator.add_line("Subcommands:", false);
            for sub in cmd.subcommands() {
                paginator.add_line(format!(" - {} -: {}", sub.name(), sub.overview()), false);
            }
        }

        if let Some(description) = cmd.description() {
            paginator.add_lines(description.lines());
        }

        paginator
    }
}

impl Default for Help {
    fn default() -> Self {
        Self::new()
    }
}

#[serenity::async_trait]
impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn overview(&self) -> &str {
        "Get help for commands."
    }

    fn usage(&self) -> Option<&str> {
        Some("[command]")
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    async fn main(&self, ctx: &CommandContext) -> Result<()> {
        let Some(name) = ctx.args.first() else {
            for page in Self::listing(ctx).pages() {
                if ctx.send_to(page, Destination::Author).await.is_err() {
                    return ctx.send(DM_REFUSAL).await;
                }
            }
            return Ok(());
        };

        let name = fold_name(name);
        let cmd = match ctx.holder.get(&name) {
            Some(cmd) if !cmd.owner_only() || ctx.is_bot_owner() => cmd,
            _ => return ctx.send(format!("Unknown command **{}**.", name)).await,
        };

        for page in Self::details(cmd.as_ref()).pages() {
            ctx.send(page).await?;
        }
        Ok(())
    }
}
