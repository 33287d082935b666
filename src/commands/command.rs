use super::{context::CommandContext, permissions::CommandPermissions};
use anyhow::Result;
use std::{future::Future, pin::Pin, sync::Arc};

/// Category for commands that don't name one
pub const DEFAULT_CATEGORY: &str = "Uncategorised";

/// A command the [`super::Holder`] can run.
#[serenity::async_trait]
pub trait Command: Send + Sync {
    /// Name the command is invoked by.  Matched case-insensitively.
    fn name(&self) -> &str;
    /// One line summary.  Must not be empty.
    fn overview(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Arguments, e.g. `<user> [reason]`
    fn usage(&self) -> Option<&str> {
        None
    }

    fn owner_only(&self) -> bool {
        false
    }

    fn guild_only(&self) -> bool {
        false
    }

    /// Left out of the help listing for everyone but the owner
    fn hidden(&self) -> bool {
        false
    }

    fn aliases(&self) -> &[String] {
        &[]
    }

    fn category(&self) -> &str {
        DEFAULT_CATEGORY
    }

    fn permissions(&self) -> Option<&CommandPermissions> {
        None
    }

    fn subcommands(&self) -> &[Arc<dyn Command>] {
        &[]
    }

    /// Called once when the command is added to a holder.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn main(&self, ctx: &CommandContext) -> Result<()>;
}

pub type BoxFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type SubCommandMain = Box<dyn Fn(CommandContext) -> BoxFuture + Send + Sync>;

#[derive(Clone, Debug, Default)]
pub struct SubCommandOptions {
    pub name: String,
    pub overview: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub owner_only: bool,
    pub guild_only: bool,
    pub hidden: bool,
    pub aliases: Vec<String>,
    pub permissions: Option<CommandPermissions>,
}

/// A command nested under another, reached by naming it as the first argument.
pub struct SubCommand {
    options: SubCommandOptions,
    subcommands: Vec<Arc<dyn Command>>,
    main: SubCommandMain,
}

impl SubCommand {
    pub fn new<F, Fut>(options: SubCommandOptions, main: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            options,
            subcommands: Vec::new(),
            main: Box::new(move |ctx| Box::pin(main(ctx))),
        }
    }

    pub fn with_subcommands(mut self, subcommands: Vec<Arc<dyn Command>>) -> Self {
        self.subcommands = subcommands;
        self
    }
}

#[serenity::async_trait]
impl Command for SubCommand {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn overview(&self) -> &str {
        &self.options.overview
    }

    fn description(&self) -> Option<&str> {
        self.options.description.as_deref()
    }

    fn usage(&self) -> Option<&str> {
        self.options.usage.as_deref()
    }

    fn owner_only(&self) -> bool {
        self.options.owner_only
    }

    fn guild_only(&self) -> bool {
        self.options.guild_only
    }

    fn hidden(&self) -> bool {
        self.options.hidden
    }

    fn aliases(&self) -> &[String] {
        &self.options.aliases
    }

    fn permissions(&self) -> Option<&CommandPermissions> {
        self.options.permissions.as_ref()
    }

    fn subcommands(&self) -> &[Arc<dyn Command>] {
        &self.subcommands
    }

    async fn main(&self, ctx: &CommandContext) -> Result<()> {
        (self.main)(ctx.clone()).await
    }
}

/// The form command names and aliases are registered and looked up in.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Whether `name` refers to `command`, by name or alias.
pub fn answers_to(command: &dyn Command, name: &str) -> bool {
    let name = fold_name(name);
    fold_name(command.name()) == name
        || command
            .aliases()
            .iter()
            .any(|alias| fold_name(alias) == name)
}
