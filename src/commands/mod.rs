//! Prefix command framework: a [`Holder`] of commands grouped into modules, and the middleware
//! that runs them for incoming messages.

use crate::{
    client::Erisa,
    event::{self, Event, Payload},
    handler::{Handler, Middleware},
    log_failure, log_internal, logger,
    matchable::Matchable,
};
use anyhow::Result;
use serenity::all::{FullEvent, Permissions, UserId};
use std::{
    future::Future,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

mod args;
mod command;
mod context;
mod help;
mod holder;
mod module_file;
mod paginator;
mod permissions;
mod prefix;

pub use args::{parse_args, ParsedArgs};
pub use command::{answers_to, Command, SubCommand, SubCommandOptions, DEFAULT_CATEGORY};
pub use context::{
    channel_permissions, CommandContext, Destination, DiscordOutbox, Invocation, Outbox, Recipient,
};
pub use help::Help;
pub use holder::{Holder, LoadReport, Loaded, GUILD_ONLY_REFUSAL};
pub use module_file::TextCommand;
pub use paginator::{Paginator, MESSAGE_LIMIT};
pub use permissions::{CommandPermissions, PermissionCheck, PermissionTarget};
pub use prefix::Prefix;

/// Emitted with the [`CommandContext`] after a command ran.
pub const COMMANDS_RUN: &str = "erisa.commands.run";
/// Emitted with the [`LoadReport`]'s loaded modules once the command directory was loaded.
pub const COMMANDS_LOADED: &str = "erisa.commands.loaded";

pub const DEFAULT_COMMAND_DIRECTORY: &str = "./commands";

pub struct Options {
    pub command_directory: PathBuf,
    /// Load the command directory when first connected
    pub auto_load: bool,
    /// Register the `help` command
    pub default_help: bool,
    pub owner: Option<UserId>,
    pub prefixes: Vec<Prefix>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            command_directory: PathBuf::from(DEFAULT_COMMAND_DIRECTORY),
            auto_load: true,
            default_help: true,
            owner: None,
            prefixes: Vec::new(),
        }
    }
}

/// Install a [`Holder`] into `erisa`'s extensions and return the middleware running its
/// commands, meant for [`Erisa::use_pairs`].
pub async fn setup(erisa: &Erisa, options: Options) -> Result<Vec<(Matchable, Handler)>> {
    let holder = Arc::new(Holder::new(options.prefixes, options.owner));
    erisa.extensions_mut().insert::<Holder>(holder.clone());

    if options.default_help {
        holder
            .add("help", || vec![Arc::new(Help::new()) as Arc<dyn Command>])
            .await?;
    }

    let mut pairs = vec![(
        Matchable::name(event::MESSAGE),
        Handler::new(RunCommands {
            holder: holder.clone(),
        }),
    )];
    if options.auto_load {
        pairs.push((
            Matchable::name(event::READY),
            Handler::new(AutoLoad {
                holder,
                directory: options.command_directory,
                done: AtomicBool::new(false),
            }),
        ));
    }

    Ok(pairs)
}

/// The installed holder, if [`setup`] ran.
pub fn holder(erisa: &Erisa) -> Option<Arc<Holder>> {
    erisa.extensions().get::<Holder>().cloned()
}

/// Runs commands in incoming messages.
struct RunCommands {
    holder: Arc<Holder>,
}

#[serenity::async_trait]
impl Middleware for RunCommands {
    async fn handle(&self, erisa: &Erisa, event: &Event) -> Result<()> {
        let Some((discord, FullEvent::Message { new_message })) = event.full_event() else {
            return Ok(());
        };
        if new_message.author.bot {
            return Ok(());
        }

        let Some(ctx) =
            CommandContext::from_message(erisa.clone(), discord, new_message, self.holder.clone())
        else {
            return Ok(());
        };

        run_command(erisa, &self.holder, ctx, || {
            context::channel_permissions(discord, new_message)
        })
        .await
    }
}

/// Run the command `ctx` invokes once `permissions` resolved the channel permissions, which is
/// skipped for unknown commands.  Failures of either are replied to the invoker.
async fn run_command<F, Fut>(
    erisa: &Erisa,
    holder: &Holder,
    mut ctx: CommandContext,
    permissions: F,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(Option<Permissions>, Option<Permissions>)>>,
{
    if holder.get(&ctx.cmd).is_none() {
        return Ok(());
    }

    let result = match permissions().await {
        Ok((author, me)) => {
            ctx.author_permissions = author;
            ctx.self_permissions = me;
            holder.run(&ctx).await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(true) => {
            erisa.emit(COMMANDS_RUN, Payload::value(ctx)).await;
        }
        Ok(false) => {}
        Err(err) => {
            ctx.send(format!(
                "There was an error when trying to run your command:\n{}",
                err
            ))
            .await?;
        }
    }

    Ok(())
}

/// Loads the command directory on the first `ready`.  Reconnects send `ready` again.
struct AutoLoad {
    holder: Arc<Holder>,
    directory: PathBuf,
    done: AtomicBool,
}

#[serenity::async_trait]
impl Middleware for AutoLoad {
    async fn handle(&self, erisa: &Erisa, _event: &Event) -> Result<()> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let report = self.holder.load_all(&self.directory, true).await;
        log_internal!(
            "Loaded {} command modules from `{}`",
            report.loaded.len(),
            self.directory.display()
        );
        report_problems(erisa, &report);

        erisa.emit(COMMANDS_LOADED, Payload::value(report.loaded)).await;
        Ok(())
    }
}

/// Send load warnings and failures to the logger, or stderr without one.
fn report_problems(erisa: &Erisa, report: &LoadReport) {
    match logger::get(erisa) {
        Some(logger) => {
            for warning in report.warnings() {
                logger.warn(warning);
            }
            for failure in &report.failures {
                logger.error(&failure.to_string());
            }
        }
        None => {
            for warning in report.warnings() {
                log_failure!("{}", warning);
            }
            for failure in &report.failures {
                log_failure!("{}", failure);
            }
        }
    }
}
