mod cli;

use clap::Parser;
use erisa::{
    commands,
    config::Config,
    log_event, logger,
    logging::{paint, Color},
    Erisa, ErisaFramework, Event, Handler,
};
use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let cfg = Config::load(cli.config.as_deref()).await?;
    let token = cfg.general.discord_token.clone();

    let erisa = Erisa::new();
    if cli.trace_events {
        erisa.use_handlers([Handler::from_fn(trace_event)]);
    }
    if let Some(lifecycle) = logger::install(&erisa, cfg.listeners()?) {
        erisa.use_handlers([lifecycle]);
    }
    erisa.use_pairs(commands::setup(&erisa, cfg.command_options()?).await?);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .framework(ErisaFramework::new(erisa))
        .await?
        .start()
        .await
        .map_err(Into::into)
}

async fn trace_event(_: Erisa, event: Event) -> anyhow::Result<()> {
    log_event!("{}", paint(Color::Highlight, &event.name));
    Ok(())
}
