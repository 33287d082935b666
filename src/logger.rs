//! Leveled console logger, installed as a client extension, plus optional middleware logging a
//! handful of lifecycle events.

use crate::{
    client::Erisa,
    event::{self, Event, ShardNotice},
    handler::{Handler, Middleware},
    logging::{paint, Color},
};
use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use serenity::{all::FullEvent, prelude::TypeMapKey};
use std::{collections::BTreeMap, str::FromStr, sync::Arc};

pub type Paint = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How one level renders: a tag in front, and a paint applied to each message.
#[derive(Clone)]
pub struct Level {
    pub tag: String,
    pub paint: Paint,
}

impl Level {
    pub fn new(tag: impl Into<String>, paint: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            tag: tag.into(),
            paint: Arc::new(paint),
        }
    }

    fn colored(tag: &str, tag_color: Color, text_color: Color) -> Self {
        Self::new(paint(tag_color, tag), move |text| paint(text_color, text))
    }
}

pub struct Logger {
    levels: RwLock<BTreeMap<String, Level>>,
}

impl TypeMapKey for Logger {
    type Value = Arc<Logger>;
}

impl Logger {
    pub fn new() -> Self {
        let levels = BTreeMap::from([
            (
                "error".to_owned(),
                Level::colored("[ERROR]", Color::ErrorTag, Color::ErrorText),
            ),
            (
                "warn".to_owned(),
                Level::colored("[WARN]", Color::WarnTag, Color::WarnText),
            ),
            (
                "info".to_owned(),
                Level::colored("[INFO]", Color::InfoTag, Color::InfoText),
            ),
        ]);

        Self {
            levels: RwLock::new(levels),
        }
    }

    /// Add or replace a level.
    pub fn add_level(&self, name: impl Into<String>, level: Level) {
        self.levels.write().insert(name.into(), level);
    }

    pub fn level(&self, name: &str) -> Option<Level> {
        self.levels.read().get(name).cloned()
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.read().keys().cloned().collect()
    }

    /// The line [`Logger::dispatch`] prints.  Unknown levels print the messages untouched.
    pub fn format_line(&self, level: &str, msgs: &[&str]) -> String {
        match self.level(level) {
            Some(level) => std::iter::once(level.tag.clone())
                .chain(msgs.iter().map(|msg| (level.paint)(msg)))
                .collect::<Vec<_>>()
                .join(" "),
            None => msgs.join(" "),
        }
    }

    pub fn dispatch(&self, level: &str, msgs: &[&str]) {
        println!("{}", self.format_line(level, msgs));
    }

    pub fn error(&self, msg: &str) {
        self.dispatch("error", &[msg]);
    }

    pub fn warn(&self, msg: &str) {
        self.dispatch("warn", &[msg]);
    }

    pub fn info(&self, msg: &str) {
        self.dispatch("info", &[msg]);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle events the logger can report on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultListener {
    Ready,
    Error,
    Warn,
    GuildCreate,
    GuildDelete,
}

impl DefaultListener {
    pub const ALL: [DefaultListener; 5] = [
        DefaultListener::Ready,
        DefaultListener::Error,
        DefaultListener::Warn,
        DefaultListener::GuildCreate,
        DefaultListener::GuildDelete,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            DefaultListener::Ready => event::READY,
            DefaultListener::Error => event::ERROR,
            DefaultListener::Warn => event::WARN,
            DefaultListener::GuildCreate => "guild_create",
            DefaultListener::GuildDelete => "guild_delete",
        }
    }
}

impl FromStr for DefaultListener {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|listener| listener.event_name() == s)
            .ok_or_else(|| anyhow!("Unknown logger listener `{}`", s))
    }
}

/// Which lifecycle events to log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listeners {
    None,
    All,
    Only(Vec<DefaultListener>),
}

impl Listeners {
    fn includes(&self, event: &str) -> bool {
        match self {
            Listeners::None => false,
            Listeners::All => DefaultListener::ALL
                .iter()
                .any(|listener| listener.event_name() == event),
            Listeners::Only(listeners) => listeners
                .iter()
                .any(|listener| listener.event_name() == event),
        }
    }
}

/// Install the logger into `erisa`'s extensions, keeping an already installed one.  Returns
/// middleware logging the requested lifecycle events, meant for [`Erisa::use_handlers`].
pub fn install(erisa: &Erisa, listeners: Listeners) -> Option<Handler> {
    {
        let mut extensions = erisa.extensions_mut();
        if extensions.get::<Logger>().is_none() {
            extensions.insert::<Logger>(Arc::new(Logger::new()));
        }
    }

    match listeners {
        Listeners::None => None,
        listeners => Some(Handler::new(LifecycleLogger { listeners })),
    }
}

/// The installed logger, if any.
pub fn get(erisa: &Erisa) -> Option<Arc<Logger>> {
    erisa.extensions().get::<Logger>().cloned()
}

struct LifecycleLogger {
    listeners: Listeners,
}

#[serenity::async_trait]
impl Middleware for LifecycleLogger {
    async fn handle(&self, erisa: &Erisa, event: &Event) -> Result<()> {
        if !self.listeners.includes(&event.name) {
            return Ok(());
        }
        let Some(logger) = get(erisa) else {
            return Ok(());
        };
        if let Some((level, message)) = describe(event) {
            logger.dispatch(level, &[&message]);
        }
        Ok(())
    }
}

/// Level and message for a lifecycle event, `None` for anything else.
fn describe(event: &Event) -> Option<(&'static str, String)> {
    if let Some(notice) = event.value::<ShardNotice>() {
        return match event.name.as_str() {
            event::ERROR => Some((
                "error",
                format!("Discord error for shard {}: {}", notice.shard_id, notice.message),
            )),
            event::WARN => Some((
                "warn",
                format!("Discord warning for shard {}: {}", notice.shard_id, notice.message),
            )),
            _ => None,
        };
    }

    let (_, full_event) = event.full_event()?;
    match full_event {
        FullEvent::Ready { data_about_bot } => {
            Some(("info", format!("Logged in as {}", data_about_bot.user.name)))
        }
        // Discord also sends guild creates for guilds we were already in when connecting.
        FullEvent::GuildCreate { guild, is_new } if *is_new == Some(true) => Some((
            "info",
            format!("Joined guild {} ({})", guild.name, guild.id),
        )),
        FullEvent::GuildDelete { incomplete, full } => {
            let name = full
                .as_ref()
                .map(|guild| guild.name.as_str())
                .unwrap_or("<unknown-guild>");
            Some(("info", format!("Left guild {} ({})", name, incomplete.id)))
        }
        _ => None,
    }
}
