use super::{
    args::parse_args,
    command::fold_name,
    holder::Holder,
    permissions::PermissionTarget,
};
use crate::client::Erisa;
use anyhow::{anyhow, Result};
use serenity::all::{
    ChannelId, Context, CreateMessage, GuildId, Message, Permissions, UserId,
};
use std::sync::Arc;

/// Where a reply goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// The channel the command was invoked in
    Channel,
    /// The invoking user's DMs
    Author,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    Channel(ChannelId),
    User(UserId),
}

/// Sends command replies.  Backed by Discord in production.
#[serenity::async_trait]
pub trait Outbox: Send + Sync {
    async fn send(&self, to: Recipient, content: &str) -> Result<()>;
}

pub struct DiscordOutbox {
    discord: Context,
}

impl DiscordOutbox {
    pub fn new(discord: Context) -> Self {
        Self { discord }
    }
}

#[serenity::async_trait]
impl Outbox for DiscordOutbox {
    async fn send(&self, to: Recipient, content: &str) -> Result<()> {
        match to {
            Recipient::Channel(channel_id) => {
                channel_id.say(&self.discord, content).await?;
            }
            Recipient::User(user_id) => {
                user_id
                    .direct_message(&self.discord, CreateMessage::new().content(content))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Everything needed to build a [`CommandContext`] besides the holder and outbox.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub content: String,
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    /// `None` outside of guilds, where everything is allowed
    pub author_permissions: Option<Permissions>,
    pub self_permissions: Option<Permissions>,
}

/// A command invocation, handed to [`super::Command::main`].
#[derive(Clone)]
pub struct CommandContext {
    /// Invoked name, lowercased
    pub cmd: String,
    pub args: Vec<String>,
    /// Everything after the command name
    pub suffix: String,
    pub content: String,
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author_permissions: Option<Permissions>,
    pub self_permissions: Option<Permissions>,
    pub holder: Arc<Holder>,
    pub outbox: Arc<dyn Outbox>,
    /// The client the invocation came through, for awaiting replies, emitting events and
    /// reaching extensions
    pub erisa: Erisa,
    /// Serenity context and message, when the invocation came from the gateway
    pub discord: Option<Context>,
    pub message: Option<Arc<Message>>,
}

impl CommandContext {
    /// `None` unless the content carries one of the holder's prefixes.
    pub fn new(
        erisa: Erisa,
        holder: Arc<Holder>,
        invocation: Invocation,
        outbox: Arc<dyn Outbox>,
    ) -> Option<Self> {
        let text = holder.test_prefix(&invocation.content)?;
        let parsed = parse_args(text);

        Some(Self {
            cmd: fold_name(&parsed.cmd),
            args: parsed.args,
            suffix: parsed.suffix,
            content: invocation.content,
            author_id: invocation.author_id,
            channel_id: invocation.channel_id,
            guild_id: invocation.guild_id,
            author_permissions: invocation.author_permissions,
            self_permissions: invocation.self_permissions,
            holder,
            outbox,
            erisa,
            discord: None,
            message: None,
        })
    }

    /// Context for a gateway message, `None` when it isn't a command.  Channel permissions are
    /// left unresolved, see [`channel_permissions`].
    pub fn from_message(
        erisa: Erisa,
        discord: &Context,
        msg: &Message,
        holder: Arc<Holder>,
    ) -> Option<Self> {
        let invocation = Invocation {
            content: msg.content.clone(),
            author_id: msg.author.id,
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            author_permissions: None,
            self_permissions: None,
        };
        let outbox = Arc::new(DiscordOutbox::new(discord.clone()));

        Self::new(erisa, holder, invocation, outbox).map(|ctx| Self {
            discord: Some(discord.clone()),
            message: Some(Arc::new(msg.clone())),
            ..ctx
        })
    }

    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Whether `target` holds `permission` in the invoking channel.  Always true in DMs.
    pub fn has_permission(&self, permission: Permissions, target: PermissionTarget) -> bool {
        let holds = |perms: Option<Permissions>| perms.map_or(true, |perms| perms.contains(permission));
        match target {
            PermissionTarget::Author => holds(self.author_permissions),
            PermissionTarget::Bot => holds(self.self_permissions),
            PermissionTarget::Both => holds(self.author_permissions) && holds(self.self_permissions),
        }
    }

    pub fn is_bot_owner(&self) -> bool {
        self.holder.owner() == Some(self.author_id)
    }

    /// Reply in the invoking channel.
    pub async fn send(&self, content: impl AsRef<str>) -> Result<()> {
        self.send_to(content, Destination::Channel).await
    }

    pub async fn send_to(&self, content: impl AsRef<str>, destination: Destination) -> Result<()> {
        let to = match destination {
            Destination::Channel => Recipient::Channel(self.channel_id),
            Destination::Author => Recipient::User(self.author_id),
        };
        self.outbox.send(to, content.as_ref()).await
    }
}

/// Channel permissions of the author and the bot, `None` outside guilds.
pub async fn channel_permissions(
    discord: &Context,
    msg: &Message,
) -> Result<(Option<Permissions>, Option<Permissions>)> {
    let Some(guild_id) = msg.guild_id else {
        return Ok((None, None));
    };

    let bot_id = discord.cache.current_user().id;
    let author = guild_id.member(discord, msg.author.id).await?;
    let me = guild_id.member(discord, bot_id).await?;
    let channel = msg
        .channel_id
        .to_channel(discord)
        .await?
        .guild()
        .ok_or_else(|| anyhow!("Channel {} is not a guild channel", msg.channel_id))?;

    let guild = discord
        .cache
        .guild(guild_id)
        .ok_or_else(|| anyhow!("Guild {} is not cached", guild_id))?;

    Ok((
        Some(guild.user_permissions_in(&channel, &author)),
        Some(guild.user_permissions_in(&channel, &me)),
    ))
}
