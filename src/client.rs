//! The [`Erisa`] client: an ordered registry of middleware keyed by event names and patterns.

use crate::{
    awaiting::{Awaiter, Filter},
    error::AwaitError,
    event::{self, Event, Payload},
    format::{FormatOptions, Formattable},
    handler::Handler,
    log_failure,
    matchable::Matchable,
};
use anyhow::Result;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serenity::{
    all::{ChannelId, FullEvent, Message, UserId},
    prelude::TypeMap,
};
use std::{sync::Arc, time::Duration};

/// How long [`Erisa::await_message`] waits unless told otherwise.
pub const DEFAULT_AWAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Middleware dispatcher wrapped around the serenity client.
///
/// Cloning is cheap; every clone refers to the same registry.
#[derive(Clone)]
pub struct Erisa {
    inner: Arc<Inner>,
}

struct Inner {
    /// Keys in registration order, each with its handlers in registration order.
    handlers: RwLock<Vec<(Matchable, Vec<Handler>)>>,
    /// Messages that are currently being waited for, keyed by channel and author.
    currently_awaiting: Awaiter<(ChannelId, UserId), Message>,
    /// Storage for middleware extensions, such as the command holder or the logger.
    extensions: RwLock<TypeMap>,
}

/// Runs the handlers registered for one event name, see [`Erisa::handle_event`].
pub struct EventListener {
    erisa: Erisa,
    key: Matchable,
}

pub struct AwaitMessageOptions {
    pub timeout: Duration,
    pub filter: Filter<Message>,
}

impl Default for AwaitMessageOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_AWAIT_TIMEOUT,
            filter: Box::new(|_| true),
        }
    }
}

impl Erisa {
    pub fn new() -> Self {
        let erisa = Self {
            inner: Arc::new(Inner {
                handlers: RwLock::new(Vec::new()),
                currently_awaiting: Awaiter::new(),
                extensions: RwLock::new(TypeMap::new()),
            }),
        };

        erisa.use_on([event::MESSAGE], [Handler::from_fn(resolve_awaited_message)]);
        erisa
    }

    /// Register middleware that runs on every event.
    pub fn use_handlers(&self, handlers: impl IntoIterator<Item = Handler>) -> &Self {
        self.use_on([Matchable::wildcard()], handlers)
    }

    /// Register middleware for specific events.  Handlers are appended after any already
    /// registered under the same key.
    pub fn use_on<E>(&self, events: E, handlers: impl IntoIterator<Item = Handler>) -> &Self
    where
        E: IntoIterator,
        E::Item: Into<Matchable>,
    {
        let handlers: Vec<Handler> = handlers.into_iter().collect();
        let mut registry = self.inner.handlers.write();

        for event in events {
            let event = event.into();
            match registry.iter_mut().find(|(key, _)| *key == event) {
                Some((_, existing)) => existing.extend(handlers.iter().cloned()),
                None => registry.push((event, handlers.clone())),
            }
        }

        self
    }

    /// Register `(event, handler)` pairs in order, e.g. those returned by
    /// [`crate::commands::setup`].
    pub fn use_pairs<E>(&self, pairs: impl IntoIterator<Item = (E, Handler)>) -> &Self
    where
        E: Into<Matchable>,
    {
        for (event, handler) in pairs {
            self.use_on([event], [handler]);
        }
        self
    }

    /// Remove the given middleware from every event it is registered on.
    pub fn disuse(&self, handlers: impl IntoIterator<Item = Handler>) -> &Self {
        let mut registry = self.inner.handlers.write();

        for handler in handlers {
            for (_, existing) in registry.iter_mut() {
                if let Some(pos) = existing.iter().position(|h| *h == handler) {
                    existing.remove(pos);
                }
            }
        }
        registry.retain(|(_, existing)| !existing.is_empty());

        self
    }

    /// Remove middleware from specific events.  With no handlers given, every handler of those
    /// events is removed.  Naming the wildcard event removes the handlers everywhere; without
    /// handlers that means every wildcard handler, from every key it is registered on.
    pub fn disuse_on<E>(&self, events: E, handlers: impl IntoIterator<Item = Handler>) -> &Self
    where
        E: IntoIterator,
        E::Item: Into<Matchable>,
    {
        let handlers: Vec<Handler> = handlers.into_iter().collect();

        for event in events {
            let event = event.into();

            if event.is_wildcard() {
                let global = if handlers.is_empty() {
                    self.handlers(Matchable::wildcard()).unwrap_or_default()
                } else {
                    handlers.clone()
                };
                self.disuse(global);
                continue;
            }

            let mut registry = self.inner.handlers.write();
            let Some(index) = registry.iter().position(|(key, _)| *key == event) else {
                continue;
            };

            if handlers.is_empty() {
                registry.remove(index);
                continue;
            }

            let existing = &mut registry[index].1;
            for handler in &handlers {
                if let Some(pos) = existing.iter().position(|h| h == handler) {
                    existing.remove(pos);
                }
            }
            if existing.is_empty() {
                registry.remove(index);
            }
        }

        self
    }

    /// Snapshot of the handlers registered under exactly `event`, if any.
    pub fn handlers(&self, event: impl Into<Matchable>) -> Option<Vec<Handler>> {
        let event = event.into();
        self.inner
            .handlers
            .read()
            .iter()
            .find(|(key, _)| *key == event)
            .map(|(_, handlers)| handlers.clone())
    }

    /// Registered keys in registration order.
    pub fn events(&self) -> Vec<Matchable> {
        self.inner
            .handlers
            .read()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Create the listener for one event name.
    ///
    /// The `*` listener runs the handlers of every key that matches the fired event's name, apart
    /// from the key equal to the name itself; that one belongs to the event's own listener.
    pub fn handle_event(&self, event: impl Into<String>) -> EventListener {
        EventListener {
            erisa: self.clone(),
            key: Matchable::name(event.into()),
        }
    }

    /// Emit `event` to the wildcard listener and then to the event's own listener.  Returns
    /// whether any middleware ran.
    pub async fn emit(&self, event: impl Into<String>, payload: Payload) -> bool {
        self.emit_event(Event::new(event, payload)).await
    }

    pub async fn emit_event(&self, event: Event) -> bool {
        let wildcard = self.handle_event(crate::matchable::WILDCARD).fire(&event).await;
        let exact = if event.name == crate::matchable::WILDCARD {
            0
        } else {
            self.handle_event(event.name.as_str()).fire(&event).await
        };

        wildcard + exact > 0
    }

    /// Wait for the next message by `user_id` in `channel_id` that passes `options.filter`.
    pub async fn await_message(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        options: AwaitMessageOptions,
    ) -> Result<Message, AwaitError> {
        self.inner
            .currently_awaiting
            .wait((channel_id, user_id), options.filter, options.timeout)
            .await
    }

    /// Hand `message` to whoever awaits its channel and author.  Returns whether a waiter took
    /// it.  Gateway messages are offered automatically.
    pub fn offer_message(&self, message: &Message) -> bool {
        self.inner
            .currently_awaiting
            .offer(&(message.channel_id, message.author.id), message)
    }

    pub fn is_awaiting(&self, channel_id: ChannelId, user_id: UserId) -> bool {
        self.inner
            .currently_awaiting
            .is_waiting(&(channel_id, user_id))
    }

    pub fn extensions(&self) -> RwLockReadGuard<'_, TypeMap> {
        self.inner.extensions.read()
    }

    pub fn extensions_mut(&self) -> RwLockWriteGuard<'_, TypeMap> {
        self.inner.extensions.write()
    }

    /// Render a Discord object for humans, with a custom formatter when one is given.
    pub fn format<T: Formattable>(&self, obj: &T, options: FormatOptions<T>) -> String {
        match options.formatter {
            Some(formatter) => formatter(obj, options.alt),
            None => obj.format(options.alt),
        }
    }
}

impl Default for Erisa {
    fn default() -> Self {
        Self::new()
    }
}

impl EventListener {
    /// Run the matching handlers in order.  Returns how many ran; failures are logged and do not
    /// stop the remaining handlers.
    pub async fn fire(&self, event: &Event) -> usize {
        let handlers = self.matching_handlers(&event.name);

        for handler in &handlers {
            if let Err(err) = handler.call(&self.erisa, event).await {
                log_failure!("Error in middleware for `{}`: {:#}", event.name, err);
            }
        }

        handlers.len()
    }

    // Snapshot under the lock so middleware may re-enter the registry.
    fn matching_handlers(&self, event: &str) -> Vec<Handler> {
        let registry = self.erisa.inner.handlers.read();

        if self.key.is_wildcard() {
            registry
                .iter()
                .filter(|(key, _)| key.matches(event) && !key.is(event))
                .flat_map(|(_, handlers)| handlers.iter().cloned())
                .collect()
        } else {
            registry
                .iter()
                .find(|(key, _)| *key == self.key)
                .map(|(_, handlers)| handlers.clone())
                .unwrap_or_default()
        }
    }
}

async fn resolve_awaited_message(erisa: Erisa, event: Event) -> Result<()> {
    if let Some((_, FullEvent::Message { new_message })) = event.full_event() {
        erisa.offer_message(new_message);
    }
    Ok(())
}
