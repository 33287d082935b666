//! Serenity hands us one typed callback per Discord event.  Middleware here is keyed by event
//! name instead, so this module flattens every gateway event into a named [`Event`] and feeds it
//! to the [`Erisa`] dispatcher.

use crate::client::Erisa;
use serenity::{
    all::{ConnectionStage, Context, FullEvent},
    framework::Framework,
};
use std::{any::Any, sync::Arc};

/// Name of the event emitted whenever Discord delivers a message.
pub const MESSAGE: &str = "message";
/// Name of the event emitted once the gateway session is established.
pub const READY: &str = "ready";
/// Framework event: a shard reported a problem.  Payload is a [`ShardNotice`].
pub const ERROR: &str = "error";
/// Framework event: a shard reported something worth a warning.  Payload is a [`ShardNotice`].
pub const WARN: &str = "warn";

/// An event as seen by middleware.
#[derive(Clone)]
pub struct Event {
    pub name: String,
    pub payload: Payload,
}

#[derive(Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Something Discord told us about, along with the serenity context to act on it.
    Gateway { ctx: Context, event: Arc<FullEvent> },
    /// Framework or user defined data.
    Value(Arc<dyn Any + Send + Sync>),
}

/// Shard problems, carried by [`ERROR`] and [`WARN`] events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardNotice {
    pub shard_id: u32,
    pub message: String,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn gateway(ctx: Context, event: FullEvent) -> Self {
        Self::new(
            event.snake_case_name(),
            Payload::Gateway {
                ctx,
                event: Arc::new(event),
            },
        )
    }

    pub fn full_event(&self) -> Option<(&Context, &FullEvent)> {
        self.payload.full_event()
    }

    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl Payload {
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Value(Arc::new(value))
    }

    pub fn full_event(&self) -> Option<(&Context, &FullEvent)> {
        match self {
            Payload::Gateway { ctx, event } => Some((ctx, event)),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Payload::Value(value) => value.downcast_ref(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Payload::Empty => write!(f, "Empty"),
            Payload::Gateway { event, .. } => write!(f, "Gateway({})", event.snake_case_name()),
            Payload::Value(_) => write!(f, "Value(..)"),
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Plugs an [`Erisa`] client into serenity as its framework, which is the one place serenity
/// delivers every event through a single entry point.
pub struct ErisaFramework {
    erisa: Erisa,
}

impl ErisaFramework {
    pub fn new(erisa: Erisa) -> Self {
        Self { erisa }
    }
}

#[serenity::async_trait]
impl Framework for ErisaFramework {
    async fn dispatch(&self, ctx: Context, event: FullEvent) {
        let notice = match &event {
            FullEvent::ShardStageUpdate { event: update }
                if update.new == ConnectionStage::Disconnected =>
            {
                Some(ShardNotice {
                    shard_id: update.shard_id.0,
                    message: format!("connection dropped while {:?}", update.old),
                })
            }
            _ => None,
        };

        self.erisa.emit_event(Event::gateway(ctx, event)).await;

        if let Some(notice) = notice {
            self.erisa.emit(WARN, Payload::value(notice)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_downcast_to_their_own_type_only() {
        let event = Event::new(
            WARN,
            Payload::value(ShardNotice {
                shard_id: 3,
                message: "lag".to_owned(),
            }),
        );

        assert_eq!(event.value::<ShardNotice>().map(|n| n.shard_id), Some(3));
        assert!(event.value::<String>().is_none());
        assert!(event.full_event().is_none());
        assert!(Payload::Empty.downcast_ref::<ShardNotice>().is_none());
    }
}
