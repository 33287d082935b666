//! Middleware-driven Discord client built on serenity.
//!
//! Gateway events are turned into named [`Event`]s and run through the middleware registered on
//! an [`Erisa`] client.  The [`commands`] and [`logger`] modules are middleware themselves.

pub mod awaiting;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod handler;
pub mod logger;
pub mod logging;
pub mod matchable;

pub use client::{AwaitMessageOptions, Erisa, EventListener};
pub use error::{AwaitError, ModuleError};
pub use event::{ErisaFramework, Event, Payload};
pub use format::{FormatOptions, Formattable};
pub use handler::{Handler, Middleware};
pub use matchable::Matchable;
