use crate::{client::Erisa, event::Event};
use anyhow::Result;
use std::{future::Future, sync::Arc};

/// Middleware run for the events it is registered under.
#[serenity::async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, erisa: &Erisa, event: &Event) -> Result<()>;
}

/// Adapter for plain async functions and closures
struct FnMiddleware<F>(F);

#[serenity::async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Erisa, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, erisa: &Erisa, event: &Event) -> Result<()> {
        (self.0)(erisa.clone(), event.clone()).await
    }
}

/// A registered piece of middleware.
///
/// Handlers compare by identity: clones of one `Handler` are equal to each other, while two
/// handlers built from identical closures are not.  Keep a clone around to `disuse` it later.
#[derive(Clone)]
pub struct Handler(Arc<dyn Middleware>);

impl Handler {
    pub fn new(middleware: impl Middleware + 'static) -> Self {
        Self(Arc::new(middleware))
    }

    /// Wrap an async function taking the client and the event.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Erisa, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(FnMiddleware(f))
    }

    pub async fn call(&self, erisa: &Erisa, event: &Event) -> Result<()> {
        self.0.handle(erisa, event).await
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handler {}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.0))
    }
}
