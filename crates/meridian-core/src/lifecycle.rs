//! Service lifecycle capabilities and shutdown hooks.
//!
//! A gateway component is composed from two capabilities:
//!
//! - [`Service`]: register with the registry, start, and shut down
//!   (running its [`ShutdownHooks`]).
//! - [`HttpHost`]: expose HTTP metadata for a service that serves an API.
//!
//! # Example
//!
//! ```rust
//! use meridian_core::ShutdownHooks;
//!
//! # tokio_test::block_on(async {
//! let hooks = ShutdownHooks::new()
//!     .on_shutdown_named("flush", || async { Ok(()) })
//!     .on_shutdown_named("close", || async { Ok(()) });
//!
//! assert_eq!(hooks.len(), 2);
//! hooks.run().await.unwrap();
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LifecycleError, LifecycleResult};
use crate::route::Route;
use crate::service::{HttpServiceMetadata, ServiceMetadata};

/// An async action run during shutdown.
pub type ShutdownHook =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = LifecycleResult> + Send>> + Send + Sync>;

/// Ordered list of shutdown hooks.
///
/// Hooks run in registration order and each one is awaited before the next
/// starts. A failing hook does not stop the sequence; every failure is
/// collected into a single [`LifecycleError::ShutdownFailed`].
#[derive(Clone, Default)]
#[must_use]
pub struct ShutdownHooks {
    hooks: Vec<(String, ShutdownHook)>,
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.hooks.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ShutdownHooks").field("hooks", &names).finish()
    }
}

impl ShutdownHooks {
    /// Creates an empty hook list.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends a hook named `shutdown_<n>`.
    pub fn on_shutdown<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        let name = format!("shutdown_{}", self.hooks.len());
        self.on_shutdown_named(name, hook)
    }

    /// Appends a named hook.
    pub fn on_shutdown_named<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        self.add(name, hook);
        self
    }

    /// Appends a named hook in place.
    pub fn add<F, Fut>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        let hook: ShutdownHook = Arc::new(move || Box::pin(hook()));
        self.hooks.push((name.into(), hook));
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ShutdownFailed`] listing each failed hook as
    /// `"<name>: <error>"`, after all hooks have run.
    pub async fn run(&self) -> LifecycleResult {
        let mut failures = Vec::new();

        for (name, hook) in &self.hooks {
            tracing::debug!(hook = %name, "Running shutdown hook");
            match hook().await {
                Ok(()) => {
                    tracing::debug!(hook = %name, "Shutdown hook completed");
                }
                Err(e) => {
                    tracing::error!(hook = %name, error = %e, "Shutdown hook failed");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ShutdownFailed { failures })
        }
    }
}

/// Lifecycle capability of a registered service.
#[async_trait]
pub trait Service: Send + Sync {
    /// Metadata the service registers under.
    fn info(&self) -> &ServiceMetadata;

    /// Publishes the service to the registry.
    async fn register(&self) -> LifecycleResult;

    /// Starts the service's background work.
    async fn start(&self) -> LifecycleResult;

    /// Unregisters the service and runs its shutdown hooks.
    async fn shutdown(&self) -> LifecycleResult;
}

/// Capability of a service that hosts an HTTP API.
pub trait HttpHost: Send + Sync {
    /// HTTP metadata for the hosted API.
    fn http_metadata(&self) -> &HttpServiceMetadata;

    /// Routes served in addition to those published in the API document.
    fn extra_routes(&self) -> &[Route] {
        &self.http_metadata().extra_routes
    }
}
