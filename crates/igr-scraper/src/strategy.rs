//! Ordered fallback chains for locating and operating portal controls.

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::ScrapeError;

type StrategyFn<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<Option<T>, ScrapeError>> + Send + 'a>;

/// A list of named strategies tried in order until one yields a value.
///
/// Strategies are only started when every earlier one has declined
/// (`Ok(None)`) or failed. Failures are logged and the chain moves on; if
/// nothing succeeds the chain reports [`ScrapeError::ControlNotFound`].
pub struct FallbackChain<'a, T> {
    control: String,
    strategies: Vec<(&'static str, StrategyFn<'a, T>)>,
}

impl<'a, T: Send + 'a> FallbackChain<'a, T> {
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            strategies: Vec::new(),
        }
    }

    #[must_use]
    pub fn then<F, Fut>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<Option<T>, ScrapeError>> + Send + 'a,
    {
        self.strategies
            .push((name, Box::new(move || Box::pin(strategy()))));
        self
    }

    /// Runs the chain, returning the value and the name of the strategy that
    /// produced it.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::ControlNotFound`] when every strategy declines
    /// or fails.
    pub async fn run(self) -> Result<(T, &'static str), ScrapeError> {
        for (name, strategy) in self.strategies {
            match strategy().await {
                Ok(Some(value)) => {
                    tracing::debug!(control = %self.control, strategy = name, "control resolved");
                    return Ok((value, name));
                }
                Ok(None) => {
                    tracing::debug!(control = %self.control, strategy = name, "strategy declined");
                }
                Err(e) => {
                    tracing::warn!(control = %self.control, strategy = name, error = %e, "strategy failed");
                }
            }
        }
        Err(ScrapeError::ControlNotFound {
            control: self.control,
        })
    }
}
