//! Ordered fallback across interchangeable upstream sources.

use std::future::Future;

use tracing::{debug, warn};

use crate::gateway::{GatewayError, SourceError, SourceFailure, UpstreamSource};

/// Tries an ordered list of sources until one of them produces a value.
///
/// Sources are queried strictly one after another: a later source is only
/// contacted once the previous one has failed, and nothing is contacted after
/// the first success. Each attempt is bounded by its source's timeout.
#[derive(Debug, Clone)]
pub struct Orchestrator<P> {
    domain: String,
    sources: Vec<UpstreamSource<P>>,
}

impl<P: Copy> Orchestrator<P> {
    pub fn new(domain: impl Into<String>, sources: Vec<UpstreamSource<P>>) -> Self {
        Self {
            domain: domain.into(),
            sources,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn sources(&self) -> &[UpstreamSource<P>] {
        &self.sources
    }

    /// Run `attempt` against each source in order and return the first success.
    ///
    /// When every source fails the result is
    /// [`GatewayError::AllSourcesUnavailable`] with one entry per attempt.
    pub async fn resolve<'a, T, F, Fut>(&'a self, mut attempt: F) -> Result<T, GatewayError>
    where
        F: FnMut(&'a UpstreamSource<P>) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            debug!(domain = %self.domain, source = source.id(), "Querying upstream");

            let outcome = match tokio::time::timeout(source.timeout(), attempt(source)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Timeout),
            };

            match outcome {
                Ok(value) => {
                    debug!(domain = %self.domain, source = source.id(), "Upstream answered");
                    return Ok(value);
                }
                Err(error) => {
                    warn!(
                        domain = %self.domain,
                        source = source.id(),
                        %error,
                        "Upstream failed, trying next source"
                    );
                    failures.push(SourceFailure::new(source.id(), &error));
                }
            }
        }

        Err(GatewayError::AllSourcesUnavailable {
            domain: self.domain.clone(),
            attempts: failures,
        })
    }
}
