//! Gateway server state.
//!
//! [`GatewayServer`] bundles the collaborators every request needs: the
//! configuration, the tool dispatcher (over the immutable registry), the
//! completion client, and the upload stager. It is cheap to clone and holds
//! no mutable state.

use std::sync::Arc;

use super::config::{Config, ErrorDetail};
use super::error::Result;
use super::staging::{FileStager, TempFileStager};
use crate::domains::completion::{CompletionClient, OpenAiCompletionClient};
use crate::domains::tools::{Dispatcher, ToolContext, ToolRegistry};

/// Shared, read-only state of the gateway.
#[derive(Clone)]
pub struct GatewayServer {
    config: Arc<Config>,
    dispatcher: Dispatcher,
    completion: Arc<dyn CompletionClient>,
    stager: Arc<dyn FileStager>,
}

impl GatewayServer {
    /// Create a gateway with the built-in tools and the OpenAI completion client.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let registry = Arc::new(ToolRegistry::builtin()?);
        let dispatcher = Dispatcher::new(registry, ToolContext::new(config.clone()));
        let completion = Arc::new(OpenAiCompletionClient::new(
            config.completion.clone(),
            dispatcher.clone(),
        ));
        let stager = Arc::new(TempFileStager::new(&config.staging));

        Ok(Self {
            config,
            dispatcher,
            completion,
            stager,
        })
    }

    /// Assemble a gateway from explicit collaborators.
    pub fn from_parts(
        config: Arc<Config>,
        dispatcher: Dispatcher,
        completion: Arc<dyn CompletionClient>,
        stager: Arc<dyn FileStager>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            completion,
            stager,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn completion(&self) -> &dyn CompletionClient {
        self.completion.as_ref()
    }

    pub fn stager(&self) -> &dyn FileStager {
        self.stager.as_ref()
    }

    /// How much detail failure responses carry.
    pub fn error_detail(&self) -> ErrorDetail {
        self.config.errors.detail
    }
}
