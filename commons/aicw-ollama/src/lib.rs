//! Client for the Ollama model runtime used by AI chat workspaces.

pub mod client;
pub mod error;
pub mod modelfile;
pub mod progress;
pub mod types;

use async_trait::async_trait;

pub use client::{DEFAULT_PORT, OllamaClient};
pub use error::OllamaError;
pub use modelfile::{ModelFile, known_patterns, pattern_variant, variant_name};
pub use types::ModelEntry;

/// Operations the operator needs from a model runtime.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError>;

    /// Downloads `name`, following the progress stream to completion.
    async fn pull_model(&self, name: &str) -> Result<(), OllamaError>;

    async fn create_model(
        &self,
        name: &str,
        file: &ModelFile,
    ) -> Result<(), OllamaError>;

    async fn list_running_models(&self) -> Result<Vec<ModelEntry>, OllamaError>;

    async fn does_model_exist(&self, name: &str) -> Result<bool, OllamaError> {
        let wanted = canonical_model_name(name);
        Ok(self
            .list_models()
            .await?
            .iter()
            .any(|m| canonical_model_name(m.identifier()) == wanted))
    }
}

/// Appends `:latest` to an untagged model reference.
pub fn canonical_model_name(name: &str) -> String {
    let repo = name.rsplit('/').next().unwrap_or(name);
    if repo.contains(':') {
        name.to_string()
    } else {
        format!("{}:latest", name)
    }
}
