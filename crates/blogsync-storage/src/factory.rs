#[cfg(feature = "backend-github")]
use crate::GitHubBackend;
#[cfg(feature = "backend-memory")]
use crate::MemoryBackend;
use crate::{BackendKind, ContentBackend, StoreError, StoreResult};
use blogsync_core::ClientConfig;
use std::sync::Arc;

/// Create a content backend based on configuration
pub fn create_backend(config: &ClientConfig) -> StoreResult<Arc<dyn ContentBackend>> {
    config
        .validate()
        .map_err(|e| StoreError::Config(e.to_string()))?;

    match config.backend {
        #[cfg(feature = "backend-github")]
        BackendKind::GitHub => {
            let backend = GitHubBackend::new(config)?;
            tracing::debug!(
                owner = %config.location.owner,
                repo = %config.location.repo,
                branch = %config.location.branch,
                api = %config.api_base_url,
                "Using GitHub content backend"
            );
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "backend-github"))]
        BackendKind::GitHub => Err(StoreError::Config(
            "GitHub backend not available (backend-github feature not enabled)".to_string(),
        )),

        #[cfg(feature = "backend-memory")]
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new(config))),

        #[cfg(not(feature = "backend-memory"))]
        BackendKind::Memory => Err(StoreError::Config(
            "Memory backend not available (backend-memory feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "backend-memory", feature = "backend-github"))]
mod tests {
    use super::*;
    use blogsync_core::{ErrorKind, RemoteLocation};

    #[test]
    fn picks_backend_from_config() {
        let config = ClientConfig::new(RemoteLocation::new("octo", "blog", "main"));
        assert_eq!(create_backend(&config).unwrap().backend_type(), BackendKind::GitHub);

        let config = config.with_backend(BackendKind::Memory);
        assert_eq!(create_backend(&config).unwrap().backend_type(), BackendKind::Memory);
    }

    #[test]
    fn invalid_config_is_a_config_error() {
        let config = ClientConfig::new(RemoteLocation::new("", "blog", "main"));
        let err = create_backend(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
