//! Holder for the consent admin handler.
//!
//! The handler is built on first use and then never replaced. Concurrent first
//! requests run the builder once; every caller sees the same instance. A failed
//! build is not cached, so the next request tries again.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::services::consent::handler::ConsentAdminHandler;

/// Produces the handler bound to this process.
#[async_trait]
pub trait ConsentAdminBuilder: Send + Sync + 'static {
    async fn build(&self) -> anyhow::Result<Arc<dyn ConsentAdminHandler>>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("consent admin handler unavailable: {0}")]
    Unavailable(String),
}

pub struct HandlerRegistry {
    builder: Option<Arc<dyn ConsentAdminBuilder>>,
    handler: OnceCell<Arc<dyn ConsentAdminHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler", &self.handler.get().map(|h| h.name()))
            .finish()
    }
}

impl HandlerRegistry {
    /// Registry that builds its handler lazily.
    pub fn new(builder: Arc<dyn ConsentAdminBuilder>) -> Self {
        Self {
            builder: Some(builder),
            handler: OnceCell::new(),
        }
    }

    /// Registry with an already constructed handler.
    pub fn bound(handler: Arc<dyn ConsentAdminHandler>) -> Self {
        Self {
            builder: None,
            handler: OnceCell::new_with(Some(handler)),
        }
    }

    pub fn current(&self) -> Option<&Arc<dyn ConsentAdminHandler>> {
        self.handler.get()
    }

    pub async fn resolve(&self) -> Result<Arc<dyn ConsentAdminHandler>, RegistryError> {
        let handler = self
            .handler
            .get_or_try_init(|| async {
                let Some(builder) = self.builder.as_ref() else {
                    return Err(RegistryError::Unavailable("no builder registered".into()));
                };

                match builder.build().await {
                    Ok(handler) => {
                        tracing::info!(handler = handler.name(), "consent admin handler initialized");
                        Ok(handler)
                    }
                    Err(err) => {
                        tracing::warn!(error = ?err, "consent admin handler is not available");
                        Err(RegistryError::Unavailable(err.to_string()))
                    }
                }
            })
            .await?;

        Ok(Arc::clone(handler))
    }
}
