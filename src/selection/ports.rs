use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::selection::{
    error::SelectorError,
    types::{ActionDescriptorProviderContext, RequestContext},
};

/// Pure predicate over a request. Must not panic for well-formed contexts.
pub trait ActionConstraint: Send + Sync + fmt::Debug {
    fn accept(&self, context: &RequestContext) -> bool;
}

/// Nested descriptor provider. Every provider appends to the shared
/// context; providers run in ascending `order()`.
#[async_trait]
pub trait ActionDescriptorProviderPort: Send + Sync {
    fn order(&self) -> i32 {
        0
    }

    async fn provide(&self, context: &mut ActionDescriptorProviderContext)
    -> Result<(), SelectorError>;
}

pub trait ValueProvider: Send + Sync {
    fn contains_prefix(&self, prefix: &str) -> bool;
}

#[async_trait]
pub trait ValueProviderFactoryPort: Send + Sync {
    /// `Ok(None)` means the factory does not apply to this request.
    async fn value_provider(
        &self,
        context: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, SelectorError>;
}
