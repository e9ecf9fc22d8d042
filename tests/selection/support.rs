use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use action_selector::selection::{
    ActionDescriptor, ActionDescriptorProviderContext, ActionDescriptorProviderPort,
    DefaultActionSelector, RequestContext, SelectorError, ValueProvider, ValueProviderFactoryPort,
    error::provider_failure,
};
use async_trait::async_trait;

/// Descriptor provider that hands out a fixed snapshot and counts calls.
#[derive(Default)]
pub struct CountingDescriptorProvider {
    descriptors: Vec<Arc<ActionDescriptor>>,
    calls: AtomicUsize,
}

impl CountingDescriptorProvider {
    pub fn new(descriptors: Vec<ActionDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().map(Arc::new).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionDescriptorProviderPort for CountingDescriptorProvider {
    async fn provide(
        &self,
        context: &mut ActionDescriptorProviderContext,
    ) -> Result<(), SelectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        context
            .results
            .extend(self.descriptors.iter().map(Arc::clone));
        Ok(())
    }
}

pub struct KeySetProvider {
    keys: BTreeSet<String>,
}

impl ValueProvider for KeySetProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.keys.contains(prefix)
    }
}

pub enum FactoryBehavior {
    Keys(Vec<&'static str>),
    NotApplicable,
    Fail,
    /// Fails with a kind other than `ProviderFailure`.
    Reject(fn() -> SelectorError),
    Hang,
}

/// Value-provider factory with scripted behavior and a call counter.
pub struct ScriptedFactory {
    behavior: FactoryBehavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(behavior: FactoryBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn keys(keys: Vec<&'static str>) -> Self {
        Self::new(FactoryBehavior::Keys(keys))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueProviderFactoryPort for ScriptedFactory {
    async fn value_provider(
        &self,
        _context: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, SelectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            FactoryBehavior::Keys(keys) => Ok(Some(Arc::new(KeySetProvider {
                keys: keys.iter().map(|key| key.to_string()).collect(),
            }))),
            FactoryBehavior::NotApplicable => Ok(None),
            FactoryBehavior::Fail => Err(provider_failure("value source offline")),
            FactoryBehavior::Reject(error) => Err(error()),
            FactoryBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

pub fn selector_with(
    descriptors: Vec<ActionDescriptor>,
    factories: Vec<Arc<ScriptedFactory>>,
) -> (
    DefaultActionSelector,
    Arc<CountingDescriptorProvider>,
    Vec<Arc<ScriptedFactory>>,
) {
    let provider = Arc::new(CountingDescriptorProvider::new(descriptors));
    let ports: Vec<Arc<dyn ValueProviderFactoryPort>> = factories
        .iter()
        .map(|factory| Arc::clone(factory) as Arc<dyn ValueProviderFactoryPort>)
        .collect();
    let selector = DefaultActionSelector::new(
        Arc::clone(&provider) as Arc<dyn ActionDescriptorProviderPort>,
        ports,
    );
    (selector, provider, factories)
}

pub fn request() -> RequestContext {
    RequestContext::new("req-1", "GET").with_path("/orders/7")
}
