use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::selection::{
    candidate::{BestCandidates, Candidate},
    error::{SelectorError, cancelled, invalid_argument, provider_failure},
    ports::{ActionDescriptorProviderPort, ValueProvider, ValueProviderFactoryPort},
    types::{ActionDescriptor, ActionDescriptorProviderContext, ConstraintFamily, RequestContext},
};

const CONSTRAINT_FAMILIES: [ConstraintFamily; 3] = [
    ConstraintFamily::Route,
    ConstraintFamily::Method,
    ConstraintFamily::Dynamic,
];

/// Picks the single descriptor that should handle a request.
///
/// Outcomes: `Ok(Some(_))` for a resolved action, `Ok(None)` when nothing
/// matches, and `Err(_)` with kind `AmbiguousAction` when two or more
/// candidates stay tied after scoring.
pub struct DefaultActionSelector {
    descriptor_provider: Arc<dyn ActionDescriptorProviderPort>,
    value_provider_factories: Vec<Arc<dyn ValueProviderFactoryPort>>,
}

impl DefaultActionSelector {
    pub fn new(
        descriptor_provider: Arc<dyn ActionDescriptorProviderPort>,
        value_provider_factories: Vec<Arc<dyn ValueProviderFactoryPort>>,
    ) -> Self {
        Self {
            descriptor_provider,
            value_provider_factories,
        }
    }

    pub async fn select(
        &self,
        context: &RequestContext,
    ) -> Result<Option<Arc<ActionDescriptor>>, SelectorError> {
        self.select_with_cancellation(context, &CancellationToken::new())
            .await
    }

    #[tracing::instrument(
        name = "select_action",
        target = "selector",
        skip(self, context, cancellation),
        fields(request_id = %context.request_id, method = %context.method, path = %context.path)
    )]
    pub async fn select_with_cancellation(
        &self,
        context: &RequestContext,
        cancellation: &CancellationToken,
    ) -> Result<Option<Arc<ActionDescriptor>>, SelectorError> {
        if context.is_blank() {
            return Err(invalid_argument(
                "request context is missing request_id/method",
            ));
        }

        let mut provider_context = ActionDescriptorProviderContext::new();
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(cancelled("selection cancelled while loading action descriptors"));
            }
            result = self.descriptor_provider.provide(&mut provider_context) => {
                result.map_err(|err| {
                    provider_failure(format!("action descriptor provider failed: {err}"))
                })?
            }
        }
        let all_descriptors = provider_context.results;

        let mut matching = Vec::new();
        for descriptor in &all_descriptors {
            if self.matches(descriptor, context)? {
                matching.push(Arc::clone(descriptor));
            }
        }

        tracing::debug!(
            target: "selector",
            request_id = %context.request_id,
            descriptors = all_descriptors.len(),
            candidates = matching.len(),
            "candidates_filtered"
        );

        let selected = match matching.len() {
            0 => None,
            1 => matching.pop(),
            _ => self.select_best(context, matching, cancellation).await?,
        };

        match &selected {
            Some(action) => tracing::debug!(
                target: "selector",
                request_id = %context.request_id,
                action_id = %action.id,
                "action_selected"
            ),
            None => tracing::debug!(
                target: "selector",
                request_id = %context.request_id,
                "no_action_matched"
            ),
        }

        Ok(selected)
    }

    /// True when every constraint of every present family accepts `context`.
    pub fn matches(
        &self,
        descriptor: &ActionDescriptor,
        context: &RequestContext,
    ) -> Result<bool, SelectorError> {
        if descriptor.id.trim().is_empty() {
            return Err(invalid_argument("action descriptor is missing its id"));
        }

        Ok(CONSTRAINT_FAMILIES.iter().all(|family| {
            descriptor
                .constraints(*family)
                .is_none_or(|constraints| {
                    constraints
                        .iter()
                        .all(|constraint| constraint.accept(context))
                })
        }))
    }

    /// Breaks ties between two or more constraint-matching candidates using
    /// the values the request can supply.
    pub async fn select_best(
        &self,
        context: &RequestContext,
        candidates: Vec<Arc<ActionDescriptor>>,
        cancellation: &CancellationToken,
    ) -> Result<Option<Arc<ActionDescriptor>>, SelectorError> {
        let value_providers = self.resolve_value_providers(context, cancellation).await?;

        let mut best = BestCandidates::new();
        let mut applicable = 0_usize;
        for action in &candidates {
            if let Some(candidate) = Candidate::evaluate(action, &value_providers) {
                applicable += 1;
                best.offer(candidate);
            }
        }

        tracing::debug!(
            target: "selector",
            request_id = %context.request_id,
            candidates = candidates.len(),
            applicable,
            value_providers = value_providers.len(),
            best_score = ?best.best_score(),
            tied = best.tied().len(),
            "candidates_scored"
        );

        best.resolve().inspect_err(|err| {
            tracing::warn!(
                target: "selector",
                request_id = %context.request_id,
                candidates = ?err.candidates,
                "action_ambiguous"
            );
        })
    }

    /// Any factory error, whatever its kind, fails the selection as
    /// `ProviderFailure`.
    async fn resolve_value_providers(
        &self,
        context: &RequestContext,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ValueProvider>>, SelectorError> {
        let lookups = self
            .value_provider_factories
            .iter()
            .map(|factory| factory.value_provider(context));

        let resolved = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(cancelled("selection cancelled while resolving value providers"));
            }
            result = try_join_all(lookups) => result.map_err(|err| {
                provider_failure(format!("value provider factory failed: {err}"))
            })?,
        };

        let value_providers: Vec<_> = resolved.into_iter().flatten().collect();
        tracing::debug!(
            target: "selector",
            request_id = %context.request_id,
            factories = self.value_provider_factories.len(),
            value_providers = value_providers.len(),
            "value_providers_resolved"
        );

        Ok(value_providers)
    }
}
