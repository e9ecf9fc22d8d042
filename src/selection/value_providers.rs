use std::sync::Arc;

use async_trait::async_trait;

use crate::selection::{
    error::SelectorError,
    ports::{ValueProvider, ValueProviderFactoryPort},
    types::RequestContext,
};

const FORM_CONTENT_TYPES: [&str; 2] = ["application/x-www-form-urlencoded", "multipart/form-data"];

/// Key set answering model-binding prefix queries.
///
/// A key matches prefix `p` when it equals `p`, or continues `p` with a
/// member (`p.child`) or index (`p[0]`) accessor. Comparison is ASCII
/// case-insensitive. The empty prefix matches as soon as any key exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixContainer {
    keys: Vec<String>,
}

impl PrefixContainer {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = keys
            .into_iter()
            .map(|key| key.as_ref().to_ascii_lowercase())
            .collect();
        keys.sort();
        keys.dedup();
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return !self.keys.is_empty();
        }

        let prefix = prefix.to_ascii_lowercase();
        // Keys sharing the prefix are contiguous in sorted order.
        let start = self.keys.partition_point(|key| key.as_str() < prefix.as_str());
        self.keys[start..]
            .iter()
            .take_while(|key| key.starts_with(&prefix))
            .any(|key| is_prefix_boundary(key, prefix.len()))
    }
}

fn is_prefix_boundary(key: &str, prefix_len: usize) -> bool {
    match key.as_bytes().get(prefix_len) {
        None => true,
        Some(b'.') | Some(b'[') => true,
        Some(_) => false,
    }
}

#[derive(Debug, Clone)]
pub struct DictionaryValueProvider {
    source: &'static str,
    container: PrefixContainer,
}

impl DictionaryValueProvider {
    pub fn new<I, S>(source: &'static str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source,
            container: PrefixContainer::new(keys),
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}

impl ValueProvider for DictionaryValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.container.contains_prefix(prefix)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteValueProviderFactory;

#[async_trait]
impl ValueProviderFactoryPort for RouteValueProviderFactory {
    async fn value_provider(
        &self,
        context: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, SelectorError> {
        Ok(Some(Arc::new(DictionaryValueProvider::new(
            "route",
            context.route_values.keys(),
        ))))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryValueProviderFactory;

#[async_trait]
impl ValueProviderFactoryPort for QueryValueProviderFactory {
    async fn value_provider(
        &self,
        context: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, SelectorError> {
        Ok(Some(Arc::new(DictionaryValueProvider::new(
            "query",
            context.query.keys(),
        ))))
    }
}

/// Only applies to requests carrying a form content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormValueProviderFactory;

#[async_trait]
impl ValueProviderFactoryPort for FormValueProviderFactory {
    async fn value_provider(
        &self,
        context: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, SelectorError> {
        let is_form = context.header("content-type").is_some_and(|content_type| {
            let media_type = content_type.split(';').next().unwrap_or("").trim();
            FORM_CONTENT_TYPES
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(media_type))
        });

        if !is_form {
            return Ok(None);
        }

        Ok(Some(Arc::new(DictionaryValueProvider::new(
            "form",
            context.form.keys(),
        ))))
    }
}
