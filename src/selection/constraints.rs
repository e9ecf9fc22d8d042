use std::{fmt, sync::Arc};

use crate::selection::{ports::ActionConstraint, types::RequestContext};

/// Accepts requests whose method is one of `methods` (ASCII case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodConstraint {
    methods: Vec<String>,
}

impl HttpMethodConstraint {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods
                .into_iter()
                .map(|method| method.into().trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl ActionConstraint for HttpMethodConstraint {
    fn accept(&self, context: &RequestContext) -> bool {
        let method = context.method.trim();
        self.methods
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(method))
    }
}

/// Requires a route value to equal `value`. An empty expected value means
/// the route value must be missing or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteValueConstraint {
    key: String,
    value: String,
}

impl RouteValueConstraint {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl ActionConstraint for RouteValueConstraint {
    fn accept(&self, context: &RequestContext) -> bool {
        let actual = context
            .route_values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&self.key))
            .map(|(_, value)| value.as_str())
            .unwrap_or("");

        actual.eq_ignore_ascii_case(&self.value)
    }
}

/// Requires a header to be present, optionally with an exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConstraint {
    name: String,
    value: Option<String>,
}

impl HeaderConstraint {
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Surrounding whitespace is ignored on both the expected and the
    /// received value.
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into().trim().to_string()),
        }
    }
}

impl ActionConstraint for HeaderConstraint {
    fn accept(&self, context: &RequestContext) -> bool {
        match (context.header(&self.name), self.value.as_deref()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual.trim() == expected,
        }
    }
}

type ConstraintFn = dyn Fn(&RequestContext) -> bool + Send + Sync;

/// Closure-backed constraint for ad-hoc dynamic checks.
pub struct FnConstraint {
    name: String,
    predicate: Arc<ConstraintFn>,
}

impl FnConstraint {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&RequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for FnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConstraint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ActionConstraint for FnConstraint {
    fn accept(&self, context: &RequestContext) -> bool {
        (self.predicate)(context)
    }
}
