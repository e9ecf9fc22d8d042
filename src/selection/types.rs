use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::selection::ports::ActionConstraint;

pub type ActionId = String;
pub type RequestId = String;

/// Ordered constraints of one family. `None` means the family does not
/// restrict the descriptor at all.
pub type ConstraintSet = Option<Vec<Arc<dyn ActionConstraint>>>;

/// Read-only view of an inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub route_values: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub form: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Header lookup is ASCII case-insensitive on the header name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.request_id.trim().is_empty() || self.method.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterBinding {
    pub prefix: String,
    pub is_from_body: bool,
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub binding: ParameterBinding,
}

impl ParameterDescriptor {
    /// Required parameter looked up under its own name.
    pub fn required(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            binding: ParameterBinding {
                prefix: name.clone(),
                is_from_body: false,
                is_optional: false,
            },
            name,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        let mut parameter = Self::required(name);
        parameter.binding.is_optional = true;
        parameter
    }

    pub fn from_body(name: impl Into<String>) -> Self {
        let mut parameter = Self::required(name);
        parameter.binding.is_from_body = true;
        parameter
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.binding.prefix = prefix.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintFamily {
    Route,
    Method,
    Dynamic,
}

#[derive(Debug, Clone, Default)]
pub struct ActionDescriptor {
    pub id: ActionId,
    pub display_name: Option<String>,
    pub route_constraints: ConstraintSet,
    pub method_constraints: ConstraintSet,
    pub dynamic_constraints: ConstraintSet,
    pub parameters: Vec<ParameterDescriptor>,
}

impl ActionDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_constraint(
        mut self,
        family: ConstraintFamily,
        constraint: Arc<dyn ActionConstraint>,
    ) -> Self {
        self.constraints_mut(family)
            .get_or_insert_with(Vec::new)
            .push(constraint);
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn constraints(&self, family: ConstraintFamily) -> Option<&[Arc<dyn ActionConstraint>]> {
        match family {
            ConstraintFamily::Route => self.route_constraints.as_deref(),
            ConstraintFamily::Method => self.method_constraints.as_deref(),
            ConstraintFamily::Dynamic => self.dynamic_constraints.as_deref(),
        }
    }

    fn constraints_mut(&mut self, family: ConstraintFamily) -> &mut ConstraintSet {
        match family {
            ConstraintFamily::Route => &mut self.route_constraints,
            ConstraintFamily::Method => &mut self.method_constraints,
            ConstraintFamily::Dynamic => &mut self.dynamic_constraints,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Accumulator handed to every nested descriptor provider for one selection.
#[derive(Debug, Default)]
pub struct ActionDescriptorProviderContext {
    pub results: Vec<Arc<ActionDescriptor>>,
}

impl ActionDescriptorProviderContext {
    pub fn new() -> Self {
        Self::default()
    }
}
