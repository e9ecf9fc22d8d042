use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{
    constraints::{HeaderConstraint, HttpMethodConstraint, RouteValueConstraint},
    error::SelectorError,
    ports::ActionDescriptorProviderPort,
    types::{
        ActionDescriptor, ActionDescriptorProviderContext, ConstraintFamily, ParameterBinding,
        ParameterDescriptor,
    },
};

/// Declarative action entry, as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub route_values: BTreeMap<String, String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub required_headers: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub from_body: bool,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("action id cannot be empty")]
    EmptyActionId,
    #[error("duplicate action id '{0}'")]
    DuplicateActionId(String),
    #[error("action '{action_id}' declares an empty http method")]
    EmptyMethod { action_id: String },
    #[error("action '{action_id}' declares a parameter with an empty name")]
    EmptyParameterName { action_id: String },
    #[error("action '{action_id}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { action_id: String, parameter: String },
}

impl ActionSpec {
    pub fn to_descriptor(&self) -> Result<ActionDescriptor, CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyActionId);
        }

        let mut descriptor = ActionDescriptor::new(self.id.trim());
        if let Some(display_name) = &self.display_name {
            descriptor = descriptor.with_display_name(display_name.clone());
        }

        for (key, value) in &self.route_values {
            descriptor = descriptor.with_constraint(
                ConstraintFamily::Route,
                Arc::new(RouteValueConstraint::new(key.clone(), value.clone())),
            );
        }

        if !self.methods.is_empty() {
            if self.methods.iter().any(|method| method.trim().is_empty()) {
                return Err(CatalogError::EmptyMethod {
                    action_id: descriptor.id.clone(),
                });
            }
            descriptor = descriptor.with_constraint(
                ConstraintFamily::Method,
                Arc::new(HttpMethodConstraint::new(self.methods.iter().cloned())),
            );
        }

        for (name, value) in &self.required_headers {
            let constraint = match value {
                Some(value) => HeaderConstraint::equals(name.clone(), value.clone()),
                None => HeaderConstraint::present(name.clone()),
            };
            descriptor = descriptor.with_constraint(ConstraintFamily::Dynamic, Arc::new(constraint));
        }

        let mut seen = BTreeSet::new();
        for parameter in &self.parameters {
            let name = parameter.name.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyParameterName {
                    action_id: descriptor.id.clone(),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(CatalogError::DuplicateParameter {
                    action_id: descriptor.id.clone(),
                    parameter: name.to_string(),
                });
            }

            descriptor = descriptor.with_parameter(ParameterDescriptor {
                name: name.to_string(),
                binding: ParameterBinding {
                    prefix: parameter.prefix.clone().unwrap_or_else(|| name.to_string()),
                    is_from_body: parameter.from_body,
                    is_optional: parameter.optional,
                },
            });
        }

        Ok(descriptor)
    }
}

/// Fixed descriptor snapshot, typically built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticActionDescriptorProvider {
    order: i32,
    descriptors: Vec<Arc<ActionDescriptor>>,
}

impl StaticActionDescriptorProvider {
    pub fn new(descriptors: Vec<ActionDescriptor>) -> Self {
        Self {
            order: 0,
            descriptors: descriptors.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_specs(specs: &[ActionSpec]) -> Result<Self, CatalogError> {
        let mut ids = BTreeSet::new();
        let mut descriptors = Vec::with_capacity(specs.len());
        for spec in specs {
            let descriptor = spec.to_descriptor()?;
            if !ids.insert(descriptor.id.clone()) {
                return Err(CatalogError::DuplicateActionId(descriptor.id));
            }
            descriptors.push(descriptor);
        }

        Ok(Self::new(descriptors))
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[async_trait]
impl ActionDescriptorProviderPort for StaticActionDescriptorProvider {
    fn order(&self) -> i32 {
        self.order
    }

    async fn provide(
        &self,
        context: &mut ActionDescriptorProviderContext,
    ) -> Result<(), SelectorError> {
        context
            .results
            .extend(self.descriptors.iter().map(Arc::clone));
        Ok(())
    }
}

/// Runs nested providers in ascending `order()`; ties keep registration order.
#[derive(Default)]
pub struct CompositeActionDescriptorProvider {
    providers: Vec<Arc<dyn ActionDescriptorProviderPort>>,
}

impl CompositeActionDescriptorProvider {
    pub fn new(mut providers: Vec<Arc<dyn ActionDescriptorProviderPort>>) -> Self {
        providers.sort_by_key(|provider| provider.order());
        Self { providers }
    }
}

#[async_trait]
impl ActionDescriptorProviderPort for CompositeActionDescriptorProvider {
    async fn provide(
        &self,
        context: &mut ActionDescriptorProviderContext,
    ) -> Result<(), SelectorError> {
        for provider in &self.providers {
            provider.provide(context).await?;
        }
        Ok(())
    }
}
