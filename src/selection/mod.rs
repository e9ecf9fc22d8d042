pub mod candidate;
pub mod catalog;
pub mod constraints;
pub mod error;
pub mod ports;
pub mod selector;
pub mod types;
pub mod value_providers;

pub use candidate::{BestCandidates, Candidate, CandidateScore};
pub use catalog::{
    ActionSpec, CatalogError, CompositeActionDescriptorProvider, ParameterSpec,
    StaticActionDescriptorProvider,
};
pub use constraints::{FnConstraint, HeaderConstraint, HttpMethodConstraint, RouteValueConstraint};
pub use error::{SelectorError, SelectorErrorKind};
pub use ports::{
    ActionConstraint, ActionDescriptorProviderPort, ValueProvider, ValueProviderFactoryPort,
};
pub use selector::DefaultActionSelector;
pub use types::{
    ActionDescriptor, ActionDescriptorProviderContext, ActionId, ConstraintFamily, ConstraintSet,
    ParameterBinding, ParameterDescriptor, RequestContext, RequestId,
};
pub use value_providers::{
    DictionaryValueProvider, FormValueProviderFactory, PrefixContainer, QueryValueProviderFactory,
    RouteValueProviderFactory,
};
