use std::sync::Arc;

use action_selector::selection::{
    ActionDescriptor, ConstraintFamily, HttpMethodConstraint, ParameterDescriptor,
    RequestContext, SelectorErrorKind,
};

use crate::support::{ScriptedFactory, request, selector_with};

fn get_only(id: &str) -> ActionDescriptor {
    ActionDescriptor::new(id).with_constraint(
        ConstraintFamily::Method,
        Arc::new(HttpMethodConstraint::new(["GET"])),
    )
}

fn post_only(id: &str) -> ActionDescriptor {
    ActionDescriptor::new(id).with_constraint(
        ConstraintFamily::Method,
        Arc::new(HttpMethodConstraint::new(["POST"])),
    )
}

#[tokio::test]
async fn no_matching_descriptor_is_not_an_error() {
    let (selector, provider, factories) = selector_with(
        vec![post_only("orders.create")],
        vec![Arc::new(ScriptedFactory::keys(vec!["id"]))],
    );

    let selected = selector
        .select(&request())
        .await
        .expect("no match is a normal outcome");

    assert!(selected.is_none());
    assert_eq!(provider.calls(), 1);
    assert_eq!(factories[0].calls(), 0);
}

#[tokio::test]
async fn single_match_never_builds_value_providers() {
    let (selector, provider, factories) = selector_with(
        vec![
            get_only("orders.show").with_parameter(ParameterDescriptor::required("id")),
            post_only("orders.create"),
        ],
        vec![
            Arc::new(ScriptedFactory::keys(vec![])),
            Arc::new(ScriptedFactory::keys(vec![])),
        ],
    );

    let selected = selector
        .select(&request())
        .await
        .expect("selection should succeed")
        .expect("one action should match");

    assert_eq!(selected.id, "orders.show");
    assert_eq!(provider.calls(), 1);
    assert!(factories.iter().all(|factory| factory.calls() == 0));
}

#[tokio::test]
async fn multiple_matches_consult_every_factory_once() {
    let (selector, provider, factories) = selector_with(
        vec![
            get_only("orders.show").with_parameter(ParameterDescriptor::required("id")),
            get_only("orders.list"),
        ],
        vec![
            Arc::new(ScriptedFactory::keys(vec!["id"])),
            Arc::new(ScriptedFactory::new(crate::support::FactoryBehavior::NotApplicable)),
        ],
    );

    let selected = selector
        .select(&request())
        .await
        .expect("selection should succeed")
        .expect("best candidate should resolve");

    assert_eq!(selected.id, "orders.show");
    assert_eq!(provider.calls(), 1);
    assert!(factories.iter().all(|factory| factory.calls() == 1));
}

#[tokio::test]
async fn blank_context_is_rejected_before_loading_descriptors() {
    let (selector, provider, _) = selector_with(vec![get_only("orders.show")], vec![]);

    let err = selector
        .select(&RequestContext::new("req-1", ""))
        .await
        .expect_err("context without method must be rejected");

    assert_eq!(err.kind, SelectorErrorKind::InvalidArgument);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn repeated_selection_over_same_snapshot_is_stable() {
    let (selector, provider, _) = selector_with(
        vec![
            get_only("orders.list"),
            get_only("orders.show").with_parameter(ParameterDescriptor::required("id")),
        ],
        vec![Arc::new(ScriptedFactory::keys(vec!["id"]))],
    );

    let context = request();
    let first = selector.select(&context).await.expect("first selection");
    let second = selector.select(&context).await.expect("second selection");

    assert_eq!(
        first.as_ref().map(|action| action.id.as_str()),
        Some("orders.show")
    );
    assert_eq!(
        first.map(|action| action.id.clone()),
        second.map(|action| action.id.clone())
    );
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn descriptor_with_blank_id_fails_the_selection() {
    let (selector, _, _) = selector_with(vec![ActionDescriptor::new("")], vec![]);

    let err = selector
        .select(&request())
        .await
        .expect_err("provider returned an invalid descriptor");
    assert_eq!(err.kind, SelectorErrorKind::InvalidArgument);
}
