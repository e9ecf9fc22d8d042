use std::sync::Arc;

use action_selector::{
    config::ValueSource,
    selection::{
        ActionSpec, DefaultActionSelector, RequestContext, SelectorErrorKind,
        StaticActionDescriptorProvider,
    },
};
use serde_json::json;

fn catalog() -> Vec<ActionSpec> {
    serde_json::from_value(json!([
        {
            "id": "orders.index",
            "route_values": { "controller": "orders", "action": "index" },
            "methods": ["GET"]
        },
        {
            "id": "orders.index.filtered",
            "display_name": "Orders filtered by status",
            "route_values": { "controller": "orders", "action": "index" },
            "methods": ["GET"],
            "parameters": [{ "name": "status" }, { "name": "page", "optional": true }]
        },
        {
            "id": "orders.create",
            "route_values": { "controller": "orders", "action": "index" },
            "methods": ["POST"],
            "parameters": [{ "name": "order", "prefix": "" }]
        },
        {
            "id": "orders.import",
            "route_values": { "controller": "orders", "action": "index" },
            "methods": ["POST"],
            "required_headers": { "x-import-batch": null },
            "parameters": [
                { "name": "payload", "from_body": true },
                { "name": "order", "prefix": "" }
            ]
        }
    ]))
    .expect("catalog should deserialize")
}

fn selector(sources: &[ValueSource]) -> DefaultActionSelector {
    let provider = StaticActionDescriptorProvider::from_specs(&catalog())
        .expect("catalog should be valid");
    DefaultActionSelector::new(
        Arc::new(provider),
        sources.iter().map(|source| source.factory()).collect(),
    )
}

fn orders_request(method: &str) -> RequestContext {
    RequestContext::new("req-catalog", method)
        .with_path("/orders")
        .with_route_value("controller", "orders")
        .with_route_value("action", "index")
}

const ALL_SOURCES: [ValueSource; 3] = [ValueSource::Route, ValueSource::Query, ValueSource::Form];

#[tokio::test]
async fn query_value_promotes_the_parameterized_action() {
    let selector = selector(&ALL_SOURCES);

    let selected = selector
        .select(&orders_request("GET").with_query("status", "open"))
        .await
        .expect("selection should succeed")
        .expect("an action should match");

    assert_eq!(selected.id, "orders.index.filtered");
    assert_eq!(selected.label(), "Orders filtered by status");
}

#[tokio::test]
async fn missing_query_value_falls_back_to_plain_action() {
    let selector = selector(&ALL_SOURCES);

    let selected = selector
        .select(&orders_request("GET").with_query("page", "2"))
        .await
        .expect("selection should succeed")
        .expect("an action should match");

    assert_eq!(selected.id, "orders.index");
}

#[tokio::test]
async fn disabled_value_source_is_not_consulted() {
    let selector = selector(&[ValueSource::Route]);

    let selected = selector
        .select(&orders_request("GET").with_query("status", "open"))
        .await
        .expect("selection should succeed")
        .expect("an action should match");

    assert_eq!(selected.id, "orders.index");
}

#[tokio::test]
async fn header_constraint_and_body_parameter_narrow_post_actions() {
    let selector = selector(&ALL_SOURCES);

    let form_post = orders_request("POST")
        .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
        .with_form("order.sku", "A-17");
    let selected = selector
        .select(&form_post)
        .await
        .expect("selection should succeed")
        .expect("orders.create should match");
    assert_eq!(selected.id, "orders.create");

    let import_post = form_post.with_header("X-Import-Batch", "42");
    let err = selector
        .select(&import_post)
        .await
        .expect_err("create and import both score (1, 0)");
    assert_eq!(err.kind, SelectorErrorKind::AmbiguousAction);
    assert_eq!(
        err.candidates,
        vec!["orders.create".to_string(), "orders.import".to_string()]
    );
}

#[tokio::test]
async fn unmatched_route_is_no_match() {
    let selector = selector(&ALL_SOURCES);

    let selected = selector
        .select(
            &RequestContext::new("req-catalog", "GET")
                .with_route_value("controller", "customers")
                .with_route_value("action", "index"),
        )
        .await
        .expect("no match is not an error");

    assert!(selected.is_none());
}
