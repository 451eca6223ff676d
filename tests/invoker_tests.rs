mod common;

use common::{create, get, json_body, memory_engine, post_json, registry, PNG_HEADER};
use http::Method;
use resx::config::ServerConfig;
use resx::params::UnknownParamPolicy;
use resx::server::{Engine, EngineRequest};
use resx::storage::MemoryStore;
use serde_json::json;
use std::sync::Arc;

fn sales(engine: &Engine) {
    create(
        engine,
        "/code/Db",
        json!({"account_name": "sales", "account_password": "pw"}),
        "Sales",
        false,
    );
}

#[test]
fn test_positional_segment_fills_parameter() {
    let engine = memory_engine();
    sales(&engine);
    let resp = get(&engine, "/resource/Sales/entries/42");
    assert_eq!(resp.status, 200, "{}", resp.text());
    let body = json_body(&resp);
    assert_eq!(body["params"]["id"], json!(42));
    assert_eq!(body["params"]["tag"], json!(""));
    assert_eq!(body["params"]["table"], json!("main"));
    assert_eq!(body["params"]["account_name"], json!("sales"));
}

#[test]
fn test_query_beats_positional_and_body() {
    let engine = memory_engine();
    sales(&engine);
    let resp = post_json(&engine, "/resource/Sales/entries/42?id=7", json!({"id": 9, "tag": "t"}));
    assert_eq!(resp.status, 200, "{}", resp.text());
    let body = json_body(&resp);
    assert_eq!(body["params"]["id"], json!(7));
    assert_eq!(body["params"]["tag"], json!("t"));
    // consumed as parameters
    assert_eq!(body["input"], json!(null));
    assert_eq!(body["method"], json!("POST"));
}

#[test]
fn test_body_fills_parameters_missing_from_url() {
    let engine = memory_engine();
    sales(&engine);
    let resp = post_json(&engine, "/resource/Sales/entries", json!({"id": "5"}));
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(json_body(&resp)["params"]["id"], json!(5));
}

#[test]
fn test_undeclared_query_parameters_are_dropped() {
    let engine = memory_engine();
    sales(&engine);
    let resp = get(&engine, "/resource/Sales/entries?color=red");
    assert_eq!(resp.status, 200);
    assert!(json_body(&resp)["params"].get("color").is_none());
}

#[test]
fn test_runtime_type_error_is_bad_request() {
    let engine = memory_engine();
    sales(&engine);
    let resp = get(&engine, "/resource/Sales/entries/abc");
    assert_eq!(resp.status, 400);
}

#[test]
fn test_body_to_service_without_input_is_unsupported() {
    let engine = memory_engine();
    create(&engine, "/code/TestComponent", json!({"api_key": "k"}), "Tc", false);
    let resp = post_json(&engine, "/resource/Tc/foobar", json!({"query": "x"}));
    assert_eq!(resp.status, 415);
}

#[test]
fn test_malformed_body_is_bad_request() {
    let engine = memory_engine();
    sales(&engine);
    let req = EngineRequest::new(Method::POST, "/resource/Sales/entries")
        .with_header("Accept", "application/json")
        .with_body("application/json", "{not json");
    let resp = engine.handle(&req);
    assert_eq!(resp.status, 400);
    assert_eq!(json_body(&resp), json!("Bad request: Input content is malformed."));
}

#[test]
fn test_form_body_is_parsed() {
    let engine = memory_engine();
    sales(&engine);
    let req = EngineRequest::new(Method::PUT, "/resource/Sales/entries")
        .with_header("Accept", "application/json")
        .with_body("application/x-www-form-urlencoded", "tag=blue&id=3");
    let resp = engine.handle(&req);
    assert_eq!(resp.status, 200, "{}", resp.text());
    let body = json_body(&resp);
    assert_eq!(body["params"]["tag"], json!("blue"));
    assert_eq!(body["params"]["id"], json!(3));
    assert_eq!(body["method"], json!("PUT"));
}

#[test]
fn test_unknown_service_is_not_found() {
    let engine = memory_engine();
    sales(&engine);
    let resp = get(&engine, "/resource/Sales/nothing");
    assert_eq!(resp.status, 404);
    assert_eq!(json_body(&resp), json!("Service 'nothing' not found in resource 'Sales'"));
}

#[test]
fn test_unknown_resource_is_not_found() {
    let engine = memory_engine();
    let resp = get(&engine, "/resource/Ghost/entries");
    assert_eq!(resp.status, 404);
    assert_eq!(json_body(&resp), json!("Cannot find resource 'Ghost'"));
}

#[test]
fn test_catch_all_handler_serves_any_service() {
    let engine = memory_engine();
    create(&engine, "/code/Proxy", json!({}), "Up", false);

    let resp = get(&engine, "/resource/Up/anything?x=1");
    assert_eq!(resp.status, 200, "{}", resp.text());
    let body = json_body(&resp);
    assert_eq!(body["service"], json!("anything"));
    // no contract, so nothing is filtered
    assert_eq!(body["params"]["x"], json!("1"));

    let resp = get(&engine, "/resource/Up/status?x=1");
    assert_eq!(resp.status, 200);
    let body = json_body(&resp);
    assert_eq!(body["service"], json!("status"));
    assert!(body["params"].get("x").is_none());
}

#[test]
fn test_service_creates_resource_through_accessor() {
    let engine = memory_engine();
    create(&engine, "/code/TestComponent", json!({"api_key": "key"}), "Maker", false);
    let resp = get(&engine, "/resource/Maker/maker");
    assert_eq!(resp.status, 200, "{}", resp.text());
    let message = json_body(&resp);
    assert!(message.as_str().unwrap().contains("Name: Maker_made"));

    let made = get(&engine, "/resource/Maker_made");
    assert_eq!(made.status, 200);
    assert_eq!(json_body(&made)["desc"], json!("Description for my resource"));

    let call = get(&engine, "/resource/Maker_made/some_subresource?text=hi");
    assert_eq!(call.status, 200, "{}", call.text());
    assert_eq!(json_body(&call)["text"], json!("hi"));
}

#[test]
fn test_time_range_forwards_window_to_base_resource() {
    let engine = memory_engine();
    create(&engine, "/code/Log", json!({}), "Access", false);
    create(
        &engine,
        "/code/TimeRange",
        json!({"base_resource": "/resource/Access/lines"}),
        "Today",
        false,
    );

    let resp = get(&engine, "/resource/Today/today?filter=GET");
    assert_eq!(resp.status, 200, "{}", resp.text());
    let forwarded = json_body(&resp);
    assert_eq!(forwarded["method"], json!("GET"));
    let params = &forwarded["params"];
    assert!(params["start_time"].as_str().unwrap().ends_with(":00:00:00"));
    assert!(params["end_time"].is_string());
    assert_eq!(params["filter"], json!("GET"));
    assert_eq!(params["unique_only"], json!(true));
    assert_eq!(params["count_only"], json!(false));
}

#[test]
fn test_time_range_reports_base_failure_status() {
    let engine = memory_engine();
    create(
        &engine,
        "/code/TimeRange",
        json!({"base_resource": "/resource/Gone/lines"}),
        "Broken",
        false,
    );
    let resp = get(&engine, "/resource/Broken/yesterday");
    assert_eq!(resp.status, 404);
    assert_eq!(json_body(&resp), json!("Cannot find resource 'Gone'"));
}

#[test]
fn test_japanese_text_survives_rendering() {
    let engine = memory_engine();
    create(&engine, "/code/TestComponent", json!({"api_key": "k"}), "Jp", false);
    let resp = get(&engine, "/resource/Jp/japanese");
    assert_eq!(resp.status, 200);
    assert_eq!(json_body(&resp), json!("これは日本語のメッセージです。"));
}

#[test]
fn test_undeclared_query_parameters_rejected_by_policy() {
    let config = ServerConfig {
        unknown_params: UnknownParamPolicy::Reject,
        ..ServerConfig::default()
    };
    let engine = Engine::with_store(&config, registry(), Arc::new(MemoryStore::new()));
    sales(&engine);

    let resp = get(&engine, "/resource/Sales/entries?bogus=1");
    assert_eq!(resp.status, 400);
    assert_eq!(
        json_body(&resp),
        json!("Unknown parameter in 'runtime parameter' section: bogus")
    );

    let resp = get(&engine, "/resource/Sales/entries/3?tag=x");
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(json_body(&resp)["params"]["id"], json!(3));
}

#[test]
fn test_binary_result_bypasses_rendering() {
    let engine = memory_engine();
    create(&engine, "/code/Blob", json!({}), "Files", false);
    let resp = get(&engine, "/resource/Files/logo");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("Content-Type"), Some("image/png"));
    assert_eq!(resp.body, PNG_HEADER);
}

#[test]
fn test_binary_body_reaches_any_type_service() {
    let engine = memory_engine();
    create(&engine, "/code/Blob", json!({}), "Files", false);
    let resp = engine.handle(
        &EngineRequest::new(Method::PUT, "/resource/Files/store").with_body("image/png", PNG_HEADER),
    );
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(resp.get_header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(resp.body, PNG_HEADER);
}
