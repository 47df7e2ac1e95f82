use formbind_mapper::MapOptions;
use formbind_model::SchemaRegistry;
use formbind_server::{build_router, map_form, split_allow, AppState, MapResponse, ServerError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const SCHEMA: &str = r#"{
  "types": {
    "Address": {
      "properties": {
        "city": {"type": "string"},
        "zip": {"type": "string"}
      },
      "template": {}
    },
    "User": {
      "properties": {
        "name": {"type": "string"},
        "age": {"type": "integer"},
        "tags": {"type": "array", "items": {"type": "string"}},
        "address": {"type": "custom", "ref": "Address"}
      },
      "mapping": ["tags"],
      "template": {}
    },
    "Grid": {
      "properties": {
        "rows": {"type": "array", "items": {"type": "array", "items": {"type": "string"}}}
      },
      "mapping": ["rows"],
      "template": {}
    }
  }
}"#;

fn test_state() -> AppState {
    AppState::new(
        SchemaRegistry::from_json_str(SCHEMA).unwrap(),
        MapOptions::default(),
    )
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server() -> String {
    let app = build_router(test_state());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn post_form(base: &str, path_and_query: &str, body: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base, path_and_query))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

// ── HTTP endpoints ───────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let base = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn types_endpoint_lists_registered_types() {
    let base = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/v1/types", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<String> = resp.json().await.unwrap();
    assert_eq!(body, vec!["Address", "Grid", "User"]);
}

#[tokio::test]
async fn map_endpoint_maps_whitelisted_fields() {
    let base = spawn_test_server().await;
    let resp = post_form(
        &base,
        "/api/v1/map/User?allow=name,tags,address_city",
        "name=Ann&age=41&tags=a%2Cb&address_city=Paris&address_zip=75001",
    )
    .await;

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));

    let body: MapResponse = resp.json().await.unwrap();
    assert!(body.changed);
    assert_eq!(
        Value::Object(body.object),
        json!({"name": "Ann", "tags": ["a", "b"], "address": {"city": "Paris"}})
    );
}

#[tokio::test]
async fn map_endpoint_without_allow_changes_nothing() {
    let base = spawn_test_server().await;
    let resp = post_form(&base, "/api/v1/map/User", "name=Ann").await;
    assert_eq!(resp.status(), 200);
    let body: MapResponse = resp.json().await.unwrap();
    assert!(!body.changed);
    assert!(body.object.is_empty());
}

#[tokio::test]
async fn unknown_type_returns_404() {
    let base = spawn_test_server().await;
    let resp = post_form(&base, "/api/v1/map/Ghost?allow=name", "name=Ann").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unknown type: Ghost");
}

#[tokio::test]
async fn schema_misuse_returns_422() {
    let base = spawn_test_server().await;
    let resp = post_form(&base, "/api/v1/map/Grid?allow=rows", "rows=a,b").await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("array of arrays"));
}

#[tokio::test]
async fn undecodable_body_returns_400() {
    let base = spawn_test_server().await;
    let resp = post_form(&base, "/api/v1/map/User?allow=name", "name=%FF").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/v1/nonexistent", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ── Library helpers ──────────────────────────────────────────────

#[test]
fn split_allow_trims_and_drops_blanks() {
    assert_eq!(split_allow(Some(" name, ,address_city,")), vec!["name", "address_city"]);
    assert!(split_allow(None).is_empty());
}

#[tokio::test]
async fn map_form_reports_unknown_type() {
    let registry = SchemaRegistry::from_json_str(SCHEMA).unwrap();
    let err = map_form(&registry, "Nope", &[], MapOptions::default(), "a=1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::UnknownType(ref name) if name == "Nope"));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn map_form_keep_existing_preserves_template_values() {
    let registry = SchemaRegistry::from_json_str(
        r#"{"types": {"Flag": {
            "properties": {"state": {"type": "string"}},
            "template": {"state": "draft"}
        }}}"#,
    )
    .unwrap();
    let allow = vec!["state".to_string()];

    let kept = map_form(&registry, "Flag", &allow, MapOptions::keep_existing(), "state=live")
        .await
        .unwrap();
    assert!(!kept.changed);
    assert_eq!(kept.object["state"], "draft");

    let replaced = map_form(&registry, "Flag", &allow, MapOptions::default(), "state=live")
        .await
        .unwrap();
    assert!(replaced.changed);
    assert_eq!(replaced.object["state"], "live");
}
