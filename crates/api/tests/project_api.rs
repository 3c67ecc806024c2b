//! HTTP-level tests for the `/projects` resource.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    body_json, build_test_app, get, get_auth, patch_json_auth, post_json, post_json_auth,
    put_json_auth, send, token_for, Team,
};
use secplan_core::projection::{INTERNAL_ONLY_FIELDS, PUBLIC_FIELDS};
use serde_json::{json, Value};

/// Seeded typology ids.
const EQ: i64 = 2;
const EP: i64 = 3;

const LINE_GORE: i64 = 3;
const PROGRAM_PMU: i64 = 1;

fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .expect("project is a JSON object")
        .keys()
        .cloned()
        .collect();
    keys.sort();
    keys
}

fn sorted(fields: impl IntoIterator<Item = &'static str>) -> Vec<String> {
    let mut fields: Vec<String> = fields.into_iter().map(String::from).collect();
    fields.sort();
    fields
}

async fn create_as(app: axum::Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/projects", token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn coordinator_creates_project_with_generated_code() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let coordinator = token_for(&team.coordinator);

    let first = create_as(
        app.clone(),
        &coordinator,
        json!({
            "name": "  Centro Comunitario Los Aromos ",
            "typology_id": EQ,
            "description": "Sede vecinal",
            "designer_id": team.designer.id,
            "year": 2025
        }),
    )
    .await;
    let second = create_as(
        app,
        &coordinator,
        json!({ "name": "Biblioteca Municipal", "typology_id": EQ }),
    )
    .await;

    assert_eq!(first["unique_code"], "EQ-001");
    assert_eq!(second["unique_code"], "EQ-002");
    assert_eq!(first["name"], "Centro Comunitario Los Aromos");
    assert_eq!(first["description"], "Sede vecinal");
    assert_eq!(first["designer"]["id"], team.designer.id);
    assert_eq!(first["prioritized"], false);
    assert_eq!(first["currency"], "CLP");
    assert_eq!(
        keys(&first),
        sorted(PUBLIC_FIELDS.iter().chain(INTERNAL_ONLY_FIELDS).copied())
    );
}

#[tokio::test]
async fn create_requires_token() {
    let (app, store) = build_test_app();

    let response = post_json(
        app,
        "/api/v1/projects",
        json!({ "name": "Plaza Norte", "typology_id": EP }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    assert_eq!(store.project_count(), 0);
}

#[tokio::test]
async fn plain_user_cannot_create() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.designer),
        json!({ "name": "Plaza Norte", "typology_id": EP }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
    assert_eq!(store.project_count(), 0);
}

#[tokio::test]
async fn invalid_fields_are_listed() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.admin),
        json!({ "name": "ab", "typology_id": EQ, "year": 1700, "amount": -5.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["amount", "name", "year"]);
}

#[tokio::test]
async fn unknown_typology_is_a_field_error() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.admin),
        json!({ "name": "Sin Tipología", "typology_id": 999 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["fields"][0]["field"], "typology_id");
}

#[tokio::test]
async fn dangling_reference_is_a_validation_error() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.admin),
        json!({ "name": "Cancha Techada", "typology_id": EQ, "sector_id": 4040 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "invalid reference");
}

#[tokio::test]
async fn program_outside_financing_line_is_rejected() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.admin),
        json!({
            "name": "Sede Social",
            "typology_id": EQ,
            "financing_line_id": LINE_GORE,
            "program_id": PROGRAM_PMU
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["fields"][0]["field"], "program_id");
}

#[tokio::test]
async fn missing_required_key_is_a_field_error() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let response = post_json_auth(
        app,
        "/api/v1/projects",
        &token_for(&team.admin),
        json!({ "name": "Sin tipología" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"][0]["field"], "typology_id");
}

#[tokio::test]
async fn ill_typed_update_value_is_a_field_error() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let token = token_for(&team.admin);

    let created = post_json_auth(
        app.clone(),
        "/api/v1/projects",
        &token,
        json!({ "name": "Plaza", "typology_id": EP }),
    )
    .await;
    let id = body_json(created).await["id"].as_i64().unwrap();

    let response = patch_json_auth(
        app,
        &format!("/api/v1/projects/{id}"),
        &token,
        json!({ "year": "dos mil" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"][0]["field"], "year");
}

#[tokio::test]
async fn unparsable_json_is_a_validation_error() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/projects")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(&team.admin)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "Plaza", "#))
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_get_omits_internal_fields() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let created = create_as(
        app.clone(),
        &token_for(&team.admin),
        json!({
            "name": "Multicancha Villa Sur",
            "typology_id": EQ,
            "description": "Detalle interno",
            "amount": 125000000.0
        }),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"]);

    let public = body_json(get(app.clone(), &uri).await).await;
    assert_eq!(keys(&public), sorted(PUBLIC_FIELDS.iter().copied()));
    assert!(public.get("description").is_none());
    assert!(public.get("amount").is_none());
    assert_eq!(public["typology"]["abbreviation"], "EQ");

    let internal = body_json(get_auth(app, &uri, &token_for(&team.other_user)).await).await;
    assert_eq!(internal["description"], "Detalle interno");
    assert_eq!(internal["amount"], 125000000.0);
}

#[tokio::test]
async fn get_unknown_project_is_404() {
    let (app, _store) = build_test_app();

    let response = get(app, "/api/v1/projects/77").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn non_numeric_id_is_a_validation_error() {
    let (app, _store) = build_test_app();

    for uri in ["/api/v1/projects/abc", "/api/v1/projects/0", "/api/v1/projects/-1"] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn invalid_token_is_never_downgraded_to_anonymous() {
    let (app, _store) = build_test_app();

    let response = get_auth(app.clone(), "/api/v1/projects", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/v1/lookups", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_pages_through_results() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let admin = token_for(&team.admin);
    for i in 1..=15 {
        create_as(
            app.clone(),
            &admin,
            json!({ "name": format!("Proyecto {i:02}"), "typology_id": EP }),
        )
        .await;
    }

    let response = get(app.clone(), "/api/v1/projects?page=2&limit=10").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 15);
    assert_eq!(json["page"], 2);
    assert_eq!(json["limit"], 10);
    assert_eq!(json["items"].as_array().unwrap().len(), 5);
    assert!(json["items"][0].get("description").is_none());

    let json = body_json(
        get(
            app,
            "/api/v1/projects?sort_by=name&sort_order=asc&limit=3&search=proyecto%2001",
        )
        .await,
    )
    .await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "Proyecto 01");
}

#[tokio::test]
async fn list_filters_and_caps_limit() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let admin = token_for(&team.admin);
    create_as(
        app.clone(),
        &admin,
        json!({ "name": "Plaza Prioritaria", "typology_id": EP, "prioritized": true }),
    )
    .await;
    create_as(
        app.clone(),
        &admin,
        json!({ "name": "Sede Vecinal", "typology_id": EQ }),
    )
    .await;

    let json = body_json(get(app.clone(), "/api/v1/projects?prioritized=true").await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "Plaza Prioritaria");

    let uri = format!("/api/v1/projects?typology_id={EQ}");
    let json = body_json(get(app.clone(), &uri).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["unique_code"], "EQ-001");

    let json = body_json(get(app, "/api/v1/projects?limit=500").await).await;
    assert_eq!(json["limit"], 100);
}

#[tokio::test]
async fn bad_list_parameters_are_rejected() {
    let (app, _store) = build_test_app();

    let response = get(app.clone(), "/api/v1/projects?page=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["fields"][0]["field"], "page");

    let response = get(app, "/api/v1/projects?page=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"][0]["field"], "page");
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn designer_patches_own_project() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let created = create_as(
        app.clone(),
        &token_for(&team.coordinator),
        json!({
            "name": "Pavimentación Calle Larga",
            "typology_id": EQ,
            "designer_id": team.designer.id,
            "address": "Calle Larga 100",
            "year": 2024
        }),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"]);

    let response = patch_json_auth(
        app,
        &uri,
        &token_for(&team.designer),
        json!({
            "name": "Pavimentación Calle Larga Norte",
            "address": null,
            "unique_code": "XX-999"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Pavimentación Calle Larga Norte");
    assert_eq!(updated["address"], Value::Null);
    assert_eq!(updated["year"], 2024);
    assert_eq!(updated["unique_code"], "EQ-001");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);
}

#[tokio::test]
async fn other_user_cannot_update() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let created = create_as(
        app.clone(),
        &token_for(&team.admin),
        json!({ "name": "Plaza Central", "typology_id": EP, "designer_id": team.designer.id }),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"]);

    let response = put_json_auth(
        app.clone(),
        &uri,
        &token_for(&team.other_user),
        json!({ "name": "Secuestrado" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app,
        &uri,
        &token_for(&team.coordinator),
        json!({ "prioritized": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["prioritized"], true);
}

#[tokio::test]
async fn update_errors() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let admin = token_for(&team.admin);
    let created = create_as(
        app.clone(),
        &admin,
        json!({ "name": "Plaza Central", "typology_id": EP }),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"]);

    let response = post_json(app.clone(), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = common::json_request(
        app.clone(),
        axum::http::Method::PUT,
        &uri,
        None,
        json!({ "name": "Anónimo" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = put_json_auth(app.clone(), &uri, &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "nothing to update");

    let response = put_json_auth(app.clone(), &uri, &admin, json!({ "name": null })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["fields"][0]["field"], "name");

    let response = put_json_auth(
        app,
        "/api/v1/projects/9999",
        &admin,
        json!({ "name": "Fantasma" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unassigned_designer_blocks_plain_user() {
    let (app, store) = build_test_app();
    let team = Team::create(&store);
    let created = create_as(
        app.clone(),
        &token_for(&team.admin),
        json!({ "name": "Plaza Sin Diseñador", "typology_id": EP }),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"]);

    // An unassigned designer never matches a plain user.
    let response = patch_json_auth(
        app,
        &uri,
        &token_for(&team.designer),
        json!({ "year": 2026 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
