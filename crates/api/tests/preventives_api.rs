//! Preventive rules: creation across a model, edits, the model library,
//! workload and scoped rule deletion.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get, post_json, put_json};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn machine(pool: &PgPool, token: &str, name: &str, model: Option<&str>) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/machines",
        Some(token),
        json!({ "name": name, "model": model }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_rule(pool: &PgPool, token: &str, body: Value) -> (StatusCode, Value) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/preventives",
        Some(token),
        body,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_applied_to_model_skips_machines_that_have_it(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press1 = machine(&pool, &token, "Press 1", Some("HX-200")).await;
    let press2 = machine(&pool, &token, "Press 2", Some("HX-200")).await;
    let press3 = machine(&pool, &token, "Press 3", Some("HX-200")).await;
    machine(&pool, &token, "Lathe", Some("LT-9")).await;

    let (status, _) = create_rule(
        &pool,
        &token,
        json!({ "machine_id": press2, "task": "Grease bearings", "frequency_hours": 168, "duration_min": 30 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = create_rule(
        &pool,
        &token,
        json!({
            "machine_id": press1,
            "task": "Grease bearings",
            "frequency_hours": 168,
            "duration_min": 30,
            "apply_to_model": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json["data"].as_array().unwrap();
    let machines: Vec<i64> = created
        .iter()
        .map(|t| t["machine_id"].as_i64().unwrap())
        .collect();
    assert_eq!(machines, vec![press1, press3]);

    // Re-applying adds nothing to machines that already carry the rule.
    let reapply = json!({
        "machine_id": press1,
        "task": "Grease bearings",
        "frequency_hours": 168,
        "duration_min": 30,
        "apply_to_model": true
    });
    let (status, json_again) = create_rule(&pool, &token, reapply).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json_again["code"], "CONFLICT");

    let expected_due = Utc::now().date_naive() + Duration::days(7);
    assert_eq!(created[0]["due_date"], expected_due.to_string());
    assert_eq!(created[0]["is_preventive"], true);

    let response = get(common::build_test_app(pool), "/preventives", Some(&token)).await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["bucket"] == "biweekly"));
    assert!(rows.iter().all(|r| r["duration_label"] == "30m"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_creation_errors(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let no_model = machine(&pool, &token, "Lathe", None).await;

    let (status, json) = create_rule(
        &pool,
        &token,
        json!({ "machine_id": no_model, "task": "Oil", "frequency_hours": 0, "duration_min": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, _) = create_rule(
        &pool,
        &token,
        json!({ "machine_id": no_model, "task": "Oil", "frequency_hours": 24, "duration_min": 10, "apply_to_model": true }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_rule(
        &pool,
        &token,
        json!({ "machine_id": 999999, "task": "Oil", "frequency_hours": 24, "duration_min": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_rule_only_touches_preventive_tasks(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press = machine(&pool, &token, "Press 1", Some("HX-200")).await;
    let (_, json) = create_rule(
        &pool,
        &token,
        json!({ "machine_id": press, "task": "Grease", "frequency_hours": 168, "duration_min": 30, "due_date": "2024-05-01" }),
    )
    .await;
    let rule_id = json["data"][0]["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/preventives/{rule_id}"),
        Some(&token),
        json!({ "frequency_hours": 720, "duration_min": 45 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["frequency_hours"], 720);
    assert_eq!(json["data"]["duration_min"], 45);
    assert_eq!(json["data"]["due_date"], "2024-05-01");

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/tasks",
        Some(&token),
        json!({ "machine_id": press, "task": "Fix guard" }),
    )
    .await;
    let manual_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool),
        &format!("/preventives/{manual_id}"),
        Some(&token),
        json!({ "duration_min": 10 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_library_and_workload(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press1 = machine(&pool, &token, "Press 1", Some("HX-200")).await;
    machine(&pool, &token, "Press 2", Some("HX-200")).await;
    let lathe = machine(&pool, &token, "Lathe", Some("LT-9")).await;

    create_rule(
        &pool,
        &token,
        json!({ "machine_id": press1, "task": "Grease", "frequency_hours": 168, "duration_min": 60, "apply_to_model": true }),
    )
    .await;
    create_rule(
        &pool,
        &token,
        json!({ "machine_id": lathe, "task": "Daily check", "frequency_hours": 24, "duration_min": 60 }),
    )
    .await;

    let response = get(
        common::build_test_app(pool.clone()),
        "/preventives/library",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let groups = json["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["model"], "HX-200");
    assert_eq!(groups[0]["machines"], json!(["Press 1", "Press 2"]));
    assert_eq!(groups[0]["rules"][0]["machine_count"], 2);
    assert_eq!(groups[0]["workload"]["status"], "ok");
    assert_eq!(groups[1]["workload"]["status"], "overload");

    let response = get(
        common::build_test_app(pool.clone()),
        "/preventives/workload",
        Some(&token),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"]["rule_count"], 3);
    assert_eq!(json["data"]["total"]["status"], "overload");
    assert_eq!(json["data"]["machines"][0]["machine_name"], "Lathe");

    let response = get(
        common::build_test_app(pool),
        &format!("/preventives/workload?machine_id={press1}"),
        Some(&token),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"]["rule_count"], 1);
    assert_eq!(json["data"]["total"]["status"], "ok");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_deletion_by_model(pool: PgPool) {
    let planner = common::token_for(&pool, "plan", "planner").await;
    let admin = common::token_for(&pool, "boss", "admin").await;
    let press1 = machine(&pool, &planner, "Press 1", Some("HX-200")).await;
    machine(&pool, &planner, "Press 2", Some("HX-200")).await;
    let lathe = machine(&pool, &planner, "Lathe", Some("LT-9")).await;

    create_rule(
        &pool,
        &planner,
        json!({ "machine_id": press1, "task": "Grease", "frequency_hours": 168, "duration_min": 30, "apply_to_model": true }),
    )
    .await;
    create_rule(
        &pool,
        &planner,
        json!({ "machine_id": lathe, "task": "Grease", "frequency_hours": 168, "duration_min": 30 }),
    )
    .await;

    let selector = json!({ "task": "Grease", "model": "HX-200" });

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/preventives/delete-rule/preview",
        Some(&planner),
        selector.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/preventives/delete-rule/preview",
        Some(&admin),
        selector.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["count"], 2);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/preventives/delete-rule",
        Some(&admin),
        selector,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["deleted"], 2);

    let response = get(common::build_test_app(pool), "/preventives", Some(&admin)).await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["machine_name"], "Lathe");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rule_deletion_requires_scope(pool: PgPool) {
    let admin = common::token_for(&pool, "boss", "admin").await;
    let response = post_json(
        common::build_test_app(pool),
        "/preventives/delete-rule",
        Some(&admin),
        json!({ "task": "Grease" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}
