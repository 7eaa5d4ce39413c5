//! Machines, task CRUD, list filters and completion over HTTP.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, delete, get, post_json, put_json};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_machine(pool: &PgPool, token: &str, name: &str, line: &str) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/machines",
        Some(token),
        json!({ "name": name, "model": "HX-200", "line": line }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_task(pool: &PgPool, token: &str, body: Value) -> Value {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/tasks",
        Some(token),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_machine_create_is_an_upsert(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let id = create_machine(&pool, &token, "Press 1", "L1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/machines",
        Some(&token),
        json!({ "name": "  Press 1 ", "serial": "SN-9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["serial"], "SN-9");
    assert_eq!(json["data"]["line"], "L1");

    let response = get(common::build_test_app(pool.clone()), "/machines", Some(&token)).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(
        common::build_test_app(pool),
        "/machines/999999",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_machine_update_and_duplicate_name(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press = create_machine(&pool, &token, "Press 1", "L1").await;
    create_machine(&pool, &token, "Lathe", "L2").await;

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/machines/{press}"),
        Some(&token),
        json!({ "line": "L3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["line"], "L3");

    let response = put_json(
        common::build_test_app(pool),
        &format!("/machines/{press}"),
        Some(&token),
        json!({ "name": "Lathe" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_list_carries_due_state_and_filters(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press = create_machine(&pool, &token, "Press 1", "L1").await;
    let lathe = create_machine(&pool, &token, "Lathe", "L2").await;
    let today = Utc::now().date_naive();

    create_task(
        &pool,
        &token,
        json!({ "machine_id": press, "task": "Replace seal", "due_date": today - Duration::days(1), "duration_min": 90 }),
    )
    .await;
    create_task(
        &pool,
        &token,
        json!({ "machine_id": lathe, "task": "Spindle noise", "is_planned": false }),
    )
    .await;

    let response = get(common::build_test_app(pool.clone()), "/tasks", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["machine_name"], "Press 1");
    assert_eq!(rows[0]["due_state"], "overdue");
    assert_eq!(rows[0]["duration_label"], "1h 30m");
    assert_eq!(rows[0]["kind"], "planned");
    assert_eq!(rows[1]["due_state"], "unknown");
    assert_eq!(rows[1]["kind"], "unplanned");

    let response = get(
        common::build_test_app(pool.clone()),
        "/tasks?due_state=overdue",
        Some(&token),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(
        common::build_test_app(pool.clone()),
        "/tasks?search=SPINDLE&line=l2",
        Some(&token),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["task"], "Spindle noise");

    let response = get(
        common::build_test_app(pool),
        "/tasks?due_state=later",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_validation_and_missing_machine(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press = create_machine(&pool, &token, "Press 1", "L1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/tasks",
        Some(&token),
        json!({ "machine_id": press, "task": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        common::build_test_app(pool),
        "/tasks",
        Some(&token),
        json!({ "machine_id": 424242, "task": "Oil" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_status_and_soft_delete(pool: PgPool) {
    let token = common::token_for(&pool, "plan", "planner").await;
    let press = create_machine(&pool, &token, "Press 1", "L1").await;
    let task = create_task(&pool, &token, json!({ "machine_id": press, "task": "Oil" })).await;
    let id = task["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}"),
        Some(&token),
        json!({ "section": "Lubrication", "duration_min": 20 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["section"], "Lubrication");
    assert_eq!(json["data"]["task"], "Oil");

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}/status"),
        Some(&token),
        json!({ "status": "In progress" }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["status"], "In progress");

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(common::build_test_app(pool), "/tasks", Some(&token)).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completing_preventive_rule_rolls_due_date(pool: PgPool) {
    let planner = common::token_for(&pool, "plan", "planner").await;
    let technician = common::token_for(&pool, "lucia", "technician").await;
    let press = create_machine(&pool, &planner, "Press 1", "L1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/preventives",
        Some(&planner),
        json!({
            "machine_id": press,
            "task": "Grease bearings",
            "frequency_hours": 168,
            "duration_min": 30,
            "due_date": "2024-03-01"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"][0]["id"].as_i64().unwrap();

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}/complete"),
        Some(&technician),
        json!({ "executed_at": "2024-03-04T09:00:00Z", "notes": "ok" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["task"]["due_date"], "2024-03-11");
    assert_eq!(json["data"]["task"]["status"], "Planned");
    assert_eq!(json["data"]["execution"]["executed_by"], "lucia");
    assert_eq!(json["data"]["execution"]["duration_min"], 30);
    assert_eq!(json["data"]["execution"]["machine_name"], "Press 1");

    let response = get(
        common::build_test_app(pool),
        "/executions?from=2024-03-04&to=2024-03-04&technician=LUC",
        Some(&technician),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completing_manual_task_marks_done(pool: PgPool) {
    let planner = common::token_for(&pool, "plan", "planner").await;
    let press = create_machine(&pool, &planner, "Press 1", "L1").await;
    let task = create_task(&pool, &planner, json!({ "machine_id": press, "task": "Fix guard" })).await;
    let id = task["id"].as_i64().unwrap();

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/tasks/{id}/complete"),
        Some(&planner),
        json!({ "executed_by": "Marco", "duration_min": 45 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["task"]["status"], "Done");
    assert_eq!(json["data"]["execution"]["executed_by"], "Marco");
    assert_eq!(json["data"]["execution"]["duration_min"], 45);

    let response = post_json(
        common::build_test_app(pool),
        "/tasks/999999/complete",
        Some(&planner),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inverted_execution_range_is_rejected(pool: PgPool) {
    let token = common::token_for(&pool, "lucia", "technician").await;
    let response = get(
        common::build_test_app(pool),
        "/executions?from=2024-03-10&to=2024-03-01",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
