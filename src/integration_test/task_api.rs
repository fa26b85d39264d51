use super::test_util::{prepare_db_and_test, reconciled_router};
use crate::api::test_util::{deserialize_body, empty_request, json_request};
use crate::dto;
use axum::Router;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

async fn create(router: &Router, body: serde_json::Value) -> dto::Task {
    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/tasks", body.to_string()))
        .await
        .expect("Router failed to respond");

    assert_eq!(StatusCode::CREATED, response.status());
    deserialize_body(response.into_body()).await
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn create_assigns_id_and_year() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;

        let created = create(
            &router,
            json!({ "title": "Pay rent", "due_date": "2025-03-01T00:00:00Z" }),
        )
        .await;

        assert_eq!("Pay rent", created.title);
        assert_eq!(Some(2025), created.year);
        assert!(!created.is_completed);
        assert_eq!(None, created.description);
        assert_eq!(Some(uuid::Version::Random), created.id.get_version());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn list_is_ordered_by_due_date() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;
        create(&router, json!({ "title": "Later", "due_date": "2025-06-01T00:00:00Z" })).await;
        create(&router, json!({ "title": "Sooner", "due_date": "2025-01-15T09:00:00Z" })).await;
        create(&router, json!({ "title": "Middle", "due_date": "2025-03-01T00:00:00Z" })).await;

        let response = router
            .clone()
            .oneshot(empty_request(Method::GET, "/api/tasks"))
            .await
            .expect("Router failed to respond");

        assert_eq!(StatusCode::OK, response.status());
        let tasks: Vec<dto::Task> = deserialize_body(response.into_body()).await;
        let titles: Vec<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(vec!["Sooner", "Middle", "Later"], titles);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn completing_task_keeps_due_date_and_year() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;
        let created = create(
            &router,
            json!({
                "title": "Pay rent",
                "description": "Transfer before the 1st",
                "due_date": "2025-03-01T00:00:00Z"
            }),
        )
        .await;

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/{}", created.id),
                json!({ "is_completed": true }).to_string(),
            ))
            .await
            .expect("Router failed to respond");

        assert_eq!(StatusCode::OK, response.status());
        let updated: dto::Task = deserialize_body(response.into_body()).await;
        assert!(updated.is_completed);
        assert_eq!(created.due_date, updated.due_date);
        assert_eq!(Some(2025), updated.year);
        assert_eq!(created.description, updated.description);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn moving_due_date_recomputes_year_and_null_clears_description() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;
        let created = create(
            &router,
            json!({
                "title": "File taxes",
                "description": "Federal and state",
                "due_date": "2025-04-15T00:00:00Z"
            }),
        )
        .await;

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/{}", created.id),
                json!({ "due_date": "2026-04-15T00:00:00Z", "description": null }).to_string(),
            ))
            .await
            .expect("Router failed to respond");

        assert_eq!(StatusCode::OK, response.status());
        let updated: dto::Task = deserialize_body(response.into_body()).await;
        assert_eq!(Some(2026), updated.year);
        assert_eq!(None, updated.description);
        assert_eq!("File taxes", updated.title);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn updating_unknown_task_is_404() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/tasks/{}", Uuid::new_v4()),
                json!({ "title": "Ghost" }).to_string(),
            ))
            .await
            .expect("Router failed to respond");

        assert_eq!(StatusCode::NOT_FOUND, response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn deleting_twice_is_204_then_404() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;
        let created = create(
            &router,
            json!({ "title": "Pay rent", "due_date": "2025-03-01T00:00:00Z" }),
        )
        .await;
        let task_uri = format!("/api/tasks/{}", created.id);

        let first = router
            .clone()
            .oneshot(empty_request(Method::DELETE, &task_uri))
            .await
            .expect("Router failed to respond");
        let second = router
            .clone()
            .oneshot(empty_request(Method::DELETE, &task_uri))
            .await
            .expect("Router failed to respond");

        assert_eq!(StatusCode::NO_CONTENT, first.status());
        assert_eq!(StatusCode::NOT_FOUND, second.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn frontend_form_payload_is_stored_as_utc() {
    prepare_db_and_test(|pool| async move {
        let router = reconciled_router(pool).await;

        let created = create(
            &router,
            json!({
                "title": "Pay rent",
                "description": "",
                "due_date": "2025-03-01T10:00:00.000",
                "is_completed": false
            }),
        )
        .await;

        assert_eq!("2025-03-01T10:00:00+00:00", created.due_date.to_rfc3339());
        assert_eq!(Some(2025), created.year);
    });
}
