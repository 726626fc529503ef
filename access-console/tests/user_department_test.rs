mod common;

use access_console::models::{AssignUserRequest, BatchAssignRequest, UpdateUserDepartmentRequest};
use common::TestSession;
use console_core::error::ApiError;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn association(id: i64, user_id: i64, department_id: i64, is_primary: bool) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "department_id": department_id,
        "position": "Engineer",
        "is_primary": is_primary,
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": "2024-05-01T08:00:00Z"
    })
}

#[tokio::test]
async fn test_primary_assign_issues_exactly_one_write() {
    let t = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user-departments/assign"))
        .and(body_json(json!({"user_id": 5, "department_id": 2, "is_primary": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": association(11, 5, 2, true)})),
        )
        .expect(1)
        .mount(&t.server)
        .await;

    let created = t
        .console()
        .user_departments
        .assign(&AssignUserRequest {
            user_id: 5,
            department_id: 2,
            position: None,
            is_primary: Some(true),
        })
        .await
        .unwrap();

    assert!(created.is_primary);
    assert_eq!(created.department_id, 2);

    let requests = t.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_str(), "POST");
}

#[tokio::test]
async fn test_batch_assign_reports_skips() {
    let t = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user-departments/batch-assign"))
        .and(body_json(json!({"user_ids": [1, 2, 3], "department_id": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "assigned_count": 2,
                "skipped_count": 1,
                "assignments": [association(20, 1, 4, false), association(21, 3, 4, false)]
            }
        })))
        .mount(&t.server)
        .await;

    let result = t
        .console()
        .user_departments
        .batch_assign(&BatchAssignRequest {
            user_ids: vec![1, 2, 3],
            department_id: 4,
            position: None,
        })
        .await
        .unwrap();

    assert_eq!(result.assigned_count, 2);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.assignments.len(), 2);
}

#[tokio::test]
async fn test_empty_batch_is_rejected_locally() {
    let t = TestSession::start().await;

    let err = t
        .console()
        .user_departments
        .batch_assign(&BatchAssignRequest {
            user_ids: vec![],
            department_id: 4,
            position: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ValidationError(_)));
    assert!(t.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_sends_only_supplied_fields() {
    let t = TestSession::start().await;
    Mock::given(method("PUT"))
        .and(path("/user-departments/11"))
        .and(body_json(json!({"is_primary": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": association(11, 5, 2, false)})),
        )
        .expect(1)
        .mount(&t.server)
        .await;

    let updated = t
        .console()
        .user_departments
        .update(
            11,
            &UpdateUserDepartmentRequest {
                position: None,
                is_primary: Some(false),
            },
        )
        .await
        .unwrap();

    assert!(!updated.is_primary);
    assert_eq!(updated.position.as_deref(), Some("Engineer"));
}

#[tokio::test]
async fn test_remove_association() {
    let t = TestSession::start().await;
    Mock::given(method("DELETE"))
        .and(path("/user-departments/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": true})))
        .expect(1)
        .mount(&t.server)
        .await;

    assert!(t.console().user_departments.remove(11).await.unwrap());
}

#[tokio::test]
async fn test_lookups_hit_dedicated_endpoints() {
    let t = TestSession::start().await;
    Mock::given(method("GET"))
        .and(path("/user-departments/user/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [association(11, 5, 2, true), association(12, 5, 3, false)]
        })))
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user-departments/department/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [association(11, 5, 2, true)]})),
        )
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user-departments/user/5/primary"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": association(11, 5, 2, true)})),
        )
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user-departments/user/6/primary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&t.server)
        .await;

    let client = t.console().user_departments;

    assert_eq!(client.by_user(5).await.unwrap().len(), 2);
    assert_eq!(client.by_department(2).await.unwrap()[0].user_id, 5);
    assert_eq!(client.primary_of_user(5).await.unwrap().unwrap().id, 11);
    assert!(client.primary_of_user(6).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_assignment_is_surfaced_verbatim() {
    let t = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user-departments/assign"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "User is already assigned to this department"})),
        )
        .mount(&t.server)
        .await;

    let err = t
        .console()
        .user_departments
        .assign(&AssignUserRequest {
            user_id: 5,
            department_id: 2,
            position: None,
            is_primary: None,
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Conflict(message) => {
            assert_eq!(message, "User is already assigned to this department")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
