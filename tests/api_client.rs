//! HTTP contract tests for the REST client against a mock backend.

use std::sync::Arc;

use serde_json::json;
use taskdesk::api::{ApiClient, ApiError, Credentials, Registration};
use taskdesk::core::id::Id;
use taskdesk::core::task::{TaskDraft, TaskStatus};
use taskdesk::core::user::{Session, User};
use taskdesk::session::{FileSessionStore, MemorySessionStore, SessionStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn logged_in_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::with_session(&Session {
        token: "secret-token".into(),
        user: Some(User::new("Rina")),
    }))
}

fn client(server: &MockServer, store: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::new(&server.uri(), store).unwrap()
}

fn task_json(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "deadline": "2025-05-01",
        "status": "pending"
    })
}

#[tokio::test]
async fn login_stores_token_and_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"email": "rina@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-abc",
            "user": {"id": 5, "name": "Rina", "email": "rina@example.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    let api = client(&server, store.clone());

    let session = api
        .login(&Credentials {
            email: "rina@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();

    assert_eq!(session.token, "tok-abc");
    assert_eq!(store.token().unwrap().as_deref(), Some("tok-abc"));
    let user = store.user().unwrap().unwrap();
    assert_eq!(user.name, "Rina");
    assert_eq!(user.id, Some(Id::from("5")));

    api.logout().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn wrong_password_is_unauthorized_and_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let api = client(&server, store.clone());
    let err = api
        .login(&Credentials {
            email: "rina@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { ref message } if message == "Invalid credentials"));
    assert_eq!(store.token().unwrap(), None);
}

#[tokio::test]
async fn login_without_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let api = client(&server, store.clone());
    let err = api
        .login(&Credentials {
            email: "a@b.io".into(),
            password: "pw".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(store.token().unwrap(), None);
}

#[tokio::test]
async fn list_sends_bearer_token_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [task_json(1, "Buy milk"), task_json(2, "Write report")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let tasks = api.list_tasks().await.unwrap().tasks;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].title, "Write report");
    assert_eq!(tasks[0].id, Id::from("1"));
}

#[tokio::test]
async fn list_accepts_bare_array_and_omits_auth_when_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(3, "Solo")])))
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::new()));
    let tasks = api.list_tasks().await.unwrap().tasks;
    assert_eq!(tasks.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn list_body_without_an_array_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let err = api.list_tasks().await.unwrap_err();
    assert!(matches!(err, ApiError::Unknown { status: Some(s), .. } if s.as_u16() == 200));
}

#[tokio::test]
async fn bad_rows_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            task_json(1, "Fine"),
            {"id": 2, "title": "No status", "status": null},
            {"id": 3, "title": "Archived", "status": "archived"},
            {"id": 4.0, "title": "Float id"},
            {"title": "No id at all"},
            "not even an object"
        ]})))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let listing = api.list_tasks().await.unwrap();
    let titles: Vec<_> = listing.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Fine", "No status", "Archived", "Float id"]);
    assert_eq!(listing.skipped, 2);
    assert_eq!(listing.tasks[1].status, TaskStatus::Pending);
    assert_eq!(listing.tasks[2].status, TaskStatus::Other("archived".into()));
    assert_eq!(listing.tasks[3].id, Id::from("4"));
}

#[tokio::test]
async fn list_unauthorized_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let err = api.list_tasks().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[tokio::test]
async fn create_update_and_delete_hit_the_right_routes() {
    let server = MockServer::start().await;
    let draft = TaskDraft {
        title: "Plan sprint".into(),
        description: "backlog grooming".into(),
        deadline: "2025-04-10".into(),
        status: TaskStatus::InProgress,
    };

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({
            "title": "Plan sprint",
            "description": "backlog grooming",
            "deadline": "2025-04-10",
            "status": "in-progress"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 77, "title": "Plan sprint", "description": "backlog grooming",
            "deadline": "2025-04-10", "status": "in-progress"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "77", "title": "Plan sprint", "description": "backlog grooming",
                     "deadline": "2025-04-10", "status": "completed"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/77"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let created = api.create_task(&draft).await.unwrap().unwrap();
    assert_eq!(created.id, Id::from("77"));

    let mut done = draft.clone();
    done.status = TaskStatus::Completed;
    let updated = api.update_task(&created.id, &done).await.unwrap().unwrap();
    assert_eq!(updated.status, TaskStatus::Completed);

    api.delete_task(&created.id).await.unwrap();
}

#[tokio::test]
async fn saves_without_a_task_body_still_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "updated"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let draft = TaskDraft::new("Feed cat");
    assert_eq!(api.create_task(&draft).await.unwrap(), None);
    assert_eq!(api.update_task(&Id::from("5"), &draft).await.unwrap(), None);
}

#[tokio::test]
async fn task_ids_are_escaped_in_paths() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/..%2Flogin"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/a%2Fb"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    api.delete_task(&Id::from("../login")).await.unwrap();
    api.update_task(&Id::from("a/b"), &TaskDraft::new("x")).await.unwrap();

    let err = api.delete_task(&Id::from("..")).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));

    let paths: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, ["/tasks/..%2Flogin", "/tasks/a%2Fb"]);
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Task not found"})))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let err = api.delete_task(&Id::from("9")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn register_validation_errors_are_per_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The given data was invalid.",
            "errors": {"email": ["The email has already been taken."]}
        })))
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::new()));
    let err = api
        .register(&Registration {
            name: "Rina".into(),
            email: "rina@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap_err();

    let fields = match err {
        ApiError::ValidationFailed(fields) => fields,
        other => panic!("expected validation failure, got {:?}", other),
    };
    assert_eq!(fields.get("email"), ["The email has already been taken."]);
}

#[tokio::test]
async fn register_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({"name": "Rina", "email": "rina@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "created"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let api = client(&server, store.clone());
    api.register(&Registration {
        name: "Rina".into(),
        email: "rina@example.com".into(),
        password: "hunter2".into(),
    })
    .await
    .unwrap();
    assert_eq!(store.token().unwrap(), None);
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    // Nothing listens on port 9 locally.
    let api = ApiClient::new("http://127.0.0.1:9", Arc::new(MemorySessionStore::new())).unwrap();
    let err = api.list_tasks().await.unwrap_err();
    assert!(err.is_network(), "got {:?}", err);
}

#[tokio::test]
async fn server_error_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let api = client(&server, logged_in_store());
    let err = api.list_tasks().await.unwrap_err();
    assert!(matches!(err, ApiError::Unknown { status: Some(s), .. } if s.as_u16() == 500));
}
