//! Full CRUD lifecycle test against the live server.
//!
//! # Design
//! Starts the real server on a random port over a temporary database, then
//! exercises every client operation over real HTTP using ureq. Validates that
//! the client's request building and response parsing agree with the server.

use todo_core::{ApiError, CreateTodo, HttpMethod, HttpResponse, Stats, TodoClient, UpdateTodo};
use todo_server::{AppState, Config};
use todo_store::{StoreConfig, TodoStore};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
fn execute(req: todo_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.url).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.url).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.url).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.url).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.url).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.url).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse::new(status, body)
}

/// Start the server on a random port; returns its base URL.
fn spawn_server(dir: &tempfile::TempDir) -> String {
    let config = Config {
        store: StoreConfig::new(dir.path().join("todos.db")),
        ..Config::default()
    };
    let store = TodoStore::new(config.store.clone());
    store.initialize().unwrap();
    let state = AppState::new(store, &config).unwrap();

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener, state, &config).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let client = TodoClient::new(&spawn_server(&dir));

    // Step 1: health.
    let health = client.parse_health(execute(client.build_health())).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.database, "connected");

    // Step 2: list: should be empty.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Step 3: create a todo.
    let create_input = CreateTodo {
        title: "Integration test".to_string(),
        description: Some("over real HTTP".to_string()),
        due_date: Some("2025-12-31".to_string()),
    };
    let req = client.build_create_todo(&create_input).unwrap();
    let created = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(created.title, "Integration test");
    assert!(!created.completed);
    let id = created.id;

    // Step 4: get the created todo.
    let fetched = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap();
    assert_eq!(fetched, created);

    // Step 5: update title.
    let update_input = UpdateTodo {
        title: Some("Updated title".to_string()),
        ..UpdateTodo::default()
    };
    let req = client.build_update_todo(id, &update_input).unwrap();
    let updated = client.parse_update_todo(execute(req)).unwrap();
    assert_eq!(updated.title, "Updated title");
    assert_eq!(updated.description.as_deref(), Some("over real HTTP"));
    assert!(!updated.completed);

    // Step 6: update completed and clear the due date.
    let update_input = UpdateTodo {
        completed: Some(true),
        due_date: Some(None),
        ..UpdateTodo::default()
    };
    let req = client.build_update_todo(id, &update_input).unwrap();
    let updated = client.parse_update_todo(execute(req)).unwrap();
    assert_eq!(updated.title, "Updated title");
    assert_eq!(updated.due_date, None);
    assert!(updated.completed);

    // Step 7: list and stats: one completed item.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert_eq!(todos.len(), 1);
    let stats = client.parse_stats(execute(client.build_stats())).unwrap();
    assert_eq!(stats, Stats { total: 1, completed: 1, pending: 0 });

    // Step 8: delete.
    client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap();

    // Step 9: get after delete: should be NotFound.
    let err = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 10: delete again: should be NotFound.
    let err = client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 11: update a missing id: should be NotFound.
    let req = client.build_update_todo(9999, &UpdateTodo::default()).unwrap();
    let err = client.parse_update_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 12: list: should be empty again.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list after delete");
}
