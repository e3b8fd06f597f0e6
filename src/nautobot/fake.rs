//! In-process stand-in for the Nautobot REST API used by the client tests.
//! Every `/api/<app>/<model>/` path is a generic collection supporting
//! filtered list, create and partial update.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::NautobotClient;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeState {
    token: String,
    collections: HashMap<String, Vec<Value>>,
    fail_patches: bool,
}

impl FakeState {
    fn seed(&mut self, collection: &str, name: &str) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(json!({ "id": Uuid::new_v4().to_string(), "name": name }));
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeNautobot {
    base_url: String,
    state: Shared,
}

impl FakeNautobot {
    pub async fn start() -> Self {
        Self::start_with_token(TOKEN).await
    }

    /// Start a server that only accepts the given token
    pub async fn start_with_token(accepted: &str) -> Self {
        let mut state = FakeState {
            token: accepted.to_string(),
            ..Default::default()
        };
        state.seed("dcim/locations", "ABC");
        state.seed("extras/statuses", "Active");
        state.seed("ipam/namespaces", "Global");
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/api/*path", any(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> NautobotClient {
        NautobotClient::new(self.base_url.clone(), TOKEN.to_string()).unwrap()
    }

    pub fn count(&self, collection: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }

    pub fn find(&self, collection: &str, field: &str, value: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(collection)?
            .iter()
            .find(|item| item[field] == value)
            .cloned()
    }

    /// Add a named reference object such as a location
    pub fn seed(&self, collection: &str, name: &str) {
        self.state.lock().unwrap().seed(collection, name);
    }

    pub fn fail_patches(&self, fail: bool) {
        self.state.lock().unwrap().fail_patches = fail;
    }
}

fn matches(item: &Value, query: &HashMap<String, String>) -> bool {
    query
        .iter()
        .filter(|(k, _)| k.as_str() != "limit" && k.as_str() != "offset")
        .all(|(k, v)| {
            let field = if k == "device_id" { "device" } else { k.as_str() };
            match item.get(field) {
                Some(Value::String(s)) => s == v,
                Some(Value::Number(n)) => n.to_string() == *v,
                _ => false,
            }
        })
}

fn reply(status: StatusCode, body: Value) -> (StatusCode, Json<Value>) {
    (status, Json(body))
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    headers: HeaderMap,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Token {}", state.token) {
        return reply(StatusCode::FORBIDDEN, json!({ "detail": "Invalid token." }));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments == ["status"] {
        return reply(StatusCode::OK, json!({ "nautobot-version": "2.2.0" }));
    }
    if segments.len() < 2 {
        return reply(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }));
    }

    let collection = format!("{}/{}", segments[0], segments[1]);
    let id = segments.get(2).map(|s| s.to_string());
    let payload: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    match (method, id) {
        (Method::GET, None) => {
            let results: Vec<Value> = state
                .collections
                .get(&collection)
                .map(|items| items.iter().filter(|i| matches(i, &query)).cloned().collect())
                .unwrap_or_default();
            reply(
                StatusCode::OK,
                json!({ "count": results.len(), "next": null, "previous": null, "results": results }),
            )
        }
        (Method::POST, None) => {
            let Value::Object(mut obj) = payload else {
                return reply(StatusCode::BAD_REQUEST, json!({ "detail": "expected object" }));
            };
            obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
            let created = Value::Object(obj);
            state
                .collections
                .entry(collection)
                .or_default()
                .push(created.clone());
            reply(StatusCode::CREATED, created)
        }
        (Method::PATCH, Some(id)) => {
            if state.fail_patches {
                return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": "boom" }));
            }
            let Value::Object(changes) = payload else {
                return reply(StatusCode::BAD_REQUEST, json!({ "detail": "expected object" }));
            };
            let items = state.collections.entry(collection).or_default();
            match items.iter_mut().find(|i| i["id"] == id.as_str()) {
                Some(item) => {
                    if let Value::Object(obj) = &mut *item {
                        for (k, v) in changes {
                            obj.insert(k, v);
                        }
                    }
                    reply(StatusCode::OK, item.clone())
                }
                None => reply(StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            }
        }
        _ => reply(StatusCode::METHOD_NOT_ALLOWED, json!({ "detail": "not allowed" })),
    }
}
