//! In-process mock of the catalog API for integration tests.
//!
//! Collections live in memory as raw JSON. The server enforces slug
//! uniqueness, detaches deleted tracks from albums, honours per-term delays
//! on list requests, and counts requests so tests can assert on traffic.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use musicly_client::api::CatalogApi;
use musicly_client::session::{Session, UserProfile};

pub const TOKEN: &str = "abc";
pub const EMAIL: &str = "test@example.com";
pub const PASSWORD: &str = "secret123";
pub const RESET_TOKEN: &str = "valid-reset-token";

pub const COLLECTIONS: [&str; 3] = ["categories", "albums", "audios"];

type Shared = Arc<MockState>;

/// One file received in a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub route: String,
    pub field: String,
    pub file_name: String,
}

#[derive(Default)]
pub struct MockState {
    collections: Mutex<HashMap<&'static str, Vec<Value>>>,
    list_hits: Mutex<HashMap<&'static str, usize>>,
    list_queries: Mutex<Vec<HashMap<String, String>>>,
    write_hits: AtomicUsize,
    auth_hits: AtomicUsize,
    delays: Mutex<HashMap<String, Duration>>,
    uploads: Mutex<Vec<Upload>>,
    list_failure: Mutex<Option<(StatusCode, String)>>,
    sign_in_delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl MockState {
    pub fn items(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, collection: &str, id: &str) -> Option<Value> {
        self.items(collection).into_iter().find(|item| item["_id"] == id)
    }

    pub fn list_hits(&self, collection: &str) -> usize {
        self.list_hits
            .lock()
            .unwrap()
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    /// Query strings of every list request, in arrival order.
    pub fn list_queries(&self) -> Vec<HashMap<String, String>> {
        self.list_queries.lock().unwrap().clone()
    }

    pub fn write_hits(&self) -> usize {
        self.write_hits.load(Ordering::SeqCst)
    }

    pub fn auth_hits(&self) -> usize {
        self.auth_hits.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Delay list responses for `term`.
    pub fn delay_term(&self, term: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(term.to_string(), delay);
    }

    /// Hold every sign-in response for `delay`.
    pub fn delay_sign_in(&self, delay: Duration) {
        *self.sign_in_delay.lock().unwrap() = Some(delay);
    }

    /// Answer every list request with this raw status and body.
    pub fn fail_lists_with(&self, status: StatusCode, body: &str) {
        *self.list_failure.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn clear_list_failure(&self) {
        *self.list_failure.lock().unwrap() = None;
    }

    pub fn insert(&self, collection: &'static str, item: Value) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push(item);
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub struct MockCatalog {
    pub state: Shared,
    pub base_url: String,
}

impl MockCatalog {
    /// Start a server seeded with [`seed`].
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        seed(&state);
        Self::serve(state).await
    }

    /// Start a server with no data.
    pub async fn empty() -> Self {
        Self::serve(Arc::new(MockState::default())).await
    }

    async fn serve(state: Shared) -> Self {
        let app = build_router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            state,
            base_url: format!("http://{addr}/api"),
        }
    }

    pub fn api(&self) -> CatalogApi {
        CatalogApi::with_client(reqwest::Client::new(), self.base_url.clone())
    }
}

/// A session carrying the token the mock accepts.
pub fn session() -> Session {
    let user: UserProfile = serde_json::from_value(json!({ "id": 1, "email": EMAIL })).unwrap();
    Session::new(TOKEN, user)
}

/// Base URL of a port that nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

pub fn bilingual(en: &str, ar: &str) -> Value {
    json!([{ "lang": "en", "value": en }, { "lang": "ar", "value": ar }])
}

/// Two categories, one album holding one track, two tracks.
pub fn seed(state: &MockState) {
    state.insert(
        "categories",
        json!({
            "_id": "c1",
            "title": bilingual("Quran", "قرآن"),
            "description": bilingual("Recitations", "تلاوات"),
            "slug": "quran",
            "albums": ["a1"],
        }),
    );
    state.insert(
        "categories",
        json!({
            "_id": "c2",
            "title": bilingual("Kids Stories", "قصص الأطفال"),
            "description": bilingual("Bedtime", "قبل النوم"),
            "slug": "kids-stories",
            "albums": [],
        }),
    );
    state.insert(
        "albums",
        json!({
            "_id": "a1",
            "title": bilingual("Evening", "مساء"),
            "description": bilingual("Evening adhkar", "أذكار المساء"),
            "slug": "evening",
            "category": "c1",
            "audios": ["t1"],
        }),
    );
    state.insert(
        "audios",
        json!({
            "_id": "t1",
            "title": bilingual("Morning Dua", "دعاء الصباح"),
            "description": bilingual("d", "د"),
            "slug": "morning-dua",
            "audio": "https://cdn.test/t1.mp3",
            "isFree": true,
            "published": "true",
        }),
    );
    state.insert(
        "audios",
        json!({
            "_id": "t2",
            "title": bilingual("Bedtime Story", "قصة قبل النوم"),
            "description": bilingual("d", "د"),
            "slug": "bedtime-story",
            "audio": "https://cdn.test/t2.mp3",
            "isFree": false,
            "published": false,
        }),
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_router(state: Shared) -> Router {
    let mut router = Router::new()
        .route("/api/auth/signin", post(sign_in))
        .route("/api/users/reset-password/{token}", post(reset_password))
        .route("/api/audios/play/{key}", get(play))
        .route(
            "/api/albums/{key}/audios/{audio_id}",
            post(attach_audio).delete(detach_audio),
        );

    for name in COLLECTIONS {
        router = router
            .route(
                &format!("/api/{name}"),
                get(move |state: State<Shared>, query: Query<HashMap<String, String>>, headers: HeaderMap| {
                    list(name, state, query, headers)
                })
                .post(move |state: State<Shared>, headers: HeaderMap, multipart: Multipart| {
                    create(name, state, headers, multipart)
                }),
            )
            .route(
                &format!("/api/{name}/image"),
                patch(move |state: State<Shared>, headers: HeaderMap, multipart: Multipart| {
                    update_image(name, state, headers, multipart)
                }),
            )
            .route(
                &format!("/api/{name}/{{key}}"),
                get(move |state: State<Shared>, key: Path<String>, headers: HeaderMap| {
                    fetch_one(name, state, key, headers)
                })
                .patch(move |state: State<Shared>, key: Path<String>, headers: HeaderMap, body: Json<Value>| {
                    update(name, state, key, headers, body)
                })
                .delete(move |state: State<Shared>, key: Path<String>, headers: HeaderMap| {
                    remove(name, state, key, headers)
                }),
            );
    }

    router.with_state(state)
}

fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(json!({ "apiStatus": true, "data": data }))).into_response()
}

fn fail(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "apiStatus": false, "data": code }))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED")),
    }
}

fn matches_term(item: &Value, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    let title_hit = item["title"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry["value"].as_str())
        .any(|value| value.to_lowercase().contains(&needle));
    let slug_hit = item["slug"]
        .as_str()
        .is_some_and(|slug| slug.to_lowercase().contains(&needle));
    title_hit || slug_hit
}

fn slug_taken(items: &[Value], slug: &str, except_id: Option<&str>) -> bool {
    items
        .iter()
        .any(|item| item["slug"] == slug && except_id.map_or(true, |id| item["_id"] != id))
}

fn not_found_code(collection: &str) -> &'static str {
    match collection {
        "categories" => "CATEGORY_NOT_FOUND",
        "albums" => "ALBUM_NOT_FOUND",
        _ => "AUDIO_NOT_FOUND",
    }
}

struct ReceivedForm {
    text: HashMap<String, String>,
    files: Vec<(String, String)>,
}

async fn read_multipart(mut multipart: Multipart) -> ReceivedForm {
    let mut form = ReceivedForm {
        text: HashMap::new(),
        files: Vec::new(),
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                field.bytes().await.unwrap();
                form.files.push((name, file_name));
            }
            None => {
                let text = field.text().await.unwrap();
                form.text.insert(name, text);
            }
        }
    }
    form
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn sign_in(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    state.auth_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *state.sign_in_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match (body.email.as_str(), body.password.as_str()) {
        (EMAIL, PASSWORD) => ok(json!({ "token": TOKEN, "user": { "id": 1, "email": EMAIL } })),
        ("tokenless@example.com", _) => ok(json!({ "user": { "id": 2 } })),
        _ => fail(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
    }
}

async fn reset_password(
    State(state): State<Shared>,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.auth_hits.fetch_add(1, Ordering::SeqCst);
    if token != RESET_TOKEN {
        return fail(StatusCode::BAD_REQUEST, "INVALID_TOKEN");
    }
    if body["password"].as_str().map_or(true, str::is_empty) || body.get("confirm_password").is_some() {
        return fail(StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    }
    ok(Value::Null)
}

async fn list(
    name: &'static str,
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    *state.list_hits.lock().unwrap().entry(name).or_default() += 1;
    state.list_queries.lock().unwrap().push(params.clone());

    let term = params.get("content").cloned().unwrap_or_default();
    let delay = state.delays.lock().unwrap().get(&term).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = state.list_failure.lock().unwrap().clone();
    if let Some((status, body)) = failure {
        return (status, body).into_response();
    }

    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(usize::MAX);
    let items: Vec<Value> = state
        .items(name)
        .into_iter()
        .filter(|item| matches_term(item, &term))
        .skip(offset)
        .take(limit)
        .collect();
    ok(Value::Array(items))
}

async fn fetch_one(
    name: &'static str,
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state
        .items(name)
        .into_iter()
        .find(|item| item["_id"] == key.as_str() || item["slug"] == key.as_str())
        .map(ok)
        .unwrap_or_else(|| fail(StatusCode::NOT_FOUND, not_found_code(name)))
}

async fn create(
    name: &'static str,
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let form = read_multipart(multipart).await;

    let Some(mut item) = form
        .text
        .get("data")
        .and_then(|data| serde_json::from_str::<Value>(data).ok())
    else {
        return fail(StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    };

    for (field, file_name) in &form.files {
        state.uploads.lock().unwrap().push(Upload {
            route: format!("POST /{name}"),
            field: field.clone(),
            file_name: file_name.clone(),
        });
        item[field.as_str()] = json!(format!("https://cdn.test/{file_name}"));
    }

    let mut collections = state.collections.lock().unwrap();
    let slug = item["slug"].as_str().unwrap_or_default().to_string();
    if slug_taken(collections.get(name).map(Vec::as_slice).unwrap_or_default(), &slug, None) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "apiStatus": false, "data": "SLUG_ALREADY_EXISTS", "Message": "duplicate key" })),
        )
            .into_response();
    }

    let id = state.next_id(name);
    item["_id"] = json!(id);
    match name {
        "categories" => item["albums"] = json!([]),
        "albums" => {
            item["audios"] = json!([]);
            if let Some(category) = item["category"].as_str().map(str::to_string) {
                for cat in collections.entry("categories").or_default() {
                    if cat["_id"] == category.as_str() {
                        push_id(cat, "albums", &id);
                    }
                }
            }
        }
        _ => {
            let albums = item
                .as_object_mut()
                .and_then(|obj| obj.remove("albums"))
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default();
            for album in collections.entry("albums").or_default() {
                if albums.iter().any(|a| a == &album["_id"]) {
                    push_id(album, "audios", &id);
                }
            }
        }
    }
    collections.entry(name).or_default().push(item);
    ok(json!({ "_id": id }))
}

fn push_id(item: &mut Value, field: &str, id: &str) {
    if let Some(list) = item[field].as_array_mut() {
        list.push(json!(id));
    } else {
        item[field] = json!([id]);
    }
}

async fn update(
    name: &'static str,
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let mut collections = state.collections.lock().unwrap();
    let items = collections.entry(name).or_default();

    if let Some(slug) = patch["slug"].as_str() {
        if slug_taken(items, slug, Some(&key)) {
            return fail(StatusCode::CONFLICT, "SLUG_ALREADY_EXISTS");
        }
    }
    let Some(item) = items.iter_mut().find(|item| item["_id"] == key.as_str()) else {
        return fail(StatusCode::NOT_FOUND, not_found_code(name));
    };
    if let (Some(target), Some(fields)) = (item.as_object_mut(), patch.as_object()) {
        for (field, value) in fields {
            target.insert(field.clone(), value.clone());
        }
    }
    ok(item.clone())
}

async fn remove(
    name: &'static str,
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let mut collections = state.collections.lock().unwrap();
    let items = collections.entry(name).or_default();
    let before = items.len();
    items.retain(|item| item["_id"] != key.as_str());
    if items.len() == before {
        return fail(StatusCode::NOT_FOUND, not_found_code(name));
    }

    let (parent, field) = match name {
        "audios" => ("albums", "audios"),
        "albums" => ("categories", "albums"),
        _ => return ok(Value::Null),
    };
    for owner in collections.entry(parent).or_default() {
        if let Some(list) = owner[field].as_array_mut() {
            list.retain(|id| id != key.as_str());
        }
    }
    ok(Value::Null)
}

async fn update_image(
    name: &'static str,
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let form = read_multipart(multipart).await;
    let (Some(id), Some((field, file_name))) = (form.text.get("id"), form.files.first()) else {
        return fail(StatusCode::BAD_REQUEST, "FILE_REQUIRED");
    };
    state.uploads.lock().unwrap().push(Upload {
        route: format!("PATCH /{name}/image"),
        field: field.clone(),
        file_name: file_name.clone(),
    });

    let mut collections = state.collections.lock().unwrap();
    let Some(item) = collections
        .entry(name)
        .or_default()
        .iter_mut()
        .find(|item| item["_id"] == id.as_str())
    else {
        return fail(StatusCode::NOT_FOUND, not_found_code(name));
    };
    item["thumbnail"] = json!(format!("https://cdn.test/{file_name}"));
    ok(Value::Null)
}

async fn attach_audio(
    State(state): State<Shared>,
    Path((album_id, audio_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let mut collections = state.collections.lock().unwrap();
    let audio_exists = collections
        .get("audios")
        .is_some_and(|audios| audios.iter().any(|a| a["_id"] == audio_id.as_str()));
    if !audio_exists {
        return fail(StatusCode::NOT_FOUND, "AUDIO_NOT_FOUND");
    }
    let Some(album) = collections
        .entry("albums")
        .or_default()
        .iter_mut()
        .find(|album| album["_id"] == album_id.as_str())
    else {
        return fail(StatusCode::NOT_FOUND, "ALBUM_NOT_FOUND");
    };
    let already = album["audios"]
        .as_array()
        .is_some_and(|ids| ids.iter().any(|id| id == audio_id.as_str()));
    if already {
        return fail(StatusCode::CONFLICT, "AUDIO_ALREADY_IN_ALBUM");
    }
    push_id(album, "audios", &audio_id);
    ok(Value::Null)
}

async fn detach_audio(
    State(state): State<Shared>,
    Path((album_id, audio_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.write_hits.fetch_add(1, Ordering::SeqCst);
    let mut collections = state.collections.lock().unwrap();
    let Some(album) = collections
        .entry("albums")
        .or_default()
        .iter_mut()
        .find(|album| album["_id"] == album_id.as_str())
    else {
        return fail(StatusCode::NOT_FOUND, "ALBUM_NOT_FOUND");
    };
    let Some(ids) = album["audios"].as_array_mut() else {
        return fail(StatusCode::NOT_FOUND, "AUDIO_NOT_IN_ALBUM");
    };
    let before = ids.len();
    ids.retain(|id| id != audio_id.as_str());
    if ids.len() == before {
        return fail(StatusCode::NOT_FOUND, "AUDIO_NOT_IN_ALBUM");
    }
    ok(Value::Null)
}

async fn play(State(state): State<Shared>, Path(key): Path<String>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match state.find("audios", &key).and_then(|audio| audio["audio"].as_str().map(str::to_string)) {
        Some(url) => ok(json!({ "url": url })),
        None => fail(StatusCode::NOT_FOUND, "AUDIO_NOT_FOUND"),
    }
}
