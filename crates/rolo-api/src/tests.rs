//! Router-level tests against an in-memory SQLite store.

use std::{
  net::{IpAddr, SocketAddr},
  sync::Arc,
  time::Duration,
};

use argon2::Params;
use axum::{
  Router,
  body::Body,
  extract::ConnectInfo,
  http::{Request, StatusCode, header},
};
use rolo_auth::{Argon2Scheme, SessionFlow, TokenConfig, TokenService};
use rolo_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, router};

async fn make_app() -> (Router, AppState<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let tokens = TokenService::new(&TokenConfig::new("access-secret", "refresh-secret")).unwrap();
  let sessions = SessionFlow::new(store.clone(), tokens)
    .with_passwords(Argon2Scheme::with_params(Params::new(8, 1, 1, None).unwrap()));
  let state = AppState::new(store, sessions, Duration::from_secs(5));
  (router(state.clone()), state)
}

async fn send(
  app:     &Router,
  method:  &str,
  uri:     &str,
  token:   Option<&str>,
  body:    Option<Value>,
) -> (StatusCode, Value) {
  send_with(app, method, uri, token, vec![], body).await
}

async fn send_with(
  app:     &Router,
  method:  &str,
  uri:     &str,
  token:   Option<&str>,
  headers: Vec<(&str, &str)>,
  body:    Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(t) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
  }
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = match body {
    Some(b) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Sign up and return `(identity id, access token, refresh token)`.
async fn signup(app: &Router, name: &str, email: &str) -> (String, String, String) {
  let (status, body) = send(
    app,
    "POST",
    "/auth/signup",
    None,
    Some(json!({ "name": name, "email": email, "password": "Abcd1234" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  (
    body["identity"]["id"].as_str().unwrap().to_owned(),
    body["accessToken"].as_str().unwrap().to_owned(),
    body["refreshToken"].as_str().unwrap().to_owned(),
  )
}

async fn login(app: &Router, email: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": email, "password": "Abcd1234" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["accessToken"].as_str().unwrap().to_owned()
}

// ─── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
  let (app, _) = make_app().await;
  let (status, body) = send(&app, "GET", "/health", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
}

// ─── Session ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_ignores_requested_role() {
  let (app, _) = make_app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/auth/signup",
    None,
    Some(json!({
      "name": "Jane",
      "email": "jane@x.com",
      "password": "Abcd1234",
      "role": "admin",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["identity"]["role"], "user");
  assert!(body["identity"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
  let (app, _) = make_app().await;
  signup(&app, "Jane", "jane@x.com").await;
  let (status, body) = send(
    &app,
    "POST",
    "/auth/signup",
    None,
    Some(json!({ "name": "Jane", "email": "JANE@x.com", "password": "Abcd1234" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn me_requires_a_valid_bearer() {
  let (app, _) = make_app().await;
  let (id, access, refresh) = signup(&app, "Jane", "jane@x.com").await;

  let (status, body) = send(&app, "GET", "/auth/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["kind"], "unauthorized");

  let (status, _) = send(&app, "GET", "/auth/me", Some(&refresh), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(&app, "GET", "/auth/me", Some(&access), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["identity"]["id"], id.as_str());
  assert_eq!(body["identity"]["email"], "jane@x.com");
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() {
  let (app, _) = make_app().await;
  let (_, access, refresh) = signup(&app, "Jane", "jane@x.com").await;

  let (status, body) = send(
    &app,
    "POST",
    "/auth/refresh",
    None,
    Some(json!({ "refreshToken": refresh })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let rotated = body["refreshToken"].as_str().unwrap().to_owned();
  assert!(body.get("identity").is_none());

  // The old token is spent.
  let (status, _) = send(
    &app,
    "POST",
    "/auth/refresh",
    None,
    Some(json!({ "refreshToken": refresh })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(&app, "POST", "/auth/logout", Some(&access), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({}));

  let (status, _) = send(
    &app,
    "POST",
    "/auth/refresh",
    None,
    Some(json!({ "refreshToken": rotated })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(&app, "POST", "/auth/refresh", None, Some(json!({}))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "refresh token required");
}

/// Post a login as if it arrived over a socket from `peer`.
async fn login_from(
  app:     &Router,
  peer:    &str,
  headers: Vec<(&str, &str)>,
  body:    Value,
) -> (StatusCode, Value) {
  let mut builder = Request::builder()
    .method("POST")
    .uri("/auth/login")
    .header(header::CONTENT_TYPE, "application/json")
    .extension(ConnectInfo(SocketAddr::new(peer.parse().unwrap(), 40_000)));
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = builder.body(Body::from(body.to_string())).unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn rotating_forwarded_headers_does_not_escape_the_throttle() {
  let (app, _) = make_app().await;
  signup(&app, "Jane", "jane@x.com").await;
  let wrong = json!({ "email": "jane@x.com", "password": "Wrong1234" });
  let right = json!({ "email": "jane@x.com", "password": "Abcd1234" });

  for hop in ["203.0.113.1", "203.0.113.2", "203.0.113.3"] {
    let headers = vec![("x-forwarded-for", hop), ("x-real-ip", hop)];
    let (status, body) = login_from(&app, "198.51.100.4", headers, wrong.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid email or password");
  }

  let headers = vec![("x-forwarded-for", "203.0.113.9")];
  let (status, body) = login_from(&app, "198.51.100.4", headers, right.clone()).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
  assert_eq!(body["kind"], "too_many_requests");

  // The email is locked for every client, not only the one that failed.
  let (status, _) = login_from(&app, "198.51.100.5", vec![], right).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn trusted_proxy_reports_the_client() {
  let (_, state) = make_app().await;
  let proxy: IpAddr = "127.0.0.1".parse().unwrap();
  let app = router(state.with_trusted_proxies([proxy]));
  signup(&app, "Jane", "jane@x.com").await;
  let right = json!({ "email": "jane@x.com", "password": "Abcd1234" });

  // Client A burns its attempts on addresses that do not exist.
  for email in ["a@x.com", "b@x.com", "c@x.com"] {
    let headers = vec![("x-forwarded-for", "203.0.113.10")];
    let body = json!({ "email": email, "password": "Abcd1234" });
    let (status, _) = login_from(&app, "127.0.0.1", headers, body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  let client_a = vec![("x-forwarded-for", "203.0.113.10")];
  let (status, _) = login_from(&app, "127.0.0.1", client_a, right.clone()).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

  // Client B behind the same proxy is unaffected.
  let client_b = vec![("x-forwarded-for", "203.0.113.11")];
  let (status, _) = login_from(&app, "127.0.0.1", client_b, right).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Contacts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_lifecycle_is_audited() {
  let (app, _) = make_app().await;
  let (_, token, _) = signup(&app, "Jane", "jane@x.com").await;

  let (status, contact) = send(
    &app,
    "POST",
    "/contacts",
    Some(&token),
    Some(json!({ "name": "Alice", "email": "alice@example.com", "company": "Acme" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(contact["status"], "Lead");
  assert_eq!(contact["owner"]["name"], "Jane");
  assert_eq!(contact["owner"]["email"], "jane@x.com");
  let uri = format!("/contacts/{}", contact["id"].as_str().unwrap());

  let (status, updated) = send(
    &app,
    "PUT",
    &uri,
    Some(&token),
    Some(json!({ "name": "Alicia", "email": "alice@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["name"], "Alicia");
  assert_eq!(updated["company"], "Acme");

  let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, log) = send(&app, "GET", "/activities", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(log["pagination"]["total"], 3);
  assert_eq!(log["pagination"]["limit"], 20);
  let items = log["items"].as_array().unwrap();
  assert_eq!(items[0]["action"], "DELETE");
  assert_eq!(items[0]["entityLabel"], "Alicia");
  assert_eq!(items[1]["action"], "UPDATE");
  assert_eq!(
    items[1]["changes"],
    json!({ "name": { "from": "Alice", "to": "Alicia" } })
  );
  assert_eq!(items[2]["action"], "CREATE");
  assert_eq!(items[2]["changes"], Value::Null);
  assert_eq!(items[2]["performer"]["name"], "Jane");
}

#[tokio::test]
async fn listing_searches_sorts_and_pages() {
  let (app, _) = make_app().await;
  let (_, token, _) = signup(&app, "Jane", "jane@x.com").await;
  for (name, email, status) in [
    ("Charlie", "charlie@example.com", "Lead"),
    ("Alice", "alice@acme.io", "Customer"),
    ("Bravo", "bravo@example.com", "Customer"),
  ] {
    let (s, _) = send(
      &app,
      "POST",
      "/contacts",
      Some(&token),
      Some(json!({ "name": name, "email": email, "status": status })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
  }

  let (_, page) = send(
    &app,
    "GET",
    "/contacts?sortBy=name&order=asc&limit=2",
    Some(&token),
    None,
  )
  .await;
  let names: Vec<_> = page["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["Alice", "Bravo"]);
  assert_eq!(page["pagination"]["totalPages"], 2);
  assert_eq!(page["pagination"]["hasNextPage"], true);

  let (_, page) = send(&app, "GET", "/contacts?search=acme", Some(&token), None).await;
  assert_eq!(page["pagination"]["total"], 1);

  let (_, page) = send(&app, "GET", "/contacts?status=Customer", Some(&token), None).await;
  assert_eq!(page["pagination"]["total"], 2);

  let (_, page) = send(&app, "GET", "/contacts?limit=500", Some(&token), None).await;
  assert_eq!(page["pagination"]["limit"], 100);

  let (status, body) =
    send(&app, "GET", "/contacts?sortBy=passwordHash", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn invalid_contacts_are_unprocessable() {
  let (app, _) = make_app().await;
  let (_, token, _) = signup(&app, "Jane", "jane@x.com").await;

  let (status, body) = send(
    &app,
    "POST",
    "/contacts",
    Some(&token),
    Some(json!({ "name": "A", "email": "alice@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "invalid");

  let (status, body) = send(&app, "GET", "/contacts/not-a-uuid", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "resource not found");

  let (status, _) = send(&app, "DELETE", "/contacts/123", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_contacts_are_not_found() {
  let (app, _) = make_app().await;
  let (_, jane, _) = signup(&app, "Jane", "jane@x.com").await;
  let (_, bob, _) = signup(&app, "Bob", "bob@x.com").await;

  let (_, contact) = send(
    &app,
    "POST",
    "/contacts",
    Some(&jane),
    Some(json!({ "name": "Alice", "email": "alice@example.com" })),
  )
  .await;
  let uri = format!("/contacts/{}", contact["id"].as_str().unwrap());

  for method in ["GET", "DELETE"] {
    let (status, _) = send(&app, method, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
  }
  let (status, _) = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "name": "Eve" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, page) = send(&app, "GET", "/contacts", Some(&bob), None).await;
  assert_eq!(page["pagination"]["total"], 0);
}

// ─── Administration ───────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_sees_everything_and_can_deactivate() {
  let (app, state) = make_app().await;
  let (jane_id, jane, _) = signup(&app, "Jane", "jane@x.com").await;
  signup(&app, "Root", "root@x.com").await;
  state.admin.promote("root@x.com").await.unwrap();
  let root = login(&app, "root@x.com").await;

  send(
    &app,
    "POST",
    "/contacts",
    Some(&jane),
    Some(json!({ "name": "Alice", "email": "alice@example.com" })),
  )
  .await;

  let (_, page) = send(&app, "GET", "/contacts", Some(&root), None).await;
  assert_eq!(page["pagination"]["total"], 1);
  let (_, log) = send(&app, "GET", "/activities", Some(&root), None).await;
  assert_eq!(log["pagination"]["total"], 1);

  // Users cannot reach admin routes.
  let (status, body) = send(
    &app,
    "POST",
    &format!("/admin/identities/{jane_id}/deactivate"),
    Some(&jane),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");

  let (status, body) = send(
    &app,
    "POST",
    &format!("/admin/identities/{jane_id}/deactivate"),
    Some(&root),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isActive"], false);

  // Jane's unexpired access token stops working immediately.
  let (status, _) = send(&app, "GET", "/contacts", Some(&jane), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(
    &app,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "jane@x.com", "password": "Abcd1234" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "account deactivated");
}

#[tokio::test]
async fn admin_sets_roles() {
  let (app, state) = make_app().await;
  let (jane_id, _, _) = signup(&app, "Jane", "jane@x.com").await;
  signup(&app, "Root", "root@x.com").await;
  state.admin.promote("root@x.com").await.unwrap();
  let root = login(&app, "root@x.com").await;

  let uri = format!("/admin/identities/{jane_id}/role");
  let (status, body) = send(&app, "PUT", &uri, Some(&root), Some(json!({ "role": "admin" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["role"], "admin");

  let missing = format!("/admin/identities/{}/role", uuid::Uuid::new_v4());
  let (status, _) =
    send(&app, "PUT", &missing, Some(&root), Some(json!({ "role": "user" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, "PUT", &uri, Some(&root), Some(json!({ "role": "owner" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
