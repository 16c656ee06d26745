use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use casetrack_api::config::ApiConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = ApiConfig {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            jwt_secret: JWT_SECRET.to_string(),
        };
        let app = casetrack_api::app::build_app(&config);
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, Some(token), None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(token), Some(body))
            .await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, Some(token), Some(body))
            .await
    }

    async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PATCH, path, Some(token), Some(body))
            .await
    }

    async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::DELETE, path, Some(token), None)
            .await
    }

    /// Register `uid` and hand back a token for it.
    async fn register(&self, uid: &str, name: &str) -> String {
        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "uid": uid,
                    "name": name,
                    "email": format!("{uid}@example.com"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        mint_jwt(uid, ChronoDuration::minutes(10))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(uid: &str, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": uid,
        "email": format!("{uid}@example.com"),
        "iat": (now - ChronoDuration::minutes(1)).timestamp(),
        "exp": (now + ttl).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_case(srv: &TestServer, token: &str, title: &str) -> String {
    let (status, body) = srv
        .post(
            "/cases",
            token,
            json!({ "title": title, "description": "Something is broken in production" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn missing_invalid_and_expired_tokens_are_401() {
    let srv = TestServer::spawn().await;
    srv.register("admin-1", "Admin").await;

    let (status, body) = srv
        .send(reqwest::Method::GET, "/auth/me", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No authentication token provided");

    let (status, body) = srv.get("/auth/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authentication token");

    let expired = mint_jwt("admin-1", ChronoDuration::seconds(-30));
    let (status, body) = srv.get("/auth/me", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication token has expired");

    let stranger = mint_jwt("nobody", ChronoDuration::minutes(5));
    let (status, body) = srv.get("/auth/me", &stranger).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found in database");
}

#[tokio::test]
async fn authentication_failure_masks_authorization_failure() {
    let srv = TestServer::spawn().await;
    srv.register("admin-1", "Admin").await;

    // Admin-only route, no token: 401, never 403.
    let (status, _) = srv
        .send(
            reqwest::Method::DELETE,
            &format!("/cases/{}", uuid_like()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn uuid_like() -> &'static str {
    "01890a5d-ac96-774b-bcce-b302099a8057"
}

#[tokio::test]
async fn unknown_route_gets_the_envelope() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found: GET /api/nope");
}

#[tokio::test]
async fn first_user_is_admin_and_duplicates_are_rejected() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let bob = srv.register("bob", "Bob").await;

    let (_, me) = srv.get("/auth/me", &admin).await;
    assert_eq!(me["data"]["role"], "admin");

    let (_, me) = srv.get("/auth/me", &bob).await;
    assert_eq!(me["data"]["role"], "user");
    assert_eq!(me["data"]["permissions"]["view_cases"], false);

    let (status, body) = srv
        .send(
            reqwest::Method::POST,
            "/auth/register",
            None,
            Some(json!({ "uid": "bob", "name": "Bob", "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already registered");
}

#[tokio::test]
async fn permission_updates_are_validated() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    srv.register("bob", "Bob").await;

    let (status, body) = srv
        .patch(
            "/auth/users/bob/permissions",
            &admin,
            json!({ "permissions": { "fly": true, "view_cases": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid permission keys: fly");

    let (status, body) = srv
        .patch(
            "/auth/users/bob/permissions",
            &admin,
            json!({ "permissions": { "view_cases": "yes" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Permission values must be boolean. Invalid: view_cases");

    let (status, _) = srv
        .patch("/auth/users/bob/permissions", &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv
        .patch(
            "/auth/users/ghost/permissions",
            &admin,
            json!({ "permissions": { "view_cases": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.get("/auth/users/admin-1/permissions", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_cannot_demote_themselves() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;

    let (status, body) = srv
        .patch("/auth/users/admin-1/role", &admin, json!({ "role": "user" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot demote yourself");

    let (status, _) = srv
        .patch("/auth/users/admin-1/role", &admin, json!({ "role": "root" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn end_to_end_case_lifecycle() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let bob = srv.register("bob", "Bob").await;

    let (status, body) = srv
        .patch(
            "/auth/users/bob/permissions",
            &admin,
            json!({ "permissions": { "view_cases": true, "comment_on_cases": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["permissions"]["view_cases"], true);
    assert_eq!(body["data"]["permissions"]["create_case"], false);

    let case_id = create_case(&srv, &admin, "Server down").await;
    let (_, case) = srv.get(&format!("/cases/{case_id}"), &bob).await;
    assert_eq!(case["data"]["status"], "Open");

    // Bob is not an admin.
    let (status, body) = srv
        .patch(
            &format!("/cases/{case_id}/status"),
            &bob,
            json!({ "status": "In Progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = srv
        .post(
            &format!("/cases/{case_id}/comments"),
            &bob,
            json!({ "message": "looking into it" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, activities) = srv
        .get(&format!("/cases/{case_id}/activities"), &bob)
        .await;
    let messages: Vec<&str> = activities["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, ["Bob added a comment", "Admin created this case"]);

    let (status, body) = srv
        .patch(
            &format!("/cases/{case_id}/status"),
            &admin,
            json!({ "status": "In Progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Case status updated to In Progress");

    let (status, body) = srv
        .patch(
            &format!("/cases/{case_id}/status"),
            &admin,
            json!({ "status": "Open" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid status transition: In Progress → Open. Allowed: Closed"
    );

    let (status, body) = srv.delete(&format!("/cases/{case_id}"), &admin).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deletedComments"], 1);
    assert_eq!(body["data"]["deletedActivities"], 3);

    let (status, _) = srv.get(&format!("/cases/{case_id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv
        .get(&format!("/cases/{case_id}/comments"), &admin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owners_edit_only_title_and_description() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let carol = srv.register("carol", "Carol").await;
    srv.patch(
        "/auth/users/carol/permissions",
        &admin,
        json!({ "permissions": { "create_case": true, "edit_own_cases": true, "view_cases": true } }),
    )
    .await;

    let own = create_case(&srv, &carol, "Printer jammed").await;
    let theirs = create_case(&srv, &admin, "Network flaky").await;

    let (status, body) = srv
        .put(
            &format!("/cases/{own}"),
            &carol,
            json!({ "title": "Printer on fire" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["title"], "Printer on fire");

    let (status, body) = srv
        .put(
            &format!("/cases/{own}"),
            &carol,
            json!({ "title": "Printer fixed", "status": "Open" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You can only edit the title and description of your own cases"
    );

    let (status, body) = srv
        .put(
            &format!("/cases/{theirs}"),
            &carol,
            json!({ "title": "Mine now" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only edit cases you created");
}

#[tokio::test]
async fn take_task_then_conflict() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let dave = srv.register("dave", "Dave").await;
    srv.patch(
        "/auth/users/dave/permissions",
        &admin,
        json!({ "permissions": { "assign_to_self": true } }),
    )
    .await;
    let id = create_case(&srv, &admin, "Disk full").await;

    let (status, body) = srv
        .patch(&format!("/cases/{id}/take"), &dave, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["assignedTo"], "dave");
    assert_eq!(body["data"]["assignedToName"], "Dave");

    let (status, body) = srv
        .patch(&format!("/cases/{id}/take"), &dave, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "This case is already assigned to someone. You can only take unassigned cases."
    );
}

#[tokio::test]
async fn missing_permission_lists_what_was_required() {
    let srv = TestServer::spawn().await;
    srv.register("admin-1", "Admin").await;
    let erin = srv.register("erin", "Erin").await;

    let (status, body) = srv
        .post(
            "/cases",
            &erin,
            json!({ "title": "Nope", "description": "Erin cannot create cases" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["requiredPermissions"], json!(["create_case"]));
}

#[tokio::test]
async fn watch_conflicts_unwatch_does_not() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let id = create_case(&srv, &admin, "Flaky tests").await;

    let (status, body) = srv
        .patch(&format!("/cases/{id}/watch"), &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["watching"], true);

    let (status, _) = srv
        .patch(&format!("/cases/{id}/watch"), &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let (status, body) = srv
            .patch(&format!("/cases/{id}/unwatch"), &admin, json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["watching"], false);
    }
}

#[tokio::test]
async fn listing_pages_newest_first() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let first = create_case(&srv, &admin, "Case one").await;
    let second = create_case(&srv, &admin, "Case two").await;
    let third = create_case(&srv, &admin, "Case three").await;

    let (status, page) = srv.get("/cases?limit=2", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["hasMore"], true);
    assert_eq!(page["data"][0]["id"], third.as_str());
    assert_eq!(page["data"][1]["id"], second.as_str());

    let cursor = page["nextCursor"].as_str().unwrap();
    let (_, page) = srv
        .get(&format!("/cases?limit=2&cursor={cursor}"), &admin)
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["hasMore"], false);
    assert_eq!(page["data"][0]["id"], first.as_str());

    let (_, page) = srv.get("/cases?search=TWO&status=All", &admin).await;
    assert_eq!(page["count"], 1);

    let (status, _) = srv.get("/cases?priority=Urgent", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_400_envelope() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;

    let res = srv
        .client
        .post(srv.url("/cases"))
        .bearer_auth(&admin)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn comment_owner_rules() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let bob = srv.register("bob", "Bob").await;
    let carol = srv.register("carol", "Carol").await;
    for uid in ["bob", "carol"] {
        srv.patch(
            &format!("/auth/users/{uid}/permissions"),
            &admin,
            json!({ "permissions": { "comment_on_cases": true, "view_cases": true } }),
        )
        .await;
    }
    let id = create_case(&srv, &admin, "Login broken").await;

    let (_, body) = srv
        .post(&format!("/cases/{id}/comments"), &bob, json!({ "message": "on it" }))
        .await;
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/cases/{id}/comments/{comment_id}");

    let (status, body) = srv.patch(&path, &carol, json!({ "message": "mine" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only edit your own comments");

    let (status, body) = srv.patch(&path, &bob, json!({ "message": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Comment message is required");

    let (status, body) = srv.patch(&path, &bob, json!({ "message": "fixed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["editedAt"].is_string());

    let (status, _) = srv.delete(&path, &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = srv.get(&format!("/cases/{id}/comments"), &bob).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn non_admin_create_ignores_malformed_admin_fields() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let frank = srv.register("frank", "Frank").await;
    srv.patch(
        "/auth/users/frank/permissions",
        &admin,
        json!({ "permissions": { "create_case": true } }),
    )
    .await;

    let (status, body) = srv
        .post(
            "/cases",
            &frank,
            json!({
                "title": "Badge reader broken",
                "description": "The door badge reader rejects every card",
                "priority": "Urgent",
                "assignedTo": "admin-1",
                "dueDate": "next tuesday",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["priority"], "Medium");
    assert_eq!(body["data"]["assignedTo"], Value::Null);
    assert_eq!(body["data"]["dueDate"], Value::Null);
}

#[tokio::test]
async fn maximum_length_multibyte_case_is_accepted() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;

    let title = "\u{1F525}".repeat(200);
    let description = "\u{1F525}".repeat(5000);
    let (status, body) = srv
        .post(
            "/cases",
            &admin,
            json!({ "title": title, "description": description }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body["message"]);
    assert_eq!(body["data"]["description"], description.as_str());
}

#[tokio::test]
async fn non_admin_restricted_field_is_forbidden_whatever_its_value() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("admin-1", "Admin").await;
    let gina = srv.register("gina", "Gina").await;
    srv.patch(
        "/auth/users/gina/permissions",
        &admin,
        json!({ "permissions": { "create_case": true, "edit_own_cases": true } }),
    )
    .await;
    let own = create_case(&srv, &gina, "Coffee machine").await;

    let (status, body) = srv
        .put(&format!("/cases/{own}"), &gina, json!({ "status": "Done" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You can only edit the title and description of your own cases"
    );

    let (status, body) = srv
        .put(&format!("/cases/{}", uuid_like()), &admin, json!({ "title": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Case not found");
}
