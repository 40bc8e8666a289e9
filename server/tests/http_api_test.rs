//! JSON API over the in-memory store.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::Harness;
use ticketing_server::routes::api_routes;
use ticketing_server::state::AppState;

fn app(harness: &Harness) -> Router {
    api_routes(AppState::new(harness.engine.clone()))
}

struct Call {
    method: Method,
    uri: String,
    user: Option<Uuid>,
    admin: bool,
    body: Option<Value>,
}

impl Call {
    fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            user: None,
            admin: false,
            body: None,
        }
    }

    fn as_user(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self
    }

    fn as_admin(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self.admin = true;
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut request = Request::builder().method(self.method).uri(self.uri);
        if let Some(user) = self.user {
            request = request.header("x-user-id", user.to_string());
        }
        if self.admin {
            request = request.header("x-user-role", "admin");
        }
        let request = match self.body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = Harness::new();
    let (status, body) = Call::new(Method::GET, "/health").send(&app(&harness)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let harness = Harness::new();
    let (status, body) = Call::new(Method::GET, "/api/v1/registrations")
        .send(&app(&harness))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn register_verify_and_cancel_round_trip() {
    let harness = Harness::new();
    let app = app(&harness);
    let (event, tiers) = harness.published_event(&[("General", 1)]);
    let ada = harness.store.add_user("Ada", "ada@example.com");
    let bob = harness.store.add_user("Bob", "bob@example.com");

    let (status, body) = Call::new(Method::POST, "/api/v1/registrations")
        .as_user(ada.id)
        .json(json!({ "event_id": event.id, "ticket_tier_id": tiers[0].id }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let registration_id = body["data"]["registration"]["id"].as_str().unwrap().to_string();
    let code = body["data"]["ticket"]["ticket_code"].as_str().unwrap().to_string();

    let (status, body) = Call::new(Method::POST, "/api/v1/registrations")
        .as_user(bob.id)
        .json(json!({ "event_id": event.id, "ticket_tier_id": tiers[0].id }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CAPACITY_EXHAUSTED");

    let (status, body) = Call::new(Method::GET, format!("/api/v1/tickets/{code}"))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["holder_id"], ada.id.to_string());

    let (status, body) = Call::new(
        Method::GET,
        format!("/api/v1/events/{}/availability", event.id),
    )
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remaining_capacity"], 0);

    let (status, body) = Call::new(Method::GET, "/api/v1/registrations")
        .as_user(ada.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["ticket_code"], code.as_str());

    let uri = format!("/api/v1/registrations/{registration_id}");
    let (status, body) = Call::new(Method::DELETE, uri.as_str())
        .as_user(ada.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, body) = Call::new(Method::DELETE, uri.as_str())
        .as_user(ada.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn transfer_and_rsvp_endpoints() {
    let harness = Harness::new();
    let app = app(&harness);
    let (event, tiers) = harness.published_event(&[("General", 2)]);
    let ada = harness.store.add_user("Ada", "ada@example.com");
    let bob = harness.store.add_user("Bob", "bob@example.com");
    let issued = harness
        .engine
        .allocate(ada.id, event.id, tiers[0].id)
        .await
        .unwrap();
    let base = format!("/api/v1/registrations/{}", issued.registration.id);

    let (status, body) = Call::new(Method::PUT, format!("{base}/rsvp"))
        .as_user(ada.id)
        .json(json!({ "status": "rsvp_maybe" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rsvp_maybe");

    let (status, _) = Call::new(Method::PUT, format!("{base}/rsvp"))
        .as_user(ada.id)
        .json(json!({ "status": "maybe_later" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = Call::new(Method::PUT, format!("{base}/rsvp"))
        .as_user(ada.id)
        .json(json!({ "status": "confirmed" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = Call::new(Method::POST, format!("{base}/transfer"))
        .as_user(ada.id)
        .json(json!({ "recipient_email": "not-an-email" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = Call::new(Method::POST, format!("{base}/transfer"))
        .as_user(bob.id)
        .json(json!({ "recipient_email": "ada@example.com" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = Call::new(Method::POST, format!("{base}/transfer"))
        .as_user(ada.id)
        .json(json!({ "recipient_email": "bob@example.com" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["registration"]["user_id"], bob.id.to_string());
    assert_ne!(
        body["data"]["ticket"]["ticket_code"],
        issued.ticket.ticket_code.as_str()
    );

    let (status, _) = Call::new(
        Method::GET,
        format!("/api/v1/tickets/{}", issued.ticket.ticket_code),
    )
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let harness = Harness::new();
    let app = app(&harness);
    let (event, tiers) = harness.published_event(&[("General", 2)]);
    let ada = harness.store.add_user("Ada", "ada@example.com");
    let root = harness.store.add_user("Root", "root@example.com");
    harness
        .engine
        .allocate(ada.id, event.id, tiers[0].id)
        .await
        .unwrap();
    let attendees_uri = format!("/api/v1/admin/events/{}/attendees", event.id);

    let (status, _) = Call::new(Method::GET, attendees_uri.as_str())
        .as_user(ada.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::new(Method::GET, attendees_uri.as_str())
        .as_admin(root.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["email"], "ada@example.com");

    let (status, body) = Call::new(
        Method::POST,
        format!("/api/v1/admin/events/{}/cancel", event.id),
    )
    .as_admin(root.id)
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn malformed_ids_are_validation_errors() {
    let harness = Harness::new();
    let app = app(&harness);
    let ada = harness.store.add_user("Ada", "ada@example.com");

    let (status, body) = Call::new(Method::DELETE, "/api/v1/registrations/not-a-uuid")
        .as_user(ada.id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = Call::new(Method::GET, "/api/v1/registrations")
        .as_user(Uuid::nil())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let request = Request::builder()
        .uri("/api/v1/registrations")
        .header("x-user-id", "garbage")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_events_and_tiers() {
    let harness = Harness::new();
    let app = app(&harness);
    let root = harness.store.add_user("Root", "root@example.com");
    let ada = harness.store.add_user("Ada", "ada@example.com");
    let new_event = json!({
        "title": "Launch",
        "start_time": "2031-05-01T18:00:00Z",
        "status": "published",
        "tiers": [{ "name": "General", "price": "12.50", "capacity": 2 }]
    });

    let (status, _) = Call::new(Method::POST, "/api/v1/admin/events")
        .as_user(ada.id)
        .json(new_event.clone())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::new(Method::POST, "/api/v1/admin/events")
        .as_admin(root.id)
        .json(new_event)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["total_capacity"], 2);
    let event_id = body["data"]["id"].as_str().unwrap().to_string();
    let tier_id = body["data"]["tiers"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = Call::new(Method::POST, format!("/api/v1/admin/events/{event_id}/tiers"))
        .as_admin(root.id)
        .json(json!({ "name": "VIP", "capacity": 1 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["remaining_capacity"], 1);

    let (status, body) = Call::new(
        Method::PUT,
        format!("/api/v1/admin/events/{event_id}/tiers/{tier_id}"),
    )
    .as_admin(root.id)
    .json(json!({ "capacity": -3 }))
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = Call::new(
        Method::PUT,
        format!("/api/v1/admin/events/{event_id}/tiers/{tier_id}"),
    )
    .as_admin(root.id)
    .json(json!({ "capacity": 5 }))
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remaining_capacity"], 5);

    let (status, body) = Call::new(Method::PUT, format!("/api/v1/admin/events/{event_id}"))
        .as_admin(root.id)
        .json(json!({ "title": "Launch (moved)" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Launch (moved)");

    let (status, body) = Call::new(
        Method::GET,
        format!("/api/v1/events/{event_id}/availability"),
    )
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_capacity"], 6);
    assert_eq!(body["data"]["tiers"].as_array().unwrap().len(), 2);

    let (status, body) = Call::new(Method::PUT, format!("/api/v1/admin/events/{event_id}"))
        .as_admin(root.id)
        .json(json!({}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
