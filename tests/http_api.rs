mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use hotel_reservations::app;
use hotel_reservations::models::ActivityCategory;
use hotel_reservations::store::MemoryStore;

fn router() -> (Router, i64, i64) {
    let store = Arc::new(MemoryStore::new());
    let deluxe = store.add_room_type("Deluxe", Decimal::new(15000, 2), 2, &["WiFi"]);
    let room = store.add_room("101", deluxe.id, 1).unwrap();
    let yoga = add_activity(&store, "Sunrise Yoga", ActivityCategory::Sport, 2500);
    let slot = add_slot(&store, yoga.id, 1, 7, 5);
    (app(state(store, Arc::new(FailingNotifier))), room.id, slot.id)
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn booking_body(check_in: &str, check_out: &str) -> Value {
    json!({
        "guest_name": "Lucia Gomez",
        "guest_email": "lucia@example.com",
        "check_in": check_in,
        "check_out": check_out,
        "guests_count": 2
    })
}

#[tokio::test]
async fn health_reports_store_and_cache() {
    let (router, _, _) = router();
    let (status, body) = call(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], true);
    assert_eq!(body["cache_enabled"], false);
}

#[tokio::test]
async fn room_search_and_booking_round_trip() {
    let (router, room_id, _) = router();

    let (status, rooms) = call(
        &router,
        Method::GET,
        "/api/rooms/available?check_in=2024-06-01&check_out=2024-06-04&guests=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["number"], "101");
    assert_eq!(rooms[0]["room_type"]["name"], "Deluxe");

    let uri = format!("/api/rooms/{room_id}/reservations");
    let (status, created) =
        call(&router, Method::POST, &uri, Some(booking_body("2024-06-01", "2024-06-04"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["total_price"], "450.00");
    assert_eq!(created["status"], "pending");
    assert_eq!(created["booking"]["mode"], "room");

    let (status, fetched) = call(&router, Method::GET, &format!("/api/reservations/{}", created["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, clash) =
        call(&router, Method::POST, &uri, Some(booking_body("2024-06-03", "2024-06-05"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(clash["error"], "capacity_exhausted");
}

#[tokio::test]
async fn invalid_dates_are_a_bad_request() {
    let (router, room_id, _) = router();

    let (status, body) = call(
        &router,
        Method::GET,
        "/api/rooms/available?check_in=2024-06-04&check_out=2024-06-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let uri = format!("/api/rooms/{room_id}/reservations");
    let (status, _) = call(&router, Method::POST, &uri, Some(booking_body("2024-05-01", "2024-05-03"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_input_gets_a_json_validation_error() {
    let (router, room_id, _) = router();

    let uri = format!("/api/rooms/{room_id}/reservations");
    let (status, body) = call(&router, Method::POST, &uri, Some(booking_body("2024-13-01", "2024-06-04"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("check_in"));

    let (status, body) = call(&router, Method::GET, "/api/rooms/available?check_in=junk&check_out=2024-06-04", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call(&router, Method::GET, "/api/reservations/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn overlong_stay_is_a_bad_request() {
    let (router, room_id, _) = router();
    let uri = format!("/api/rooms/{room_id}/reservations");
    let (status, body) = call(&router, Method::POST, &uri, Some(booking_body("2024-06-01", "3940-01-01"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn empty_listing_filters_return_everything() {
    let (router, _, _) = router();
    let (status, activities) = call(&router, Method::GET, "/api/activities?category=&search=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activities.as_array().unwrap().len(), 1);
    assert_eq!(activities[0]["name"], "Sunrise Yoga");
}

#[tokio::test]
async fn activity_detail_lists_open_slots_and_accepts_bookings() {
    let (router, _, slot_id) = router();

    let (status, activities) = call(&router, Method::GET, "/api/activities?category=sport&search=yoga", None).await;
    assert_eq!(status, StatusCode::OK);
    let id = activities[0]["id"].as_i64().unwrap();

    let (status, detail) = call(&router, Method::GET, &format!("/api/activities/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Sunrise Yoga");
    assert_eq!(detail["schedules"][0]["available_spots"], 5);

    let (status, created) = call(
        &router,
        Method::POST,
        &format!("/api/schedules/{slot_id}/reservations"),
        Some(json!({ "guest_name": "Omar", "guest_email": "omar@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["total_price"], "25.00");

    let (_, detail) = call(&router, Method::GET, &format!("/api/activities/{id}"), None).await;
    assert_eq!(detail["schedules"][0]["available_spots"], 4);
}

#[tokio::test]
async fn status_changes_follow_the_lifecycle() {
    let (router, room_id, _) = router();
    let (_, created) = call(
        &router,
        Method::POST,
        &format!("/api/rooms/{room_id}/reservations"),
        Some(booking_body("2024-07-01", "2024-07-03")),
    )
    .await;
    let uri = format!("/api/reservations/{}/status", created["id"]);

    let (status, _) = call(&router, Method::PATCH, &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmed) = call(&router, Method::PATCH, &uri, Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (router, _, _) = router();
    let (status, body) = call(&router, Method::GET, "/api/reservations/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = call(&router, Method::GET, "/api/activities/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_carry_display_labels() {
    let (router, _, _) = router();
    let (status, body) = call(&router, Method::GET, "/api/activity-categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
    assert_eq!(body[0], json!({ "value": "spa", "label": "Spa & Wellness" }));
}
