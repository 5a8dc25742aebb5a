// Handler tests for the campground API
// Drives the full router over the in-memory stores

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::payments::PaymentHistory;
use crate::reservations::{CancellationResult, EditedReservation, Reservation, ReservationStatus};
use crate::sites::{Site, SiteType};
use crate::test_support::InMemoryStore;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_test_app() -> (TestServer, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let stores = Stores {
        sites: store.clone(),
        reservations: store.clone(),
        rate_plans: store.clone(),
        events: store.clone(),
        payments: store.clone(),
    };
    let app = create_router(AppState::new(stores, &PolicyConfig::default()));
    (TestServer::new(app).unwrap(), store)
}

fn booking_payload(site_id: i32, check_in: &str, check_out: &str) -> Value {
    json!({
        "site_id": site_id,
        "guest_name": "Dana Whitfield",
        "guest_email": "dana@example.com",
        "rig_length_ft": 30,
        "check_in": check_in,
        "check_out": check_out
    })
}

fn decimal_field(body: &Value, field: &str) -> Decimal {
    body[field].as_str().unwrap().parse().unwrap()
}

async fn book(server: &TestServer, site_id: i32, check_in: &str, check_out: &str) -> Reservation {
    let response = server
        .post("/api/reservations")
        .json(&booking_payload(site_id, check_in, check_out))
        .await;
    let status = response.status_code();
    if status != StatusCode::CREATED {
        eprintln!("Response body: {}", response.text());
        panic!("Expected 201 CREATED, got {}", status);
    }
    response.json()
}

// ============================================================================
// Availability (GET /api/sites/available)
// ============================================================================

#[tokio::test]
async fn test_available_sites_filters_rig_and_orders_tightest_fit() {
    let (server, store) = create_test_app();
    store.add_site(1, SiteType::BackIn, 45);
    store.add_site(2, SiteType::BackIn, 35);
    store.add_site(3, SiteType::PullThru, 60);
    store.add_site(4, SiteType::BackIn, 25);

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "2030-10-10")
        .add_query_param("check_out", "2030-10-12")
        .add_query_param("rig_length_ft", "30")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let sites: Vec<Site> = response.json();
    let numbers: Vec<i32> = sites.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![2, 1, 3]);
}

#[tokio::test]
async fn test_available_sites_by_type_and_number_order() {
    let (server, store) = create_test_app();
    store.add_site(7, SiteType::PullThru, 40);
    store.add_site(3, SiteType::PullThru, 70);
    store.add_site(5, SiteType::BackIn, 40);

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "2030-10-10")
        .add_query_param("check_out", "2030-10-12")
        .add_query_param("site_type", "PULL_THRU")
        .add_query_param("order", "number")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let numbers: Vec<i32> = response.json::<Vec<Site>>().iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![3, 7]);
}

#[tokio::test]
async fn test_available_sites_excludes_booked_site() {
    let (server, store) = create_test_app();
    let taken = store.add_site(1, SiteType::BackIn, 40);
    store.add_site(2, SiteType::BackIn, 40);
    store.add_confirmed(taken.id, "2030-10-09", "2030-10-11");

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "2030-10-10")
        .add_query_param("check_out", "2030-10-12")
        .await;

    let numbers: Vec<i32> = response.json::<Vec<Site>>().iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![2]);
}

#[tokio::test]
async fn test_available_sites_rejects_bad_input() {
    let (server, _store) = create_test_app();

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "2030-10-12")
        .add_query_param("check_out", "2030-10-12")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "INVALID_DATE_RANGE");

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "next tuesday")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "INVALID_DATE");

    let response = server
        .get("/api/sites/available")
        .add_query_param("order", "price")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "INVALID_ORDERING");
}

#[tokio::test]
async fn test_available_sites_storage_failure_is_503() {
    let (server, store) = create_test_app();
    store.add_site(1, SiteType::BackIn, 40);
    store.set_unavailable(true);

    let response = server
        .get("/api/sites/available")
        .add_query_param("check_in", "2030-10-10")
        .add_query_param("check_out", "2030-10-12")
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "STORAGE_UNAVAILABLE");
}

// ============================================================================
// Booking (POST /api/reservations)
// ============================================================================

#[tokio::test]
async fn test_create_reservation_success() {
    let (server, store) = create_test_app();
    let site = store.add_site(12, SiteType::BackIn, 40);

    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;

    assert_eq!(reservation.site_id, site.id);
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.nightly_rate, dec!(30.00));
    assert_eq!(reservation.amount_paid, dec!(90.00));
    assert!(reservation.confirmation_code.starts_with("RV-"));
    assert!(!reservation.paid);

    // Retrievable by id and by confirmation code, case-insensitively
    let response = server.get(&format!("/api/reservations/{}", reservation.id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Reservation>().id, reservation.id);

    let code = reservation.confirmation_code.to_lowercase();
    let response = server.get(&format!("/api/reservations/confirmation/{}", code)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Reservation>().id, reservation.id);
}

#[tokio::test]
async fn test_create_reservation_conflict_lists_alternatives() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    store.add_site(2, SiteType::BackIn, 40);
    store.add_site(3, SiteType::PullThru, 60);
    book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let response = server
        .post("/api/reservations")
        .json(&booking_payload(site.id, "2030-10-12", "2030-10-14"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "BOOKING_CONFLICT");
    let alternatives = body["details"]["alternatives"].as_array().unwrap();
    assert_eq!(alternatives.len(), 1);
    assert_eq!(alternatives[0]["number"], 2);
}

#[tokio::test]
async fn test_create_reservation_same_day_turnover() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let next = book(&server, site.id, "2030-10-13", "2030-10-15").await;
    assert_eq!(next.check_in, crate::test_support::date("2030-10-13"));
}

#[tokio::test]
async fn test_create_reservation_rule_violations() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 25);
    let big = store.add_site(2, SiteType::PullThru, 60);

    // Rig longer than the site
    let response = server
        .post("/api/reservations")
        .json(&booking_payload(site.id, "2030-10-10", "2030-10-12"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "RIG_TOO_LONG");

    // Fifteen nights touching July
    let response = server
        .post("/api/reservations")
        .json(&booking_payload(big.id, "2030-07-01", "2030-07-16"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "PEAK_STAY_LIMIT_EXCEEDED");

    // Unknown site
    let response = server
        .post("/api/reservations")
        .json(&booking_payload(999, "2030-10-10", "2030-10-12"))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // Blank name fails request validation
    let mut payload = booking_payload(big.id, "2030-10-10", "2030-10-12");
    payload["guest_name"] = json!("");
    let response = server.post("/api/reservations").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_reservation_pcs_exempt_long_peak_stay() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::PullThru, 60);

    let mut payload = booking_payload(site.id, "2030-07-01", "2030-07-21");
    payload["pcs_exempt"] = json!(true);
    let response = server.post("/api/reservations").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let reservation: Reservation = response.json();
    assert!(reservation.pcs_exempt);
    assert_eq!(reservation.amount_paid, dec!(600.00));
}

#[tokio::test]
async fn test_get_reservation_not_found() {
    let (server, _store) = create_test_app();

    let response = server
        .get(&format!("/api/reservations/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/reservations/confirmation/RV-NOPE0000").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Edit (PUT /api/reservations/:id)
// ============================================================================

#[tokio::test]
async fn test_edit_reservation_extends_stay_with_adjustment() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let response = server
        .put(&format!("/api/reservations/{}", reservation.id))
        .json(&json!({ "check_out": "2030-10-14" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let edited: EditedReservation = response.json();
    assert_eq!(edited.reservation.amount_paid, dec!(120.00));
    let adjustment = edited.adjustment.unwrap();
    assert_eq!(adjustment.amount, dec!(30.00));

    let history: PaymentHistory = server
        .get(&format!("/api/reservations/{}/payments", reservation.id))
        .await
        .json();
    assert_eq!(history.payments.len(), 1);
    assert_eq!(history.net_total, dec!(30.00));
}

#[tokio::test]
async fn test_edit_reservation_into_conflict() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let first = book(&server, site.id, "2030-10-10", "2030-10-13").await;
    book(&server, site.id, "2030-10-15", "2030-10-17").await;

    let response = server
        .put(&format!("/api/reservations/{}", first.id))
        .json(&json!({ "check_out": "2030-10-16" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "BOOKING_CONFLICT");
}

// ============================================================================
// Cancellation (POST /api/reservations/:id/cancel)
// ============================================================================

#[tokio::test]
async fn test_cancel_early_keeps_base_fee() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let response = server
        .post(&format!("/api/reservations/{}/cancel", reservation.id))
        .json(&json!({ "now": "2030-10-06T00:00:00Z" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result: CancellationResult = response.json();
    assert_eq!(result.fee, dec!(10.00));
    assert_eq!(result.refund, dec!(80.00));
    assert!(!result.already_cancelled);
}

#[tokio::test]
async fn test_cancel_late_adds_one_night_and_is_idempotent() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;
    let path = format!("/api/reservations/{}/cancel", reservation.id);

    let first: CancellationResult = server
        .post(&path)
        .json(&json!({ "now": "2030-10-09T00:00:00Z" }))
        .await
        .json();
    assert_eq!(first.fee, dec!(40.00));
    assert_eq!(first.refund, dec!(50.00));

    let again = server.post(&path).json(&json!({ "now": "2030-10-09T12:00:00Z" })).await;
    assert_eq!(again.status_code(), StatusCode::OK);
    let again: CancellationResult = again.json();
    assert!(again.already_cancelled);
    assert_eq!(again.fee, first.fee);
    assert_eq!(again.refund, first.refund);

    let history: PaymentHistory = server
        .get(&format!("/api/reservations/{}/payments", reservation.id))
        .await
        .json();
    assert_eq!(history.payments.len(), 1);
    assert_eq!(history.payments[0].amount, dec!(-50.00));

    // Cancelled stays free the dates again
    book(&server, site.id, "2030-10-10", "2030-10-13").await;
}

#[tokio::test]
async fn test_cancel_without_body_uses_current_time() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2099-10-10", "2099-10-12").await;

    let response = server
        .post(&format!("/api/reservations/{}/cancel", reservation.id))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result: CancellationResult = response.json();
    assert_eq!(result.fee, dec!(10.00));
    assert_eq!(result.refund, dec!(50.00));
}

#[tokio::test]
async fn test_cancel_completed_reservation_is_rejected() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let response = server
        .post(&format!("/api/reservations/{}/complete", reservation.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Reservation>().status, ReservationStatus::Completed);

    let response = server
        .post(&format!("/api/reservations/{}/cancel", reservation.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "INVALID_STATUS_TRANSITION");
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_record_payment_marks_reservation_paid() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let reservation = book(&server, site.id, "2030-10-10", "2030-10-13").await;

    let response = server
        .post(&format!("/api/reservations/{}/payments", reservation.id))
        .json(&json!({ "amount": "90.00", "method": "Credit Card" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["reservation"]["paid"], true);
    assert_eq!(body["reservation"]["status"], "CONFIRMED");
    assert_eq!(body["payment"]["kind"], "charge");

    let response = server
        .post(&format!("/api/reservations/{}/payments", reservation.id))
        .json(&json!({ "amount": "0", "method": "Cash" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Rates and special events
// ============================================================================

#[tokio::test]
async fn test_rate_lookup_follows_new_plan() {
    let (server, _store) = create_test_app();

    let response = server
        .get("/api/rates")
        .add_query_param("site_type", "BACK_IN")
        .add_query_param("date", "2030-07-04")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(decimal_field(&response.json(), "nightly_rate"), dec!(30.00));

    let response = server
        .post("/api/admin/rate-plans")
        .json(&json!({
            "site_type": "BACK_IN",
            "nightly_rate": "45.00",
            "start_date": "2030-06-01",
            "end_date": "2030-08-31"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .get("/api/rates")
        .add_query_param("site_type", "BACK_IN")
        .add_query_param("date", "2030-07-04")
        .await;
    assert_eq!(decimal_field(&response.json(), "nightly_rate"), dec!(45.00));
}

#[tokio::test]
async fn test_special_event_overlap_drives_late_fee() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);

    let response = server
        .post("/api/admin/special-events")
        .json(&json!({ "name": "Balloon Fiesta", "start_date": "2030-10-05", "end_date": "2030-10-12" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .get("/api/special-events/overlap")
        .add_query_param("check_in", "2030-10-11")
        .add_query_param("check_out", "2030-10-13")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["overlaps_special_event"], true);

    // Early cancellation still pays the extra night during an event
    let reservation = book(&server, site.id, "2030-10-11", "2030-10-13").await;
    let result: CancellationResult = server
        .post(&format!("/api/reservations/{}/cancel", reservation.id))
        .json(&json!({ "now": "2030-09-01T00:00:00Z" }))
        .await
        .json();
    assert_eq!(result.fee, dec!(40.00));
    assert_eq!(result.refund, dec!(20.00));
}

// ============================================================================
// Administration
// ============================================================================

#[tokio::test]
async fn test_site_admin_lifecycle() {
    let (server, _store) = create_test_app();
    let payload = json!({ "number": 12, "site_type": "PULL_THRU", "max_length_ft": 55 });

    let response = server.post("/api/admin/sites").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let site: Site = response.json();

    let response = server.post("/api/admin/sites").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "DUPLICATE_SITE_NUMBER");

    let response = server
        .put(&format!("/api/admin/sites/{}", site.id))
        .json(&json!({ "max_length_ft": 65 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Site>().max_length_ft, 65);

    let response = server.delete(&format!("/api/admin/sites/{}", site.id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!response.json::<Site>().active);

    // The number is free again once the old site is retired
    let response = server.post("/api/admin/sites").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .post("/api/admin/sites")
        .json(&json!({ "number": 0, "site_type": "TENT", "max_length_ft": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports() {
    let (server, store) = create_test_app();
    let busy = store.add_site(1, SiteType::BackIn, 40);
    let quiet = store.add_site(2, SiteType::BackIn, 40);
    store.add_confirmed(busy.id, "2030-10-10", "2030-10-13");
    store.add_confirmed(quiet.id, "2030-10-20", "2030-10-22");

    let response = server
        .get("/api/admin/reports/occupancy")
        .add_query_param("date", "2030-10-11")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["occupied"], 1);

    let response = server
        .get("/api/admin/reports/walk-ins")
        .add_query_param("date", "2030-10-11")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["next_check_in"].is_null());
    assert_eq!(rows[1]["site"]["number"], 2);
    assert_eq!(rows[1]["days_until_next_check_in"], 9);
}

#[tokio::test]
async fn test_unpaid_report_lists_confirmed_walk_ins_awaiting_payment() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let walk_in = store.add_confirmed(site.id, "2030-10-10", "2030-10-13");
    let settled = store.add_confirmed(site.id, "2030-10-20", "2030-10-22");
    store.set_paid(settled.id);

    let response = server.get("/api/admin/reports/unpaid").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["reservation"]["id"], walk_in.id.to_string());
    assert_eq!(rows[0]["nights"], 3);
    assert_eq!(decimal_field(&rows[0], "expected_amount"), dec!(90.00));
}

// ============================================================================
// Listings (GET /api/reservations, GET /api/guests/:guest_id/reservations)
// ============================================================================

#[tokio::test]
async fn test_front_desk_listing_filters_by_status_and_site() {
    let (server, store) = create_test_app();
    let site1 = store.add_site(1, SiteType::BackIn, 40);
    let site2 = store.add_site(2, SiteType::BackIn, 40);
    let later = book(&server, site1.id, "2030-10-20", "2030-10-22").await;
    let first = book(&server, site2.id, "2030-10-10", "2030-10-12").await;
    let cancelled = book(&server, site1.id, "2030-10-05", "2030-10-07").await;
    store.set_status(cancelled.id, ReservationStatus::Cancelled);

    let response = server.get("/api/reservations").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let ids: Vec<_> = response.json::<Vec<Reservation>>().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![cancelled.id, first.id, later.id]);

    let response = server
        .get("/api/reservations")
        .add_query_param("status", "CONFIRMED")
        .add_query_param("site_id", site1.id.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let ids: Vec<_> = response.json::<Vec<Reservation>>().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![later.id]);

    let response = server
        .get("/api/reservations")
        .add_query_param("status", "PENDING")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guest_reservations_newest_check_in_first() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    let october = book(&server, site.id, "2030-10-10", "2030-10-12").await;
    let december = book(&server, site.id, "2030-12-01", "2030-12-03").await;
    let someone_else = book(&server, site.id, "2030-11-01", "2030-11-03").await;
    store.set_guest(october.id, 41);
    store.set_guest(december.id, 41);
    store.set_guest(someone_else.id, 42);

    let response = server.get("/api/guests/41/reservations").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let ids: Vec<_> = response.json::<Vec<Reservation>>().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![december.id, october.id]);

    let response = server.get("/api/guests/7/reservations").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.json::<Vec<Reservation>>().is_empty());
}

#[tokio::test]
async fn test_metrics_count_bookings_and_conflicts() {
    let (server, store) = create_test_app();
    let site = store.add_site(1, SiteType::BackIn, 40);
    book(&server, site.id, "2030-10-10", "2030-10-13").await;
    server
        .post("/api/reservations")
        .json(&booking_payload(site.id, "2030-10-11", "2030-10-12"))
        .await;

    let response = server.get("/api/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["reservations_created"], 1);
    assert_eq!(body["booking_conflicts"], 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (server, _store) = create_test_app();

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["paths"]["/api/reservations"]["get"].is_object());
    assert!(body["paths"]["/api/reservations"]["post"].is_object());
    assert!(body["paths"]["/api/admin/reports/unpaid"].is_object());
}
