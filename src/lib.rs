pub mod cache;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod metrics;
pub mod payments;
pub mod rates;
pub mod reports;
pub mod reservations;
pub mod sites;
pub mod validation;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cache::PolicyCache;
use config::PolicyConfig;
use db::DbPool;
use events::{PgSpecialEventStore, SpecialEventRegistry, SpecialEventStore};
use metrics::{BookingMetrics, MetricsSnapshot};
use payments::{PaymentLedger, PaymentService, PgPaymentLedger};
use rates::{PgRatePlanStore, RatePlanStore, RatePolicy};
use reports::ReportService;
use reservations::{BookingEngine, CancellationEngine, CancellationPolicy, PgReservationStore, ReservationStore};
use sites::{PgSiteStore, SiteService, SiteStore};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        reservations::handlers::available_sites_handler,
        reservations::handlers::create_reservation_handler,
        reservations::handlers::list_reservations_handler,
        reservations::handlers::guest_reservations_handler,
        reservations::handlers::get_reservation_handler,
        reservations::handlers::get_reservation_by_code_handler,
        reservations::handlers::edit_reservation_handler,
        reservations::handlers::cancel_reservation_handler,
        reservations::handlers::complete_reservation_handler,
        payments::handlers::record_payment_handler,
        payments::handlers::payment_history_handler,
        rates::handlers::get_rate_handler,
        rates::handlers::list_rate_plans_handler,
        rates::handlers::create_rate_plan_handler,
        rates::handlers::deactivate_rate_plan_handler,
        events::handlers::special_event_overlap_handler,
        events::handlers::list_special_events_handler,
        events::handlers::create_special_event_handler,
        events::handlers::delete_special_event_handler,
        sites::handlers::list_sites_handler,
        sites::handlers::create_site_handler,
        sites::handlers::update_site_handler,
        sites::handlers::deactivate_site_handler,
        reports::handlers::walk_in_report_handler,
        reports::handlers::occupancy_report_handler,
        reports::handlers::unpaid_report_handler,
        metrics_handler,
    ),
    components(
        schemas(
            sites::Site,
            sites::SiteType,
            sites::CreateSiteRequest,
            sites::UpdateSiteRequest,
            rates::RatePlan,
            rates::CreateRatePlanRequest,
            rates::RateQuote,
            events::SpecialEvent,
            events::CreateSpecialEventRequest,
            events::OverlapResponse,
            reservations::Reservation,
            reservations::ReservationStatus,
            reservations::CreateReservationRequest,
            reservations::EditReservationRequest,
            reservations::EditedReservation,
            reservations::CancelReservationRequest,
            reservations::CancellationResult,
            reservations::ConflictReport,
            payments::Payment,
            payments::PaymentKind,
            payments::PaymentReceipt,
            payments::PaymentHistory,
            payments::RecordPaymentRequest,
            reports::WalkInAvailability,
            reports::SiteOccupancy,
            reports::OccupancyReport,
            reports::UnpaidReservation,
            MetricsSnapshot,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "reservations", description = "Availability search and reservation lifecycle"),
        (name = "payments", description = "Payment capture and ledger history"),
        (name = "rates", description = "Nightly rate lookup"),
        (name = "special-events", description = "Special event lookup"),
        (name = "admin", description = "Sites, rate plans, special events and reports"),
        (name = "metrics", description = "Booking counters")
    ),
    info(
        title = "Campground Reservation API",
        version = "1.0.0",
        description = "Site availability, booking, pricing and cancellation for an RV park"
    )
)]
pub struct ApiDoc;

/// Persistence backends used by the engines
#[derive(Clone)]
pub struct Stores {
    pub sites: Arc<dyn SiteStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub rate_plans: Arc<dyn RatePlanStore>,
    pub events: Arc<dyn SpecialEventStore>,
    pub payments: Arc<dyn PaymentLedger>,
}

impl Stores {
    /// Postgres stores sharing one pool; every call is bounded by `timeout`
    pub fn postgres(pool: DbPool, timeout: Duration) -> Self {
        Self {
            sites: Arc::new(PgSiteStore::new(pool.clone(), timeout)),
            reservations: Arc::new(PgReservationStore::new(pool.clone(), timeout)),
            rate_plans: Arc::new(PgRatePlanStore::new(pool.clone(), timeout)),
            events: Arc::new(PgSpecialEventStore::new(pool.clone(), timeout)),
            payments: Arc::new(PgPaymentLedger::new(pool, timeout)),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sites: SiteService,
    pub rates: Arc<RatePolicy>,
    pub events: Arc<SpecialEventRegistry>,
    pub booking: BookingEngine,
    pub cancellation: CancellationEngine,
    pub payments: PaymentService,
    pub reports: ReportService,
    pub metrics: BookingMetrics,
}

impl AppState {
    /// Wire the engines over the given stores
    pub fn new(stores: Stores, policy: &PolicyConfig) -> Self {
        let metrics = BookingMetrics::new();

        let rates = Arc::new(RatePolicy::new(
            Arc::clone(&stores.rate_plans),
            PolicyCache::with_metrics("rate_plans", policy.cache_ttl, metrics.clone()),
            policy.default_nightly_rate,
        ));
        let events = Arc::new(SpecialEventRegistry::new(
            Arc::clone(&stores.events),
            PolicyCache::with_metrics("special_events", policy.cache_ttl, metrics.clone()),
        ));
        let booking = BookingEngine::new(
            Arc::clone(&stores.sites),
            Arc::clone(&stores.reservations),
            Arc::clone(&rates),
            policy.peak_season,
            metrics.clone(),
        );
        let cancellation = CancellationEngine::new(
            Arc::clone(&stores.reservations),
            Arc::clone(&events),
            CancellationPolicy {
                base_fee: policy.cancellation_base_fee,
                late_window_hours: policy.late_cancellation_hours,
            },
            metrics.clone(),
        );

        Self {
            sites: SiteService::new(Arc::clone(&stores.sites)),
            payments: PaymentService::new(
                Arc::clone(&stores.reservations),
                Arc::clone(&stores.payments),
                metrics.clone(),
            ),
            reports: ReportService::new(stores.sites, stores.reservations),
            rates,
            events,
            booking,
            cancellation,
            metrics,
        }
    }
}

/// Handler for GET /api/metrics
#[utoipa::path(
    get,
    path = "/api/metrics",
    responses((status = 200, description = "Current booking counters", body = MetricsSnapshot)),
    tag = "metrics"
)]
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Guest-facing
        .route("/api/sites/available", get(reservations::available_sites_handler))
        .route(
            "/api/reservations",
            get(reservations::list_reservations_handler).post(reservations::create_reservation_handler),
        )
        .route(
            "/api/reservations/:id",
            get(reservations::get_reservation_handler).put(reservations::edit_reservation_handler),
        )
        .route(
            "/api/reservations/confirmation/:code",
            get(reservations::get_reservation_by_code_handler),
        )
        .route("/api/reservations/:id/cancel", post(reservations::cancel_reservation_handler))
        .route("/api/reservations/:id/complete", post(reservations::complete_reservation_handler))
        .route(
            "/api/reservations/:id/payments",
            post(payments::record_payment_handler).get(payments::payment_history_handler),
        )
        .route("/api/guests/:guest_id/reservations", get(reservations::guest_reservations_handler))
        .route("/api/rates", get(rates::get_rate_handler))
        .route("/api/special-events/overlap", get(events::special_event_overlap_handler))
        // Administration
        .route(
            "/api/admin/sites",
            get(sites::list_sites_handler).post(sites::create_site_handler),
        )
        .route("/api/admin/sites/:id", put(sites::update_site_handler))
        .route("/api/admin/sites/:id", delete(sites::deactivate_site_handler))
        .route(
            "/api/admin/rate-plans",
            get(rates::list_rate_plans_handler).post(rates::create_rate_plan_handler),
        )
        .route("/api/admin/rate-plans/:id", delete(rates::deactivate_rate_plan_handler))
        .route(
            "/api/admin/special-events",
            get(events::list_special_events_handler).post(events::create_special_event_handler),
        )
        .route("/api/admin/special-events/:id", delete(events::delete_special_event_handler))
        .route("/api/admin/reports/walk-ins", get(reports::walk_in_report_handler))
        .route("/api/admin/reports/occupancy", get(reports::occupancy_report_handler))
        .route("/api/admin/reports/unpaid", get(reports::unpaid_report_handler))
        .route("/api/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
