use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::{parse_date, parse_time};
use crate::models::{
    AvailabilitySlot, BookingWithSlot, Offer, OfferType, PortfolioItem, Service, SiteSettings,
};
use crate::services::availability;
use crate::services::booking::{self, ReservationRequest};
use crate::services::offers;
use crate::state::AppState;

use super::public::{BookingResponse, CreateBookingRequest};

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// ── Slots ──

#[derive(Serialize)]
pub struct AdminSlotResponse {
    id: String,
    date: String,
    start_time: String,
    end_time: String,
    is_booked: bool,
}

impl From<AvailabilitySlot> for AdminSlotResponse {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            date: slot.date.format("%Y-%m-%d").to_string(),
            start_time: slot.start_time.format("%H:%M").to_string(),
            end_time: slot.end_time.format("%H:%M").to_string(),
            is_booked: slot.is_booked,
        }
    }
}

#[derive(Serialize)]
pub struct AdminSlotGroupResponse {
    date: String,
    slots: Vec<AdminSlotResponse>,
}

// GET /api/admin/slots
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdminSlotGroupResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let now = Utc::now().naive_utc();
    let slots = {
        let db = state.db.lock().unwrap();
        availability::upcoming_slots(&db, now)?
    };

    let groups = availability::group_by_date(slots)
        .into_iter()
        .map(|(date, slots)| AdminSlotGroupResponse {
            date: date.format("%Y-%m-%d").to_string(),
            slots: slots.into_iter().map(AdminSlotResponse::from).collect(),
        })
        .collect();

    Ok(Json(groups))
}

// POST /api/admin/slots
#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub date: String,
    pub start_time: String,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<AdminSlotResponse>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.date.trim().is_empty() || body.start_time.trim().is_empty() {
        return Err(AppError::Validation(
            "date and start_time are required".to_string(),
        ));
    }

    let date = parse_date(body.date.trim()).map_err(|e| AppError::Validation(e.to_string()))?;
    let start_time =
        parse_time(body.start_time.trim()).map_err(|e| AppError::Validation(e.to_string()))?;

    let slot = AvailabilitySlot::new(date, start_time);
    {
        let db = state.db.lock().unwrap();
        queries::insert_slot(&db, &slot)?;
    }

    Ok((StatusCode::CREATED, Json(AdminSlotResponse::from(slot))))
}

// DELETE /api/admin/slots/:id
pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    if queries::delete_free_slot(&db, &id)? {
        return Ok(Json(serde_json::json!({"ok": true})));
    }

    match queries::get_slot(&db, &id)? {
        Some(_) => Err(AppError::Conflict(
            "slot is booked and cannot be deleted".to_string(),
        )),
        None => Err(AppError::NotFound(format!("slot {id}"))),
    }
}

// ── Bookings ──

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct AdminBookingResponse {
    id: String,
    slot_id: String,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    notes: Option<String>,
    status: String,
    slot_date: String,
    slot_start: String,
    service_title: Option<String>,
    created_at: String,
}

impl From<BookingWithSlot> for AdminBookingResponse {
    fn from(b: BookingWithSlot) -> Self {
        Self {
            id: b.id,
            slot_id: b.slot_id,
            customer_name: b.customer_name,
            customer_phone: b.customer_phone,
            customer_email: b.customer_email,
            notes: b.notes,
            status: b.status,
            slot_date: b.slot_date.format("%Y-%m-%d").to_string(),
            slot_start: b.slot_start.format("%H:%M").to_string(),
            service_title: b.service_title,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/admin/bookings
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<AdminBookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(100);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, limit)?
    };

    Ok(Json(
        bookings
            .into_iter()
            .map(AdminBookingResponse::from)
            .collect(),
    ))
}

// POST /api/admin/bookings — manual entry, same reservation path as the
// public flow but without the notification dispatch.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let now = Utc::now().naive_utc();
    let booking = {
        let mut db = state.db.lock().unwrap();
        booking::reserve(
            &mut db,
            ReservationRequest {
                slot_id: body.slot_id,
                customer_name: body.customer_name,
                customer_phone: body.customer_phone,
                customer_email: body.customer_email,
                notes: body.notes,
                service_id: body.service_id,
            },
            now,
        )?
    };

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let mut db = state.db.lock().unwrap();
        booking::cancel(&mut db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Dashboard ──

#[derive(Serialize)]
pub struct DashboardResponse {
    today: Vec<AdminBookingResponse>,
    next: Option<AdminBookingResponse>,
    trend: Vec<TrendPoint>,
    counts: CountsResponse,
}

#[derive(Serialize)]
pub struct TrendPoint {
    date: String,
    count: i64,
}

#[derive(Serialize)]
pub struct CountsResponse {
    services: i64,
    portfolio: i64,
    offers: i64,
}

// GET /api/admin/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let now = Utc::now().naive_utc();
    let db = state.db.lock().unwrap();

    let today = availability::todays_bookings(&db, now)?;
    let next = availability::next_booking(&db, now)?;
    let trend = availability::trailing_trend(&db, 7, now)?;
    let counts = queries::get_entity_counts(&db)?;

    Ok(Json(DashboardResponse {
        today: today.into_iter().map(AdminBookingResponse::from).collect(),
        next: next.map(AdminBookingResponse::from),
        trend: trend
            .into_iter()
            .map(|b| TrendPoint {
                date: b.date.format("%Y-%m-%d").to_string(),
                count: b.count,
            })
            .collect(),
        counts: CountsResponse {
            services: counts.services,
            portfolio: counts.portfolio,
            offers: counts.offers,
        },
    }))
}

// GET /api/admin/traffic — proxy to the hosting provider's analytics API
// (trailing 30 days). Kept server-side so the token never reaches the
// browser; the dashboard charts whatever JSON comes back.
pub async fn get_traffic(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if state.config.vercel_token.is_empty() || state.config.vercel_project_id.is_empty() {
        return Err(AppError::Config(
            "analytics credentials not set".to_string(),
        ));
    }

    let to = Utc::now();
    let from = to - chrono::Duration::days(30);
    let endpoint = format!(
        "https://vercel.com/api/v1/analytics/stats?projectId={}&from={}&to={}&environment=production",
        state.config.vercel_project_id,
        from.to_rfc3339(),
        to.to_rfc3339(),
    );

    let response = reqwest::Client::new()
        .get(&endpoint)
        .bearer_auth(&state.config.vercel_token)
        .send()
        .await
        .context("failed to reach analytics API")?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        tracing::error!(%status, "analytics API error: {detail}");
        return Err(AppError::Internal(anyhow::anyhow!(
            "analytics API returned {status}"
        )));
    }

    let data = response
        .json::<serde_json::Value>()
        .await
        .context("failed to decode analytics response")?;
    Ok(Json(data))
}

// ── Services ──

#[derive(Deserialize)]
pub struct ServicePayload {
    pub title: String,
    pub description: Option<String>,
    pub price: String,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
}

fn validate_service(payload: &ServicePayload) -> Result<(), AppError> {
    if payload.title.trim().is_empty() || payload.price.trim().is_empty() {
        return Err(AppError::Validation(
            "title and price are required".to_string(),
        ));
    }
    Ok(())
}

// GET /api/admin/services
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServicePayload>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service(&body)?;

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        title: body.title.trim().to_string(),
        description: body.description,
        price: body.price.trim().to_string(),
        duration: body.duration,
        image_url: body.image_url,
        is_popular: body.is_popular,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_service(&db, &service)?;
    }

    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ServicePayload>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service(&body)?;

    let db = state.db.lock().unwrap();
    let existing = queries::get_service(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;

    let service = Service {
        id,
        title: body.title.trim().to_string(),
        description: body.description,
        price: body.price.trim().to_string(),
        duration: body.duration,
        image_url: body.image_url,
        is_popular: body.is_popular,
        created_at: existing.created_at,
    };
    queries::update_service(&db, &service)?;

    Ok(Json(service))
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_service(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("service {id}")))
    }
}

// ── Offers ──

#[derive(Deserialize)]
pub struct OfferPayload {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
}

// GET /api/admin/offers
pub async fn get_offers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Offer>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let offers = {
        let db = state.db.lock().unwrap();
        queries::list_offers(&db)?
    };
    Ok(Json(offers))
}

// POST /api/admin/offers — created inactive; activation is a separate step.
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<OfferPayload>,
) -> Result<(StatusCode, Json<Offer>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let offer = Offer {
        id: uuid::Uuid::new_v4().to_string(),
        title: body.title.trim().to_string(),
        description: body.description,
        offer_type: OfferType::parse(body.offer_type.as_deref().unwrap_or("popup")),
        is_active: false,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_offer(&db, &offer)?;
    }

    Ok((StatusCode::CREATED, Json(offer)))
}

// POST /api/admin/offers/:id/activate
#[derive(Deserialize)]
pub struct ActivateOfferRequest {
    pub active: bool,
}

pub async fn activate_offer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ActivateOfferRequest>,
) -> Result<Json<Offer>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let offer = {
        let mut db = state.db.lock().unwrap();
        offers::set_active(&mut db, &id, body.active, state.config.banner_exclusive)?
    };

    Ok(Json(offer))
}

// DELETE /api/admin/offers/:id
pub async fn delete_offer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_offer(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("offer {id}")))
    }
}

// ── Portfolio ──

#[derive(Deserialize)]
pub struct PortfolioPayload {
    pub title: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
}

// GET /api/admin/portfolio
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PortfolioItem>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let items = {
        let db = state.db.lock().unwrap();
        queries::list_portfolio(&db)?
    };
    Ok(Json(items))
}

// POST /api/admin/portfolio
pub async fn create_portfolio_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PortfolioPayload>,
) -> Result<(StatusCode, Json<PortfolioItem>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.image_url.trim().is_empty() {
        return Err(AppError::Validation("image_url is required".to_string()));
    }

    let item = PortfolioItem {
        id: uuid::Uuid::new_v4().to_string(),
        title: body.title,
        image_url: body.image_url.trim().to_string(),
        category: body.category,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_portfolio_item(&db, &item)?;
    }

    Ok((StatusCode::CREATED, Json(item)))
}

// DELETE /api/admin/portfolio/:id
pub async fn delete_portfolio_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_portfolio_item(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("portfolio item {id}")))
    }
}

// ── Site Settings ──

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SiteSettings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let settings = {
        let db = state.db.lock().unwrap();
        queries::get_settings(&db)?
    };
    Ok(Json(settings))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SiteSettings>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::upsert_settings(&db, &body)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}
