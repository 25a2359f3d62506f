use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AvailabilitySlot, Booking, OfferType, SiteVisit};
use crate::services::availability;
use crate::services::booking::{self, ReservationRequest};
use crate::services::notify::{self, BookingSummary};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SlotResponse {
    id: String,
    date: String,
    start_time: String,
    end_time: String,
}

#[derive(Serialize)]
pub struct SlotGroupResponse {
    date: String,
    slots: Vec<SlotResponse>,
}

impl From<AvailabilitySlot> for SlotResponse {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            date: slot.date.format("%Y-%m-%d").to_string(),
            start_time: slot.start_time.format("%H:%M").to_string(),
            end_time: slot.end_time.format("%H:%M").to_string(),
        }
    }
}

// GET /api/slots
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SlotGroupResponse>>, AppError> {
    let now = Utc::now().naive_utc();

    let slots = {
        let db = state.db.lock().unwrap();
        availability::upcoming_free_slots(&db, now)?
    };

    let groups = availability::group_by_date(slots)
        .into_iter()
        .map(|(date, slots)| SlotGroupResponse {
            date: date.format("%Y-%m-%d").to_string(),
            slots: slots.into_iter().map(SlotResponse::from).collect(),
        })
        .collect();

    Ok(Json(groups))
}

// GET /api/services
#[derive(Serialize)]
pub struct ServiceResponse {
    id: String,
    title: String,
    description: Option<String>,
    price: String,
    duration: Option<String>,
    image_url: Option<String>,
    is_popular: bool,
}

pub async fn get_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };

    let response = services
        .into_iter()
        .map(|s| ServiceResponse {
            id: s.id,
            title: s.title,
            description: s.description,
            price: s.price,
            duration: s.duration,
            image_url: s.image_url,
            is_popular: s.is_popular,
        })
        .collect();

    Ok(Json(response))
}

// GET /api/offers/active?type=popup|banner
#[derive(Deserialize)]
pub struct ActiveOfferQuery {
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
}

#[derive(Serialize)]
pub struct OfferResponse {
    id: String,
    title: String,
    description: Option<String>,
    #[serde(rename = "type")]
    offer_type: String,
}

pub async fn get_active_offer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActiveOfferQuery>,
) -> Result<Json<Option<OfferResponse>>, AppError> {
    let offer_type = OfferType::parse(query.offer_type.as_deref().unwrap_or("popup"));

    let offer = {
        let db = state.db.lock().unwrap();
        queries::active_offer_of_type(&db, offer_type)?
    };

    Ok(Json(offer.map(|o| OfferResponse {
        id: o.id,
        title: o.title,
        description: o.description,
        offer_type: o.offer_type.as_str().to_string(),
    })))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub slot_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub service_id: Option<String>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    slot_id: String,
    service_id: Option<String>,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    notes: Option<String>,
    status: String,
    created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            slot_id: b.slot_id,
            service_id: b.service_id,
            customer_name: b.customer_name,
            customer_phone: b.customer_phone,
            customer_email: b.customer_email,
            notes: b.notes,
            status: b.status,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let now = Utc::now().naive_utc();

    let (booking, summary) = {
        let mut db = state.db.lock().unwrap();
        let booking = booking::reserve(
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
        )?;

        let summary = queries::get_slot(&db, &booking.slot_id)?.map(|slot| {
            let service_title = booking
                .service_id
                .as_deref()
                .and_then(|id| queries::get_service(&db, id).ok().flatten())
                .map(|s| s.title);
            BookingSummary {
                customer_name: booking.customer_name.clone(),
                date: slot.date,
                start_time: slot.start_time,
                service_title,
            }
        });

        (booking, summary)
    };

    if let Some(summary) = summary {
        notify::dispatch_booking_notification(&state, summary).await;
    }

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

// POST /api/visits
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    Json(visit): Json<SiteVisit>,
) -> StatusCode {
    let result = {
        let db = state.db.lock().unwrap();
        queries::insert_visit(&db, &visit)
    };

    // Analytics must never bother the visitor.
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to record site visit");
    }

    StatusCode::NO_CONTENT
}
