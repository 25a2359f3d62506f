use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub slot_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub service_id: Option<String>,
}

/// Reserve a slot for a customer.
///
/// The FREE→BOOKED transition and the booking insert run in one SQLite
/// transaction, with the slot update conditional on the slot still being
/// free. Of any number of concurrent attempts on the same slot, exactly one
/// commits; the rest see `SlotUnavailable`. No partial state can leak:
/// either both writes land or neither does.
pub fn reserve(
    conn: &mut Connection,
    req: ReservationRequest,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let customer_name = req.customer_name.trim().to_string();
    let customer_phone = req.customer_phone.trim().to_string();
    let slot_id = req.slot_id.trim().to_string();

    if slot_id.is_empty() {
        return Err(AppError::Validation("slot_id is required".to_string()));
    }
    if customer_name.is_empty() {
        return Err(AppError::Validation("customer_name is required".to_string()));
    }
    if customer_phone.is_empty() {
        return Err(AppError::Validation("customer_phone is required".to_string()));
    }

    let tx = conn.transaction()?;

    if !queries::try_mark_slot_booked(&tx, &slot_id)? {
        // 0 rows affected: either the slot never existed or someone else
        // won it. Look once more to tell the caller which.
        return match queries::get_slot(&tx, &slot_id)? {
            None => Err(AppError::NotFound(format!("slot {slot_id}"))),
            Some(_) => Err(AppError::SlotUnavailable),
        };
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        slot_id,
        service_id: req.service_id.filter(|s| !s.trim().is_empty()),
        customer_name,
        customer_phone,
        customer_email: req.customer_email.filter(|s| !s.trim().is_empty()),
        notes: req.notes.filter(|s| !s.trim().is_empty()),
        status: "confirmed".to_string(),
        created_at: now,
    };

    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    Ok(booking)
}

/// Cancel a booking and free its slot, atomically. The slot becomes
/// reservable again as soon as this commits.
pub fn cancel(conn: &mut Connection, booking_id: &str) -> Result<Booking, AppError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    queries::delete_booking(&tx, booking_id)?;
    queries::free_slot(&tx, &booking.slot_id)?;
    tx.commit()?;

    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::slot::{parse_date, parse_time};
    use crate::models::AvailabilitySlot;
    use std::sync::{Arc, Mutex};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn make_slot(conn: &Connection, date: &str, start: &str) -> AvailabilitySlot {
        let slot = AvailabilitySlot::new(parse_date(date).unwrap(), parse_time(start).unwrap());
        queries::insert_slot(conn, &slot).unwrap();
        slot
    }

    fn request(slot_id: &str) -> ReservationRequest {
        ReservationRequest {
            slot_id: slot_id.to_string(),
            customer_name: "Maria".to_string(),
            customer_phone: "+391234567".to_string(),
            customer_email: None,
            notes: None,
            service_id: None,
        }
    }

    #[test]
    fn test_reserve_creates_booking_and_marks_slot() {
        let mut conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");

        let booking = reserve(&mut conn, request(&slot.id), dt("2025-06-01 09:00")).unwrap();

        assert_eq!(booking.slot_id, slot.id);
        assert_eq!(booking.customer_name, "Maria");
        assert_eq!(booking.status, "confirmed");

        let stored = queries::get_slot(&conn, &slot.id).unwrap().unwrap();
        assert!(stored.is_booked);
        assert_eq!(queries::count_bookings_for_slot(&conn, &slot.id).unwrap(), 1);
    }

    #[test]
    fn test_second_reserve_on_same_slot_conflicts() {
        let mut conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");

        reserve(&mut conn, request(&slot.id), dt("2025-06-01 09:00")).unwrap();
        let second = reserve(&mut conn, request(&slot.id), dt("2025-06-01 09:01"));

        assert!(matches!(second, Err(AppError::SlotUnavailable)));
        assert_eq!(queries::count_bookings_for_slot(&conn, &slot.id).unwrap(), 1);
    }

    #[test]
    fn test_reserve_unknown_slot_is_not_found() {
        let mut conn = setup_db();
        let result = reserve(&mut conn, request("no-such-slot"), dt("2025-06-01 09:00"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_reserve_rejects_missing_fields_before_any_write() {
        let mut conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");

        let mut req = request(&slot.id);
        req.customer_phone = "   ".to_string();
        let result = reserve(&mut conn, req, dt("2025-06-01 09:00"));

        assert!(matches!(result, Err(AppError::Validation(_))));
        let stored = queries::get_slot(&conn, &slot.id).unwrap().unwrap();
        assert!(!stored.is_booked);
        assert_eq!(queries::count_bookings_for_slot(&conn, &slot.id).unwrap(), 0);
    }

    #[test]
    fn test_reserve_blank_optional_fields_become_null() {
        let mut conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");

        let mut req = request(&slot.id);
        req.customer_email = Some("".to_string());
        req.service_id = Some(" ".to_string());
        let booking = reserve(&mut conn, req, dt("2025-06-01 09:00")).unwrap();

        assert!(booking.customer_email.is_none());
        assert!(booking.service_id.is_none());
    }

    #[test]
    fn test_cancel_frees_slot_for_rebooking() {
        let mut conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");

        let booking = reserve(&mut conn, request(&slot.id), dt("2025-06-01 09:00")).unwrap();
        cancel(&mut conn, &booking.id).unwrap();

        let stored = queries::get_slot(&conn, &slot.id).unwrap().unwrap();
        assert!(!stored.is_booked);
        assert_eq!(queries::count_bookings_for_slot(&conn, &slot.id).unwrap(), 0);

        // The freed slot is reservable again.
        let rebooked = reserve(&mut conn, request(&slot.id), dt("2025-06-01 10:00")).unwrap();
        assert_eq!(rebooked.slot_id, slot.id);
    }

    #[test]
    fn test_cancel_unknown_booking_is_not_found() {
        let mut conn = setup_db();
        let result = cancel(&mut conn, "no-such-booking");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_concurrent_reserves_have_exactly_one_winner() {
        let conn = setup_db();
        let slot = make_slot(&conn, "2025-06-10", "14:00");
        let db = Arc::new(Mutex::new(conn));

        let mut handles = vec![];
        for i in 0..8 {
            let db = Arc::clone(&db);
            let slot_id = slot.id.clone();
            handles.push(std::thread::spawn(move || {
                let mut req = request(&slot_id);
                req.customer_name = format!("Customer {i}");
                let mut conn = db.lock().unwrap();
                reserve(&mut conn, req, dt("2025-06-01 09:00")).is_ok()
            }));
        }

        let outcomes: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = outcomes.iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);

        let conn = db.lock().unwrap();
        let stored = queries::get_slot(&conn, &slot.id).unwrap().unwrap();
        assert!(stored.is_booked);
        assert_eq!(queries::count_bookings_for_slot(&conn, &slot.id).unwrap(), 1);
    }
}
