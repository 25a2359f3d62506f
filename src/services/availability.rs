use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries::{self, SlotFilter};
use crate::models::{AvailabilitySlot, BookingWithSlot};

/// Temporal filter shared by every slot/booking view: anything dated after
/// the reference day is kept; anything on the reference day is kept only if
/// it has not started yet. Comparison is at minute resolution — a slot
/// starting at 14:00 is still offered at 14:00:45.
pub fn is_upcoming(date: NaiveDate, start: NaiveTime, now: NaiveDateTime) -> bool {
    if date != now.date() {
        return date > now.date();
    }
    let now_minute = now
        .time()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| now.time());
    start >= now_minute
}

/// Free slots a customer can still pick: the store filters on booked flag
/// and date, the temporal filter trims today's already-started slots.
pub fn upcoming_free_slots(
    conn: &Connection,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let filter = SlotFilter {
        from_date: Some(now.date()),
        is_booked: Some(false),
    };
    let mut slots = queries::list_slots(conn, &filter)?;
    slots.retain(|s| is_upcoming(s.date, s.start_time, now));
    Ok(slots)
}

/// Admin calendar view: booked and free slots alike, past ones suppressed.
pub fn upcoming_slots(
    conn: &Connection,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let filter = SlotFilter {
        from_date: Some(now.date()),
        is_booked: None,
    };
    let mut slots = queries::list_slots(conn, &filter)?;
    slots.retain(|s| is_upcoming(s.date, s.start_time, now));
    Ok(slots)
}

/// Partition slots into per-day groups, dates in first-appearance order,
/// each group keeping the input order. Input comes (date, start_time)
/// sorted from the store, so groups render chronologically.
pub fn group_by_date(slots: Vec<AvailabilitySlot>) -> Vec<(NaiveDate, Vec<AvailabilitySlot>)> {
    let mut groups: Vec<(NaiveDate, Vec<AvailabilitySlot>)> = vec![];
    for slot in slots {
        if let Some((_, group)) = groups.iter_mut().find(|(date, _)| *date == slot.date) {
            group.push(slot);
        } else {
            groups.push((slot.date, vec![slot]));
        }
    }
    groups
}

/// All of today's bookings in start-time order, past ones included — the
/// dashboard shows the whole day. The time sort happens here because the
/// store cannot order by a joined column.
pub fn todays_bookings(
    conn: &Connection,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<BookingWithSlot>> {
    let mut bookings = queries::bookings_with_slot_on_date(conn, now.date())?;
    bookings.sort_by_key(|b| b.slot_start);
    Ok(bookings)
}

/// The next upcoming booking. Ties on (date, start_time) — possible because
/// duplicate slots can exist — break deterministically by creation time,
/// then id.
pub fn next_booking(
    conn: &Connection,
    now: NaiveDateTime,
) -> anyhow::Result<Option<BookingWithSlot>> {
    let bookings = queries::bookings_with_slot_from_date(conn, now.date())?;
    Ok(bookings
        .into_iter()
        .filter(|b| is_upcoming(b.slot_date, b.slot_start, now))
        .min_by(|a, b| {
            (a.slot_date, a.slot_start, a.created_at, a.id.as_str())
                .cmp(&(b.slot_date, b.slot_start, b.created_at, b.id.as_str()))
        }))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyBookings {
    pub date: NaiveDate,
    pub count: i64,
}

/// Booking counts for the trailing `days` calendar days ending today, one
/// bucket per day, zero-filled. Bookings outside the window (including
/// future-dated ones) are not counted.
pub fn trailing_trend(
    conn: &Connection,
    days: u32,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<DailyBookings>> {
    if days == 0 {
        return Ok(vec![]);
    }

    let today = now.date();
    let window_start = today - Duration::days(i64::from(days) - 1);

    let mut buckets: Vec<DailyBookings> = (0..days)
        .map(|i| DailyBookings {
            date: window_start + Duration::days(i64::from(i)),
            count: 0,
        })
        .collect();

    for booking in queries::bookings_with_slot_from_date(conn, window_start)? {
        if booking.slot_date > today {
            continue;
        }
        let offset = (booking.slot_date - window_start).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.count += 1;
        }
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::slot::{parse_date, parse_time};
    use crate::services::booking::{reserve, ReservationRequest};

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

    fn book(conn: &mut Connection, slot_id: &str, name: &str, created: &str) {
        reserve(
            conn,
            ReservationRequest {
                slot_id: slot_id.to_string(),
                customer_name: name.to_string(),
                customer_phone: "+391112223".to_string(),
                customer_email: None,
                notes: None,
                service_id: None,
            },
            dt(created),
        )
        .unwrap();
    }

    #[test]
    fn test_temporal_filter_today() {
        let now = dt("2025-06-10 14:00");
        let date = parse_date("2025-06-10").unwrap();
        assert!(!is_upcoming(date, parse_time("13:00").unwrap(), now));
        assert!(is_upcoming(date, parse_time("14:00").unwrap(), now));
        assert!(is_upcoming(date, parse_time("15:00").unwrap(), now));
    }

    #[test]
    fn test_temporal_filter_other_days() {
        let now = dt("2025-06-10 14:00");
        assert!(is_upcoming(
            parse_date("2025-06-11").unwrap(),
            parse_time("00:00").unwrap(),
            now
        ));
        assert!(!is_upcoming(
            parse_date("2025-06-09").unwrap(),
            parse_time("23:00").unwrap(),
            now
        ));
    }

    #[test]
    fn test_temporal_filter_ignores_seconds() {
        // 14:00 slot is still bookable at 14:00:45.
        let now = dt("2025-06-10 14:00") + Duration::seconds(45);
        assert!(is_upcoming(
            parse_date("2025-06-10").unwrap(),
            parse_time("14:00").unwrap(),
            now
        ));
    }

    #[test]
    fn test_upcoming_free_slots_excludes_past_and_booked() {
        let mut conn = setup_db();
        let past = make_slot(&conn, "2025-06-10", "09:00");
        let today_later = make_slot(&conn, "2025-06-10", "16:00");
        let tomorrow = make_slot(&conn, "2025-06-11", "09:00");
        let booked = make_slot(&conn, "2025-06-11", "10:00");
        book(&mut conn, &booked.id, "Anna", "2025-06-01 09:00");

        let slots = upcoming_free_slots(&conn, dt("2025-06-10 14:00")).unwrap();
        let ids: Vec<&str> = slots.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec![today_later.id.as_str(), tomorrow.id.as_str()]);
        assert!(!ids.contains(&past.id.as_str()));
        assert!(!ids.contains(&booked.id.as_str()));
    }

    #[test]
    fn test_upcoming_slots_keeps_booked_ones() {
        let mut conn = setup_db();
        let booked = make_slot(&conn, "2025-06-11", "10:00");
        book(&mut conn, &booked.id, "Anna", "2025-06-01 09:00");

        let slots = upcoming_slots(&conn, dt("2025-06-10 14:00")).unwrap();
        assert_eq!(slots.len(), 1);
        assert!(slots[0].is_booked);
    }

    #[test]
    fn test_group_by_date_preserves_order() {
        let conn = setup_db();
        make_slot(&conn, "2025-06-10", "09:00");
        make_slot(&conn, "2025-06-10", "10:00");
        make_slot(&conn, "2025-06-11", "09:00");

        let slots = queries::list_slots(&conn, &SlotFilter::default()).unwrap();
        let groups = group_by_date(slots);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, parse_date("2025-06-10").unwrap());
        assert_eq!(groups[0].1.len(), 2);
        assert!(groups[0].1[0].start_time < groups[0].1[1].start_time);
        assert_eq!(groups[1].0, parse_date("2025-06-11").unwrap());
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_todays_bookings_sorted_by_start_time() {
        let mut conn = setup_db();
        let late = make_slot(&conn, "2025-06-10", "16:00");
        let early = make_slot(&conn, "2025-06-10", "09:00");
        let other_day = make_slot(&conn, "2025-06-11", "08:00");
        book(&mut conn, &late.id, "Carla", "2025-06-01 09:00");
        book(&mut conn, &early.id, "Bianca", "2025-06-01 09:01");
        book(&mut conn, &other_day.id, "Dora", "2025-06-01 09:02");

        let bookings = todays_bookings(&conn, dt("2025-06-10 12:00")).unwrap();
        let names: Vec<&str> = bookings.iter().map(|b| b.customer_name.as_str()).collect();

        // Past-today bookings stay in the list; only the sort matters here.
        assert_eq!(names, vec!["Bianca", "Carla"]);
    }

    #[test]
    fn test_next_booking_skips_already_started() {
        let mut conn = setup_db();
        let past = make_slot(&conn, "2025-06-10", "09:00");
        let upcoming = make_slot(&conn, "2025-06-10", "16:00");
        book(&mut conn, &past.id, "Anna", "2025-06-01 09:00");
        book(&mut conn, &upcoming.id, "Elena", "2025-06-01 09:01");

        let next = next_booking(&conn, dt("2025-06-10 14:00")).unwrap().unwrap();
        assert_eq!(next.customer_name, "Elena");
    }

    #[test]
    fn test_next_booking_tie_breaks_by_creation() {
        let mut conn = setup_db();
        // Duplicate slots for the same wall-clock time are possible.
        let slot_a = make_slot(&conn, "2025-06-12", "10:00");
        let slot_b = make_slot(&conn, "2025-06-12", "10:00");
        book(&mut conn, &slot_b.id, "Second", "2025-06-02 09:00");
        book(&mut conn, &slot_a.id, "First", "2025-06-01 09:00");

        let next = next_booking(&conn, dt("2025-06-10 14:00")).unwrap().unwrap();
        assert_eq!(next.customer_name, "First");
    }

    #[test]
    fn test_next_booking_none_when_everything_past() {
        let mut conn = setup_db();
        let past = make_slot(&conn, "2025-06-10", "09:00");
        book(&mut conn, &past.id, "Anna", "2025-06-01 09:00");

        assert!(next_booking(&conn, dt("2025-06-10 14:00")).unwrap().is_none());
    }

    #[test]
    fn test_trailing_trend_buckets() {
        let mut conn = setup_db();
        let in_window_a = make_slot(&conn, "2025-06-08", "10:00");
        let in_window_b = make_slot(&conn, "2025-06-08", "11:00");
        let today = make_slot(&conn, "2025-06-10", "10:00");
        let before_window = make_slot(&conn, "2025-06-03", "10:00");
        let future = make_slot(&conn, "2025-06-12", "10:00");
        for (slot, name) in [
            (&in_window_a, "A"),
            (&in_window_b, "B"),
            (&today, "C"),
            (&before_window, "D"),
            (&future, "E"),
        ] {
            book(&mut conn, &slot.id, name, "2025-06-01 09:00");
        }

        let trend = trailing_trend(&conn, 7, dt("2025-06-10 14:00")).unwrap();

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, parse_date("2025-06-04").unwrap());
        assert_eq!(trend[6].date, parse_date("2025-06-10").unwrap());
        let total: i64 = trend.iter().map(|b| b.count).sum();
        assert_eq!(total, 3);
        assert_eq!(
            trend
                .iter()
                .find(|b| b.date == parse_date("2025-06-08").unwrap())
                .unwrap()
                .count,
            2
        );
        // Days without bookings stay as zero buckets.
        assert_eq!(trend[1].count, 0);
    }

    #[test]
    fn test_trailing_trend_zero_days() {
        let conn = setup_db();
        assert!(trailing_trend(&conn, 0, dt("2025-06-10 14:00")).unwrap().is_empty());
    }
}
