use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    AvailabilitySlot, Booking, BookingWithSlot, Notification, Offer, OfferType, PortfolioItem,
    Service, SiteSettings, SiteVisit,
};

// ── Availability Slots ──

pub fn insert_slot(conn: &Connection, slot: &AvailabilitySlot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO availability_slots (id, date, start_time, end_time, is_booked)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            slot.id,
            slot.date.format("%Y-%m-%d").to_string(),
            slot.start_time.format("%H:%M").to_string(),
            slot.end_time.format("%H:%M").to_string(),
            slot.is_booked as i32,
        ],
    )?;
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct SlotFilter {
    pub from_date: Option<NaiveDate>,
    pub is_booked: Option<bool>,
}

pub fn list_slots(conn: &Connection, filter: &SlotFilter) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let mut sql = String::from(
        "SELECT id, date, start_time, end_time, is_booked FROM availability_slots",
    );
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(from) = filter.from_date {
        params_vec.push(Box::new(from.format("%Y-%m-%d").to_string()));
        clauses.push(format!("date >= ?{}", params_vec.len()));
    }
    if let Some(booked) = filter.is_booked {
        params_vec.push(Box::new(booked as i32));
        clauses.push(format!("is_booked = ?{}", params_vec.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY date ASC, start_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_slot_row(row)))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

pub fn get_slot(conn: &Connection, id: &str) -> anyhow::Result<Option<AvailabilitySlot>> {
    let result = conn.query_row(
        "SELECT id, date, start_time, end_time, is_booked FROM availability_slots WHERE id = ?1",
        params![id],
        |row| Ok(parse_slot_row(row)),
    );

    match result {
        Ok(slot) => Ok(Some(slot?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Conditional FREE→BOOKED transition. Returns false when the slot is
/// missing or already booked; the caller decides which it was. This is the
/// guard that makes two concurrent reservations impossible.
pub fn try_mark_slot_booked(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE availability_slots SET is_booked = 1 WHERE id = ?1 AND is_booked = 0",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn free_slot(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE availability_slots SET is_booked = 0 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

/// Deletes only while free; a booked slot is left untouched.
pub fn delete_free_slot(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM availability_slots WHERE id = ?1 AND is_booked = 0",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_slot_row(row: &rusqlite::Row) -> anyhow::Result<AvailabilitySlot> {
    let id: String = row.get(0)?;
    let date_str: String = row.get(1)?;
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;
    let is_booked: bool = row.get::<_, i32>(4)? != 0;

    Ok(AvailabilitySlot {
        id,
        date: parse_date_col(&date_str),
        start_time: parse_time_col(&start_str),
        end_time: parse_time_col(&end_str),
        is_booked,
    })
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, slot_id, service_id, customer_name, customer_phone, customer_email, notes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.slot_id,
            booking.service_id,
            booking.customer_name,
            booking.customer_phone,
            booking.customer_email,
            booking.notes,
            booking.status,
            booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, slot_id, service_id, customer_name, customer_phone, customer_email, notes, status, created_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_bookings_for_slot(conn: &Connection, slot_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE slot_id = ?1",
        params![slot_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

const BOOKING_JOIN_SELECT: &str =
    "SELECT b.id, b.slot_id, b.customer_name, b.customer_phone, b.customer_email, b.notes, b.status,
            s.date, s.start_time, sv.title, b.created_at
     FROM bookings b
     INNER JOIN availability_slots s ON s.id = b.slot_id
     LEFT JOIN services sv ON sv.id = b.service_id";

/// Admin list view: newest bookings first.
pub fn list_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<BookingWithSlot>> {
    let sql = format!("{BOOKING_JOIN_SELECT} ORDER BY b.created_at DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_with_slot_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn bookings_with_slot_on_date(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<Vec<BookingWithSlot>> {
    let sql = format!("{BOOKING_JOIN_SELECT} WHERE s.date = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let date_str = date.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map(params![date_str], |row| Ok(parse_booking_with_slot_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn bookings_with_slot_from_date(
    conn: &Connection,
    from: NaiveDate,
) -> anyhow::Result<Vec<BookingWithSlot>> {
    let sql =
        format!("{BOOKING_JOIN_SELECT} WHERE s.date >= ?1 ORDER BY s.date ASC, s.start_time ASC");
    let mut stmt = conn.prepare(&sql)?;
    let from_str = from.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map(params![from_str], |row| Ok(parse_booking_with_slot_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let created_at_str: String = row.get(8)?;

    Ok(Booking {
        id: row.get(0)?,
        slot_id: row.get(1)?,
        service_id: row.get(2)?,
        customer_name: row.get(3)?,
        customer_phone: row.get(4)?,
        customer_email: row.get(5)?,
        notes: row.get(6)?,
        status: row.get(7)?,
        created_at: parse_datetime_col(&created_at_str),
    })
}

fn parse_booking_with_slot_row(row: &rusqlite::Row) -> anyhow::Result<BookingWithSlot> {
    let date_str: String = row.get(7)?;
    let start_str: String = row.get(8)?;
    let created_at_str: String = row.get(10)?;

    Ok(BookingWithSlot {
        id: row.get(0)?,
        slot_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        customer_email: row.get(4)?,
        notes: row.get(5)?,
        status: row.get(6)?,
        slot_date: parse_date_col(&date_str),
        slot_start: parse_time_col(&start_str),
        service_title: row.get(9)?,
        created_at: parse_datetime_col(&created_at_str),
    })
}

// ── Services ──

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, price, duration, image_url, is_popular, created_at
         FROM services ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, title, description, price, duration, image_url, is_popular, created_at
         FROM services WHERE id = ?1",
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, title, description, price, duration, image_url, is_popular, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            service.id,
            service.title,
            service.description,
            service.price,
            service.duration,
            service.image_url,
            service.is_popular as i32,
            service.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET title = ?1, description = ?2, price = ?3, duration = ?4, image_url = ?5, is_popular = ?6
         WHERE id = ?7",
        params![
            service.title,
            service.description,
            service.price,
            service.duration,
            service.image_url,
            service.is_popular as i32,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let created_at_str: String = row.get(7)?;

    Ok(Service {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        duration: row.get(4)?,
        image_url: row.get(5)?,
        is_popular: row.get::<_, i32>(6)? != 0,
        created_at: parse_datetime_col(&created_at_str),
    })
}

// ── Offers ──

pub fn list_offers(conn: &Connection) -> anyhow::Result<Vec<Offer>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, type, is_active, created_at
         FROM offers ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_offer_row(row)))?;

    let mut offers = vec![];
    for row in rows {
        offers.push(row??);
    }
    Ok(offers)
}

pub fn get_offer(conn: &Connection, id: &str) -> anyhow::Result<Option<Offer>> {
    let result = conn.query_row(
        "SELECT id, title, description, type, is_active, created_at FROM offers WHERE id = ?1",
        params![id],
        |row| Ok(parse_offer_row(row)),
    );

    match result {
        Ok(offer) => Ok(Some(offer?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Active offer of a given type for the public site. At most one popup can
/// be active; banners are not constrained, so first by recency wins.
pub fn active_offer_of_type(
    conn: &Connection,
    offer_type: OfferType,
) -> anyhow::Result<Option<Offer>> {
    let result = conn.query_row(
        "SELECT id, title, description, type, is_active, created_at
         FROM offers WHERE is_active = 1 AND type = ?1
         ORDER BY created_at DESC LIMIT 1",
        params![offer_type.as_str()],
        |row| Ok(parse_offer_row(row)),
    );

    match result {
        Ok(offer) => Ok(Some(offer?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_offer(conn: &Connection, offer: &Offer) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO offers (id, title, description, type, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            offer.id,
            offer.title,
            offer.description,
            offer.offer_type.as_str(),
            offer.is_active as i32,
            offer.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn set_offer_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE offers SET is_active = ?1 WHERE id = ?2",
        params![active as i32, id],
    )?;
    Ok(count > 0)
}

pub fn deactivate_other_offers_of_type(
    conn: &Connection,
    offer_type: OfferType,
    keep_id: &str,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE offers SET is_active = 0 WHERE type = ?1 AND id != ?2 AND is_active = 1",
        params![offer_type.as_str(), keep_id],
    )?;
    Ok(count)
}

pub fn delete_offer(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM offers WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_offer_row(row: &rusqlite::Row) -> anyhow::Result<Offer> {
    let type_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;

    Ok(Offer {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        offer_type: OfferType::parse(&type_str),
        is_active: row.get::<_, i32>(4)? != 0,
        created_at: parse_datetime_col(&created_at_str),
    })
}

// ── Portfolio ──

pub fn list_portfolio(conn: &Connection) -> anyhow::Result<Vec<PortfolioItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, image_url, category, created_at
         FROM portfolio_items ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        let created_at_str: String = row.get(4)?;
        Ok(PortfolioItem {
            id: row.get(0)?,
            title: row.get(1)?,
            image_url: row.get(2)?,
            category: row.get(3)?,
            created_at: parse_datetime_col(&created_at_str),
        })
    })?;

    let mut items = vec![];
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

pub fn insert_portfolio_item(conn: &Connection, item: &PortfolioItem) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO portfolio_items (id, title, image_url, category, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.id,
            item.title,
            item.image_url,
            item.category,
            item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn delete_portfolio_item(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM portfolio_items WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Site Settings ──

pub fn get_settings(conn: &Connection) -> anyhow::Result<SiteSettings> {
    let result = conn.query_row(
        "SELECT hero_bg_url FROM site_settings WHERE id = 1",
        [],
        |row| {
            Ok(SiteSettings {
                hero_bg_url: row.get(0)?,
            })
        },
    );

    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(SiteSettings { hero_bg_url: None }),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_settings(conn: &Connection, settings: &SiteSettings) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO site_settings (id, hero_bg_url) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET hero_bg_url = excluded.hero_bg_url",
        params![settings.hero_bg_url],
    )?;
    Ok(())
}

// ── Notifications ──

pub fn insert_notification(conn: &Connection, notification: &Notification) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, title, message, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            notification.id,
            notification.user_id,
            notification.title,
            notification.message,
            notification.is_read as i32,
            notification.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_notifications(
    conn: &Connection,
    user_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, message, is_read, created_at
         FROM notifications WHERE user_id = ?1
         ORDER BY created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit], |row| {
        let created_at_str: String = row.get(5)?;
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            is_read: row.get::<_, i32>(4)? != 0,
            created_at: parse_datetime_col(&created_at_str),
        })
    })?;

    let mut notifications = vec![];
    for row in rows {
        notifications.push(row?);
    }
    Ok(notifications)
}

pub fn mark_notification_read(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn mark_all_notifications_read(conn: &Connection, user_id: &str) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id],
    )?;
    Ok(count)
}

// ── Site Visits ──

pub fn insert_visit(conn: &Connection, visit: &SiteVisit) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO site_visits (page_path, user_agent, referrer) VALUES (?1, ?2, ?3)",
        params![visit.page_path, visit.user_agent, visit.referrer],
    )?;
    Ok(())
}

// ── Dashboard counts ──

pub struct EntityCounts {
    pub services: i64,
    pub portfolio: i64,
    pub offers: i64,
}

pub fn get_entity_counts(conn: &Connection) -> anyhow::Result<EntityCounts> {
    let services: i64 =
        conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?;
    let portfolio: i64 =
        conn.query_row("SELECT COUNT(*) FROM portfolio_items", [], |row| row.get(0))?;
    let offers: i64 = conn.query_row("SELECT COUNT(*) FROM offers", [], |row| row.get(0))?;

    Ok(EntityCounts {
        services,
        portfolio,
        offers,
    })
}

// ── Column parsing helpers ──

fn parse_date_col(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_time_col(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .unwrap_or(NaiveTime::MIN)
}

fn parse_datetime_col(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc())
}
