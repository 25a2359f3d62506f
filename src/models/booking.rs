use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub slot_id: String,
    pub service_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// A booking joined to its slot (and service title, when one was chosen).
/// The dashboard views sort and filter on the slot's date/time, which the
/// plain bookings table does not carry.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithSlot {
    pub id: String,
    pub slot_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub slot_date: NaiveDate,
    pub slot_start: NaiveTime,
    pub service_title: Option<String>,
    pub created_at: NaiveDateTime,
}
