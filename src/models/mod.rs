pub mod booking;
pub mod notification;
pub mod offer;
pub mod portfolio;
pub mod service;
pub mod settings;
pub mod slot;
pub mod visit;

pub use booking::{Booking, BookingWithSlot};
pub use notification::Notification;
pub use offer::{Offer, OfferType};
pub use portfolio::PortfolioItem;
pub use service::Service;
pub use settings::SiteSettings;
pub use slot::AvailabilitySlot;
pub use visit::SiteVisit;
