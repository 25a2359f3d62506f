use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Offer, OfferType};

/// Flip an offer's active flag. Popup offers are exclusive: activating one
/// deactivates every other active popup in the same transaction, so no two
/// popups are ever live together. Banners follow the same rule only when
/// `banner_exclusive` is set.
pub fn set_active(
    conn: &mut Connection,
    offer_id: &str,
    active: bool,
    banner_exclusive: bool,
) -> Result<Offer, AppError> {
    let tx = conn.transaction()?;

    let offer = queries::get_offer(&tx, offer_id)?
        .ok_or_else(|| AppError::NotFound(format!("offer {offer_id}")))?;

    if active {
        let exclusive = match offer.offer_type {
            OfferType::Popup => true,
            OfferType::Banner => banner_exclusive,
        };
        if exclusive {
            queries::deactivate_other_offers_of_type(&tx, offer.offer_type, &offer.id)?;
        }
    }

    queries::set_offer_active(&tx, &offer.id, active)?;
    tx.commit()?;

    Ok(Offer {
        is_active: active,
        ..offer
    })
}
