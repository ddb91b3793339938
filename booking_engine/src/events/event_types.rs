use crate::db_types::{Booking, Payment};

/// Emitted exactly once per successful settlement, after the status transition has been committed.
/// Confirmation-mail dispatch hangs off this event, which is what keeps "email the guest" from firing
/// on replayed or out-of-order callbacks.
#[derive(Debug, Clone)]
pub struct BookingPaidEvent {
    pub booking: Booking,
    pub payment: Payment,
}
