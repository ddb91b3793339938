use crate::db_types::{Booking, Payment};

/// The result of the conditional settlement update keyed by correlation id.
#[derive(Debug, Clone)]
pub enum SettlementUpdate {
    /// This call won the compare-and-swap and performed the transition. `payment` is present iff the
    /// verdict was a success (failure verdicts cancel the booking without creating a payment record).
    Applied { booking: Booking, payment: Option<Payment> },
    /// The booking exists but had already left `pending`. Nothing was changed.
    AlreadySettled(Booking),
    /// No booking carries this correlation id.
    Unmatched,
}
