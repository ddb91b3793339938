use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Booking, BookingStatus, Payment, Room};

//--------------------------------------   PaymentVerdict    ---------------------------------------------------------
/// The verdict carried by a gateway callback, in either channel. The wire encodes it as `resultCode`,
/// with zero meaning success and anything else a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentVerdict {
    Success,
    Failure { code: i64 },
}

impl PaymentVerdict {
    pub fn from_result_code(code: i64) -> Self {
        if code == 0 {
            PaymentVerdict::Success
        } else {
            PaymentVerdict::Failure { code }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentVerdict::Success)
    }

    /// The booking status a settlement with this verdict lands on. A failed payment cancels the hold so
    /// the room is freed for other bookers.
    pub fn target_status(&self) -> BookingStatus {
        match self {
            PaymentVerdict::Success => BookingStatus::Paid,
            PaymentVerdict::Failure { .. } => BookingStatus::Cancelled,
        }
    }
}

//----------------------------------   ReconciliationOutcome   -------------------------------------------------------
/// What a `settle` call did. Both callback channels receive one of these and translate it into their own
/// response semantics (ack body vs. user redirect).
#[derive(Debug, Clone)]
pub enum ReconciliationOutcome {
    /// This call performed the settlement. `payment` is present iff the verdict was a success.
    Settled { booking: Booking, payment: Option<Payment> },
    /// The booking had already been settled; the call was a no-op and is safe to acknowledge again.
    AlreadySettled(Booking),
    /// No booking matches the correlation id. The notify channel still acknowledges to stop redelivery;
    /// the return channel shows an error page instead.
    Unmatched,
}

impl ReconciliationOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            ReconciliationOutcome::Settled { booking, .. } => Some(booking),
            ReconciliationOutcome::AlreadySettled(booking) => Some(booking),
            ReconciliationOutcome::Unmatched => None,
        }
    }
}

//--------------------------------------  RoomAvailability   ---------------------------------------------------------
/// A room annotated with its availability for a requested range, as shown on the search screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room: Room,
    pub available: bool,
}

//--------------------------------------  BookingQueryFilter  --------------------------------------------------------
/// Criteria for searching bookings. Empty fields do not constrain the search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingQueryFilter {
    pub user_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<Vec<BookingStatus>>,
    pub check_in_after: Option<NaiveDate>,
    pub check_out_before: Option<NaiveDate>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl BookingQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_room_id(mut self, room_id: i64) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_check_in_after(mut self, date: NaiveDate) -> Self {
        self.check_in_after = Some(date);
        self
    }

    pub fn with_check_out_before(mut self, date: NaiveDate) -> Self {
        self.check_out_before = Some(date);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.room_id.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.check_in_after.is_none()
            && self.check_out_before.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }
}
