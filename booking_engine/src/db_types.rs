use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use hbg_common::Vnd;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   BookingStatusType   -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// The booking has been created and holds the room, but no payment verdict has arrived yet.
    Pending,
    /// A successful payment verdict has been settled against the booking.
    Paid,
    /// An admin has confirmed the booking out-of-band (e.g. pay-on-arrival).
    Confirmed,
    /// The guest has arrived.
    CheckedIn,
    /// The stay is over. Terminal.
    CheckedOut,
    /// The booking was cancelled by the user, an admin, or a failed payment. Terminal.
    Cancelled,
}

impl BookingStatus {
    /// Statuses that count as occupying the room for overlap purposes.
    pub const BLOCKING: [BookingStatus; 3] = [BookingStatus::Pending, BookingStatus::Paid, BookingStatus::CheckedIn];

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::CheckedOut)
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    /// Whether this status implies the booking has been paid for. This is the only source of truth for
    /// "is paid" — there is no separately stored flag to drift out of sync.
    pub fn is_paid(&self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::CheckedIn | BookingStatus::CheckedOut)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Paid => write!(f, "paid"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::CheckedIn => write!(f, "checked_in"),
            BookingStatus::CheckedOut => write!(f, "checked_out"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid booking status: {0}")]
pub struct ConversionError(String);

impl FromStr for BookingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "confirmed" => Ok(Self::Confirmed),
            "checked_in" => Ok(Self::CheckedIn),
            "checked_out" => Ok(Self::CheckedOut),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid booking status: {s}"))),
        }
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid booking status: {value}. But this conversion cannot fail. Defaulting to pending");
            BookingStatus::Pending
        })
    }
}

//--------------------------------------        OrderId        -------------------------------------------------------
/// The correlation id assigned at payment-initiation time. It is the only link between a booking and the
/// gateway's two callback channels, and is never reused across attempts.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Room          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub room_type: String,
    /// Nightly price.
    pub price: Vnd,
    pub description: String,
    pub image: Option<String>,
    /// Advisory occupancy flag. Set as a side effect of settlement; availability never consults it.
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Booking         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i64,
    /// The price computed at creation time, discount included. Never negative.
    pub total_price: Vnd,
    /// The discount code quoted at payment initiation, if any. Denormalized; not re-validated later.
    pub discount_code: Option<String>,
    /// The amount actually sent to the gateway at initiation time.
    pub amount_after_discount: Option<Vnd>,
    /// Correlation id for gateway callbacks. `None` until payment has been initiated.
    pub momo_order_id: Option<OrderId>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Derived projection of [`BookingStatus::is_paid`].
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// The amount the guest is (or was) asked to pay.
    pub fn charged_amount(&self) -> Vnd {
        self.amount_after_discount.unwrap_or(self.total_price)
    }
}

//--------------------------------------      NewBooking       -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: i64,
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i64,
    /// An optional coupon code supplied by the guest. Evaluated against the catalog at creation time.
    pub discount_code: Option<String>,
}

impl NewBooking {
    pub fn new(user_id: i64, room_id: i64, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self { user_id, room_id, check_in, check_out, guests: 1, discount_code: None }
    }

    pub fn with_guests(mut self, guests: i64) -> Self {
        self.guests = guests;
        self
    }

    pub fn with_discount_code<S: Into<String>>(mut self, code: S) -> Self {
        self.discount_code = Some(code.into());
        self
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unpaid" => Self::Unpaid,
            "paid" => Self::Paid,
            "failed" => Self::Failed,
            _ => {
                error!("Invalid payment status: {value}. Defaulting to unpaid");
                Self::Unpaid
            },
        }
    }
}

//--------------------------------------       Payment         -------------------------------------------------------
/// The method identifier recorded on wallet-gateway payments.
pub const MOMO_PAYMENT_METHOD: &str = "momo";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    /// The amount reported by the gateway, not the amount we asked for.
    pub amount: Vnd,
    pub method: String,
    pub status: PaymentStatus,
    /// Set exactly once, when the first successful verdict is processed.
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Discount        -------------------------------------------------------
/// A coupon code. Either percent-based or a flat amount off; percent wins if both are configured.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    /// Unique, stored uppercase.
    pub code: String,
    /// Percentage off, 1–100.
    pub percent: Option<i64>,
    /// Flat amount off.
    pub value: Option<Vnd>,
    /// `None` = valid from the beginning of time.
    pub start_date: Option<DateTime<Utc>>,
    /// `None` = never expires.
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// A discount is valid at `t` iff it is active and `t` lies within the (inclusive) validity window.
    pub fn is_valid_at(&self, t: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if let Some(start) = self.start_date {
            if t < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if t > end {
                return false;
            }
        }
        true
    }

    /// Applies the discount to `price`, clamping at zero. Does not check validity; callers are expected
    /// to gate on [`Self::is_valid_at`] first.
    pub fn apply_to(&self, price: Vnd) -> Vnd {
        if let Some(percent) = self.percent {
            return (price - Vnd::from(price.value() * percent / 100)).or_zero();
        }
        if let Some(value) = self.value {
            return (price - value).or_zero();
        }
        price
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn window_discount() -> Discount {
        Discount {
            id: 1,
            code: "SUMMER10".to_string(),
            percent: Some(10),
            value: None,
            start_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap()),
            active: true,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn validity_window_bounds_are_inclusive() {
        let d = window_discount();
        let start = d.start_date.unwrap();
        let end = d.end_date.unwrap();
        assert!(d.is_valid_at(start));
        assert!(d.is_valid_at(end));
        assert!(!d.is_valid_at(start - chrono::Duration::milliseconds(1)));
        assert!(!d.is_valid_at(end + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn inactive_discount_is_never_valid() {
        let mut d = window_discount();
        d.active = false;
        assert!(!d.is_valid_at(d.start_date.unwrap() + chrono::Duration::days(10)));
    }

    #[test]
    fn unbounded_window_is_always_valid() {
        let mut d = window_discount();
        d.start_date = None;
        d.end_date = None;
        assert!(d.is_valid_at(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap()));
        assert!(d.is_valid_at(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn percent_discount_application() {
        let d = window_discount();
        assert_eq!(d.apply_to(Vnd::from(1_500_000)), Vnd::from(1_350_000));
    }

    #[test]
    fn flat_discount_clamps_at_zero() {
        let mut d = window_discount();
        d.percent = None;
        d.value = Some(Vnd::from(200_000));
        assert_eq!(d.apply_to(Vnd::from(150_000)), Vnd::from(0));
        assert_eq!(d.apply_to(Vnd::from(500_000)), Vnd::from(300_000));
    }

    #[test]
    fn booking_status_projections() {
        assert!(BookingStatus::Paid.is_paid());
        assert!(BookingStatus::CheckedIn.is_paid());
        assert!(BookingStatus::CheckedOut.is_paid());
        assert!(!BookingStatus::Pending.is_paid());
        assert!(!BookingStatus::Cancelled.is_paid());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::CheckedOut.is_terminal());
        assert!(!BookingStatus::CheckedIn.is_terminal());
        assert!(BookingStatus::Pending.is_blocking());
        assert!(!BookingStatus::Confirmed.is_blocking());
        assert!(!BookingStatus::CheckedOut.is_blocking());
    }
}
