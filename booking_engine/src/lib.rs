//! Hotel Booking Engine
//!
//! The booking engine holds the core logic for the hotel booking gateway: room availability, discount
//! evaluation, the booking lifecycle, and the reconciliation of asynchronous payment verdicts coming back
//! from the mobile-wallet gateway. It is HTTP-framework agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The
//!    exception is the data types used in the database. These are defined in the `db_types` module and are
//!    public.
//! 2. The engine public API ([`mod@flow_api`]). This provides the public-facing functionality of the
//!    booking engine. It is responsible for creating bookings, admin status transitions and settling
//!    payment callbacks. Backends need to implement the traits in [`mod@traits`] in order to act as a
//!    store for the booking server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when
//! certain actions occur within the engine. For example, when a booking is settled as paid, a
//! `BookingPaidEvent` is emitted. A simple actor framework is used so that you can easily hook into these
//! events and perform custom actions (sending the confirmation mail, for instance).

pub mod availability;
pub mod db_types;
pub mod events;
pub mod flow_api;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use availability::AvailabilityFailMode;
pub use flow_api::{
    booking_objects::{BookingQueryFilter, PaymentVerdict, ReconciliationOutcome},
    bookings_api::BookingApi,
    BookingFlowApi,
};
pub use traits::{BookingApiError, BookingGatewayDatabase, BookingGatewayError, BookingManagement, SettlementUpdate};
