//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the booking engine database
//! *backends*.
//!
//! ## Traits
//! * [`BookingGatewayDatabase`] defines the highest level of behaviour for backends supporting the
//!   booking engine: the guarded booking insert, payment-reference attachment, and the conditional
//!   settlement update that the reconciliation engine is built on.
//! * [`BookingManagement`] provides read-only queries for rooms, bookings, payments and the discount
//!   catalog.

mod booking_gateway_database;
mod booking_management;
mod data_objects;

pub use booking_gateway_database::{BookingGatewayDatabase, BookingGatewayError};
pub use booking_management::{BookingApiError, BookingManagement};
pub use data_objects::SettlementUpdate;
