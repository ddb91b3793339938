//! Room availability rules.
//!
//! A room is unavailable for a requested range iff some booking in a *blocking* status overlaps it.
//! Ranges are half-open, `[check_in, check_out)`: the check-out day does not hold the room, so a stay
//! ending on the day another begins does not conflict.

use chrono::NaiveDate;

use crate::db_types::BookingStatus;

/// What to report when the availability lookup itself fails.
///
/// The conservative default is [`FailClosed`](AvailabilityFailMode::FailClosed): a storage fault makes
/// rooms look occupied rather than risking a double booking. [`FailOpen`](AvailabilityFailMode::FailOpen)
/// reproduces the legacy behaviour of hiding storage faults behind "available".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AvailabilityFailMode {
    #[default]
    FailClosed,
    FailOpen,
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether an existing booking with the given status and range blocks a request for
/// `[req_start, req_end)`. An empty or inverted request never matches anything (fail-safe: the caller
/// reports such a request as unavailable before ever asking about overlaps).
pub fn booking_blocks(
    status: BookingStatus,
    existing_start: NaiveDate,
    existing_end: NaiveDate,
    req_start: NaiveDate,
    req_end: NaiveDate,
) -> bool {
    status.is_blocking() && ranges_overlap(existing_start, existing_end, req_start, req_end)
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn overlapping_ranges_block() {
        // [2024-01-10, 2024-01-12) vs [2024-01-11, 2024-01-13) share the night of the 11th
        assert!(ranges_overlap(d("2024-01-10"), d("2024-01-12"), d("2024-01-11"), d("2024-01-13")));
    }

    #[test]
    fn adjacent_ranges_do_not_block() {
        // Checking out on the 12th frees the room for a check-in on the 12th
        assert!(!ranges_overlap(d("2024-01-10"), d("2024-01-12"), d("2024-01-12"), d("2024-01-14")));
        assert!(!ranges_overlap(d("2024-01-12"), d("2024-01-14"), d("2024-01-10"), d("2024-01-12")));
    }

    #[test]
    fn containment_blocks() {
        assert!(ranges_overlap(d("2024-01-01"), d("2024-01-31"), d("2024-01-10"), d("2024-01-12")));
        assert!(ranges_overlap(d("2024-01-10"), d("2024-01-12"), d("2024-01-01"), d("2024-01-31")));
    }

    #[test]
    fn only_blocking_statuses_count() {
        let (s, e) = (d("2024-01-10"), d("2024-01-12"));
        assert!(booking_blocks(BookingStatus::Pending, s, e, s, e));
        assert!(booking_blocks(BookingStatus::Paid, s, e, s, e));
        assert!(booking_blocks(BookingStatus::CheckedIn, s, e, s, e));
        assert!(!booking_blocks(BookingStatus::Cancelled, s, e, s, e));
        assert!(!booking_blocks(BookingStatus::CheckedOut, s, e, s, e));
        assert!(!booking_blocks(BookingStatus::Confirmed, s, e, s, e));
    }
}
