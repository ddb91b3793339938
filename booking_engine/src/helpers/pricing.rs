//! Price quoting for a stay.

use chrono::{DateTime, NaiveDate, Utc};
use hbg_common::Vnd;

use crate::db_types::Discount;

/// The number of nights between check-in and check-out, clamped to at least one. The quote for a
/// degenerate range is the quote for a single night; rejecting such ranges is the caller's job.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

/// Deterministic price for a stay: nightly price times nights, minus the discount when it is valid at
/// `at`, clamped at zero.
pub fn quote_price(nightly: Vnd, check_in: NaiveDate, check_out: NaiveDate, discount: Option<&Discount>, at: DateTime<Utc>) -> Vnd {
    let base = nightly * nights_between(check_in, check_out);
    match discount {
        Some(d) if d.is_valid_at(at) => d.apply_to(base),
        _ => base.or_zero(),
    }
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hbg_common::Vnd;

    use super::*;
    use crate::db_types::Discount;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn ten_percent() -> Discount {
        Discount {
            id: 1,
            code: "TENOFF".to_string(),
            percent: Some(10),
            value: None,
            start_date: None,
            end_date: None,
            active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn three_nights_with_ten_percent_off() {
        let price = quote_price(
            Vnd::from(500_000),
            d("2024-03-01"),
            d("2024-03-04"),
            Some(&ten_percent()),
            Utc::now(),
        );
        assert_eq!(price, Vnd::from(1_350_000));
    }

    #[test]
    fn degenerate_ranges_clamp_to_one_night() {
        assert_eq!(nights_between(d("2024-03-01"), d("2024-03-01")), 1);
        assert_eq!(nights_between(d("2024-03-04"), d("2024-03-01")), 1);
        let price = quote_price(Vnd::from(500_000), d("2024-03-01"), d("2024-03-01"), None, Utc::now());
        assert_eq!(price, Vnd::from(500_000));
    }

    #[test]
    fn expired_discount_is_ignored() {
        let mut d10 = ten_percent();
        d10.end_date = Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap());
        let price = quote_price(
            Vnd::from(500_000),
            d("2024-03-01"),
            d("2024-03-04"),
            Some(&d10),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(price, Vnd::from(1_500_000));
    }
}
