//! Orbit requirement derivation
//!
//! Turns a batch of parsed products, or a set of explicit dates, into a
//! deduplicated set of [`RequirementKey`]s. Deduplication happens here, before
//! any network query, which guarantees at most one resolution attempt per
//! distinct (mission, date) pair per invocation.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::warn;

use crate::app::models::{Mission, RequirementKey, TypePreference};
use crate::app::products::Product;
use crate::constants::orbit;
use crate::errors::{ParseError, ParseResult};

/// Derive requirement keys from parsed products
///
/// Each product contributes its start time shifted back by the fixed
/// [`orbit::PRODUCT_DATE_MARGIN_DAYS`] margin, truncated to a UTC calendar
/// date. Products sharing a mission and margin-shifted day collapse to one
/// key.
pub fn from_products<'a, I>(products: I, preference: TypePreference) -> BTreeSet<RequirementKey>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .map(|product| {
            let reference =
                (product.start_time() - Duration::days(orbit::PRODUCT_DATE_MARGIN_DAYS)).date();
            RequirementKey::new(product.mission, reference, preference)
        })
        .collect()
}

/// Derive requirement keys from explicit dates
///
/// Dates are used as-is. With no mission filter, every supported mission is
/// requested for each date.
pub fn from_dates<'a, I>(
    dates: I,
    missions: &[Mission],
    preference: TypePreference,
) -> BTreeSet<RequirementKey>
where
    I: IntoIterator<Item = &'a NaiveDate>,
{
    let missions: &[Mission] = if missions.is_empty() {
        &Mission::ALL
    } else {
        missions
    };

    dates
        .into_iter()
        .flat_map(|&date| {
            missions
                .iter()
                .map(move |&mission| RequirementKey::new(mission, date, preference))
        })
        .collect()
}

/// Resolve mission filter strings, dropping unrecognized codes with a warning
pub fn missions_from_filters(filters: &[String]) -> Vec<Mission> {
    let mut missions = Vec::new();
    for filter in filters {
        match Mission::parse(filter) {
            Ok(mission) => {
                if !missions.contains(&mission) {
                    missions.push(mission);
                }
            }
            Err(_) => warn!("Dropping unrecognized mission filter: {}", filter),
        }
    }
    missions
}

/// Parse a user-supplied date in compact (`20180503`) or dashed
/// (`2018-05-03`) form
pub fn parse_date(value: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| ParseError::InvalidTimestamp {
            name: "date argument".to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_product_reference_date_shifted_by_margin() {
        let product = Product::parse(
            "S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70.zip",
        )
        .unwrap();

        let keys = from_products([&product], TypePreference::default());
        assert_eq!(keys.len(), 1);

        let key = keys.iter().next().unwrap();
        assert_eq!(key.mission, Mission::S1A);
        assert_eq!(key.date, date(2018, 4, 7));
    }

    #[test]
    fn test_same_day_products_collapse_to_one_key() {
        // Two acquisitions hours apart on the same margin-shifted day
        let early = Product::parse(
            "S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70",
        )
        .unwrap();
        let late = Product::parse(
            "S1A_IW_SLC__1SDV_20180408T171200_20180408T171230_021379_024CDD_AB12",
        )
        .unwrap();
        let other_mission = Product::parse(
            "S1B_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70",
        )
        .unwrap();

        let keys = from_products([&early, &late, &other_mission], TypePreference::default());
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_explicit_date_fans_out_to_all_missions() {
        let dates = [date(2018, 5, 3)];
        let keys = from_dates(&dates, &[], TypePreference::default());

        assert_eq!(keys.len(), Mission::ALL.len());
        assert!(keys.iter().all(|k| k.date == date(2018, 5, 3)));
    }

    #[test]
    fn test_explicit_date_with_mission_filter() {
        let dates = [date(2018, 5, 3), date(2018, 5, 4)];
        let keys = from_dates(&dates, &[Mission::S1B], TypePreference::default());

        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.mission == Mission::S1B));
    }

    #[test]
    fn test_product_and_date_paths_produce_identical_keys() {
        let product = Product::parse(
            "S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70",
        )
        .unwrap();

        let from_product = from_products([&product], TypePreference::default());
        let from_date = from_dates(
            &[date(2018, 4, 7)],
            &[Mission::S1A],
            TypePreference::default(),
        );

        assert_eq!(from_product, from_date);
    }

    #[test]
    fn test_mission_filters_drop_unknown() {
        let filters = vec![
            "s1a".to_string(),
            "S1X".to_string(),
            "S1A".to_string(),
            "S1B".to_string(),
        ];
        let missions = missions_from_filters(&filters);
        assert_eq!(missions, vec![Mission::S1A, Mission::S1B]);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("20180503").unwrap(), date(2018, 5, 3));
        assert_eq!(parse_date("2018-05-03").unwrap(), date(2018, 5, 3));
        assert!(parse_date("03/05/2018").is_err());
        assert!(parse_date("20181350").is_err());
    }
}
