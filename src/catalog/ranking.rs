//! Pet popularity rating and the default catalog order.
//!
//! The two are deliberately unrelated: listings are ordered by the raw
//! favorites counter, while the rating is a separate weighted display value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The four engagement counters of a pet. `None` means "never recorded",
/// which is not the same as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounters {
    pub in_favorites: Option<u32>,
    pub take_a_home: Option<u32>,
    pub take_a_walk: Option<u32>,
    pub visit_counter: Option<u32>,
}

/// Rating was requested for a pet with at least one unrecorded counter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rating needs every engagement counter, missing: {}", .missing.join(", "))]
pub struct MissingCounterError {
    pub missing: Vec<&'static str>,
}

impl EngagementCounters {
    pub fn new(in_favorites: u32, take_a_home: u32, take_a_walk: u32, visit_counter: u32) -> Self {
        Self {
            in_favorites: Some(in_favorites),
            take_a_home: Some(take_a_home),
            take_a_walk: Some(take_a_walk),
            visit_counter: Some(visit_counter),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            ("in_favorites", self.in_favorites),
            ("take_a_home", self.take_a_home),
            ("take_a_walk", self.take_a_walk),
            ("visit_counter", self.visit_counter),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_none().then_some(name))
        .collect()
    }
}

/// `floor(0.3 F + 0.2 H + 0.2 W + 0.3 V)`.
///
/// Evaluated in integers as `(3F + 2H + 2W + 3V) / 10`, which is the exact
/// floor and cannot overflow: the result never exceeds `u32::MAX`.
pub fn rating(counters: &EngagementCounters) -> Result<u32, MissingCounterError> {
    match (
        counters.in_favorites,
        counters.take_a_home,
        counters.take_a_walk,
        counters.visit_counter,
    ) {
        (Some(f), Some(h), Some(w), Some(v)) => {
            let weighted = 3 * u64::from(f) + 2 * u64::from(h) + 2 * u64::from(w) + 3 * u64::from(v);
            Ok((weighted / 10) as u32)
        }
        _ => Err(MissingCounterError {
            missing: counters.missing(),
        }),
    }
}

/// Anything that can be placed in the catalog listing.
pub trait Ranked {
    fn id(&self) -> i64;
    fn counters(&self) -> EngagementCounters;
}

/// Default listing order: ascending by raw favorites, unrecorded first,
/// ties broken by id.
pub fn catalog_order<T: Ranked>(a: &T, b: &T) -> Ordering {
    (a.counters().in_favorites, a.id()).cmp(&(b.counters().in_favorites, b.id()))
}

pub fn sort_catalog<T: Ranked>(items: &mut [T]) {
    items.sort_by(catalog_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Entry {
        id: i64,
        counters: EngagementCounters,
    }

    impl Ranked for Entry {
        fn id(&self) -> i64 {
            self.id
        }

        fn counters(&self) -> EngagementCounters {
            self.counters
        }
    }

    #[test]
    fn test_rating_of_equal_counters() {
        assert_eq!(rating(&EngagementCounters::new(10, 10, 10, 10)), Ok(10));
    }

    #[test]
    fn test_rating_truncates() {
        // 0.3 + 0.2 + 0.2 + 0.3 = 1.0, 0.3 * 3 = 0.9
        assert_eq!(rating(&EngagementCounters::new(1, 1, 1, 1)), Ok(1));
        assert_eq!(rating(&EngagementCounters::new(3, 0, 0, 0)), Ok(0));
        assert_eq!(rating(&EngagementCounters::new(0, 4, 0, 0)), Ok(0));
        assert_eq!(rating(&EngagementCounters::new(0, 5, 0, 0)), Ok(1));
    }

    #[test]
    fn test_rating_all_zero_is_zero() {
        assert_eq!(rating(&EngagementCounters::new(0, 0, 0, 0)), Ok(0));
    }

    #[test]
    fn test_missing_counter_is_an_error_not_zero() {
        let counters = EngagementCounters {
            in_favorites: Some(10),
            take_a_home: None,
            take_a_walk: Some(10),
            visit_counter: None,
        };

        let err = rating(&counters).unwrap_err();
        assert_eq!(err.missing, vec!["take_a_home", "visit_counter"]);
        assert!(err.to_string().contains("take_a_home"));
    }

    #[test]
    fn test_all_counters_missing() {
        let err = rating(&EngagementCounters::default()).unwrap_err();
        assert_eq!(err.missing.len(), 4);
    }

    #[test]
    fn test_rating_at_counter_limits() {
        let max = u32::MAX;
        assert_eq!(rating(&EngagementCounters::new(max, max, max, max)), Ok(max));
    }

    #[test]
    fn test_catalog_order_diverges_from_rating_order() {
        // favorites 1 but huge visits: highest rating, still listed first
        let mut items = vec![
            Entry { id: 1, counters: EngagementCounters::new(50, 0, 0, 0) },
            Entry { id: 2, counters: EngagementCounters::new(1, 0, 0, 1000) },
            Entry { id: 3, counters: EngagementCounters::new(20, 0, 0, 0) },
        ];

        sort_catalog(&mut items);

        let ids: Vec<i64> = items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let ratings: Vec<u32> = items.iter().map(|e| rating(&e.counters).unwrap()).collect();
        assert_eq!(ratings, vec![300, 6, 15]);
    }

    #[test]
    fn test_unrecorded_favorites_sort_first_and_ties_by_id() {
        let mut items = vec![
            Entry { id: 5, counters: EngagementCounters::new(2, 0, 0, 0) },
            Entry { id: 4, counters: EngagementCounters::default() },
            Entry { id: 3, counters: EngagementCounters::new(2, 0, 0, 0) },
        ];

        sort_catalog(&mut items);

        let ids: Vec<i64> = items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 3, 5]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Integer evaluation agrees with the decimal formula.
        #[test]
        fn rating_matches_weighted_sum(
            f in 0u32..1_000_000,
            h in 0u32..1_000_000,
            w in 0u32..1_000_000,
            v in 0u32..1_000_000,
        ) {
            let counters = EngagementCounters::new(f, h, w, v);
            let tenths = 3 * u64::from(f) + 2 * u64::from(h) + 2 * u64::from(w) + 3 * u64::from(v);
            let got = rating(&counters).unwrap();

            prop_assert!(u64::from(got) * 10 <= tenths);
            prop_assert!(tenths < (u64::from(got) + 1) * 10);
            prop_assert_eq!(rating(&counters).unwrap(), got);
        }

        /// Sorted listings are non-decreasing by favorites whatever the ratings.
        #[test]
        fn sorted_catalog_is_non_decreasing_by_favorites(
            favs in proptest::collection::vec(proptest::option::of(0u32..100), 0..30),
            visits in proptest::collection::vec(0u32..10_000, 30),
        ) {
            let mut items: Vec<Entry> = favs
                .iter()
                .enumerate()
                .map(|(i, fav)| Entry {
                    id: i as i64,
                    counters: EngagementCounters {
                        in_favorites: *fav,
                        take_a_home: Some(0),
                        take_a_walk: Some(0),
                        visit_counter: Some(visits[i]),
                    },
                })
                .collect();

            sort_catalog(&mut items);

            for pair in items.windows(2) {
                prop_assert!(pair[0].counters.in_favorites <= pair[1].counters.in_favorites);
            }
        }
    }
}
