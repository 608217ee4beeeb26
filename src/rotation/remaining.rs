use uuid::Uuid;

use super::pool::{is_other, Category, Pool};
use crate::records::Record;

/// Working pool for `scheme_id`: the original pool minus every dish already
/// served under that scheme. Records of other schemes are ignored and an
/// emptied category is returned as-is; resets happen at draw/consume time.
pub fn compute_remaining_pool(original: &Pool, records: &[Record], scheme_id: Uuid) -> Pool {
    let mut remaining = original.clone();
    for record in records.iter().filter(|r| r.scheme_id == scheme_id) {
        for (category, dish) in record.meals.iter() {
            if is_other(dish) {
                continue;
            }
            remaining.remove_one(category, dish);
        }
    }
    remaining
}

/// Categories of `pool` with nothing left to draw.
pub(super) fn exhausted(pool: &Pool) -> impl Iterator<Item = Category> + '_ {
    Category::ALL.into_iter().filter(|c| pool.get(*c).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::MealSet;
    use time::{macros::date, Date, OffsetDateTime};

    fn record(date: Date, scheme_id: Uuid, meals: MealSet) -> Record {
        Record {
            id: Uuid::new_v4(),
            date,
            scheme_id,
            scheme_name: "test".into(),
            meals,
            note: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn subtracts_served_dishes_of_the_active_scheme() {
        let scheme = Uuid::new_v4();
        let original = Pool::new(["a1", "a2"], ["b1", "b2"], ["c1"]);
        let records = vec![record(date!(2024 - 01 - 01), scheme, MealSet::new("a1", "b2", "c1"))];

        let remaining = compute_remaining_pool(&original, &records, scheme);

        assert_eq!(remaining, Pool::new(["a2"], ["b1"], Vec::<&str>::new()));
        assert_eq!(exhausted(&remaining).collect::<Vec<_>>(), vec![Category::C]);
    }

    #[test]
    fn ignores_records_of_other_schemes_even_on_same_dates() {
        let scheme = Uuid::new_v4();
        let other_scheme = Uuid::new_v4();
        let original = Pool::new(["a1", "a2"], ["b1"], ["c1"]);
        let records = vec![
            record(date!(2024 - 01 - 01), other_scheme, MealSet::new("a1", "b1", "c1")),
            record(date!(2024 - 01 - 02), other_scheme, MealSet::new("a2", "b1", "c1")),
        ];

        assert_eq!(compute_remaining_pool(&original, &records, scheme), original);
    }

    #[test]
    fn ad_hoc_and_unknown_dishes_leave_pool_untouched() {
        let scheme = Uuid::new_v4();
        let original = Pool::new(["a1"], ["b1"], ["c1"]);
        let records = vec![record(
            date!(2024 - 01 - 01),
            scheme,
            MealSet::new("other", "other:street food", "not-in-pool"),
        )];

        assert_eq!(compute_remaining_pool(&original, &records, scheme), original);
    }

    #[test]
    fn duplicates_are_consumed_one_occurrence_per_record() {
        let scheme = Uuid::new_v4();
        let original = Pool::new(["rice", "rice", "noodles"], ["b1"], ["c1"]);
        let records = vec![record(date!(2024 - 01 - 01), scheme, MealSet::new("rice", "x", "y"))];

        let remaining = compute_remaining_pool(&original, &records, scheme);

        assert_eq!(remaining.a, vec!["rice", "noodles"]);
    }
}
