use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::Date;

use super::dto::StatsQuery;
use crate::dates::{format_date, parse_date};
use crate::error::AppError;
use crate::records::Record;
use crate::rotation::{Category, PoolSizes};
use crate::storage::MealStore;

const TOP_DISHES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
}

impl Granularity {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(AppError::validation(format!("unknown granularity: {other}"))),
        }
    }

    fn bucket(&self, date: Date) -> String {
        match self {
            Self::Day => format_date(date),
            Self::Week => {
                let monday = date
                    .checked_sub(time::Duration::days(
                        date.weekday().number_days_from_monday() as i64,
                    ))
                    .unwrap_or(date);
                format_date(monday)
            }
            Self::Month => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishCount {
    pub name: String,
    pub group: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_days: usize,
    pub total_records: usize,
    pub meals_by_group: PoolSizes,
    pub top_dishes: Vec<DishCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DishFrequency {
    pub name: String,
    pub group: Category,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frequency {
    pub by_group: PoolSizes,
    pub by_dish: Vec<DishFrequency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub total_meals: usize,
    pub unique_dishes: usize,
    pub breakdown: PoolSizes,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub overview: Overview,
    pub frequency: Frequency,
    pub time_granularity: Granularity,
    pub trends: Vec<TrendPoint>,
}

fn count_by_group(records: &[Record]) -> PoolSizes {
    // every record carries exactly one dish per category
    let n = records.len();
    PoolSizes { a: n, b: n, c: n }
}

/// Dish counts keyed by (category, dish), most frequent first, ties by name.
fn dish_counts(records: &[Record]) -> Vec<DishCount> {
    let mut counts: HashMap<(Category, &str), usize> = HashMap::new();
    for record in records {
        for (category, dish) in record.meals.iter() {
            *counts.entry((category, dish)).or_default() += 1;
        }
    }
    let mut out: Vec<DishCount> = counts
        .into_iter()
        .map(|((group, name), count)| DishCount {
            name: name.to_string(),
            group,
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

pub fn overview(records: &[Record]) -> Overview {
    let mut top = dish_counts(records);
    top.truncate(TOP_DISHES);
    Overview {
        total_days: records.iter().map(|r| r.date).collect::<HashSet<_>>().len(),
        total_records: records.len(),
        meals_by_group: count_by_group(records),
        top_dishes: top,
    }
}

pub fn frequency(records: &[Record]) -> Frequency {
    let total = records.len() * Category::ALL.len();
    let by_dish = dish_counts(records)
        .into_iter()
        .map(|d| DishFrequency {
            percentage: if total == 0 {
                0.0
            } else {
                d.count as f64 * 100.0 / total as f64
            },
            name: d.name,
            group: d.group,
            count: d.count,
        })
        .collect();
    Frequency {
        by_group: count_by_group(records),
        by_dish,
    }
}

pub fn trends(records: &[Record], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(granularity.bucket(record.date))
            .or_default()
            .push(record);
    }
    buckets
        .into_iter()
        .map(|(date, recs)| {
            let unique: HashSet<(Category, &str)> =
                recs.iter().flat_map(|r| r.meals.iter()).collect();
            TrendPoint {
                date,
                total_meals: recs.len() * Category::ALL.len(),
                unique_dishes: unique.len(),
                breakdown: PoolSizes {
                    a: recs.len(),
                    b: recs.len(),
                    c: recs.len(),
                },
            }
        })
        .collect()
}

pub fn statistics(records: &[Record], granularity: Granularity) -> Statistics {
    Statistics {
        overview: overview(records),
        frequency: frequency(records),
        time_granularity: granularity,
        trends: trends(records, granularity),
    }
}

/// Loads the records a query selects and aggregates them.
pub async fn load_statistics(store: &dyn MealStore, q: StatsQuery) -> Result<Statistics, AppError> {
    let granularity = match q.granularity.as_deref() {
        Some(raw) => Granularity::parse(raw)?,
        None => Granularity::parse(&store.get_settings().await?.chart_granularity).unwrap_or_default(),
    };
    let range = match (q.start, q.end) {
        (Some(start), Some(end)) => Some((parse_date(&start)?, parse_date(&end)?)),
        (None, None) => None,
        _ => return Err(AppError::validation("start and end must be given together")),
    };
    let mut records = store.list_records(range).await?;
    if let Some(scheme_id) = q.scheme_id {
        records.retain(|r| r.scheme_id == scheme_id);
    }
    Ok(statistics(&records, granularity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::MealSet;
    use time::{macros::date, OffsetDateTime};
    use uuid::Uuid;

    fn record(date: Date, a: &str, b: &str, c: &str) -> Record {
        Record {
            id: Uuid::new_v4(),
            date,
            scheme_id: Uuid::nil(),
            scheme_name: "s".into(),
            meals: MealSet::new(a, b, c),
            note: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            // 2024-01-01 is a Monday
            record(date!(2024 - 01 - 01), "rice", "tofu", "soup"),
            record(date!(2024 - 01 - 03), "rice", "greens", "soup"),
            record(date!(2024 - 01 - 08), "noodles", "tofu", "other"),
            record(date!(2024 - 02 - 01), "rice", "tofu", "soup"),
        ]
    }

    #[test]
    fn overview_ranks_top_dishes() {
        let o = overview(&sample());
        assert_eq!(o.total_records, 4);
        assert_eq!(o.total_days, 4);
        assert_eq!(o.meals_by_group, PoolSizes { a: 4, b: 4, c: 4 });
        assert_eq!(o.top_dishes.len(), 5);
        assert_eq!(o.top_dishes[0].count, 3);
        assert_eq!(o.top_dishes[0].name, "rice");
        assert_eq!(o.top_dishes[0].group, Category::A);
    }

    #[test]
    fn frequency_percentages_sum_to_hundred() {
        let f = frequency(&sample());
        let sum: f64 = f.by_dish.iter().map(|d| d.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!(frequency(&[]).by_dish.is_empty());
    }

    #[test]
    fn trends_group_by_week_and_month() {
        let weekly = trends(&sample(), Granularity::Week);
        let keys: Vec<_> = weekly.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-08", "2024-01-29"]);
        assert_eq!(weekly[0].total_meals, 6);
        assert_eq!(weekly[0].unique_dishes, 4);

        let monthly = trends(&sample(), Granularity::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].date, "2024-01");
        assert_eq!(monthly[0].breakdown.a, 3);
    }

    #[tokio::test]
    async fn load_filters_by_range_and_scheme() {
        use crate::records::NewRecord;
        use crate::storage::MemoryStore;

        let store = MemoryStore::new();
        let other = Uuid::new_v4();
        for (i, rec) in sample().into_iter().enumerate() {
            store
                .create_record(NewRecord {
                    date: rec.date,
                    scheme_id: if i == 0 { other } else { Uuid::nil() },
                    scheme_name: rec.scheme_name,
                    meals: rec.meals,
                    note: None,
                })
                .await
                .unwrap();
        }

        let all = load_statistics(&store, StatsQuery::default()).await.unwrap();
        assert_eq!(all.overview.total_records, 4);
        assert_eq!(all.time_granularity, Granularity::Week);

        let january = load_statistics(
            &store,
            StatsQuery {
                start: Some("2024-01-01".into()),
                end: Some("2024-01-31".into()),
                scheme_id: Some(Uuid::nil()),
                granularity: Some("day".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(january.overview.total_records, 2);
        assert_eq!(january.trends.len(), 2);

        let half = StatsQuery {
            start: Some("2024-01-01".into()),
            ..StatsQuery::default()
        };
        assert!(matches!(
            load_statistics(&store, half).await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn granularity_parsing() {
        assert_eq!(Granularity::parse("day").unwrap(), Granularity::Day);
        assert!(Granularity::parse("year").is_err());
    }
}
