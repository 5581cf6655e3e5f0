use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::expenses::repo::Expense;
use crate::validate;

/// Fixed expense category set, stored as the `expense_category` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "expense_category", rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Leisure,
    Electronics,
    Utilities,
    Clothing,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Leisure,
        Category::Electronics,
        Category::Utilities,
        Category::Clothing,
        Category::Health,
        Category::Other,
    ];
}

impl FromStr for Category {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "groceries" => Ok(Category::Groceries),
            "leisure" => Ok(Category::Leisure),
            "electronics" => Ok(Category::Electronics),
            "utilities" => Ok(Category::Utilities),
            "clothing" => Ok(Category::Clothing),
            "health" => Ok(Category::Health),
            "other" => Ok(Category::Other),
            other => Err(ApiError::Validation(format!("unknown category: {other}"))),
        }
    }
}

/// Relative time-window unit; counts are whole days per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Day,
    Week,
    Month,
    Year,
}

impl TimePeriod {
    pub fn days(self) -> i64 {
        match self {
            TimePeriod::Day => 1,
            TimePeriod::Week => 7,
            TimePeriod::Month => 30,
            TimePeriod::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Amount,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl OrderBy {
    pub fn column(self) -> &'static str {
        match self {
            OrderBy::Amount => "amount",
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Listing parameters as they arrive on the query string.
///
/// `categories` is a comma-separated list; absent means all categories while
/// an explicitly empty value selects none.
#[derive(Debug, Deserialize)]
pub struct ExpenseFilter {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub period: Option<TimePeriod>,
    pub n_periods: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub categories: Option<String>,
}

fn default_limit() -> i64 {
    100
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            period: None,
            n_periods: None,
            start_date: None,
            end_date: None,
            order_by: OrderBy::default(),
            sort_order: SortOrder::default(),
            categories: None,
        }
    }
}

/// Time predicate after precedence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    All,
    Since(OffsetDateTime),
    Between(OffsetDateTime, OffsetDateTime),
}

/// Validated filter, ready to be turned into SQL.
#[derive(Debug, Clone)]
pub struct ResolvedFilter {
    pub categories: Vec<Category>,
    pub window: TimeWindow,
    pub order_by: OrderBy,
    pub sort_order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

impl ExpenseFilter {
    /// Validates the raw parameters against the clock passed in. A relative
    /// window (period and count both present) takes precedence over an
    /// explicit date range; with neither, all time matches.
    pub fn resolve(&self, now: OffsetDateTime) -> Result<ResolvedFilter, ApiError> {
        if self.skip < 0 || !(1..=500).contains(&self.limit) {
            return Err(ApiError::Validation(
                "skip must be non-negative and limit between 1 and 500".into(),
            ));
        }

        if let Some(n) = self.n_periods {
            if n <= 0 {
                return Err(ApiError::Validation("n_periods must be positive".into()));
            }
        }

        let window = match (self.period, self.n_periods, self.start_date, self.end_date) {
            (Some(period), Some(n), _, _) => {
                // Checked all the way down: a huge count must surface as a
                // validation error, not an arithmetic panic.
                let threshold = n
                    .checked_mul(period.days())
                    .and_then(|days| days.checked_mul(86_400))
                    .map(Duration::seconds)
                    .and_then(|span| now.checked_sub(span))
                    .ok_or_else(|| {
                        ApiError::Validation("time window is out of range".into())
                    })?;
                TimeWindow::Since(threshold)
            }
            (_, _, Some(start), Some(end)) => {
                if start > end {
                    return Err(ApiError::Validation(
                        "start date must be before end date".into(),
                    ));
                }
                TimeWindow::Between(start, end)
            }
            _ => TimeWindow::All,
        };

        let categories = match &self.categories {
            None => Category::ALL.to_vec(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Category::from_str)
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(ResolvedFilter {
            categories,
            window,
            order_by: self.order_by,
            sort_order: self.sort_order,
            skip: self.skip,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Category,
}

impl CreateExpenseRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate::validate_title(&self.title)?;
        if let Some(description) = &self.description {
            validate::validate_description(description)?;
        }
        validate::validate_amount(self.amount)
    }
}

/// Typed patch; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<Category>,
}

impl UpdateExpenseRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            validate::validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate::validate_description(description)?;
        }
        if let Some(amount) = self.amount {
            validate::validate_amount(amount)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ExpensePublic {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Category,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub owner_id: Uuid,
}

impl From<Expense> for ExpensePublic {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            amount: e.amount,
            category: e.category,
            created_at: e.created_at,
            updated_at: e.updated_at,
            owner_id: e.owner_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpensesResponse {
    pub data: Vec<ExpensePublic>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn now() -> OffsetDateTime {
        datetime!(2024-06-15 12:00:00 UTC)
    }

    #[test]
    fn default_filter_is_all_time_all_categories() {
        let f: ExpenseFilter = serde_json::from_str("{}").unwrap();
        let resolved = f.resolve(now()).unwrap();
        assert_eq!(resolved.window, TimeWindow::All);
        assert_eq!(resolved.categories, Category::ALL.to_vec());
        assert_eq!(resolved.skip, 0);
        assert_eq!(resolved.limit, 100);
        assert_eq!(resolved.order_by, OrderBy::CreatedAt);
        assert_eq!(resolved.sort_order, SortOrder::Asc);
    }

    #[test]
    fn relative_window_computes_day_threshold() {
        let filter = ExpenseFilter {
            period: Some(TimePeriod::Week),
            n_periods: Some(1),
            ..Default::default()
        };
        let resolved = filter.resolve(now()).unwrap();
        let TimeWindow::Since(threshold) = resolved.window else {
            panic!("expected a relative window");
        };
        assert_eq!(threshold, now() - Duration::days(7));
        // One week back: a ten-day-old expense falls outside, a one-day-old inside.
        assert!(now() - Duration::days(10) < threshold);
        assert!(now() - Duration::days(1) >= threshold);
    }

    #[test]
    fn relative_window_takes_precedence_over_dates() {
        let filter = ExpenseFilter {
            period: Some(TimePeriod::Day),
            n_periods: Some(3),
            start_date: Some(datetime!(2024-01-01 00:00:00 UTC)),
            end_date: Some(datetime!(2024-02-01 00:00:00 UTC)),
            ..Default::default()
        };
        let resolved = filter.resolve(now()).unwrap();
        assert_eq!(resolved.window, TimeWindow::Since(now() - Duration::days(3)));
    }

    #[test]
    fn explicit_range_is_inclusive_and_validated() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let end = datetime!(2024-02-01 00:00:00 UTC);
        let filter = ExpenseFilter {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        };
        assert_eq!(
            filter.resolve(now()).unwrap().window,
            TimeWindow::Between(start, end)
        );

        let backwards = ExpenseFilter {
            start_date: Some(end),
            end_date: Some(start),
            ..Default::default()
        };
        assert!(matches!(
            backwards.resolve(now()),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn equal_start_and_end_is_a_valid_range() {
        let day = datetime!(2024-03-03 00:00:00 UTC);
        let filter = ExpenseFilter {
            start_date: Some(day),
            end_date: Some(day),
            ..Default::default()
        };
        assert_eq!(
            filter.resolve(now()).unwrap().window,
            TimeWindow::Between(day, day)
        );
    }

    #[test]
    fn period_without_count_is_ignored() {
        let filter = ExpenseFilter {
            period: Some(TimePeriod::Month),
            ..Default::default()
        };
        assert_eq!(filter.resolve(now()).unwrap().window, TimeWindow::All);
    }

    #[test]
    fn oversized_relative_window_is_rejected() {
        // Counts large enough to overflow the day arithmetic must fail
        // cleanly instead of panicking.
        for n in [i64::MAX, 100_000_000_000] {
            let filter = ExpenseFilter {
                period: Some(TimePeriod::Year),
                n_periods: Some(n),
                ..Default::default()
            };
            assert!(matches!(
                filter.resolve(now()),
                Err(ApiError::Validation(_))
            ));
        }
    }

    #[test]
    fn n_periods_must_be_positive() {
        let filter = ExpenseFilter {
            period: Some(TimePeriod::Day),
            n_periods: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            filter.resolve(now()),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn categories_parse_from_comma_list() {
        let filter = ExpenseFilter {
            categories: Some("groceries, health".into()),
            ..Default::default()
        };
        let resolved = filter.resolve(now()).unwrap();
        assert_eq!(
            resolved.categories,
            vec![Category::Groceries, Category::Health]
        );
    }

    #[test]
    fn empty_categories_means_none_not_all() {
        let filter = ExpenseFilter {
            categories: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.resolve(now()).unwrap().categories.is_empty());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let filter = ExpenseFilter {
            categories: Some("groceries,travel".into()),
            ..Default::default()
        };
        assert!(matches!(
            filter.resolve(now()),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn pagination_bounds() {
        let negative_skip = ExpenseFilter {
            skip: -1,
            ..Default::default()
        };
        assert!(negative_skip.resolve(now()).is_err());

        let zero_limit = ExpenseFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(zero_limit.resolve(now()).is_err());

        let oversized = ExpenseFilter {
            limit: 501,
            ..Default::default()
        };
        assert!(oversized.resolve(now()).is_err());
    }

    #[test]
    fn period_units_in_days() {
        assert_eq!(TimePeriod::Day.days(), 1);
        assert_eq!(TimePeriod::Week.days(), 7);
        assert_eq!(TimePeriod::Month.days(), 30);
        assert_eq!(TimePeriod::Year.days(), 365);
    }

    #[test]
    fn create_request_validation() {
        let valid = CreateExpenseRequest {
            title: "coffee".into(),
            description: None,
            amount: 3.5,
            category: Category::Groceries,
        };
        assert!(valid.validate().is_ok());

        let bad_amount = CreateExpenseRequest {
            amount: 0.0,
            ..valid_clone(&valid)
        };
        assert!(bad_amount.validate().is_err());

        let bad_title = CreateExpenseRequest {
            title: String::new(),
            ..valid_clone(&valid)
        };
        assert!(bad_title.validate().is_err());
    }

    fn valid_clone(r: &CreateExpenseRequest) -> CreateExpenseRequest {
        CreateExpenseRequest {
            title: r.title.clone(),
            description: r.description.clone(),
            amount: r.amount,
            category: r.category,
        }
    }
}
