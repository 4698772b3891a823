//! Filter/predicate engine for listing and history queries.
//!
//! Callers describe bounds with the typed filter structs below. Each filter
//! lowers to an ordered list of [`Predicate`] terms over logical [`Field`]s;
//! storage adapters translate the terms into their own query language and
//! AND them together. An unset bound contributes no term.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{Result, StoreError};
use crate::models::{CampaignStatus, InvoiceStatus, RechargeStatus};

/// Logical column a predicate constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Creation / request / occurrence timestamp of the row.
    Timestamp,
    /// Campaign window start date.
    StartDate,
    /// Campaign window end date.
    EndDate,
    /// Monetary amount in minor units.
    Amount,
    /// Lifecycle status.
    Status,
    /// Owning campaign of an event.
    CampaignId,
}

/// Comparison applied by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
}

/// Typed predicate operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Int(i64),
    Text(String),
}

/// One typed term of a conjunctive filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: Field,
    pub op: Op,
    pub operand: Operand,
}

impl Predicate {
    pub fn new(field: Field, op: Op, operand: Operand) -> Self {
        Self { field, op, operand }
    }
}

/// Anything that lowers into predicate terms.
pub trait ToPredicates {
    fn predicates(&self) -> Vec<Predicate>;
}

/// Start of a calendar day in UTC.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Last representable instant of a calendar day at storage precision.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    day.and_time(last).and_utc()
}

/// Inclusive calendar date range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// No constraint.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Both ends set. Fails when `end` precedes `start`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(Some(start), Some(end))
    }

    /// Optional ends. Fails when both are set and `end` precedes `start`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(StoreError::invalid(format!(
                    "end date {e} is before start date {s}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Timestamp terms with the end bound widened to end-of-day.
    fn timestamp_terms(&self) -> Vec<Predicate> {
        let mut terms = Vec::with_capacity(2);
        if let Some(start) = self.start {
            terms.push(Predicate::new(
                Field::Timestamp,
                Op::Gte,
                Operand::Timestamp(start_of_day(start)),
            ));
        }
        if let Some(end) = self.end {
            terms.push(Predicate::new(
                Field::Timestamp,
                Op::Lte,
                Operand::Timestamp(end_of_day(end)),
            ));
        }
        terms
    }
}

/// Inclusive amount bounds in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmountRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl AmountRange {
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Recharge history filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RechargeFilter {
    pub dates: DateRange,
    pub amount: AmountRange,
    pub status: Option<RechargeStatus>,
}

impl ToPredicates for RechargeFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut terms = Vec::new();
        if let Some(status) = self.status {
            terms.push(status_term(status.as_str()));
        }
        terms.extend(self.dates.timestamp_terms());
        if let Some(min) = self.amount.min {
            terms.push(Predicate::new(Field::Amount, Op::Gte, Operand::Int(min)));
        }
        if let Some(max) = self.amount.max {
            terms.push(Predicate::new(Field::Amount, Op::Lte, Operand::Int(max)));
        }
        terms
    }
}

/// Campaign listing filter. The date range bounds the campaign window itself:
/// campaigns starting on/after `start` and ending on/before `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignFilter {
    pub dates: DateRange,
    pub status: Option<CampaignStatus>,
}

impl ToPredicates for CampaignFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut terms = Vec::new();
        if let Some(status) = self.status {
            terms.push(status_term(status.as_str()));
        }
        if let Some(start) = self.dates.start() {
            terms.push(Predicate::new(Field::StartDate, Op::Gte, Operand::Date(start)));
        }
        if let Some(end) = self.dates.end() {
            terms.push(Predicate::new(Field::EndDate, Op::Lte, Operand::Date(end)));
        }
        terms
    }
}

/// Invoice request listing filter (bounds the request timestamp).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub dates: DateRange,
    pub status: Option<InvoiceStatus>,
}

impl ToPredicates for InvoiceFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut terms = Vec::new();
        if let Some(status) = self.status {
            terms.push(status_term(status.as_str()));
        }
        terms.extend(self.dates.timestamp_terms());
        terms
    }
}

/// Performance summary filter (bounds the event timestamp).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceFilter {
    pub dates: DateRange,
    pub campaign_id: Option<i64>,
}

impl ToPredicates for PerformanceFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut terms = self.dates.timestamp_terms();
        if let Some(campaign_id) = self.campaign_id {
            terms.push(Predicate::new(
                Field::CampaignId,
                Op::Eq,
                Operand::Int(campaign_id),
            ));
        }
        terms
    }
}

fn status_term(status: &str) -> Predicate {
    Predicate::new(Field::Status, Op::Eq, Operand::Text(status.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_empty_filter_has_no_terms() {
        assert!(RechargeFilter::default().predicates().is_empty());
        assert!(CampaignFilter::default().predicates().is_empty());
        assert!(InvoiceFilter::default().predicates().is_empty());
        assert!(PerformanceFilter::default().predicates().is_empty());
    }

    #[test]
    fn test_end_date_expands_to_last_instant() {
        let end = end_of_day(day(4));
        assert_eq!(end.date_naive(), day(4));
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
        assert_eq!(end.second(), 59);
        assert_eq!(end.nanosecond(), 999_999_000);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(DateRange::between(day(5), day(4)).is_err());
        assert!(DateRange::between(day(4), day(4)).is_ok());
        assert!(DateRange::new(None, Some(day(1))).is_ok());
    }

    #[test]
    fn test_recharge_filter_terms() {
        let filter = RechargeFilter {
            dates: DateRange::between(day(1), day(3)).unwrap(),
            amount: AmountRange::between(1000, 5000),
            status: Some(RechargeStatus::Success),
        };
        let terms = filter.predicates();
        assert_eq!(terms.len(), 5);
        assert_eq!(
            terms[0],
            Predicate::new(Field::Status, Op::Eq, Operand::Text("Success".into()))
        );
        assert_eq!(
            terms[1],
            Predicate::new(
                Field::Timestamp,
                Op::Gte,
                Operand::Timestamp(start_of_day(day(1)))
            )
        );
        assert_eq!(
            terms[2],
            Predicate::new(
                Field::Timestamp,
                Op::Lte,
                Operand::Timestamp(end_of_day(day(3)))
            )
        );
        assert_eq!(terms[3], Predicate::new(Field::Amount, Op::Gte, Operand::Int(1000)));
        assert_eq!(terms[4], Predicate::new(Field::Amount, Op::Lte, Operand::Int(5000)));
    }

    #[test]
    fn test_single_sided_amount_bound() {
        let filter = RechargeFilter {
            amount: AmountRange {
                min: None,
                max: Some(200),
            },
            ..Default::default()
        };
        assert_eq!(
            filter.predicates(),
            vec![Predicate::new(Field::Amount, Op::Lte, Operand::Int(200))]
        );
    }

    #[test]
    fn test_campaign_filter_bounds_window_columns() {
        let filter = CampaignFilter {
            dates: DateRange::between(day(2), day(9)).unwrap(),
            status: None,
        };
        assert_eq!(
            filter.predicates(),
            vec![
                Predicate::new(Field::StartDate, Op::Gte, Operand::Date(day(2))),
                Predicate::new(Field::EndDate, Op::Lte, Operand::Date(day(9))),
            ]
        );
    }

    #[test]
    fn test_performance_filter_campaign_term() {
        let filter = PerformanceFilter {
            dates: DateRange::unbounded(),
            campaign_id: Some(42),
        };
        assert_eq!(
            filter.predicates(),
            vec![Predicate::new(Field::CampaignId, Op::Eq, Operand::Int(42))]
        );
    }
}
