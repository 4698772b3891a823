//! Shared storage helper functions.
//!
//! Timestamp/date encoding, status decoding and predicate translation used
//! by the SQLite adapters.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sea_query::{Condition, Expr, Value};

use crate::error::{Result, StoreError};
use crate::filter::{Field, Op, Operand, Predicate};
use crate::models::UnknownStatus;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode a timestamp as fixed-width RFC3339 UTC text (microseconds, `Z`).
///
/// Fixed width keeps lexical order equal to chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time, encoded for storage.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Decode a stored RFC3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Integrity(format!("invalid stored timestamp {raw:?}: {e}")))
}

/// Encode a calendar date as `YYYY-MM-DD`.
pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Decode a stored calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StoreError::Integrity(format!("invalid stored date {raw:?}: {e}")))
}

/// Decode a stored status column into its closed enumeration.
pub fn parse_status<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = UnknownStatus>,
{
    raw.parse::<T>()
        .map_err(|e| StoreError::Integrity(e.to_string()))
}

/// Optional text: empty strings are stored as NULL.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reject blank required text fields.
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn operand_value(operand: &Operand) -> Value {
    match operand {
        Operand::Timestamp(ts) => format_timestamp(*ts).into(),
        Operand::Date(day) => format_date(*day).into(),
        Operand::Int(n) => (*n).into(),
        Operand::Text(s) => s.clone().into(),
    }
}

/// Translate predicate terms into an AND-ed sea-query condition.
///
/// `column` maps each logical field onto the table being queried; a term on
/// a field the table does not have is rejected rather than ignored.
pub fn to_condition<F>(terms: &[Predicate], column: F) -> Result<Condition>
where
    F: Fn(Field) -> Option<Expr>,
{
    let mut condition = Condition::all();
    for term in terms {
        let col = column(term.field).ok_or_else(|| {
            StoreError::invalid(format!("filter on {:?} is not supported here", term.field))
        })?;
        let value = operand_value(&term.operand);
        let expr = match term.op {
            Op::Eq => col.eq(value),
            Op::Gte => col.gte(value),
            Op::Lte => col.lte(value),
        };
        condition = condition.add(expr);
    }
    Ok(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_query::{Alias, Query, SqliteQueryBuilder};

    #[test]
    fn test_timestamp_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(120);
        let fa = format_timestamp(a);
        let fb = format_timestamp(b);
        assert_eq!(fa, "2026-01-02T03:04:05.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_timestamp(&fb).unwrap(), b);
    }

    #[test]
    fn test_date_round_trip() {
        let day = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert_eq!(format_date(day), "2026-07-01");
        assert_eq!(parse_date("2026-07-01").unwrap(), day);
        assert!(parse_date("07/01/2026").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" TX-1 "), Some("TX-1".to_string()));
    }

    #[test]
    fn test_condition_rendering() {
        let terms = vec![
            Predicate::new(Field::Status, Op::Eq, Operand::Text("Success".into())),
            Predicate::new(Field::Amount, Op::Gte, Operand::Int(1000)),
        ];
        let condition = to_condition(&terms, |field| match field {
            Field::Status => Some(Expr::col(Alias::new("status"))),
            Field::Amount => Some(Expr::col(Alias::new("amount"))),
            _ => None,
        })
        .unwrap();
        let sql = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("t"))
            .cond_where(condition)
            .to_string(SqliteQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "id" FROM "t" WHERE "status" = 'Success' AND "amount" >= 1000"#
        );
    }

    #[test]
    fn test_unmapped_field_rejected() {
        let terms = vec![Predicate::new(Field::CampaignId, Op::Eq, Operand::Int(1))];
        assert!(to_condition(&terms, |_| None).is_err());
    }
}
