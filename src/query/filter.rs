//! Predicate builder
//!
//! Translates [`LogQuery`] arguments into a storage [`Predicate`] and
//! [`Ordering`]. Both functions are pure: equal arguments always produce
//! equal output, and every caller-supplied value is a bound parameter.

use crate::logs::LogRecord;
use crate::query::args::LogQuery;
use crate::query::error::{QueryError, QueryResult};
use crate::storage::{Column, Comparison, Ordering, Predicate, Schema, Value};
use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Build the WHERE predicate for `args`. No filters yields the empty predicate.
pub fn build_filter(args: &LogQuery) -> QueryResult<Predicate> {
    if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
        if start > end {
            return Err(QueryError::InvalidArgument(format!(
                "start_date {} is after end_date {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
    }

    let mut predicate = Predicate::all();

    if let Some(user_id) = args.user_id {
        let user_id = i64::try_from(user_id).map_err(|_| {
            QueryError::InvalidArgument(format!("user_id out of range: {}", user_id))
        })?;
        predicate = predicate.eq(column("user_id")?, Value::Integer(user_id));
    }
    if let Some(key) = &args.key {
        predicate = predicate.eq(column("key")?, Value::Text(key.clone()));
    }
    if let Some(version) = &args.version {
        predicate = predicate.eq(column("version")?, Value::Text(version.clone()));
    }
    if let Some(ip) = &args.ip {
        predicate = predicate.eq(column("ip")?, Value::Text(ip.clone()));
    }
    if let Some(start) = args.start_date {
        predicate = predicate.compare(
            column("date_created")?,
            Comparison::Gte,
            Value::Timestamp(ceil_micros(start)),
        );
    }
    if let Some(end) = args.end_date {
        predicate = predicate.compare(
            column("date_created")?,
            Comparison::Lte,
            Value::Timestamp(end.trunc_subsecs(6)),
        );
    }

    Ok(predicate)
}

/// Build ORDER BY and pagination for `args`
pub fn build_ordering(args: &LogQuery) -> QueryResult<Ordering> {
    let sort_column = LogRecord::column(&args.orderby).ok_or_else(|| {
        QueryError::InvalidArgument(format!("unknown orderby field: {}", args.orderby))
    })?;

    let limit = (args.number > 0).then_some(args.number);
    Ok(Ordering::new(sort_column.name, args.order).page(limit, args.offset))
}

/// Stored timestamps have microsecond precision; round a lower bound up to it
fn ceil_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floor = ts.trunc_subsecs(6);
    if floor < ts {
        floor + Duration::microseconds(1)
    } else {
        floor
    }
}

fn column(name: &str) -> QueryResult<&'static Column> {
    LogRecord::column(name)
        .ok_or_else(|| QueryError::InvalidArgument(format!("unknown filter field: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SortOrder;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_no_args_matches_everything() {
        let p = build_filter(&LogQuery::new()).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.where_clause(), "");
    }

    #[test]
    fn test_all_filters() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let q = LogQuery::new()
            .user_id(5)
            .key("public")
            .version("1")
            .ip("1.2.3.4")
            .between(start, end);

        let p = build_filter(&q).unwrap();
        assert_eq!(
            p.where_clause(),
            " WHERE \"user_id\" = ? AND \"key\" = ? AND \"version\" = ? AND \"ip\" = ? \
             AND \"date_created\" >= ? AND \"date_created\" <= ?"
        );
        assert_eq!(p.params().len(), 6);
        assert_eq!(p.params()[0], Value::Integer(5));
        assert_eq!(p.params()[4], Value::Timestamp(start));
    }

    #[test]
    fn test_is_deterministic() {
        let q = LogQuery::new().key("k").ip("::1");
        assert_eq!(build_filter(&q).unwrap(), build_filter(&q.clone()).unwrap());
    }

    #[test]
    fn test_injection_stays_in_params() {
        let q = LogQuery::new().key("x' OR '1'='1");
        let p = build_filter(&q).unwrap();
        assert_eq!(p.where_clause(), " WHERE \"key\" = ?");
        assert_eq!(p.params(), &[Value::Text("x' OR '1'='1".into())]);
    }

    #[test]
    fn test_inverted_date_range() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = build_filter(&LogQuery::new().between(start, end)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_ordering() {
        let o = build_ordering(&LogQuery::new()).unwrap();
        assert_eq!(o, Ordering::new("id", SortOrder::Desc).page(Some(20), 0));

        let o = build_ordering(&LogQuery::new().number(0).offset(3)).unwrap();
        assert_eq!(o.limit, None);
        assert_eq!(o.offset, 3);
    }

    #[test]
    fn test_date_bounds_round_to_stored_precision() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let q = LogQuery::new().between(
            t + chrono::Duration::nanoseconds(1_500),
            t + chrono::Duration::nanoseconds(9_500),
        );

        let p = build_filter(&q).unwrap();
        assert_eq!(
            p.params(),
            &[
                Value::Timestamp(t + chrono::Duration::microseconds(2)),
                Value::Timestamp(t + chrono::Duration::microseconds(9)),
            ]
        );
    }

    #[test]
    fn test_unknown_orderby() {
        let q = LogQuery::new().order_by("id; DROP TABLE x", SortOrder::Asc);
        assert!(matches!(
            build_ordering(&q),
            Err(QueryError::InvalidArgument(_))
        ));
    }
}
