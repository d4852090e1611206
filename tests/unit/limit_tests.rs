use chrono::{DateTime, Utc};

use slack_mcp_server::limit::{parse_limit, parse_limit_at, MessageWindow, DEFAULT_LIMIT, MAX_LIMIT};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_716_932_719, 123_000).unwrap()
}

fn count(limit: u32) -> MessageWindow {
    MessageWindow {
        limit,
        oldest: None,
        latest: None,
    }
}

#[test]
fn plain_count() {
    assert_eq!(parse_limit_at("50", now()), count(50));
    assert_eq!(parse_limit_at(" 7 ", now()), count(7));
}

#[test]
fn count_above_max_is_capped() {
    assert_eq!(parse_limit_at("5000", now()), count(MAX_LIMIT));
    assert_eq!(parse_limit_at("99999999999999999999999", now()), count(MAX_LIMIT));
}

#[test]
fn one_day_window() {
    let window = parse_limit_at("1d", now());
    assert_eq!(window.limit, MAX_LIMIT);
    assert_eq!(window.oldest.as_deref(), Some("1716846319.000123"));
    assert!(window.latest.is_none());
}

#[test]
fn months_are_thirty_days() {
    let window = parse_limit_at("1m", now());
    assert_eq!(window.oldest.as_deref(), Some("1714340719.000123"));
}

#[test]
fn unparseable_uses_default() {
    for expr in ["", "abc", "d", "5y", "-1d", "1.5d"] {
        assert_eq!(parse_limit_at(expr, now()), count(DEFAULT_LIMIT), "expr {expr:?}");
    }
}

#[test]
fn same_expression_same_instant_is_stable() {
    assert_eq!(parse_limit_at("2w", now()), parse_limit_at("2w", now()));
}

#[test]
fn current_time_window_is_in_the_past() {
    let window = parse_limit("1d");
    let oldest = window.oldest.unwrap();
    let (secs, _) = oldest.split_once('.').unwrap();
    let secs: i64 = secs.parse().unwrap();
    let elapsed = Utc::now().timestamp() - secs;
    assert!((86_400..86_460).contains(&elapsed), "elapsed {elapsed}");
}

#[test]
fn numeric_results_parse_back_to_themselves() {
    for expr in ["50", "0", "5000"] {
        let first = parse_limit_at(expr, now());
        let again = parse_limit_at(&first.limit.to_string(), now());
        assert_eq!(again, first, "expr {expr:?}");
    }
}
