use crate::prelude::{ReduceError, ReduceResult};
use crate::sight::measurement::Measurement;
use chrono::NaiveTime;

/// Parses one `HH:MM:SS@DD°MM.M'` token into a measurement.
///
/// The pattern is literal: two-digit clock fields, an integer degree field,
/// and arc-minutes with exactly one decimal digit. Anything else fails with
/// [`ReduceError::Format`] carrying the offending token.
pub fn parse_token(token: &str) -> ReduceResult<Measurement> {
    let (time_part, arc_part) = token.split_once('@').ok_or_else(|| format_error(token))?;
    let time = parse_time(time_part).ok_or_else(|| format_error(token))?;
    let (degrees, minutes) = parse_arc(arc_part).ok_or_else(|| format_error(token))?;
    Ok(Measurement::from_arc(time, degrees, minutes))
}

/// Parses a whole run of tokens, aborting on the first malformed one.
///
/// Partial results over an ill-defined input set would be misleading, so a
/// single bad token fails the batch.
pub fn parse_run<S: AsRef<str>>(tokens: &[S]) -> ReduceResult<Vec<Measurement>> {
    tokens.iter().map(|t| parse_token(t.as_ref())).collect()
}

fn format_error(token: &str) -> ReduceError {
    ReduceError::Format {
        token: token.to_string(),
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let mut fields = text.split(':');
    let hour = two_digit(fields.next()?)?;
    let minute = two_digit(fields.next()?)?;
    let second = two_digit(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    // from_hms_opt enforces the 23/59/59 field ranges.
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn two_digit(field: &str) -> Option<u32> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_arc(text: &str) -> Option<(u32, f64)> {
    let (degree_part, minute_part) = text.split_once('°')?;
    let minute_part = minute_part.strip_suffix('\'')?;
    if degree_part.is_empty() || !degree_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (whole, frac) = minute_part.split_once('.')?;
    let whole_ok = !whole.is_empty() && whole.len() <= 2 && whole.bytes().all(|b| b.is_ascii_digit());
    let frac_ok = frac.len() == 1 && frac.bytes().all(|b| b.is_ascii_digit());
    if !whole_ok || !frac_ok {
        return None;
    }
    let degrees = degree_part.parse().ok()?;
    let minutes = minute_part.parse().ok()?;
    Some((degrees, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_a_well_formed_token() {
        let sight = parse_token("12:15:30@05°30.2'").unwrap();
        assert_eq!(sight.time.hour(), 12);
        assert_eq!(sight.time.minute(), 15);
        assert_eq!(sight.time.second(), 30);
        assert!((sight.angle_deg - (5.0 + 30.2 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn parse_then_format_round_trips() {
        for token in ["12:15:30@05°30.2'", "00:00:00@00°00.0'", "23:59:59@89°59.9'"] {
            assert_eq!(parse_token(token).unwrap().to_string(), token);
        }
    }

    #[test]
    fn rejects_a_token_without_seconds() {
        let err = parse_token("12:15@05°30.2'").unwrap_err();
        assert!(matches!(
            err,
            ReduceError::Format { token } if token == "12:15@05°30.2'"
        ));
    }

    #[test]
    fn rejects_out_of_range_clock_fields() {
        assert!(parse_token("24:00:00@05°30.2'").is_err());
        assert!(parse_token("12:60:00@05°30.2'").is_err());
        assert!(parse_token("12:00:60@05°30.2'").is_err());
    }

    #[test]
    fn rejects_single_digit_clock_fields() {
        assert!(parse_token("1:15:30@05°30.2'").is_err());
    }

    #[test]
    fn rejects_malformed_arc_parts() {
        // missing degree symbol, missing quote, wrong decimal precision
        assert!(parse_token("12:15:30@0530.2'").is_err());
        assert!(parse_token("12:15:30@05°30.2").is_err());
        assert!(parse_token("12:15:30@05°30'").is_err());
        assert!(parse_token("12:15:30@05°30.25'").is_err());
        assert!(parse_token("12:15:30@°30.2'").is_err());
        assert!(parse_token("12:15:30@-5°30.2'").is_err());
    }

    #[test]
    fn parse_run_fails_on_the_first_bad_token() {
        let tokens = ["12:15:30@05°30.2'", "oops", "12:17:30@05°35.1'"];
        let err = parse_run(&tokens).unwrap_err();
        assert!(matches!(err, ReduceError::Format { token } if token == "oops"));
    }

    #[test]
    fn parse_run_keeps_input_order() {
        let tokens = ["12:16:30@05°30.0'", "12:15:30@05°30.2'"];
        let sights = parse_run(&tokens).unwrap();
        assert_eq!(sights[0].time.minute(), 16);
        assert_eq!(sights[1].time.minute(), 15);
    }
}
