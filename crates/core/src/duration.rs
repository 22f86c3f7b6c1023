/// Parses a free-text duration into minutes.
///
/// Accepts bare numbers (minutes), `H:MM`, and unit-suffixed parts such as
/// `"1h 30m"`, `"2 hours 15 min"` or `"1.5 hrs"`. Parts with an unknown unit
/// are ignored; input with no usable part yields `0.0`.
pub fn parse_minutes(input: &str) -> f64 {
    let normalized = input.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return 0.0;
    }

    if let Some(minutes) = parse_clock(&normalized) {
        return minutes;
    }

    let mut total = 0.0;
    let mut chars = normalized.chars().peekable();
    while let Some(&next) = chars.peek() {
        if !(next.is_ascii_digit() || next == '.') {
            chars.next();
            continue;
        }

        let mut number = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
                chars.next();
            } else {
                break;
            }
        }
        while matches!(chars.peek(), Some(ch) if ch.is_whitespace()) {
            chars.next();
        }
        let mut unit = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_ascii_alphabetic() {
                unit.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        let Ok(value) = number.parse::<f64>() else {
            continue;
        };
        if let Some(factor) = unit_factor(&unit) {
            total += value * factor;
        }
    }

    total
}

/// Hours are unbounded free text, so the arithmetic stays in `f64`.
fn parse_clock(value: &str) -> Option<f64> {
    let (hours, minutes) = value.split_once(':')?;
    let hours = hours.trim();
    if hours.is_empty() || !hours.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let hours = hours.parse::<f64>().ok()?;
    let minutes = minutes.trim().parse::<u8>().ok().filter(|minutes| *minutes < 60)?;
    Some(hours * 60.0 + f64::from(minutes))
}

fn unit_factor(unit: &str) -> Option<f64> {
    match unit {
        "" | "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_minutes;

    #[test]
    fn bare_numbers_are_minutes() {
        assert_eq!(parse_minutes("45"), 45.0);
        assert_eq!(parse_minutes(" 7.5 "), 7.5);
    }

    #[test]
    fn unit_suffixes_are_combined() {
        assert_eq!(parse_minutes("1h 30m"), 90.0);
        assert_eq!(parse_minutes("2 hours 15 min"), 135.0);
        assert_eq!(parse_minutes("1.5 hrs"), 90.0);
        assert_eq!(parse_minutes("20 Minutes"), 20.0);
    }

    #[test]
    fn clock_notation_is_supported() {
        assert_eq!(parse_minutes("1:05"), 65.0);
        assert_eq!(parse_minutes("0:45"), 45.0);
        assert_eq!(parse_minutes("99999999:00"), 5_999_999_940.0);
    }

    #[test]
    fn huge_clock_hours_do_not_overflow() {
        let minutes = parse_minutes("99999999999999999999999:30");
        assert!(minutes.is_finite());
        assert_eq!(minutes, 99_999_999_999_999_999_999_999.0 * 60.0 + 30.0);
        assert_eq!(parse_minutes("4294967296:00"), 4_294_967_296.0 * 60.0);
    }

    #[test]
    fn unusable_input_is_zero() {
        assert_eq!(parse_minutes(""), 0.0);
        assert_eq!(parse_minutes("a while"), 0.0);
        assert_eq!(parse_minutes("3 days"), 0.0);
    }
}
