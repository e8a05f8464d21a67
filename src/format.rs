//! Rendering of currency amounts, dates, and the insight sentence.
//!
//! Aggregation code produces plain numbers; anything shown to the user
//! passes through here on the way out.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::Date;

use crate::{insight::InsightSummary, window::month_abbrev};

/// Format an amount as currency with two decimal places, e.g. "$1,234.50".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}

/// Format an amount as currency rounded to the whole amount, e.g. "$1,235".
pub fn format_currency_rounded(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    let number = number.round();

    if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        "$0".to_owned()
    }
}

/// Format a date for display, e.g. "15 Aug 2024".
pub fn format_date(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

/// The one-sentence takeaway shown with the month-over-month insight.
///
/// `None` when the current month has no categorized spending to talk about.
pub fn insight_message(insight: &InsightSummary) -> Option<String> {
    let top = insight.top_categories.first()?;

    let mut message = format!(
        "Your highest spending category is {} at {}.",
        top.category,
        format_currency(top.amount)
    );

    if insight.trend_up {
        message.push_str(" Consider reducing expenses here to improve savings.");
    } else {
        message.push_str(" Great job managing your expenses!");
    }

    Some(message)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::insight::{InsightCategory, InsightSummary};

    use super::{format_currency, format_currency_rounded, format_date, insight_message};

    #[test]
    fn currency_keeps_two_decimal_places() {
        assert_eq!(format_currency(12.3), "$12.30");
        assert_eq!(format_currency(12.34), "$12.34");
        assert_eq!(format_currency(1234.5), "$1,234.50");
    }

    #[test]
    fn currency_handles_zero_and_negative_amounts() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-45.0), "-$45.00");
    }

    #[test]
    fn rounded_currency_drops_the_cents() {
        assert_eq!(format_currency_rounded(1234.56), "$1,235");
        assert_eq!(format_currency_rounded(0.0), "$0");
        assert_eq!(format_currency_rounded(-99.5), "-$100");
    }

    #[test]
    fn date_labels_are_day_month_year() {
        assert_eq!(format_date(date!(2024 - 08 - 15)), "15 Aug 2024");
        assert_eq!(format_date(date!(2025 - 01 - 02)), "2 Jan 2025");
    }

    fn insight(trend_up: bool, top_categories: Vec<InsightCategory>) -> InsightSummary {
        InsightSummary {
            has_data: !top_categories.is_empty(),
            current_month: "August".to_string(),
            prior_month: "July".to_string(),
            current_total: 800.0,
            prior_total: 400.0,
            delta: if trend_up { 400.0 } else { -400.0 },
            percent_change: 100.0,
            trend_up,
            top_categories,
        }
    }

    #[test]
    fn insight_message_warns_when_spending_rose() {
        let summary = insight(
            true,
            vec![InsightCategory {
                category: "rent".to_string(),
                amount: 500.0,
                percentage: 62.5,
            }],
        );

        assert_eq!(
            insight_message(&summary).unwrap(),
            "Your highest spending category is rent at $500.00. \
             Consider reducing expenses here to improve savings."
        );
    }

    #[test]
    fn insight_message_congratulates_when_spending_fell() {
        let summary = insight(
            false,
            vec![InsightCategory {
                category: "food".to_string(),
                amount: 120.0,
                percentage: 40.0,
            }],
        );

        let message = insight_message(&summary).unwrap();

        assert!(message.ends_with("Great job managing your expenses!"));
    }

    #[test]
    fn insight_message_is_empty_without_categories() {
        let summary = insight(true, Vec::new());

        assert_eq!(insight_message(&summary), None);
    }
}
