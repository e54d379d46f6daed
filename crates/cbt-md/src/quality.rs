//! Data quality report for a raw daily series.
//!
//! Structural errors (bad split, bad dates) are handled by
//! [`crate::validate_bars`] and reject the series. This report covers what
//! is structurally valid but numerically suspicious, so callers can flag it:
//! - dividends that exceed the prior close (negative adjustment factor)
//! - zero closes (dividend factor falls back to 1 for the next bar)
//! - calendar gaps longer than [`MAX_CALENDAR_GAP_DAYS`]
//!
//! It never mutates or rejects anything.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::PriceBar;

/// A weekend plus a holiday is 4 calendar days; anything longer is reported.
pub const MAX_CALENDAR_GAP_DAYS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendIssue {
    pub date: NaiveDate,
    pub dividend: f64,
    pub prior_close: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapIssue {
    pub prev_date: NaiveDate,
    pub next_date: NaiveDate,
    pub calendar_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub split_events: usize,
    pub dividend_events: usize,
    /// Dividend on the oldest bar; it has no prior close and is ignored.
    pub leading_dividend_ignored: bool,
    pub zero_closes: Vec<NaiveDate>,
    pub dividend_exceeds_prior_close: Vec<DividendIssue>,
    pub gaps: Vec<GapIssue>,
}

impl QualityReport {
    /// True when nothing numerically suspicious was found. Gaps alone do not
    /// make a report unclean.
    pub fn is_clean(&self) -> bool {
        self.zero_closes.is_empty()
            && self.dividend_exceeds_prior_close.is_empty()
            && !self.leading_dividend_ignored
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date_or_none = |d: Option<NaiveDate>| {
            d.map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        };
        writeln!(f, "QualityReport {{")?;
        writeln!(f, "  total_bars: {}", self.total_bars)?;
        writeln!(f, "  first_date: {}", date_or_none(self.first_date))?;
        writeln!(f, "  last_date: {}", date_or_none(self.last_date))?;
        writeln!(f, "  split_events: {}", self.split_events)?;
        writeln!(f, "  dividend_events: {}", self.dividend_events)?;
        writeln!(
            f,
            "  leading_dividend_ignored: {}",
            self.leading_dividend_ignored
        )?;
        writeln!(f, "  zero_closes: {}", self.zero_closes.len())?;
        writeln!(
            f,
            "  dividend_exceeds_prior_close: {}",
            self.dividend_exceeds_prior_close.len()
        )?;
        for d in &self.dividend_exceeds_prior_close {
            writeln!(
                f,
                "    date={} dividend={} prior_close={}",
                d.date, d.dividend, d.prior_close
            )?;
        }
        writeln!(f, "  gaps: {}", self.gaps.len())?;
        for g in &self.gaps {
            writeln!(
                f,
                "    prev={} next={} days={}",
                g.prev_date, g.next_date, g.calendar_days
            )?;
        }
        write!(f, "}}")
    }
}

/// Build a [`QualityReport`] for bars already in date order.
pub fn build_quality_report(bars: &[PriceBar]) -> QualityReport {
    let mut report = QualityReport {
        total_bars: bars.len(),
        first_date: bars.first().map(|b| b.date),
        last_date: bars.last().map(|b| b.date),
        split_events: bars.iter().filter(|b| b.split_coefficient != 1.0).count(),
        dividend_events: bars.iter().filter(|b| b.dividend > 0.0).count(),
        leading_dividend_ignored: bars.first().map(|b| b.dividend > 0.0).unwrap_or(false),
        zero_closes: bars
            .iter()
            .filter(|b| b.close == 0.0)
            .map(|b| b.date)
            .collect(),
        dividend_exceeds_prior_close: Vec::new(),
        gaps: Vec::new(),
    };

    for pair in bars.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);

        if next.dividend > 0.0 && prev.close != 0.0 && next.dividend > prev.close {
            report.dividend_exceeds_prior_close.push(DividendIssue {
                date: next.date,
                dividend: next.dividend,
                prior_close: prev.close,
            });
        }

        let days = (next.date - prev.date).num_days();
        if days > MAX_CALENDAR_GAP_DAYS {
            report.gaps.push(GapIssue {
                prev_date: prev.date,
                next_date: next.date,
                calendar_days: days,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn clean_series_reports_nothing() {
        // Fri -> Mon is 3 days, not a gap
        let bars = vec![PriceBar::new(d(1, 5), 10.0), PriceBar::new(d(1, 8), 10.5)];
        let r = build_quality_report(&bars);
        assert!(r.is_clean());
        assert!(r.gaps.is_empty());
        assert_eq!(r.total_bars, 2);
        assert_eq!(r.first_date, Some(d(1, 5)));
    }

    #[test]
    fn flags_oversized_dividend_and_zero_close() {
        let bars = vec![
            PriceBar::new(d(1, 2), 5.0),
            PriceBar::new(d(1, 3), 4.0).with_dividend(6.0),
            PriceBar::new(d(1, 4), 0.0),
            PriceBar::new(d(1, 5), 1.0).with_dividend(0.1),
        ];
        let r = build_quality_report(&bars);
        assert!(!r.is_clean());
        assert_eq!(r.dividend_events, 2);
        assert_eq!(r.zero_closes, vec![d(1, 4)]);
        assert_eq!(
            r.dividend_exceeds_prior_close,
            vec![DividendIssue {
                date: d(1, 3),
                dividend: 6.0,
                prior_close: 5.0
            }]
        );
    }

    #[test]
    fn flags_leading_dividend_and_gaps() {
        let bars = vec![
            PriceBar::new(d(1, 2), 5.0).with_dividend(0.2),
            PriceBar::new(d(1, 20), 5.0).with_split(2.0),
        ];
        let r = build_quality_report(&bars);
        assert!(r.leading_dividend_ignored);
        assert_eq!(r.split_events, 1);
        assert_eq!(r.gaps.len(), 1);
        assert_eq!(r.gaps[0].calendar_days, 18);
        assert!(r.to_string().contains("days=18"));
    }
}
