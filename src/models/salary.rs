use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AppError;
use crate::text::contains_term;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kK])?").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Aud,
    Cad,
    Chf,
    Nok,
    Sek,
    Dkk,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
            Currency::Dkk => "DKK",
        }
    }

    /// Detect the currency named in a salary string, defaulting to USD.
    fn detect(text: &str) -> Currency {
        let upper = text.to_uppercase();
        if text.contains('€') || upper.contains("EUR") {
            Currency::Eur
        } else if text.contains('£') || upper.contains("GBP") {
            Currency::Gbp
        } else if upper.contains("AUD") || upper.contains("A$") {
            Currency::Aud
        } else if upper.contains("CAD") || upper.contains("C$") {
            Currency::Cad
        } else if upper.contains("CHF") {
            Currency::Chf
        } else if upper.contains("NOK") {
            Currency::Nok
        } else if upper.contains("SEK") {
            Currency::Sek
        } else if upper.contains("DKK") {
            Currency::Dkk
        } else {
            Currency::Usd
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hour,
    Day,
    Month,
    Year,
    Project,
}

impl SalaryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryPeriod::Hour => "hour",
            SalaryPeriod::Day => "day",
            SalaryPeriod::Month => "month",
            SalaryPeriod::Year => "year",
            SalaryPeriod::Project => "project",
        }
    }

    fn detect(text: &str) -> Option<SalaryPeriod> {
        let lower = text.to_lowercase();
        let has = |terms: &[&str]| terms.iter().any(|t| contains_term(&lower, t));
        if has(&["hour", "hours", "hourly", "hr", "hrs", "h"]) {
            Some(SalaryPeriod::Hour)
        } else if has(&["day", "days", "daily", "d"]) {
            Some(SalaryPeriod::Day)
        } else if has(&["month", "months", "monthly", "mo"]) {
            Some(SalaryPeriod::Month)
        } else if has(&["project", "fixed price", "fixed-price"]) {
            Some(SalaryPeriod::Project)
        } else if has(&["year", "years", "yearly", "annual", "annually", "yr", "pa", "p.a."]) {
            Some(SalaryPeriod::Year)
        } else {
            None
        }
    }
}

/// A pay range. `min_amount` is never negative and `max_amount`, when set,
/// is never below `min_amount`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Salary {
    min_amount: f64,
    max_amount: Option<f64>,
    currency: Currency,
    period: Option<SalaryPeriod>,
}

impl Salary {
    pub fn new(
        min_amount: f64,
        max_amount: Option<f64>,
        currency: Currency,
        period: Option<SalaryPeriod>,
    ) -> Result<Salary, AppError> {
        if !min_amount.is_finite() || min_amount < 0.0 {
            return Err(AppError::InvalidRecord(format!(
                "salary minimum must be a non-negative amount, got {min_amount}"
            )));
        }
        if let Some(max) = max_amount
            && (!max.is_finite() || max < min_amount)
        {
            return Err(AppError::InvalidRecord(format!(
                "salary maximum {max} is below minimum {min_amount}"
            )));
        }
        Ok(Salary {
            min_amount,
            max_amount,
            currency,
            period,
        })
    }

    /// Parse free-form salary text such as `"$80,000 - $120,000 per year"`,
    /// `"€60k - €80k"` or `"$50/hour"`. Returns `None` for unspecified pay
    /// ("competitive", "negotiable") or text without amounts.
    pub fn parse(text: &str) -> Option<Salary> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty()
            || ["competitive", "not specified", "negotiable"]
                .iter()
                .any(|w| lower.contains(w))
        {
            return None;
        }

        let amounts: Vec<f64> = AMOUNT
            .captures_iter(text)
            .filter_map(|caps| {
                let raw = caps.get(1)?.as_str().replace(',', "");
                let amount: f64 = raw.parse().ok()?;
                if caps.get(2).is_some() && amount < 1000.0 {
                    Some(amount * 1000.0)
                } else {
                    Some(amount)
                }
            })
            .collect();

        let min = amounts.iter().copied().reduce(f64::min)?;
        let max = amounts.iter().copied().reduce(f64::max)?;
        let max = (amounts.len() > 1 && max > min).then_some(max);

        Salary::new(min, max, Currency::detect(text), SalaryPeriod::detect(text)).ok()
    }

    /// Fill in the period when the source text did not name one.
    pub fn or_period(mut self, period: SalaryPeriod) -> Salary {
        self.period.get_or_insert(period);
        self
    }

    pub fn min_amount(&self) -> f64 {
        self.min_amount
    }

    pub fn max_amount(&self) -> Option<f64> {
        self.max_amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn period(&self) -> Option<SalaryPeriod> {
        self.period
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_amount {
            Some(max) => write!(
                f,
                "{}-{} {}",
                group_thousands(self.min_amount),
                group_thousands(max),
                self.currency.code()
            )?,
            None => write!(
                f,
                "{}+ {}",
                group_thousands(self.min_amount),
                self.currency.code()
            )?,
        }
        if let Some(period) = self.period {
            write!(f, "/{}", period.as_str())?;
        }
        Ok(())
    }
}

/// Round to a whole amount and insert `,` every three digits.
fn group_thousands(amount: f64) -> String {
    let digits = format!("{:.0}", amount.round());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_minimum() {
        assert!(Salary::new(-1.0, None, Currency::Usd, None).is_err());
        assert!(Salary::new(f64::NAN, None, Currency::Usd, None).is_err());
    }

    #[test]
    fn rejects_maximum_below_minimum() {
        let err = Salary::new(5000.0, Some(2000.0), Currency::Usd, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord(_)));
        assert!(Salary::new(5000.0, Some(5000.0), Currency::Usd, None).is_ok());
    }

    #[test]
    fn parses_yearly_range() {
        let salary = Salary::parse("$80,000 - $120,000 per year").unwrap();
        assert_eq!(salary.min_amount(), 80_000.0);
        assert_eq!(salary.max_amount(), Some(120_000.0));
        assert_eq!(salary.currency(), Currency::Usd);
        assert_eq!(salary.period(), Some(SalaryPeriod::Year));
    }

    #[test]
    fn parses_thousands_suffix_and_euro() {
        let salary = Salary::parse("€60k - €80k").unwrap();
        assert_eq!(salary.min_amount(), 60_000.0);
        assert_eq!(salary.max_amount(), Some(80_000.0));
        assert_eq!(salary.currency(), Currency::Eur);
        assert_eq!(salary.period(), None);
    }

    #[test]
    fn parses_hourly_rate() {
        let salary = Salary::parse("$30-50/hr").unwrap();
        assert_eq!(salary.min_amount(), 30.0);
        assert_eq!(salary.max_amount(), Some(50.0));
        assert_eq!(salary.period(), Some(SalaryPeriod::Hour));

        let single = Salary::parse("£45,000 annually").unwrap();
        assert_eq!(single.max_amount(), None);
        assert_eq!(single.currency(), Currency::Gbp);
        assert_eq!(single.period(), Some(SalaryPeriod::Year));
    }

    #[test]
    fn period_words_match_whole_words() {
        let monday = Salary::parse("$500 bonus, Monday start").unwrap();
        assert_eq!(monday.period(), None);
        let part_time = Salary::parse("Part-time, $25").unwrap();
        assert_eq!(part_time.period(), None);

        assert_eq!(Salary::parse("$600 per day").unwrap().period(), Some(SalaryPeriod::Day));
        assert_eq!(Salary::parse("$5,000/mo").unwrap().period(), Some(SalaryPeriod::Month));
        assert_eq!(Salary::parse("£40k pa").unwrap().period(), Some(SalaryPeriod::Year));
        assert_eq!(Salary::parse("€55k p.a.").unwrap().period(), Some(SalaryPeriod::Year));
    }

    #[test]
    fn unspecified_pay_is_none() {
        assert!(Salary::parse("Competitive salary").is_none());
        assert!(Salary::parse("Negotiable").is_none());
        assert!(Salary::parse("").is_none());
        assert!(Salary::parse("great benefits").is_none());
    }

    #[test]
    fn or_period_keeps_detected_period() {
        let project = Salary::parse("$2000-5000").unwrap().or_period(SalaryPeriod::Project);
        assert_eq!(project.period(), Some(SalaryPeriod::Project));

        let hourly = Salary::parse("$40-80/hr").unwrap().or_period(SalaryPeriod::Project);
        assert_eq!(hourly.period(), Some(SalaryPeriod::Hour));
    }

    #[test]
    fn displays_grouped_amounts() {
        let range = Salary::new(80_000.0, Some(120_000.0), Currency::Usd, Some(SalaryPeriod::Year))
            .unwrap();
        assert_eq!(range.to_string(), "80,000-120,000 USD/year");

        let floor = Salary::new(150.0, None, Currency::Eur, Some(SalaryPeriod::Project)).unwrap();
        assert_eq!(floor.to_string(), "150+ EUR/project");
    }
}
