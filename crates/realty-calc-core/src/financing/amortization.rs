use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{monthly_payment, MAX_YEARS};
use crate::types::{pct, Money, Percent, Rate};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A one-time principal prepayment applied at a given month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPayment {
    /// Zero-based month the payment lands in
    #[serde(default, deserialize_with = "coerce::count")]
    pub month_index: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub amount: Money,
}

/// Fixed-rate loan definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub principal: Money,
    /// Annual interest rate as a whole percent (6.5 = 6.5%)
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_rate_percent: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub term_months: u32,
    /// One-time prepayments keyed by month index
    #[serde(default)]
    pub extra_principal_payments: Vec<ExtraPayment>,
    /// Constant extra principal paid every month
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub recurring_extra_payment: Money,
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    /// Zero-based month index
    pub month_index: u32,
    /// One-based payment number
    pub payment_number: u32,
    pub opening_balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub extra_paid: Money,
    pub closing_balance: Money,
    pub cumulative_interest: Money,
    /// Scheduled plus extra principal paid to date
    pub cumulative_principal: Money,
}

/// Lazy month-by-month amortization schedule.
///
/// The iterator is finite (`term_months` rows) and cloning it restarts
/// from the current position, so `amortize(&terms)` always regenerates the
/// same sequence.
#[derive(Debug, Clone)]
pub struct Amortization {
    payment: Money,
    monthly_rate: Rate,
    term_months: u32,
    recurring_extra: Money,
    extras: BTreeMap<u32, Money>,
    month: u32,
    balance: Money,
    cumulative_interest: Money,
    cumulative_principal: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the amortization schedule for a fixed-rate loan.
pub fn amortize(terms: &LoanTerms) -> RealtyCalcResult<Amortization> {
    if terms.principal < Decimal::ZERO {
        return Err(RealtyCalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    if terms.term_months == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be at least one month".into(),
        });
    }
    if terms.term_months > MAX_YEARS * 12 {
        return Err(RealtyCalcError::InvalidInput {
            field: "term_months".into(),
            reason: format!("Loan term must be at most {} months", MAX_YEARS * 12),
        });
    }

    let annual_rate = pct(terms.annual_rate_percent);
    let payment = monthly_payment(terms.principal, annual_rate, terms.term_months)?;

    let mut extras: BTreeMap<u32, Money> = BTreeMap::new();
    for extra in &terms.extra_principal_payments {
        if extra.amount > Decimal::ZERO {
            *extras.entry(extra.month_index).or_insert(Decimal::ZERO) += extra.amount;
        }
    }

    Ok(Amortization {
        payment,
        monthly_rate: annual_rate / dec!(12),
        term_months: terms.term_months,
        recurring_extra: terms.recurring_extra_payment.max(Decimal::ZERO),
        extras,
        month: 0,
        balance: terms.principal,
        cumulative_interest: Decimal::ZERO,
        cumulative_principal: Decimal::ZERO,
    })
}

impl Amortization {
    /// Scheduled level payment (principal + interest).
    pub fn payment(&self) -> Money {
        self.payment
    }
}

impl Iterator for Amortization {
    type Item = AmortizationRow;

    fn next(&mut self) -> Option<AmortizationRow> {
        if self.month >= self.term_months {
            return None;
        }
        let month_index = self.month;
        self.month += 1;

        let opening = self.balance;
        let (interest, principal, extra) = if opening <= Decimal::ZERO {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else {
            let interest = opening * self.monthly_rate;
            let mut principal = (self.payment - interest).max(Decimal::ZERO).min(opening);
            // Final scheduled month retires whatever rounding residue remains.
            if month_index + 1 == self.term_months {
                principal = opening;
            }
            let requested_extra = self.recurring_extra
                + self.extras.get(&month_index).copied().unwrap_or(Decimal::ZERO);
            let extra = requested_extra.min(opening - principal);
            (interest, principal, extra)
        };

        self.balance = (opening - principal - extra).max(Decimal::ZERO);
        self.cumulative_interest += interest;
        self.cumulative_principal += principal + extra;

        Some(AmortizationRow {
            month_index,
            payment_number: month_index + 1,
            opening_balance: opening,
            interest_paid: interest,
            principal_paid: principal,
            extra_paid: extra,
            closing_balance: self.balance,
            cumulative_interest: self.cumulative_interest,
            cumulative_principal: self.cumulative_principal,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.term_months - self.month) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Amortization {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    fn terms(principal: Money, rate: Percent, months: u32) -> LoanTerms {
        LoanTerms {
            principal,
            annual_rate_percent: rate,
            term_months: months,
            ..Default::default()
        }
    }

    #[test]
    fn test_schedule_length_matches_term() {
        let rows: Vec<_> = amortize(&terms(dec!(200000), dec!(6), 360)).unwrap().collect();
        assert_eq!(rows.len(), 360);
        assert_eq!(rows[0].payment_number, 1);
        assert_eq!(rows[359].month_index, 359);
    }

    #[test]
    fn test_first_month_split() {
        let mut sched = amortize(&terms(dec!(280000), dec!(6.5), 360)).unwrap();
        let row = sched.next().unwrap();
        // 280000 * 0.065 / 12 = 1516.666...
        assert!((row.interest_paid - dec!(1516.67)).abs() < dec!(0.01));
        assert!((row.principal_paid - dec!(253.12)).abs() < dec!(0.01));
    }

    #[test]
    fn test_balance_reaches_zero_at_term() {
        let rows: Vec<_> = amortize(&terms(dec!(150000), dec!(5), 180)).unwrap().collect();
        assert_eq!(rows.last().unwrap().closing_balance, Decimal::ZERO);
        assert!((rows.last().unwrap().cumulative_principal - dec!(150000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let rows: Vec<_> = amortize(&terms(dec!(12000), Decimal::ZERO, 12)).unwrap().collect();
        for row in &rows {
            assert_eq!(row.interest_paid, Decimal::ZERO);
            assert_eq!(row.principal_paid, dec!(1000));
        }
        assert_eq!(rows[11].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payments_same_month_are_summed() {
        let mut t = terms(dec!(10000), Decimal::ZERO, 10);
        t.extra_principal_payments = vec![
            ExtraPayment { month_index: 2, amount: dec!(500) },
            ExtraPayment { month_index: 2, amount: dec!(250) },
        ];
        let rows: Vec<_> = amortize(&t).unwrap().collect();
        assert_eq!(rows[2].extra_paid, dec!(750));
        assert_eq!(rows[1].extra_paid, Decimal::ZERO);
    }

    #[test]
    fn test_rows_after_payoff_are_zero() {
        let mut t = terms(dec!(10000), dec!(6), 60);
        t.extra_principal_payments = vec![ExtraPayment { month_index: 3, amount: dec!(50000) }];
        let rows: Vec<_> = amortize(&t).unwrap().collect();
        assert_eq!(rows[3].closing_balance, Decimal::ZERO);
        // Extra is capped at the outstanding balance
        assert!(rows[3].extra_paid < dec!(50000));
        for row in &rows[4..] {
            assert_eq!(row.interest_paid, Decimal::ZERO);
            assert_eq!(row.principal_paid, Decimal::ZERO);
            assert_eq!(row.extra_paid, Decimal::ZERO);
        }
        assert!((rows.last().unwrap().cumulative_principal - dec!(10000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_schedule_is_restartable() {
        let t = terms(dec!(50000), dec!(4.25), 120);
        let a: Vec<_> = amortize(&t).unwrap().collect();
        let b: Vec<_> = amortize(&t).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_term_rejected() {
        assert!(amortize(&terms(dec!(1000), dec!(5), 0)).is_err());
    }

    #[test]
    fn test_term_beyond_limit_rejected() {
        assert!(amortize(&terms(dec!(1000), dec!(5), 1200)).is_ok());
        assert!(amortize(&terms(dec!(1000), dec!(5), 1201)).is_err());
        assert!(amortize(&terms(dec!(1000), dec!(5), u32::MAX)).is_err());
    }

    #[test]
    fn test_negative_principal_rejected() {
        assert!(amortize(&terms(dec!(-1), dec!(5), 12)).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_balance_non_increasing_and_sums_to_principal(
            principal in 1_000u32..2_000_000,
            rate_bp in 0u32..1_500,
            months in 1u32..480,
        ) {
            let t = terms(Decimal::from(principal), Decimal::new(rate_bp as i64, 2), months);
            let rows: Vec<_> = amortize(&t).unwrap().collect();
            let mut prev = Decimal::from(principal);
            for row in &rows {
                prop_assert!(row.closing_balance <= prev);
                prop_assert!(row.closing_balance >= Decimal::ZERO);
                prev = row.closing_balance;
            }
            let last = rows.last().unwrap();
            prop_assert_eq!(last.closing_balance, Decimal::ZERO);
            let paid: Decimal = rows.iter().map(|r| r.principal_paid + r.extra_paid).sum();
            prop_assert!((paid - Decimal::from(principal)).abs() < dec!(0.000001));
        }
    }
}
