use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RealtyCalcError;
use crate::types::{Money, Rate};
use crate::RealtyCalcResult;

const IRR_TOLERANCE: Decimal = dec!(0.000001);
const MAX_IRR_ITERATIONS: u32 = 1000;
const IRR_FLOOR: Rate = dec!(-0.99);
const IRR_CEILING: Rate = dec!(10);

/// Longest loan term or projection horizon any calculator accepts.
pub const MAX_YEARS: u32 = 100;

/// Reject year counts beyond [`MAX_YEARS`].
pub fn check_years(years: u32, field: &str) -> RealtyCalcResult<u32> {
    if years > MAX_YEARS {
        return Err(RealtyCalcError::InvalidInput {
            field: field.into(),
            reason: format!("Must be at most {MAX_YEARS} years"),
        });
    }
    Ok(years)
}

/// Months in a term of `years`, bounded by [`MAX_YEARS`].
pub fn term_months(years: u32, field: &str) -> RealtyCalcResult<u32> {
    Ok(check_years(years, field)? * 12)
}

/// `(1 + rate)^periods` via repeated multiplication.
///
/// Fails instead of overflowing when the rate is too large for the term.
pub fn compound_factor(rate: Rate, periods: u32) -> RealtyCalcResult<Decimal> {
    let step = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor.checked_mul(step).ok_or_else(|| RealtyCalcError::InvalidInput {
            field: "rate".into(),
            reason: format!("Compounding {rate} over {periods} periods overflows"),
        })?;
    }
    Ok(factor)
}

/// `base` compounded at `rate` for `periods`, failing on overflow.
pub fn grow(base: Money, rate: Rate, periods: u32) -> RealtyCalcResult<Money> {
    base.checked_mul(compound_factor(rate, periods)?)
        .ok_or_else(|| RealtyCalcError::InvalidInput {
            field: "rate".into(),
            reason: format!("Growing {base} at {rate} over {periods} periods overflows"),
        })
}

/// Level monthly payment for a fixed-rate loan: P * r(1+r)^n / ((1+r)^n - 1).
///
/// `annual_rate` is a decimal rate (0.065 = 6.5%).
pub fn monthly_payment(principal: Money, annual_rate: Rate, months: u32) -> RealtyCalcResult<Money> {
    if months == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be at least one month".into(),
        });
    }

    let monthly_rate = annual_rate / dec!(12);
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let overflow = || RealtyCalcError::InvalidInput {
        field: "interest_rate".into(),
        reason: "Rate is too high to amortize over this term".into(),
    };
    let compound = compound_factor(monthly_rate, months).map_err(|_| overflow())?;
    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(RealtyCalcError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    (principal * monthly_rate)
        .checked_mul(compound / denominator)
        .ok_or_else(overflow)
}

/// Outstanding balance after `payments_made` level payments.
pub fn balance_after(
    principal: Money,
    annual_rate: Rate,
    term_months: u32,
    payments_made: u32,
) -> RealtyCalcResult<Money> {
    let payment = monthly_payment(principal, annual_rate, term_months)?;
    let monthly_rate = annual_rate / dec!(12);

    let mut balance = principal;
    for _ in 0..payments_made.min(term_months) {
        let interest = balance * monthly_rate;
        balance -= payment - interest;
        if balance <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
    }
    if payments_made >= term_months {
        return Ok(Decimal::ZERO);
    }
    Ok(balance)
}

/// Compound annual growth rate between two values over `years`.
///
/// Returns zero when the starting value is not positive and -100% when the
/// ending value is not positive.
pub fn cagr(start: Money, end: Money, years: Decimal) -> Rate {
    if start <= Decimal::ZERO || years <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if end <= Decimal::ZERO {
        return dec!(-1);
    }
    (end / start)
        .checked_powd(Decimal::ONE / years)
        .map(|growth| growth - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RealtyCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(RealtyCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    npv_and_derivative(cash_flows, rate)
        .map(|(value, _)| value)
        .ok_or_else(|| RealtyCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discounting at this rate overflows".into(),
        })
}

/// Result of the IRR search. A non-converged estimate is still usable but
/// should be presented with lower confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrEstimate {
    pub rate: Rate,
    pub converged: bool,
    pub iterations: u32,
}

impl IrrEstimate {
    /// True when the search ended clamped to its lower or upper bound, in
    /// which case `rate` is an artifact of the clamp rather than a root.
    pub fn at_search_bound(&self) -> bool {
        self.rate == IRR_FLOOR || self.rate == IRR_CEILING
    }
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Never loops unboundedly: after `MAX_IRR_ITERATIONS`, or if the derivative
/// vanishes, the last iterate is returned with `converged = false`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> RealtyCalcResult<IrrEstimate> {
    if cash_flows.len() < 2 {
        return Err(RealtyCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            tracing::warn!(iterations = i, %rate, "IRR discounting overflowed");
            return Ok(IrrEstimate {
                rate,
                converged: false,
                iterations: i,
            });
        };

        if dnpv.abs() < dec!(0.000000001) {
            tracing::warn!(iterations = i, %rate, "IRR derivative vanished");
            return Ok(IrrEstimate {
                rate,
                converged: npv_val.abs() < IRR_TOLERANCE,
                iterations: i,
            });
        }

        let mut next = rate - npv_val / dnpv;

        // Guard against divergence
        if next < IRR_FLOOR {
            next = IRR_FLOOR;
        } else if next > IRR_CEILING {
            next = IRR_CEILING;
        }

        if (next - rate).abs() < IRR_TOLERANCE {
            // A step pinned against a clamp bound is a stall, not a root.
            let estimate = IrrEstimate {
                rate: next,
                converged: true,
                iterations: i + 1,
            };
            if estimate.at_search_bound() {
                tracing::warn!(%next, "IRR stalled at search bound");
                return Ok(IrrEstimate {
                    converged: false,
                    ..estimate
                });
            }
            return Ok(estimate);
        }
        rate = next;
    }

    tracing::warn!(%rate, "IRR did not converge, returning last iterate");
    Ok(IrrEstimate {
        rate,
        converged: false,
        iterations: MAX_IRR_ITERATIONS,
    })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
///
/// `None` when a term leaves the decimal range, which happens for rates near
/// -100% over long horizons.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf.checked_mul(discount)?;
        npv = npv.checked_add(term)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let slope = Decimal::from(-(t as i64))
                .checked_mul(term)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_add(slope)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_standard_mortgage() {
        let pmt = monthly_payment(dec!(280000), dec!(0.065), 360).unwrap();
        assert!((pmt - dec!(1769.79)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let pmt = monthly_payment(dec!(120000), Decimal::ZERO, 240).unwrap();
        assert_eq!(pmt, dec!(500));
    }

    #[test]
    fn test_monthly_payment_zero_term_rejected() {
        assert!(monthly_payment(dec!(1000), dec!(0.05), 0).is_err());
    }

    #[test]
    fn test_monthly_payment_extreme_rate_is_error() {
        // 300% a year compounded monthly over 30 years exceeds decimal range
        let err = monthly_payment(dec!(240000), dec!(3), 360).unwrap_err();
        assert!(matches!(
            err,
            RealtyCalcError::InvalidInput { ref field, .. } if field == "interest_rate"
        ));
    }

    #[test]
    fn test_compound_factor_overflow_is_error() {
        assert!(compound_factor(dec!(10), 100).is_err());
        assert_eq!(compound_factor(dec!(0.1), 2).unwrap(), dec!(1.21));
    }

    #[test]
    fn test_grow_overflow_is_error() {
        assert_eq!(grow(dec!(100), dec!(0.5), 2).unwrap(), dec!(225));
        // Factor fits on its own but not once scaled by a house price
        assert!(grow(dec!(300000), dec!(1), 80).is_err());
    }

    #[test]
    fn test_term_months_bounded() {
        assert_eq!(term_months(30, "loan_term_years").unwrap(), 360);
        assert_eq!(term_months(MAX_YEARS, "loan_term_years").unwrap(), 1200);
        assert!(term_months(MAX_YEARS + 1, "loan_term_years").is_err());
        assert!(term_months(u32::MAX, "loan_term_years").is_err());
    }

    #[test]
    fn test_balance_after_full_term_is_zero() {
        let bal = balance_after(dec!(100000), dec!(0.06), 120, 120).unwrap();
        assert_eq!(bal, Decimal::ZERO);
    }

    #[test]
    fn test_balance_after_partial() {
        let bal = balance_after(dec!(100000), dec!(0.06), 360, 12).unwrap();
        // First-year principal on a 6% 30y loan is roughly 1,228
        assert!((bal - dec!(98772)).abs() < dec!(5), "got {bal}");
    }

    #[test]
    fn test_cagr_doubling_in_ten_years() {
        let rate = cagr(dec!(100), dec!(200), dec!(10));
        assert!((rate - dec!(0.07177)).abs() < dec!(0.0001), "got {rate}");
    }

    #[test]
    fn test_cagr_guards() {
        assert_eq!(cagr(Decimal::ZERO, dec!(100), dec!(5)), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), dec!(-5), dec!(5)), dec!(-1));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let est = irr(&cfs, dec!(0.10)).unwrap();
        assert!(est.converged);
        assert!((est.rate - dec!(0.0970)).abs() < dec!(0.001), "got {}", est.rate);
    }

    #[test]
    fn test_irr_no_sign_change_returns_last_iterate() {
        // All-positive flows have no root; the solver must still return.
        let cfs = vec![dec!(100), dec!(100), dec!(100)];
        let est = irr(&cfs, dec!(0.10)).unwrap();
        assert!(!est.converged);
        assert!(est.at_search_bound());
    }

    #[test]
    fn test_discounting_near_minus_one_over_long_horizon() {
        // At -99% each period multiplies the discount by 100, which leaves
        // the decimal range well before thirty periods.
        let mut cfs = vec![dec!(-100000)];
        cfs.extend(std::iter::repeat(dec!(1000)).take(30));
        assert!(npv(dec!(-0.99), &cfs).is_err());

        let est = irr(&cfs, dec!(-0.99)).unwrap();
        assert!(!est.converged);
        assert_eq!(est.iterations, 0);
    }

    #[test]
    fn test_irr_requires_two_flows() {
        assert!(irr(&[dec!(-100)], dec!(0.1)).is_err());
    }
}
