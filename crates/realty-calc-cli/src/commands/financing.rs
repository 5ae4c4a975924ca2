use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use realty_calc_core::coerce::parse_rate;
use realty_calc_core::financing::amortization::{amortize, AmortizationRow, LoanTerms};
use realty_calc_core::financing::mortgage::{calculate_mortgage, MortgageInput};
use realty_calc_core::time_value::{monthly_payment, term_months};

use crate::input;

/// Arguments for an amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML loan terms (principal, annualRatePercent, termMonths, ...)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a level loan payment
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate, as a percent (6.5) or a fraction (0.065)
    #[arg(long)]
    pub rate: Decimal,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub years: u32,
}

/// Arguments for the mortgage calculator
#[derive(Args)]
pub struct MortgageArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price of the home
    #[arg(long)]
    pub home_price: Option<Decimal>,

    /// Cash down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate, whole percent (6.5 = 6.5%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub loan_term_years: u32,

    /// Annual property tax
    #[arg(long)]
    pub property_tax: Option<Decimal>,

    /// Annual homeowner's insurance
    #[arg(long)]
    pub insurance: Option<Decimal>,

    /// Monthly HOA dues
    #[arg(long)]
    pub hoa: Option<Decimal>,

    /// Annual PMI premium, percent of the loan
    #[arg(long)]
    pub pmi_percent: Option<Decimal>,

    /// Extra principal paid every month
    #[arg(long)]
    pub extra_monthly: Option<Decimal>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = input::load(&args.input)?;
    let schedule = amortize(&terms)?;
    let payment = schedule.payment();
    let rows: Vec<AmortizationRow> = schedule.collect();
    let total_interest: Decimal = rows.iter().map(|r| r.interest_paid).sum();

    Ok(json!({
        "result": {
            "monthlyPayment": payment,
            "totalInterest": total_interest,
            "schedule": rows,
        },
        "methodology": "Fixed-rate amortization with optional prepayments",
    }))
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = term_months(args.years, "years")?;
    let payment = monthly_payment(args.principal, parse_rate(args.rate), months)?;
    let total_paid = payment * Decimal::from(months);

    Ok(json!({
        "result": {
            "monthlyPayment": payment.round_dp(2),
            "totalPaid": total_paid.round_dp(2),
            "totalInterest": (total_paid - args.principal).round_dp(2),
        },
        "methodology": "Level payment P * r(1+r)^n / ((1+r)^n - 1)",
    }))
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = if args.input.is_some() {
        input::load(&args.input)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MortgageInput {
            home_price: args
                .home_price
                .ok_or("--home-price is required (or provide --input)")?,
            down_payment: args.down_payment.unwrap_or(Decimal::ZERO),
            interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input)")?,
            loan_term_years: args.loan_term_years,
            annual_property_tax: args.property_tax.unwrap_or(Decimal::ZERO),
            annual_insurance: args.insurance.unwrap_or(Decimal::ZERO),
            monthly_hoa: args.hoa.unwrap_or(Decimal::ZERO),
            pmi_percent: args.pmi_percent.unwrap_or(Decimal::ZERO),
            extra_monthly_payment: args.extra_monthly.unwrap_or(Decimal::ZERO),
            ..Default::default()
        }
    };
    let result = calculate_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}
