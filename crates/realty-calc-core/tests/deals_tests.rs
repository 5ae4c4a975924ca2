use pretty_assertions::assert_eq;
use realty_calc_core::coerce::parse_input;
use realty_calc_core::deals::buy_vs_rent::{calculate_buy_vs_rent, BuyVsRentInput, Recommendation};
use realty_calc_core::deals::flip::{compute_flip_metrics, FlipInput};
use realty_calc_core::deals::holding_cost::{calculate_holding_cost, HoldingCostInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fix and flip
// ===========================================================================

const FLIP_FORM: &str = r#"{
    "purchasePrice": "200000",
    "cashPercent": "20",
    "interestRate": "8",
    "interestOnly": "on",
    "timelineMonths": "6",
    "rehabBudget": "40000",
    "arv": "320000",
    "commissionPercent": "5"
}"#;

#[test]
fn test_flip_from_form_interest_only() {
    let input: FlipInput = parse_input(FLIP_FORM).unwrap();
    let out = compute_flip_metrics(&input).unwrap().result;
    assert_eq!(out.loan_amount, dec!(160000));
    assert_eq!(out.total_interest, dec!(6400));
    assert_eq!(out.payoff_balance, dec!(166400));
    assert_eq!(out.maximum_allowable_offer, dec!(184000));
}

#[test]
fn test_flip_profit_identity() {
    let input: FlipInput = parse_input(FLIP_FORM).unwrap();
    let out = compute_flip_metrics(&input).unwrap().result;
    assert_eq!(
        out.net_profit,
        input.arv - out.sale_costs - out.payoff_balance - out.total_cash_invested
    );
    assert_eq!(out.total_cash_invested, out.total_project_cost - out.loan_amount);
}

#[test]
fn test_flip_selling_at_break_even_has_no_profit() {
    let input: FlipInput = parse_input(FLIP_FORM).unwrap();
    let first = compute_flip_metrics(&input).unwrap().result;

    let mut at_break_even = input.clone();
    at_break_even.arv = first.break_even_sale_price;
    let second = compute_flip_metrics(&at_break_even).unwrap().result;
    assert!(second.net_profit.abs() < dec!(0.000001), "got {}", second.net_profit);
}

#[test]
fn test_flip_amortizing_loan_pays_down_principal() {
    let mut input: FlipInput = parse_input(FLIP_FORM).unwrap();
    input.interest_only = false;
    let out = compute_flip_metrics(&input).unwrap().result;
    assert!(out.payoff_balance < out.loan_amount);
    assert!(out.debt_service_paid > Decimal::ZERO);
    assert!(out.monthly_loan_payment > Decimal::ZERO);
}

#[test]
fn test_flip_zero_timeline_rejected() {
    let input = FlipInput {
        timeline_months: 0,
        ..Default::default()
    };
    assert!(compute_flip_metrics(&input).is_err());
}

// ===========================================================================
// Buy vs rent
// ===========================================================================

fn starter_home() -> BuyVsRentInput {
    BuyVsRentInput {
        home_price: dec!(400000),
        down_payment_percent: dec!(20),
        interest_rate: dec!(6.5),
        loan_term_years: 30,
        buying_closing_costs_percent: dec!(3),
        property_tax_percent: dec!(1.1),
        annual_insurance: dec!(1800),
        maintenance_percent: dec!(1),
        appreciation_percent: dec!(3),
        selling_costs_percent: dec!(6),
        monthly_rent: dec!(2400),
        rent_growth_percent: dec!(3),
        investment_return_percent: dec!(6),
        years: 10,
        ..Default::default()
    }
}

#[test]
fn test_buy_vs_rent_yearly_rows_and_advantage() {
    let out = calculate_buy_vs_rent(&starter_home()).unwrap().result;
    assert_eq!(out.yearly.len(), 10);
    for row in &out.yearly {
        assert_eq!(row.advantage, row.owner_net_worth - row.renter_net_worth);
    }
    assert_eq!(
        out.final_advantage,
        out.final_owner_net_worth - out.final_renter_net_worth
    );
    let expected = if out.final_advantage >= Decimal::ZERO {
        Recommendation::Buy
    } else {
        Recommendation::Rent
    };
    assert_eq!(out.recommendation, expected);
}

#[test]
fn test_buy_vs_rent_upfront_cash() {
    let out = calculate_buy_vs_rent(&starter_home()).unwrap().result;
    // 20% down plus 3% closing
    assert_eq!(out.upfront_cash, dec!(92000));
}

#[test]
fn test_buy_vs_rent_zero_years_rejected() {
    let mut input = starter_home();
    input.years = 0;
    assert!(calculate_buy_vs_rent(&input).is_err());
}

// ===========================================================================
// Holding cost
// ===========================================================================

#[test]
fn test_holding_cost_line_items_sum() {
    let input = HoldingCostInput {
        property_value: dec!(250000),
        annual_property_tax: dec!(3000),
        annual_insurance: dec!(1200),
        monthly_utilities: dec!(150),
        holding_period_months: 6,
        square_feet: Some(dec!(1500)),
        ..Default::default()
    };
    let out = calculate_holding_cost(&input).unwrap().result;
    let sum: Decimal = out.monthly_costs.iter().map(|i| i.amount).sum();
    assert_eq!(out.gross_monthly_cost, sum);
    assert_eq!(out.gross_monthly_cost, dec!(500));
    assert_eq!(out.holding_period_cost, dec!(3000));
    assert_eq!(out.cost_per_sqft, Some(dec!(4)));
}
