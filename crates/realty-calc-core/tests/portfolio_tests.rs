use pretty_assertions::assert_eq;
use realty_calc_core::coerce::parse_input;
use realty_calc_core::portfolio::aggregate::{analyze_portfolio, PortfolioInput};
use realty_calc_core::portfolio::stress::StressScenario;
use realty_calc_core::types::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MIXED_PORTFOLIO: &str = r#"{
    "horizonYears": 5,
    "properties": [
        {
            "name": "Duplex",
            "type": "residential",
            "monthlyRent": "3200",
            "vacancyPercent": "5",
            "purchasePrice": "450000",
            "currentValue": "500000",
            "loanBalance": "340000",
            "interestRate": "6.5",
            "loanTermYears": "28",
            "downPayment": "90000",
            "closingCosts": "12000",
            "operatingExpenses": "8000"
        },
        {
            "name": "Beach condo",
            "type": "airbnb",
            "nightlyRate": 220,
            "occupancyPercent": 60,
            "currentValue": 380000,
            "downPayment": 380000,
            "operatingExpenses": 18000
        },
        {
            "name": "Pasture",
            "type": "land",
            "annualRent": "4000",
            "currentValue": "120000",
            "downPayment": "120000"
        }
    ]
}"#;

#[test]
fn test_portfolio_from_json() {
    let input: PortfolioInput = parse_input(MIXED_PORTFOLIO).unwrap();
    let out = analyze_portfolio(&input).unwrap().result;

    assert_eq!(out.properties.len(), 3);
    assert_eq!(out.properties[1].property_type, "airbnb");
    assert_eq!(out.properties[1].gross_income, dec!(220) * dec!(365) * dec!(0.6));

    let equity: Money = out.properties.iter().map(|p| p.equity).sum();
    assert_eq!(out.total_equity, equity);
    assert_eq!(out.total_value, dec!(1000000));
    assert_eq!(out.total_debt, dec!(340000));
}

#[test]
fn test_unleveraged_properties_have_no_dscr() {
    let input: PortfolioInput = parse_input(MIXED_PORTFOLIO).unwrap();
    let out = analyze_portfolio(&input).unwrap().result;
    assert!(out.properties[0].dscr.is_some());
    assert!(out.properties[1].dscr.is_none());
    assert_eq!(out.properties[2].annual_debt_service, Decimal::ZERO);
}

#[test]
fn test_every_stress_scenario_reported() {
    let input: PortfolioInput = parse_input(MIXED_PORTFOLIO).unwrap();
    let out = analyze_portfolio(&input).unwrap().result;
    let scenarios: Vec<StressScenario> = out.stress_tests.iter().map(|s| s.scenario).collect();
    assert_eq!(scenarios, StressScenario::ALL.to_vec());
    for result in &out.stress_tests {
        assert_eq!(result.impact, result.stressed_equity - result.base_equity);
        assert!(result.impact <= Decimal::ZERO, "{} raised equity", result.label);
    }
}

#[test]
fn test_unknown_property_type_is_rejected() {
    let json = r#"{"properties": [{"name": "Boat", "type": "marina"}]}"#;
    assert!(parse_input::<PortfolioInput>(json).is_err());
}
