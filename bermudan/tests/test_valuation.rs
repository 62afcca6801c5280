//! End-to-end valuations through the façade.

use approx::assert_relative_eq;
use bermudan::core::ErrorCategory;
use bermudan::methods::FdmScheme;
use bermudan::models::ModelKind;
use bermudan::{Component, EngineKind, PricingConfig, PricingRequest, Valuation};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

fn request(model: ModelKind, engine: EngineKind, strike_multiplier: f64) -> PricingRequest {
    PricingRequest {
        date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
        flat_rate: 0.035,
        model,
        engine,
        strike_multiplier,
    }
}

#[test]
fn default_request_settles_two_target_days_later() {
    let result = Valuation::default()
        .price(&request(ModelKind::HullWhite, EngineKind::Tree, 1.0))
        .unwrap();
    assert_eq!(result.settlement_date, NaiveDate::from_ymd_opt(2025, 7, 17).unwrap());
    assert_eq!(result.valuation_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    assert!(result.atm_rate > 0.03 && result.atm_rate < 0.04, "atm {}", result.atm_rate);
    assert_eq!(result.strike, result.atm_rate);
    assert!(result.npv > 0.0);
    assert_eq!((result.model, result.engine), (ModelKind::HullWhite, EngineKind::Tree));
}

#[test]
fn every_model_and_engine_prices_the_atm_swaption() {
    let valuation = Valuation::default();
    for model in ModelKind::ALL {
        for engine in EngineKind::ALL {
            let result = valuation.price(&request(model, engine, 1.0)).unwrap();
            assert!(
                result.npv.is_finite() && result.npv > 0.0 && result.npv < 0.1,
                "{model}/{engine}: {}",
                result.npv
            );
        }
    }
}

#[test]
fn moneyness_orders_the_value() {
    let valuation = Valuation::default();
    for model in ModelKind::ALL {
        let npv = |m| valuation.price(&request(model, EngineKind::Tree, m)).unwrap().npv;
        let (itm, atm, otm) = (npv(0.8), npv(1.0), npv(1.2));
        assert!(itm > atm && atm > otm, "{model}: {itm} {atm} {otm}");
    }
}

#[test]
fn strike_scales_the_atm_rate() {
    let result = Valuation::default()
        .price(&request(ModelKind::G2, EngineKind::Tree, 1.2))
        .unwrap();
    assert_relative_eq!(result.strike, 1.2 * result.atm_rate, max_relative = 1e-15);
}

#[test]
fn requests_parse_from_json() {
    let parsed: PricingRequest = serde_json::from_str(
        r#"{"date": "2025-07-15", "flat_rate": 0.035, "model": "g2",
            "engine": "fdm", "strike_multiplier": 1.2}"#,
    )
    .unwrap();
    assert_eq!(parsed, request(ModelKind::G2, EngineKind::Fdm, 1.2));

    for bad in [
        r#"{"date": "2025-07-15", "flat_rate": 0.035, "model": "cir", "engine": "fdm", "strike_multiplier": 1.0}"#,
        r#"{"date": "2025-07-15", "flat_rate": 0.035, "model": "hw", "engine": "mc", "strike_multiplier": 1.0}"#,
        r#"{"date": "2025-07-15", "flat_rate": 0.035, "model": "HW", "engine": "tree", "strike_multiplier": 1.0}"#,
    ] {
        assert!(serde_json::from_str::<PricingRequest>(bad).is_err(), "{bad}");
    }
}

#[test]
fn minimal_response_carries_only_the_npv() {
    let result = Valuation::default()
        .price(&request(ModelKind::HullWhite, EngineKind::Tree, 1.0))
        .unwrap();
    let json: serde_json::Value = serde_json::to_value(result.response()).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(object["npv"].as_f64().unwrap(), result.npv);

    let full = serde_json::to_value(&result).unwrap();
    assert_eq!(full["model"], "hw");
    assert_eq!(full["engine"], "tree");
    assert_eq!(full["settlement_date"], "2025-07-17");
}

#[test]
fn bad_strike_multiplier_is_rejected_as_input() {
    let valuation = Valuation::default();
    for m in [0.0, -1.0, f64::NAN] {
        let err = valuation
            .price(&request(ModelKind::HullWhite, EngineKind::Tree, m))
            .unwrap_err();
        assert_eq!(err.component, Component::Request);
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
    }
}

#[test]
fn out_of_range_rate_is_a_curve_error() {
    let valuation = Valuation::default();
    for rate in [-0.01, 1.0, f64::INFINITY] {
        let mut req = request(ModelKind::G2, EngineKind::Fdm, 1.0);
        req.flat_rate = rate;
        let err = valuation.price(&req).unwrap_err();
        assert_eq!(err.component, Component::Curve);
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
        assert_eq!((err.model, err.engine), (ModelKind::G2, EngineKind::Fdm));
    }
}

#[test]
fn zero_curve_is_rejected_by_the_lognormal_model() {
    let valuation = Valuation::default();
    for engine in EngineKind::ALL {
        let mut req = request(ModelKind::BlackKarasinski, engine, 1.0);
        req.flat_rate = 0.0;
        let err = valuation.price(&req).unwrap_err();
        assert_eq!(err.component, Component::Model);
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
        assert!(err.to_string().contains("log-normal"));
    }
}

#[test]
fn gaussian_grids_price_high_rates() {
    let valuation = Valuation::default();
    for model in [ModelKind::HullWhite, ModelKind::G2] {
        let price = |engine| {
            let mut req = request(model, engine, 1.0);
            req.flat_rate = 0.5;
            valuation.price(&req)
        };
        let fdm = price(EngineKind::Fdm).unwrap();
        let tree = price(EngineKind::Tree).unwrap();
        assert!(fdm.npv.is_finite() && fdm.npv > 0.0, "{model}: {}", fdm.npv);
        assert_relative_eq!(fdm.npv, tree.npv, max_relative = 2e-2);
    }
}

#[test]
fn unstable_grid_is_a_numerical_failure() {
    let mut config = PricingConfig::default();
    config.fdm = config.fdm.with_scheme(FdmScheme::Explicit).with_resolution(50, 400);
    let err = Valuation::new(config)
        .price(&request(ModelKind::HullWhite, EngineKind::Fdm, 1.0))
        .unwrap_err();
    assert_eq!(err.component, Component::Engine);
    assert_eq!(err.category(), ErrorCategory::NumericalMethod);
    assert!(err.to_string().contains("engine failed"));
}

#[test]
fn receiver_side_from_configuration() {
    let config = PricingConfig::from_toml_str("[market]\nside = \"receiver\"\n").unwrap();
    let receiver = Valuation::new(config)
        .price(&request(ModelKind::HullWhite, EngineKind::Tree, 1.2))
        .unwrap();
    let payer = Valuation::default()
        .price(&request(ModelKind::HullWhite, EngineKind::Tree, 1.2))
        .unwrap();
    // a receiver struck above ATM is in the money
    assert!(receiver.npv > payer.npv);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn atm_value_is_positive_for_any_date_and_rate(
        offset in 0u64..1500,
        rate in 0.005f64..0.08,
    ) {
        let mut req = request(ModelKind::HullWhite, EngineKind::Tree, 1.0);
        req.date = req.date.checked_add_days(Days::new(offset)).unwrap();
        req.flat_rate = rate;
        let result = Valuation::default().price(&req).unwrap();
        prop_assert!(result.npv.is_finite() && result.npv > 0.0);
        prop_assert!(result.settlement_date > result.valuation_date);
        prop_assert!(result.atm_rate > 0.0);
    }
}
