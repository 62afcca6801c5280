use approx::{assert_abs_diff_eq, assert_relative_eq};
use bermudan_core::errors::Error;
use bermudan_core::ErrorCategory;
use bermudan_instruments::{
    BermudanSwaption, Exercise, MakeVanillaSwap, PricingEngine, SwapType, SwaptionEngine,
    VanillaSwap,
};
use bermudan_methods::FdmScheme;
use bermudan_models::{HullWhite, ModelKind, ModelParameters, ShortRateModel};
use bermudan_pricingengines::{
    DiscountingSwapEngine, FdSwaptionEngine, FdmSettings, JamshidianSwaptionEngine, TreeSettings,
    TreeSwaptionEngine,
};
use bermudan_termstructures::{FlatForward, YieldTermStructure};
use bermudan_time::Date;
use std::sync::Arc;

const RATE: f64 = 0.035;

fn settlement() -> Date {
    Date::from_ymd(2025, 7, 17).unwrap()
}

fn curve() -> Arc<dyn YieldTermStructure> {
    Arc::new(FlatForward::continuous(settlement(), RATE).unwrap())
}

fn model(kind: ModelKind) -> Arc<ShortRateModel> {
    Arc::new(ShortRateModel::new(&ModelParameters::default_for(kind), curve()).unwrap())
}

/// The standard 1Y-into-5Y swap struck at `multiplier` times the ATM rate.
fn swap(multiplier: f64) -> VanillaSwap {
    let atm_swap = MakeVanillaSwap::new(settlement()).build().unwrap();
    let atm = DiscountingSwapEngine::new(curve()).fair_rate(&atm_swap).unwrap();
    atm_swap.with_fixed_rate(atm * multiplier)
}

fn bermudan(multiplier: f64) -> BermudanSwaption {
    BermudanSwaption::on_fixed_resets(swap(multiplier)).unwrap()
}

fn european(multiplier: f64, coupon: usize) -> BermudanSwaption {
    let s = swap(multiplier);
    let expiry = s.fixed_leg()[coupon].accrual_start();
    BermudanSwaption::new(s, Exercise::european(expiry)).unwrap()
}

fn tree(kind: ModelKind, steps: usize) -> TreeSwaptionEngine {
    TreeSwaptionEngine::new(model(kind), TreeSettings::default().with_time_steps(steps)).unwrap()
}

fn fdm(kind: ModelKind, steps: usize, points: usize) -> FdSwaptionEngine {
    FdSwaptionEngine::new(model(kind), FdmSettings::default().with_resolution(steps, points)).unwrap()
}

fn npv(swaption: &BermudanSwaption, engine: &dyn SwaptionEngine) -> f64 {
    let args = swaption.arguments(engine.term_structure().as_ref()).unwrap();
    engine.calculate(&args).unwrap().npv
}

fn jamshidian() -> JamshidianSwaptionEngine {
    JamshidianSwaptionEngine::new(Arc::new(HullWhite::new(curve(), 0.1, 0.01).unwrap()))
}

// ── Cross-engine agreement ───────────────────────────────────────────────

#[test]
fn european_hull_white_grids_converge_to_jamshidian() {
    for coupon in [0, 2] {
        let swaption = european(1.0, coupon);
        let exact = npv(&swaption, &jamshidian());
        assert!(exact > 0.0);
        let fd = npv(&swaption, &fdm(ModelKind::HullWhite, 400, 401));
        assert_relative_eq!(fd, exact, max_relative = 1e-3);
        let lattice = npv(&swaption, &tree(ModelKind::HullWhite, 1000));
        assert_relative_eq!(lattice, exact, max_relative = 1e-3);
    }
}

#[test]
fn hull_white_tree_and_grid_agree() {
    let swaption = bermudan(1.0);
    let lattice = npv(&swaption, &tree(ModelKind::HullWhite, 200));
    let fd = npv(&swaption, &fdm(ModelKind::HullWhite, 200, 201));
    assert_relative_eq!(lattice, fd, max_relative = 1e-2);
}

#[test]
fn g2_and_black_karasinski_tree_and_grid_agree() {
    let swaption = bermudan(1.0);
    for kind in [ModelKind::G2, ModelKind::BlackKarasinski] {
        let lattice = npv(&swaption, &tree(kind, 100));
        let fd = npv(&swaption, &FdSwaptionEngine::with_defaults(model(kind)));
        assert!(lattice > 0.0 && fd > 0.0, "{kind}: tree {lattice}, fdm {fd}");
        assert_relative_eq!(lattice, fd, max_relative = 5e-2);
    }
}

#[test]
fn european_payer_minus_receiver_is_the_forward_swap() {
    let payer = european(1.1, 2);
    let receiver = BermudanSwaption::new(
        payer.swap().with_type(SwapType::Receiver),
        payer.exercise().clone(),
    )
    .unwrap();
    let curve = curve();
    let forward: f64 = payer
        .arguments(curve.as_ref())
        .unwrap()
        .cash_flows
        .iter()
        .map(|cf| cf.amount * curve.discount(cf.payment_time).unwrap())
        .sum();
    let engine = tree(ModelKind::HullWhite, 100);
    assert_abs_diff_eq!(npv(&payer, &engine) - npv(&receiver, &engine), forward, epsilon = 2e-4);
}

// ── Limits and orderings ─────────────────────────────────────────────────

#[test]
fn deep_out_of_the_money_is_worthless() {
    let swaption = bermudan(10.0);
    for kind in ModelKind::ALL {
        for value in [
            npv(&swaption, &TreeSwaptionEngine::with_defaults(model(kind))),
            npv(&swaption, &FdSwaptionEngine::with_defaults(model(kind))),
        ] {
            assert!((0.0..1e-6).contains(&value), "{kind}: {value}");
        }
    }
}

#[test]
fn deep_in_the_money_is_the_swap() {
    let swaption = bermudan(1e-6);
    let swap_value = swaption.swap().price(&DiscountingSwapEngine::new(curve())).unwrap().npv;
    for kind in ModelKind::ALL {
        let lattice = npv(&swaption, &TreeSwaptionEngine::with_defaults(model(kind)));
        let fd = npv(&swaption, &FdSwaptionEngine::with_defaults(model(kind)));
        assert_relative_eq!(lattice, swap_value, max_relative = 2e-3);
        assert_relative_eq!(fd, swap_value, max_relative = 2e-3);
    }
}

#[test]
fn more_exercise_dates_are_worth_more() {
    let s = swap(1.0);
    let starts: Vec<Date> = s.fixed_leg().iter().map(|c| c.accrual_start()).collect();
    let engine = TreeSwaptionEngine::with_defaults(model(ModelKind::HullWhite));
    let values: Vec<f64> = (1..=starts.len())
        .map(|k| {
            let exercise = Exercise::bermudan(starts[starts.len() - k..].to_vec()).unwrap();
            npv(&BermudanSwaption::new(s.clone(), exercise).unwrap(), &engine)
        })
        .collect();
    for pair in values.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-6, "{values:?}");
    }
}

#[test]
fn at_the_money_value_is_bounded_by_the_floating_leg() {
    let swaption = bermudan(1.0);
    let value = npv(&swaption, &TreeSwaptionEngine::with_defaults(model(ModelKind::HullWhite)));
    let curve = curve();
    let floating = curve.discount_at(swaption.swap().start_date()).unwrap()
        - curve.discount_at(Date::from_ymd(2031, 7, 17).unwrap()).unwrap();
    assert!(value > 0.0 && value < floating, "{value} vs {floating}");
}

#[test]
fn payer_value_decreases_with_strike() {
    for kind in ModelKind::ALL {
        let engine = TreeSwaptionEngine::with_defaults(model(kind));
        let itm = npv(&bermudan(0.8), &engine);
        let atm = npv(&bermudan(1.0), &engine);
        let otm = npv(&bermudan(1.2), &engine);
        assert!(itm > atm && atm > otm, "{kind}: {itm} {atm} {otm}");
    }
}

// ── Failures ─────────────────────────────────────────────────────────────

#[test]
fn unstable_grid_is_a_numerical_failure() {
    let settings = FdmSettings::default()
        .with_scheme(FdmScheme::Explicit)
        .with_resolution(50, 400);
    let engine = FdSwaptionEngine::new(model(ModelKind::HullWhite), settings).unwrap();
    let args = bermudan(1.0).arguments(curve().as_ref()).unwrap();
    let err = engine.calculate(&args).unwrap_err();
    assert!(matches!(err, Error::GridInstability(_)), "{err}");
    assert_eq!(err.category(), ErrorCategory::NumericalMethod);
}

#[test]
fn jamshidian_prices_european_exercise_only() {
    let args = bermudan(1.0).arguments(curve().as_ref()).unwrap();
    let err = jamshidian().calculate(&args).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidInput);
}
