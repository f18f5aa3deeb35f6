//! Forecast Pipeline Tests
//!
//! Exercises the full per-well pipeline through `run_forecast` and
//! `forecast_wells`: decline fitting, GOR forecasting, companion-fluid
//! derivation and the post-processing policies. Asserts on forecast window
//! bounds, monotone decline, offset anchoring and the degradation paths
//! (manual GOR with inconsistent breakpoints, flat-rate gas stepping).

use prodcast::types::{FluidTag, GorBreakpoints, NormalizationMethod, WellSample};
use prodcast::{
    forecast_wells, run_forecast, DeclineModel, EngineConfig, Fluid, ForecastConfig, GorMethod,
    SwitchMethod, WellHistory,
};

/// Oil well with a clean ramp to a peak of 100 m3/d at t = 90.
fn oil_history() -> WellHistory {
    let points = [(0.0, 10.0), (30.0, 50.0), (60.0, 80.0), (90.0, 100.0), (120.0, 95.0)];
    let mut cum = 0.0;
    let mut prev_t = 0.0;
    let samples = points
        .iter()
        .map(|&(t, qo)| {
            cum += qo * (t - prev_t);
            prev_t = t;
            WellSample {
                t,
                qo,
                qg: qo * 0.8,
                cum_oil: cum,
                cum_gas: cum * 0.8,
                gor: 800.0,
                qw: 0.0,
            }
        })
        .collect();

    WellHistory {
        well_name: "OIL-1".into(),
        field: "LA CALERA".into(),
        lateral_length: 2500.0,
        frac_stages: 40.0,
        fluid_tag: FluidTag::OilAssociated,
        start_date: None,
        qo_peak: 100.0,
        samples,
    }
}

/// Dry-gas well producing a flat 100 m3/d.
fn flat_gas_history() -> WellHistory {
    let samples = (0..10)
        .map(|i| {
            let t = f64::from(i) * 30.0;
            WellSample {
                t,
                qo: 0.5,
                qg: 100.0,
                cum_oil: t * 0.5,
                cum_gas: t * 100.0,
                gor: 1_000_000.0,
                qw: 0.0,
            }
        })
        .collect();

    WellHistory {
        well_name: "GAS-1".into(),
        field: "FORTIN DE PIEDRA".into(),
        lateral_length: 2800.0,
        frac_stages: 36.0,
        fluid_tag: FluidTag::DryGas,
        start_date: None,
        qo_peak: 0.5,
        samples,
    }
}

fn oil_cfg() -> ForecastConfig {
    ForecastConfig {
        primary_fluid: Fluid::Oil,
        model: DeclineModel::Hyperbolic,
        switch_method: SwitchMethod::ByTime,
        switch_value: 0.0,
        horizon_years: 5.0,
        rate_limit: 0.0,
        fix_last_rate: false,
        gor: GorMethod::Auto,
        normalization: None,
    }
}

fn gas_cfg() -> ForecastConfig {
    ForecastConfig {
        primary_fluid: Fluid::Gas,
        model: DeclineModel::Hyperbolic,
        switch_method: SwitchMethod::ByTime,
        switch_value: 0.0,
        horizon_years: 3.0,
        rate_limit: 0.0,
        fix_last_rate: false,
        gor: GorMethod::Auto,
        normalization: None,
    }
}

#[test]
fn oil_forecast_starts_at_peak_rate_and_declines() {
    let state = run_forecast(oil_history(), &oil_cfg(), &EngineConfig::default());

    assert!(!state.t_forecast.is_empty(), "forecast should not be empty");

    // Trim window: [last history time, horizon)
    let horizon_days = 5.0 * 365.25;
    assert!(state.t_forecast[0] >= 120.0 - 1e-9);
    assert!(*state.t_forecast.last().unwrap() < horizon_days);

    // Monotone hyperbolic decline from roughly the last observed rate
    assert!(
        (85.0..=105.0).contains(&state.qo_forecast[0]),
        "first rate = {}",
        state.qo_forecast[0]
    );
    for w in state.qo_forecast.windows(2) {
        assert!(w[1] <= w[0] + 1e-9, "rate increased: {} -> {}", w[0], w[1]);
    }

    let b = state.params.b.expect("fit should produce b");
    assert!((0.0..=1.2).contains(&b), "b = {b}");

    // Companion fluid spans the same forecast grid
    assert_eq!(state.qg_forecast.len(), state.t_forecast.len());
    assert_eq!(state.cum_oil_forecast.len(), state.t_forecast.len());
    assert_eq!(state.cum_gas_forecast.len(), state.t_forecast.len());
}

#[test]
fn flat_gas_rate_steps_one_month_of_volume_at_a_time() {
    let state = run_forecast(flat_gas_history(), &gas_cfg(), &EngineConfig::default());

    assert!(!state.t_forecast.is_empty(), "forecast should not be empty");

    // A flat rate must not stall the root-solver: each step lands close to
    // one average month later
    for w in state.t_forecast.windows(2) {
        let dt = w[1] - w[0];
        assert!((25.0..=36.0).contains(&dt), "step = {dt} days");
    }
}

#[test]
fn dry_gas_well_gets_constant_gor() {
    let state = run_forecast(flat_gas_history(), &gas_cfg(), &EngineConfig::default());

    assert!(!state.gor_forecast.is_empty());
    assert!(state
        .gor_forecast
        .iter()
        .all(|&g| (g - 1_000_000.0).abs() < f64::EPSILON));

    // Derived oil is finite and tiny at that GOR
    assert!(state.qo_forecast.iter().all(|q| q.is_finite()));
}

#[test]
fn inconsistent_manual_breakpoints_degrade_to_flat_gor() {
    let mut cfg = oil_cfg();
    // GORmax cumulative below the bubble-point cumulative
    cfg.gor = GorMethod::Manual(GorBreakpoints {
        gor_i: 800.0,
        np_pb: 30_000.0,
        gor_max: 4000.0,
        np_gor_max: 10_000.0,
        gor_f: 2000.0,
        np_gor_f: 50_000.0,
        a: 0.002,
    });

    let state = run_forecast(oil_history(), &cfg, &EngineConfig::default());

    assert_eq!(
        state.gor_forecast.len(),
        state.history_len() + state.forecast_len()
    );
    assert!(state
        .gor_forecast
        .iter()
        .all(|&g| (g - 800.0).abs() < f64::EPSILON));
}

#[test]
fn trimmed_rates_are_above_limit_or_zero() {
    let mut cfg = oil_cfg();
    cfg.horizon_years = 30.0;
    cfg.rate_limit = 50.0;

    let state = run_forecast(oil_history(), &cfg, &EngineConfig::default());

    assert!(!state.qo_forecast.is_empty());
    for &q in &state.qo_forecast {
        assert!(q >= 50.0 || q == 0.0, "rate {q} below limit but not zeroed");
    }
    // A 30-year horizon at this decline must cross the limit somewhere
    assert!(state.qo_forecast.iter().any(|&q| q == 0.0));
}

#[test]
fn rate_offset_anchors_the_forecast_on_the_last_observation() {
    let mut cfg = oil_cfg();
    cfg.fix_last_rate = true;

    let state = run_forecast(oil_history(), &cfg, &EngineConfig::default());

    // After trimming, the forecast starts at the last history time and the
    // offset pins the rate there to the last observed 95 m3/d
    assert!((state.t_forecast[0] - 120.0).abs() < 1e-9);
    assert!(
        (state.qo_forecast[0] - 95.0).abs() < 1e-6,
        "anchored rate = {}",
        state.qo_forecast[0]
    );
}

#[test]
fn normalizing_by_the_actual_attribute_changes_nothing() {
    let mut cfg = oil_cfg();
    cfg.normalization = Some((NormalizationMethod::LateralLength, 2500.0));

    let baseline = run_forecast(oil_history(), &oil_cfg(), &EngineConfig::default());
    let normalized = run_forecast(oil_history(), &cfg, &EngineConfig::default());

    assert!(normalized.normalization.enabled);
    for (a, b) in baseline
        .qo_forecast
        .iter()
        .zip(normalized.qo_forecast.iter())
    {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }
}

#[test]
fn batch_forecast_preserves_order_and_never_aborts() {
    let mut empty = oil_history();
    empty.samples.clear();

    let wells = vec![oil_history(), empty, oil_history()];
    let states = forecast_wells(wells, &oil_cfg(), &EngineConfig::default());

    assert_eq!(states.len(), 3);
    assert_eq!(states[0].history.well_name, "OIL-1");
    assert!(!states[0].t_forecast.is_empty());
    // The history-less well degrades to an empty forecast
    assert!(states[1].t_forecast.is_empty());
    assert_eq!(states[1].params.b, None);
    assert!(!states[2].t_forecast.is_empty());
}
