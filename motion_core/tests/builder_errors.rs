use motion_core::error::BuildError;
use motion_core::{
    BoundaryCfg, CycleCfg, PredictorCfg, ProfileCfg, RegulatorCfg, StateFeedbackRegulator,
};
use rstest::rstest;

#[rstest]
#[case(0.0)]
#[case(-0.01)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn non_positive_cycle_is_a_typed_build_error(#[case] dt_s: f64) {
    let err = StateFeedbackRegulator::new(dt_s).expect_err("should reject cycle length");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::NonPositiveCycle) => {}
        other => panic!("expected NonPositiveCycle, got: {other:?}"),
    }
}

#[rstest]
#[case(0.0)]
#[case(-49.17)]
#[case(f64::NAN)]
fn non_positive_natural_frequency_is_rejected(#[case] omega: f64) {
    let err = StateFeedbackRegulator::builder()
        .with_predictor(PredictorCfg { zeta: 1.0, omega })
        .build()
        .expect_err("should reject omega");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::NonPositiveNaturalFrequency) => {}
        other => panic!("expected NonPositiveNaturalFrequency, got: {other:?}"),
    }
}

#[rstest]
#[case::min_above_max(ProfileCfg { min_acceleration: 5000.0, ..ProfileCfg::default() })]
#[case::release_inside_stable(ProfileCfg { stable_distance: 80.0, ..ProfileCfg::default() })]
#[case::zero_kp(ProfileCfg { kp: 0.0, ..ProfileCfg::default() })]
fn inconsistent_profile_is_invalid_config(#[case] profile: ProfileCfg) {
    let err = StateFeedbackRegulator::builder()
        .with_profile(profile)
        .build()
        .expect_err("should reject profile");
    assert!(
        matches!(err.downcast_ref::<BuildError>(), Some(BuildError::InvalidConfig(_))),
        "got: {err}"
    );
}

#[rstest]
#[case::negative_zeta(PredictorCfg { zeta: -0.1, omega: 49.17 }, RegulatorCfg::default(), BoundaryCfg::default())]
#[case::nan_pole(PredictorCfg::default(), RegulatorCfg { pole: f64::NAN, ..RegulatorCfg::default() }, BoundaryCfg::default())]
#[case::zero_ceiling(PredictorCfg::default(), RegulatorCfg { velocity_ceiling: 0.0, ..RegulatorCfg::default() }, BoundaryCfg::default())]
#[case::negative_margin(PredictorCfg::default(), RegulatorCfg::default(), BoundaryCfg { margin: -1.0, trigger_speed: 100.0 })]
fn other_malformed_sections_are_invalid_config(
    #[case] predictor: PredictorCfg,
    #[case] regulator: RegulatorCfg,
    #[case] boundary: BoundaryCfg,
) {
    let err = StateFeedbackRegulator::builder()
        .with_predictor(predictor)
        .with_regulator(regulator)
        .with_boundary(boundary)
        .build()
        .expect_err("should reject config");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[test]
fn builder_applies_rate_and_initial_limit() {
    use motion_traits::VelocityController;
    let r = StateFeedbackRegulator::builder()
        .with_rate_hz(100.0)
        .with_velocity_limit(20_000.0)
        .build()
        .unwrap();
    assert!((r.cycle() - 0.01).abs() < 1e-15);
    // clamped to the ceiling
    assert_eq!(r.velocity_limit(), 10_000.0);
    assert!((CycleCfg::from_rate_hz(60.0).dt_s - CycleCfg::default().dt_s).abs() < 1e-15);
}
