use assert_approx_eq::assert_approx_eq;
use cpu_forecast::metrics::{
    evaluate_forecast, mean_squared_error, r_squared, root_mean_squared_error,
};
use cpu_forecast::PipelineError;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    // Squared errors: 4, 4, 9, 9, 4
    let mse = mean_squared_error(&actual, &predicted);
    assert_approx_eq!(mse, 6.0, 1e-12);

    let rmse = root_mean_squared_error(&actual, &predicted);
    assert_approx_eq!(rmse, 6.0_f64.sqrt(), 1e-12);
}

#[test]
fn test_r_squared_perfect_prediction() {
    let actual = vec![1.0, 2.0, 3.0, 4.0];
    assert_approx_eq!(r_squared(&actual, &actual), 1.0, 1e-12);
}

#[test]
fn test_r_squared_hand_computed() {
    let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let predicted = vec![1.1, 2.1, 2.9, 4.2, 4.8];

    // ss_res = 0.01 + 0.01 + 0.01 + 0.04 + 0.04 = 0.11, ss_tot = 10
    assert_approx_eq!(r_squared(&actual, &predicted), 1.0 - 0.11 / 10.0, 1e-12);
}

#[test]
fn test_metrics_are_nan_for_invalid_input() {
    let empty: Vec<f64> = vec![];
    assert!(mean_squared_error(&empty, &empty).is_nan());
    assert!(root_mean_squared_error(&[1.0, 2.0], &[1.0]).is_nan());
    assert!(r_squared(&[1.0], &[1.0, 2.0]).is_nan());

    // Zero variance leaves R² undefined
    assert!(r_squared(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_nan());
}

#[test]
fn test_evaluate_forecast_report() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let report = evaluate_forecast(&actual, &predicted).unwrap();
    assert_approx_eq!(report.mse, 6.0, 1e-12);
    assert_approx_eq!(report.rmse, 6.0_f64.sqrt(), 1e-12);
    // ss_res = 30, ss_tot = 1000
    assert_approx_eq!(report.r2, 1.0 - 30.0 / 1000.0, 1e-12);
}

#[test]
fn test_evaluate_forecast_rejects_empty_pairs() {
    let err = evaluate_forecast(&[], &[]).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientOverlap(_)));

    let err = evaluate_forecast(&[1.0, 2.0], &[1.0]).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientOverlap(_)));
}

#[test]
fn test_evaluate_forecast_rejects_zero_variance() {
    let err = evaluate_forecast(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientOverlap(_)));
}
