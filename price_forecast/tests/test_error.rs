use forecast_math::MathError;
use price_forecast::error::ForecastError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::IoError(_) => {}
        _ => panic!("Expected IoError variant"),
    }

    let math_error = MathError::CalculationError("SVD did not converge".to_string());
    match ForecastError::from(math_error) {
        ForecastError::MathError(msg) => assert!(msg.contains("SVD")),
        _ => panic!("Expected MathError variant"),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::ModelFit("No finite sum of squares found after 5000 iterations".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.starts_with("Model fit failed"));
    assert!(error_string.contains("5000 iterations"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = price_forecast::DataLoader::from_csv("definitely/not/here.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
