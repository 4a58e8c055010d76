pub mod irradiance_predictor;
pub mod panel_sizing;
pub mod weather_service;
