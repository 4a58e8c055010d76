pub mod prediction_controller;
pub mod sizing_controller;
pub mod weather_controller;
