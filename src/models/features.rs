use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PredictError;

/// Number of features the regressor was trained on.
pub const FEATURE_COUNT: usize = 7;

/// Column names, in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Hour",
    "Temperature",
    "Dew Point",
    "Relative Humidity",
    "Surface Albedo",
    "Pressure",
    "Wind Speed",
];

/// One row of weather features for a single irradiance prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeatureRecord {
    /// Hour of day, a whole number in 0–23
    pub hour: f64,
    /// Air temperature (°C)
    pub temperature_c: f64,
    /// Dew point (°C)
    pub dew_point_c: f64,
    /// Relative humidity (%)
    pub relative_humidity_percent: f64,
    /// Surface albedo, 0–1
    pub surface_albedo: f64,
    /// Surface pressure (hPa)
    pub pressure_hpa: f64,
    /// Wind speed (m/s)
    pub wind_speed_m_s: f64,
}

impl FeatureRecord {
    /// Checks every field against the bounds accepted by the input form.
    pub fn validate(&self) -> Result<(), PredictError> {
        if !self.hour.is_finite() || self.hour.fract() != 0.0 || !(0.0..=23.0).contains(&self.hour) {
            return Err(PredictError::PredictionFailed(format!(
                "Hour {} must be a whole hour in 0..=23",
                self.hour
            )));
        }
        let bounded = [
            ("Temperature", self.temperature_c, -50.0, 60.0),
            ("Dew Point", self.dew_point_c, -50.0, 40.0),
            ("Relative Humidity", self.relative_humidity_percent, 0.0, 100.0),
            ("Surface Albedo", self.surface_albedo, 0.0, 1.0),
            ("Pressure", self.pressure_hpa, 800.0, 1100.0),
            ("Wind Speed", self.wind_speed_m_s, 0.0, 50.0),
        ];
        for (name, value, min, max) in bounded {
            if !value.is_finite() {
                return Err(PredictError::PredictionFailed(format!("{name} is not a finite number")));
            }
            if value < min || value > max {
                return Err(PredictError::PredictionFailed(format!(
                    "{name} {value} out of range {min}..={max}"
                )));
            }
        }
        Ok(())
    }

    /// Feature vector in [`FEATURE_NAMES`] order.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.hour,
            self.temperature_c,
            self.dew_point_c,
            self.relative_humidity_percent,
            self.surface_albedo,
            self.pressure_hpa,
            self.wind_speed_m_s,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureRecord {
        FeatureRecord {
            hour: 16.0,
            temperature_c: 29.6,
            dew_point_c: 16.8,
            relative_humidity_percent: 46.17,
            surface_albedo: 0.15,
            pressure_hpa: 986.0,
            wind_speed_m_s: 2.9,
        }
    }

    #[test]
    fn test_vector_order_matches_names() {
        let v = sample().to_vector();
        assert_eq!(v, [16.0, 29.6, 16.8, 46.17, 0.15, 986.0, 2.9]);
        assert_eq!(FEATURE_NAMES[2], "Dew Point");
    }

    #[test]
    fn test_validate_bounds() {
        assert!(sample().validate().is_ok());

        for hour in [24.0, -1.0, 7.5, 300.0, f64::NAN] {
            let bad = FeatureRecord { hour, ..sample() };
            match bad.validate() {
                Err(PredictError::PredictionFailed(msg)) => assert!(msg.contains("Hour"), "{msg}"),
                other => panic!("hour {hour}: unexpected {other:?}"),
            }
        }
        assert!(FeatureRecord { hour: 0.0, ..sample() }.validate().is_ok());
        assert!(FeatureRecord { hour: 23.0, ..sample() }.validate().is_ok());

        let nan = FeatureRecord { temperature_c: f64::NAN, ..sample() };
        match nan.validate() {
            Err(PredictError::PredictionFailed(msg)) => assert!(msg.contains("Temperature")),
            other => panic!("unexpected {other:?}"),
        }

        let thin_air = FeatureRecord { pressure_hpa: 500.0, ..sample() };
        assert!(thin_air.validate().is_err());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["relative_humidity_percent"], 46.17);
        let back: FeatureRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_out_of_range_hour_still_deserializes() {
        // integer hours from the form parse, and bad ones reach validate
        let json = serde_json::json!({
            "hour": -3,
            "temperature_c": 29.6,
            "dew_point_c": 16.8,
            "relative_humidity_percent": 46.17,
            "surface_albedo": 0.15,
            "pressure_hpa": 986.0,
            "wind_speed_m_s": 2.9
        });
        let record: FeatureRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.hour, -3.0);
        assert!(record.validate().is_err());
    }
}
