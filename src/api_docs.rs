use utoipa::OpenApi;
use crate::config;
use crate::controllers::{prediction_controller, sizing_controller, weather_controller};
use crate::models::{features, panel, session, sizing, weather};

#[derive(OpenApi)]
#[openapi(
    paths(
        weather_controller::get_weather,
        weather_controller::list_panels,
        prediction_controller::get_model_status,
        prediction_controller::predict,
        prediction_controller::predict_in_session,
        sizing_controller::create_session,
        sizing_controller::get_session,
        sizing_controller::delete_session,
        sizing_controller::set_irradiance,
        sizing_controller::size_system,
        sizing_controller::size_in_session
    ),
    components(
        schemas(
            features::FeatureRecord,
            panel::PanelSpec,
            weather::WeatherLookup,
            weather::WeatherSnapshot,
            weather::Coordinates,
            weather::FormDefaults,
            weather::WeatherSource,
            session::SessionCreated,
            session::SessionStatus,
            session::SessionContext,
            session::IrradianceReading,
            session::IrradianceOrigin,
            session::IrradianceOverride,
            session::PredictionResponse,
            session::ModelStatus,
            sizing::SizingRequest,
            sizing::SizingReport,
            sizing::SizingResult,
            sizing::EnergyProjection,
            sizing::FinancialProjection,
            sizing::Payback,
            config::FeaturePath,
            config::SizingDefaults,
            weather_controller::PanelCatalogResponse
        )
    ),
    tags(
        (name = "solar-sizer", description = "Solar irradiance prediction and panel sizing API")
    )
)]
pub struct ApiDoc;
