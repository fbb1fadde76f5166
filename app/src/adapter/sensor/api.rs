use actix_web::{HttpResponse, ResponseError, web};
use derive_more::derive::{Display, Error};

use crate::{core::unit::TemperatureUnit, thermostat::ThermostatRegistry};

use super::sensor_states;

struct SensorApiContext {
    registry: ThermostatRegistry,
    unit: TemperatureUnit,
}

type SensorResponse = Result<HttpResponse, SensorApiError>;

#[derive(Debug, Error, Display)]
enum SensorApiError {
    #[display("Thermostat {thermostat} not found")]
    UnknownThermostat { thermostat: String },
}

impl ResponseError for SensorApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        tracing::warn!("SensorApiError: {:?}", self);

        match self {
            SensorApiError::UnknownThermostat { .. } => StatusCode::NOT_FOUND,
        }
    }
}

pub fn new_routes(registry: ThermostatRegistry, unit: TemperatureUnit) -> actix_web::Scope {
    web::scope("/api/sensors")
        .route("", web::get().to(all_sensors))
        .route("/{thermostat}", web::get().to(thermostat_sensors))
        .app_data(web::Data::new(SensorApiContext { registry, unit }))
}

async fn all_sensors(ctx: web::Data<SensorApiContext>) -> SensorResponse {
    let mut sensors = Vec::new();

    for handle in ctx.registry.iter() {
        sensors.extend(sensor_states(handle, ctx.unit).await);
    }

    Ok(HttpResponse::Ok().json(sensors))
}

async fn thermostat_sensors(ctx: web::Data<SensorApiContext>, path: web::Path<String>) -> SensorResponse {
    let thermostat = path.into_inner();

    let handle = ctx
        .registry
        .get(&thermostat)
        .ok_or(SensorApiError::UnknownThermostat { thermostat: thermostat.clone() })?;

    Ok(HttpResponse::Ok().json(sensor_states(handle, ctx.unit).await))
}
