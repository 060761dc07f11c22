//! Saved locations
//!
//! - `GET /v1/locations`
//! - `POST /v1/locations`
//! - `DELETE /v1/locations/:id` (owner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::AuthUser,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reciclaje_shared::models::{
    history::{History, HistoryAction},
    location::{CreateLocation, Location},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 100, message = "La etiqueta debe tener entre 1 y 100 caracteres"))]
    pub label: String,

    #[validate(length(min = 1, max = 255, message = "La dirección debe tener entre 1 y 255 caracteres"))]
    pub address: String,

    #[validate(length(max = 100, message = "Ciudad demasiado larga"))]
    pub city: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitud fuera de rango"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitud fuera de rango"))]
    pub longitude: Option<f64>,
}

pub async fn list_locations(State(state): State<AppState>, AuthUser(auth): AuthUser) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(Location::list_by_user(&state.db, auth.user_id).await?))
}

pub async fn create_location(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(req): Json<CreateLocationRequest>,
) -> ApiResult<(StatusCode, Json<Location>)> {
    req.validate()?;

    let location = Location::create(
        &state.db,
        CreateLocation {
            user_id: auth.user_id,
            label: req.label.trim().to_string(),
            address: req.address.trim().to_string(),
            city: req.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            latitude: req.latitude,
            longitude: req.longitude,
        },
    )
    .await?;

    info!(user_id = %auth.user_id, location_id = %location.id, "Location created");

    History::record_best_effort(
        &state.db,
        auth.user_id,
        HistoryAction::LocationCreated,
        Some(location.id),
        json!({ "label": location.label }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Location::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::NotFound("Ubicación no encontrada".to_string()));
    }

    info!(user_id = %auth.user_id, location_id = %id, "Location deleted");

    History::record_best_effort(&state.db, auth.user_id, HistoryAction::LocationDeleted, Some(id), json!({})).await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: serde_json::Value) -> CreateLocationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_location() {
        let req = request(json!({
            "label": "Bodega",
            "address": "Carrera 43A # 1-50",
            "latitude": 6.2,
            "longitude": -75.57
        }));

        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_location_rejects_blank_label_and_bad_coordinates() {
        let req = request(json!({
            "label": "",
            "address": "Calle 1",
            "latitude": 91.0,
            "longitude": -181.0
        }));

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("label"));
        assert!(fields.contains_key("latitude"));
        assert!(fields.contains_key("longitude"));
        assert!(!fields.contains_key("address"));
    }
}
