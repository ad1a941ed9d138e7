// src/web/vehicle_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::vehicle::{NewVehicle, Vehicle, VehiclePatch, VehicleType},
    services::{upload_service, vehicle_service},
    state::AppState,
    web::{multipart_form::MultipartForm, mw_auth::CurrentUser},
};
use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

const DOCUMENT_FIELD: &str = "document";

// Grava o documento anexado, se houver
async fn store_document(state: &AppState, form: &MultipartForm) -> AppResult<Option<String>> {
    match &form.file {
        Some(file) => Ok(Some(
            upload_service::store_upload(&state.config.upload_dir, file).await?,
        )),
        None => Ok(None),
    }
}

// Desfaz o upload quando o serviço recusa a operação
async fn discard_document_on_error<T>(
    state: &AppState,
    document_url: Option<String>,
    result: AppResult<T>,
) -> AppResult<T> {
    if result.is_err() {
        if let Some(url) = document_url {
            upload_service::discard_upload(&state.config.upload_dir, &url).await;
        }
    }
    result
}

// GET /api/vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Vehicle>>> {
    Ok(Json(vehicle_service::list_vehicles(&state.db_pool, user.id).await?))
}

// GET /api/vehicles/type/{type}
pub async fn list_vehicles_by_type(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_type): Path<String>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let vehicle_type: VehicleType = vehicle_type.parse()?;
    Ok(Json(
        vehicle_service::list_vehicles_by_type(&state.db_pool, user.id, vehicle_type).await?,
    ))
}

// GET /api/vehicles/{id}
pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vehicle>> {
    Ok(Json(vehicle_service::get_vehicle(&state.db_pool, id, user.id).await?))
}

// POST /api/vehicles (multipart, documento opcional)
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart, DOCUMENT_FIELD).await?;

    let mut data = NewVehicle {
        license_plate: form.required("licensePlate")?.to_string(),
        vehicle_type: form.required("vehicleType")?.parse()?,
        weight: form
            .parsed("weight")?
            .ok_or_else(|| AppError::InvalidInput("Campo obrigatório: weight".to_string()))?,
        document_year: form
            .parsed("documentYear")?
            .ok_or_else(|| AppError::InvalidInput("Campo obrigatório: documentYear".to_string()))?,
        document_url: None,
    };
    // Só grava o documento depois de os campos de texto serem válidos
    let document_url = store_document(&state, &form).await?;
    data.document_url = document_url.clone();

    let result = vehicle_service::create_vehicle(&state.db_pool, user.id, data).await;
    let vehicle = discard_document_on_error(&state, document_url, result).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

// PUT /api/vehicles/{id} (multipart, só os campos enviados mudam)
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<Vehicle>> {
    let form = MultipartForm::read(multipart, DOCUMENT_FIELD).await?;

    let mut patch = VehiclePatch {
        license_plate: form.text("licensePlate").map(str::to_string),
        vehicle_type: form.parsed("vehicleType")?,
        weight: form.parsed("weight")?,
        document_year: form.parsed("documentYear")?,
        document_url: None,
    };
    let document_url = store_document(&state, &form).await?;
    patch.document_url = document_url.clone();

    let result = vehicle_service::update_vehicle(&state.db_pool, id, patch, user.id).await;
    Ok(Json(discard_document_on_error(&state, document_url, result).await?))
}

// DELETE /api/vehicles/{id}
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    vehicle_service::delete_vehicle(&state.db_pool, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
