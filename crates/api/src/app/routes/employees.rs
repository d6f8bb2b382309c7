use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use keyroster_core::EmployeeId;
use keyroster_employees::{DeleteOutcome, Employee, EmployeePayload};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Vec<Employee>> {
    Json(services.employees.list())
}

fn parse_id(raw: &str) -> Result<EmployeeId, Response> {
    raw.parse::<EmployeeId>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

/// Missing ids answer `200 null`.
pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    Json(services.employees.get(id)).into_response()
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<EmployeePayload>,
) -> Json<Employee> {
    let employee = services.employees.create(body);
    tracing::info!(id = %employee.id, principal = %principal.name(), "employee created");
    Json(employee)
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<EmployeePayload>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let updated = services.employees.update(id, body);
    if updated.is_some() {
        tracing::info!(%id, principal = %principal.name(), "employee updated");
    }
    Json(updated).into_response()
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let body = match services.employees.delete(id) {
        DeleteOutcome::Deleted => {
            tracing::info!(%id, principal = %principal.name(), "employee deleted");
            json!({ "message": format!("Deleted employee {id}") })
        }
        DeleteOutcome::NotFound => json!({ "error": "Employee not found" }),
    };
    Json(body).into_response()
}
