//! Unauthenticated content: landing page, static assets, API docs.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::app::errors;

const LANDING_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Employee directory</title>
  <link rel="stylesheet" href="/public/style.css">
</head>
<body>
  <h1>Employee directory</h1>
  <p>The employee API lives under <code>/api/v1/employees</code> and needs a login or a bearer token.</p>
  <ul>
    <li><a href="/api/v1/employees">Browse employees</a> (starts a login when needed)</li>
    <li><a href="/swagger-ui.html">API documentation</a></li>
    <li><a href="/logout">Log out</a></li>
  </ul>
</body>
</html>
"#;

const SWAGGER_UI_PAGE: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Employee API docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ configUrl: "/v3/api-docs/swagger-config", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

/// Files served under `/public/`.
const ASSETS: &[(&str, &str, &str)] = &[
    (
        "style.css",
        "text/css; charset=utf-8",
        "body { font-family: sans-serif; margin: 2rem auto; max-width: 40rem; }\n",
    ),
    ("robots.txt", "text/plain; charset=utf-8", "User-agent: *\nDisallow: /api/\n"),
];

pub fn router() -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/public/*path", get(asset))
        .route("/swagger-ui.html", get(swagger_ui))
        .route("/v3/api-docs", get(api_docs))
        .route("/v3/api-docs/swagger-config", get(swagger_config))
}

pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub async fn asset(Path(path): Path<String>) -> Response {
    match ASSETS.iter().find(|(name, _, _)| *name == path) {
        Some((_, content_type, body)) => ([(header::CONTENT_TYPE, *content_type)], *body).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no public asset '{path}'")),
    }
}

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_PAGE)
}

pub async fn swagger_config() -> Json<Value> {
    Json(json!({ "url": "/v3/api-docs" }))
}

pub async fn api_docs() -> Json<Value> {
    Json(openapi_document())
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64", "minimum": 1 }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

/// OpenAPI 3 description of the employee and login endpoints.
pub fn openapi_document() -> Value {
    let employee = json!({ "$ref": "#/components/schemas/Employee" });
    let nullable_employee = json!({ "allOf": [employee.clone()], "nullable": true });
    let body = json!({
        "required": true,
        "content": { "application/json": { "schema": employee.clone() } }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Employee API",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/api/v1/employees": {
                "get": {
                    "summary": "List employees",
                    "responses": {
                        "200": json_response("All employees", json!({ "type": "array", "items": employee.clone() }))
                    }
                },
                "post": {
                    "summary": "Create an employee; any id in the body is ignored",
                    "requestBody": body.clone(),
                    "responses": { "200": json_response("Created employee", employee.clone()) }
                }
            },
            "/api/v1/employees/{id}": {
                "parameters": [id_parameter()],
                "get": {
                    "summary": "Get one employee",
                    "responses": { "200": json_response("The employee, or null when missing", nullable_employee.clone()) }
                },
                "put": {
                    "summary": "Replace an employee",
                    "requestBody": body,
                    "responses": { "200": json_response("The updated employee, or null when missing", nullable_employee) }
                },
                "delete": {
                    "summary": "Delete an employee",
                    "responses": {
                        "200": json_response("Outcome message", json!({
                            "type": "object",
                            "properties": {
                                "message": { "type": "string" },
                                "error": { "type": "string" }
                            }
                        }))
                    }
                }
            },
            "/api/v1/auth/success": {
                "get": {
                    "summary": "Result of a completed browser login",
                    "responses": {
                        "200": json_response("Access token and identity claims", json!({
                            "type": "object",
                            "properties": {
                                "message": { "type": "string" },
                                "access_token": { "type": "string" },
                                "user": { "type": "object", "additionalProperties": true }
                            }
                        })),
                        "401": { "description": "No login session" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Employee": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64", "readOnly": true },
                        "name": { "type": "string", "nullable": true }
                    },
                    "additionalProperties": true
                }
            },
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            }
        },
        "security": [{ "bearerAuth": [] }]
    })
}
