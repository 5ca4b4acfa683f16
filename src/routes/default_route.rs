use actix_web::{get, HttpResponse};
use serde_json::json;

#[get("/")]
async fn default() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
