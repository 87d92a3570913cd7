use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{error, info};
use std::net::SocketAddr;

use crate::data::{GenerationReport, TimetableConfig};
use crate::driver;

async fn generate_handler(
    Json(config): Json<TimetableConfig>,
) -> Result<Json<GenerationReport>, (StatusCode, String)> {
    let count = config.num_timetables;
    // the search is CPU-bound, keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || driver::generate_many(&config, count))
        .await
        .map_err(|e| {
            error!("Generation task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match outcome {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((StatusCode::BAD_REQUEST, e.to_string())),
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/timetables/generate", post(generate_handler))
}

pub async fn run_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/timetables/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn config_json(faculty: &str) -> Value {
        json!({
            "num_timetables": 2,
            "timetable_names": ["Morning", "Evening"],
            "working_days": 2,
            "day_start": "09:00",
            "day_end": "12:00",
            "lecture_slot_length_minutes": 60,
            "rooms": [{"name": "R1"}],
            "faculties": [{"name": "Prof. A"}],
            "subjects": [{"name": "Algebra", "code": "MA101", "faculty": faculty, "sessions_per_week": 2}],
            "time_format": "24h",
            "seed": 9,
        })
    }

    #[tokio::test]
    async fn generates_named_timetables() {
        let response = router()
            .oneshot(post_json(config_json("Prof. A")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["requested"], 2);
        let timetables = body["timetables"].as_array().unwrap();
        assert_eq!(timetables.len(), 2);
        assert_eq!(timetables[0]["name"], "Morning");
        let schedule = timetables[0]["schedule"].as_array().unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0]["subject_code"], "MA101");
        assert_eq!(schedule[0]["start_time"].as_str().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn unknown_faculty_is_bad_request() {
        let response = router()
            .oneshot(post_json(config_json("Prof. X")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(message.contains("Prof. X"));
    }

    #[tokio::test]
    async fn oversized_timetable_count_is_bad_request() {
        let mut config = config_json("Prof. A");
        config["num_timetables"] = json!(1_000_000_000u64);
        let response = router().oneshot(post_json(config)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(message.contains("num_timetables"));
    }
}
