use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::pipeline::ScrapePipeline;

const MAX_BODY_BYTES: u64 = 16 * 1024;
const HEALTH_STATUS: &str = "AWS Architecture Scraper API service is up and running";

#[derive(Debug, Deserialize)]
struct ScrapeRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted_count: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// All HTTP routes, wired to a shared pipeline.
pub fn routes(
    pipeline: Arc<ScrapePipeline>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let with_pipeline = warp::any().map(move || pipeline.clone());

    let scrape_route = warp::path("scrape")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_pipeline.clone())
        .and_then(scrape);

    let list_route = warp::path("architectures")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_pipeline.clone())
        .and_then(list_architectures);

    let clear_route = warp::path("architectures")
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_pipeline)
        .and_then(clear_architectures);

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(health);

    let root_route = warp::path::end().and(warp::get()).map(health);

    scrape_route
        .or(list_route)
        .or(clear_route)
        .or(health_route)
        .or(root_route)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"])
                .allow_header("content-type"),
        )
        .with(warp::trace::request())
}

/// Serve until `shutdown` resolves.
pub async fn run_server(
    pipeline: Arc<ScrapePipeline>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let (bound, server) =
        warp::serve(routes(pipeline)).try_bind_with_graceful_shutdown(addr, shutdown)?;

    info!("Server running on http://{}", bound);
    server.await;
    info!("Server stopped");

    Ok(())
}

fn json_with_status<T: Serialize>(body: &T, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn failure(detail: String) -> WithStatus<Json> {
    json_with_status(&ErrorResponse { detail }, StatusCode::INTERNAL_SERVER_ERROR)
}

fn health() -> Json {
    warp::reply::json(&HealthResponse {
        status: HEALTH_STATUS,
    })
}

async fn scrape(
    request: ScrapeRequest,
    pipeline: Arc<ScrapePipeline>,
) -> Result<WithStatus<Json>, Infallible> {
    Ok(match pipeline.process(&request.url).await {
        Ok(_) => json_with_status(
            &MessageResponse {
                message: format!("Scraped {} successfully", request.url),
            },
            StatusCode::CREATED,
        ),
        Err(e) => failure(format!("Failed to scrape url: {}, Error: {}", request.url, e)),
    })
}

async fn list_architectures(
    pipeline: Arc<ScrapePipeline>,
) -> Result<WithStatus<Json>, Infallible> {
    Ok(match pipeline.list_all().await {
        Ok(records) => json_with_status(&records, StatusCode::OK),
        Err(e) => failure(format!("Failed to retrieve architectures: {}", e)),
    })
}

async fn clear_architectures(
    pipeline: Arc<ScrapePipeline>,
) -> Result<WithStatus<Json>, Infallible> {
    Ok(match pipeline.delete_all().await {
        Ok(deleted_count) => json_with_status(
            &DeleteResponse {
                deleted_count,
                message: format!("Deleted {} architectures", deleted_count),
            },
            StatusCode::OK,
        ),
        Err(e) => failure(format!("Failed to clear architectures: {}", e)),
    })
}
