//! HTTP surface for the mock account directory.
//!
//! One endpoint, `GET /hello` (with or without a trailing slash), returning
//! the fixture's accounts as JSON. The optional `UpdatedAt.gt` query
//! parameter asks for accounts only if anything was updated after that
//! instant; otherwise the list comes back empty.
//!
//! Every failure on this path degrades to an empty response with HTTP 200:
//! integration suites point real clients at this server, and those clients
//! treat non-200 as a directory outage.

use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use url::form_urlencoded;

use crate::fixture::{self, AccountsResponse};
use crate::store::AccountStore;

type BoxBody = http_body_util::combinators::BoxBody<bytes::Bytes, hyper::Error>;

fn full<T: Into<bytes::Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<BoxBody> {
    let body = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full(body))
        .unwrap()
}

/// Extract the decoded `UpdatedAt.gt` parameter. An empty value counts as
/// absent, like an empty `lt` on the original directory.
fn updated_after_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == "UpdatedAt.gt" && !value.is_empty() {
            return Some(value.into_owned());
        }
    }
    None
}

/// Handle `GET /hello`.
///
/// Without a filter: reload the fixture, merge it into the cache, return
/// everything. With a filter: reload, and return the fresh accounts only
/// when the filter instant is strictly before the dataset's most recent
/// update; otherwise an empty list. Load and parse failures degrade to an
/// empty response.
async fn handle_hello(query: Option<&str>, store: &AccountStore) -> AccountsResponse {
    let Some(raw) = updated_after_param(query) else {
        return match store.reload() {
            Ok(loaded) => {
                let cached = store.merge(&loaded.response.accounts).await;
                println!(
                    "GET /hello -> {} accounts ({} cached)",
                    loaded.response.accounts.len(),
                    cached
                );
                loaded.response
            }
            Err(err) => {
                println!("fixture load failed: {}", err);
                AccountsResponse::default()
            }
        };
    };

    let updated_after = match fixture::parse_updated_after(&raw) {
        Ok(instant) => instant,
        Err(err) => {
            println!("unparsable UpdatedAt.gt {:?}: {}", raw, err);
            return AccountsResponse::default();
        }
    };

    match store.reload() {
        Ok(loaded) => {
            if updated_after < loaded.most_recent {
                let cached = store.merge(&loaded.response.accounts).await;
                println!(
                    "GET /hello?UpdatedAt.gt={} -> {} accounts ({} cached)",
                    raw,
                    loaded.response.accounts.len(),
                    cached
                );
                loaded.response
            } else {
                println!("GET /hello?UpdatedAt.gt={} -> nothing newer", raw);
                AccountsResponse::default()
            }
        }
        Err(err) => {
            println!("fixture load failed: {}", err);
            AccountsResponse::default()
        }
    }
}

/// Route an incoming request.
async fn handle_request(
    req: Request<Incoming>,
    store: Arc<AccountStore>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // "/hello" and "/hello/" collapse to the same segment list.
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (method, segments.as_slice()) {
        (Method::GET, ["hello"]) => {
            let body = handle_hello(req.uri().query(), &store).await;
            json_response(StatusCode::OK, &body)
        }
        _ => json_response(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "error": "not found" }),
        ),
    };

    Ok(response)
}

/// Serve requests on an already-bound listener until the process is killed.
///
/// Taking the listener (rather than an address) lets tests bind port 0 and
/// read the ephemeral address back before starting the loop.
pub async fn run_server(listener: TcpListener, store: Arc<AccountStore>) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let store = store.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let store = store.clone();
                handle_request(req, store)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("Error serving connection: {:?}", err);
            }
        });
    }
}
