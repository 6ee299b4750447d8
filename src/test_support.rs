//! A local stand-in for the Koji web interface and package host.

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const NO_RESULTS: &str = "<html><body><p>No search results</p></body></html>";

#[derive(Default)]
struct Routes {
    search_pages: HashMap<usize, String>,
    search_status: HashMap<usize, u16>,
    broken_search: HashSet<usize>,
    builds: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    broken_files: HashSet<String>,
    search_starts: Mutex<Vec<usize>>,
    downloads: Mutex<Vec<String>>,
}

#[derive(Default)]
pub struct MockKoji {
    routes: Routes,
}

pub struct RunningKoji {
    pub base: String,
    routes: Arc<Routes>,
}

impl MockKoji {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_page(mut self, start: usize, html: &str) -> Self {
        self.routes.search_pages.insert(start, html.to_string());
        self
    }

    pub fn search_status(mut self, start: usize, status: u16) -> Self {
        self.routes.search_status.insert(start, status);
        self
    }

    /// The page at `start` sends a few bytes and then drops the connection.
    pub fn broken_search_page(mut self, start: usize) -> Self {
        self.routes.broken_search.insert(start);
        self
    }

    pub fn build_page(mut self, build_id: &str, links: &[&str]) -> Self {
        let anchors: String = links
            .iter()
            .map(|href| format!("<tr><td><a href=\"{}\">download</a></td></tr>\n", href))
            .collect();
        let html = format!(
            "<html><body><h4>Information for build {}</h4><table>\n{}</table></body></html>",
            build_id, anchors
        );
        self.routes.builds.insert(build_id.to_string(), html);
        self
    }

    pub fn file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.routes.files.insert(path.to_string(), bytes.to_vec());
        self
    }

    /// Starts sending `path` and fails partway through the body.
    pub fn broken_file(mut self, path: &str) -> Self {
        self.routes.broken_files.insert(path.to_string());
        self
    }

    pub async fn serve(self) -> RunningKoji {
        let routes = Arc::new(self.routes);
        let app = Router::new()
            .route("/koji/search", get(search))
            .route("/koji/buildinfo", get(buildinfo))
            .fallback(file)
            .with_state(routes.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RunningKoji {
            base: format!("http://{}", addr),
            routes,
        }
    }
}

impl RunningKoji {
    pub fn search_starts(&self) -> Vec<usize> {
        self.routes.search_starts.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.routes.downloads.lock().unwrap().clone()
    }
}

/// A search results page in Koji's table layout.
pub fn result_page(builds: &[(&str, &str)], next: bool) -> String {
    let rows: String = builds
        .iter()
        .enumerate()
        .map(|(i, (name, id))| {
            let class = if i % 2 == 0 { "row-odd" } else { "row-even" };
            format!(
                "<tr class=\"{}\"><td><a href=\"buildinfo?buildID={}\">{}</a></td><td>owner</td></tr>\n",
                class, id, name
            )
        })
        .collect();
    let next = if next {
        "<a href=\"search?start=next\">Next</a>"
    } else {
        ""
    };
    format!(
        "<html><body><table class=\"data-list\">\n<tr><th>Name</th><th>Owner</th></tr>\n{}</table>{}</body></html>",
        rows, next
    )
}

async fn search(
    State(routes): State<Arc<Routes>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let start = query
        .get("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    routes.search_starts.lock().unwrap().push(start);

    if let Some(code) = routes.search_status.get(&start) {
        return StatusCode::from_u16(*code).unwrap().into_response();
    }
    if routes.broken_search.contains(&start) {
        return truncated_body();
    }
    let page = routes
        .search_pages
        .get(&start)
        .cloned()
        .unwrap_or_else(|| NO_RESULTS.to_string());
    Html(page).into_response()
}

async fn buildinfo(
    State(routes): State<Arc<Routes>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let build = query.get("buildID").and_then(|id| routes.builds.get(id));
    match build {
        Some(html) => Html(html.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn file(State(routes): State<Arc<Routes>>, uri: Uri) -> Response {
    routes.downloads.lock().unwrap().push(uri.path().to_string());
    if routes.broken_files.contains(uri.path()) {
        return truncated_body();
    }
    match routes.files.get(uri.path()) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A 200 response whose body errors after the first chunk. The pause lets
/// the headers and first chunk reach the client before the connection dies.
fn truncated_body() -> Response {
    let chunks = futures_util::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok(b"<html><body><table>".to_vec()), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Some((Err(io::Error::other("connection reset")), 2))
            }
            _ => None,
        }
    });
    Body::from_stream(chunks).into_response()
}
