use crate::config::Config;
use crate::html::{self, BuildCandidate};
use crate::logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Koji search returned status {0}")]
    Status(StatusCode),
    #[error("Koji search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to fetch build {build_id}: {source}")]
    Fetch {
        build_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("No binary {arch} RPM found for build {build_id}")]
    NoArtifact { build_id: String, arch: String },
}

/// HTTP access to the Koji web interface.
pub struct KojiClient {
    http: reqwest::Client,
    search_url: String,
    buildinfo_url: String,
    dist_marker: String,
    arch: String,
}

impl KojiClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kojinstall/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            search_url: config.search_url(),
            buildinfo_url: config.buildinfo_url(),
            dist_marker: config.dist_marker.clone(),
            arch: config.arch.clone(),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Walks every results page for `term` and collects the builds that carry
    /// the dist marker, in the order Koji lists them.
    ///
    /// A bad status on any page fails the whole search. A transport error
    /// after at least one good page keeps what was found so far.
    pub async fn search(&self, term: &str) -> Result<Vec<BuildCandidate>, SearchError> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Searching Koji for {}", Logger::highlight(term)));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        let mut candidates = Vec::new();
        let mut start = 0usize;
        let mut pages = 0usize;

        loop {
            let page = match self.fetch_search_page(term, start).await {
                Ok(page) => page,
                Err(SearchError::Request(e)) if pages > 0 => {
                    pb.suspend(|| Logger::warn(format!("Search stopped early: {}", e)));
                    break;
                }
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            pages += 1;

            if page.rows == 0 {
                break;
            }
            candidates.extend(page.candidates);
            log::debug!(
                "Search page at offset {}: {} rows, {} builds so far",
                start,
                page.rows,
                candidates.len()
            );

            if !page.has_next {
                break;
            }
            start += page.rows;
            pb.set_message(format!("Found {} builds so far...", candidates.len()));
        }

        pb.finish_and_clear();
        Logger::info(format!("Found {} builds in total", candidates.len()));
        Ok(candidates)
    }

    async fn fetch_search_page(
        &self,
        term: &str,
        start: usize,
    ) -> Result<html::SearchPage, SearchError> {
        let start = start.to_string();
        let res = self
            .http
            .get(&self.search_url)
            .query(&[
                ("match", "glob"),
                ("type", "package"),
                ("terms", term),
                ("start", start.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(SearchError::Status(res.status()));
        }

        let body = res.text().await?;
        Ok(html::parse_search_page(&body, &self.dist_marker))
    }

    /// Finds the download link of the binary RPM for this build.
    /// The result may be host-relative; see [`Config::qualify`].
    pub async fn resolve_artifact(&self, build_id: &str) -> Result<String, ResolveError> {
        let fetch = |source| ResolveError::Fetch {
            build_id: build_id.to_string(),
            source,
        };

        let body = self
            .http
            .get(&self.buildinfo_url)
            .query(&[("buildID", build_id)])
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(fetch)?
            .text()
            .await
            .map_err(fetch)?;

        let links = html::parse_detail_page(&body);
        log::debug!("Build {} page has {} links", build_id, links.len());

        html::pick_artifact(&links, &self.arch)
            .map(str::to_string)
            .ok_or_else(|| ResolveError::NoArtifact {
                build_id: build_id.to_string(),
                arch: self.arch.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockKoji, result_page};

    fn client(base: &str) -> KojiClient {
        let config = Config {
            koji_url: base.to_string(),
            arch: "aarch64".to_string(),
            ..Config::default()
        };
        KojiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn search_follows_next_links_by_row_count() {
        let koji = MockKoji::new()
            .search_page(0, &result_page(&[("foo-1.0-1.fc39", "1"), ("foo-1.0-1.el9", "2")], true))
            .search_page(2, &result_page(&[("foo-1.1-1.fc40", "3")], false))
            .serve()
            .await;

        let found = client(&koji.base).search("foo").await.unwrap();

        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["foo-1.0-1.fc39", "foo-1.1-1.fc40"]);
        assert_eq!(koji.search_starts(), vec![0, 2]);
    }

    #[tokio::test]
    async fn search_without_rows_is_empty_not_an_error() {
        let koji = MockKoji::new()
            .search_page(0, "<html><body><p>No search results</p></body></html>")
            .serve()
            .await;

        let found = client(&koji.base).search("nothing").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn search_status_error_is_distinct_from_empty() {
        let koji = MockKoji::new().search_status(0, 503).serve().await;

        let err = client(&koji.base).search("foo").await.unwrap_err();
        assert!(matches!(err, SearchError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn bad_status_on_a_later_page_fails_the_search() {
        let koji = MockKoji::new()
            .search_page(0, &result_page(&[("foo-1.0-1.fc39", "1")], true))
            .search_status(1, 500)
            .serve()
            .await;

        let err = client(&koji.base).search("foo").await.unwrap_err();

        assert!(matches!(err, SearchError::Status(s) if s.as_u16() == 500));
        assert_eq!(koji.search_starts(), vec![0, 1]);
    }

    #[tokio::test]
    async fn dropped_connection_after_a_good_page_keeps_partial_results() {
        let koji = MockKoji::new()
            .search_page(0, &result_page(&[("foo-1.0-1.fc39", "1")], true))
            .broken_search_page(1)
            .serve()
            .await;

        let found = client(&koji.base).search("foo").await.unwrap();

        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["foo-1.0-1.fc39"]);
        assert_eq!(koji.search_starts(), vec![0, 1]);
    }

    #[tokio::test]
    async fn search_fails_when_host_is_unreachable() {
        let err = client("http://127.0.0.1:9").search("foo").await.unwrap_err();
        assert!(matches!(err, SearchError::Request(_)));
    }

    #[tokio::test]
    async fn resolve_picks_binary_link() {
        let koji = MockKoji::new()
            .build_page(
                "12345",
                &[
                    "/packages/foo/1.2/1.fc40/src/foo-1.2-1.fc40.src.rpm",
                    "/packages/foo/1.2/1.fc40/aarch64/foo-debuginfo-1.2-1.fc40.aarch64.rpm",
                    "/packages/foo/1.2/1.fc40/aarch64/foo-1.2-1.fc40.aarch64.rpm",
                ],
            )
            .serve()
            .await;

        let url = client(&koji.base).resolve_artifact("12345").await.unwrap();
        assert_eq!(url, "/packages/foo/1.2/1.fc40/aarch64/foo-1.2-1.fc40.aarch64.rpm");
    }

    #[tokio::test]
    async fn resolve_reports_missing_artifact_and_bad_status() {
        let koji = MockKoji::new()
            .build_page("1", &["/packages/foo/1.2/1.fc40/x86_64/foo-1.2-1.fc40.x86_64.rpm"])
            .serve()
            .await;
        let koji_client = client(&koji.base);

        let err = koji_client.resolve_artifact("1").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoArtifact { .. }));

        let err = koji_client.resolve_artifact("404").await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch { .. }));
    }
}
