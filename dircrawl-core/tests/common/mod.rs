// Mock directory pages shared by the integration tests

#![allow(dead_code)]

use dircrawl_core::explore::CategoryExplorer;
use dircrawl_core::sink::OutputSink;
use dircrawl_scanner::{
    HttpConfig, HttpFetcher, HttpSessionFactory, Paginator, RecordExtractor, SiteProfile,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub fn category_page(links: &[(&str, &str)]) -> String {
    let blocks: String = links
        .iter()
        .map(|(name, href)| {
            format!(
                r#"<li class="category-block"><a href="{}"><span>{}</span></a></li>"#,
                href, name
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", blocks)
}

pub fn listing_page(titles: &[&str]) -> String {
    let items: String = titles
        .iter()
        .map(|title| {
            format!(
                r#"<li class="result_hit">
                    <h3><a href="/service/{0}">{0}</a></h3>
                    <div class="result-hit-body"><p class="mb-2">About {0}</p></div>
                    <span class="comma_split_line">1 Market St</span>
                    <span class="comma_split_line">Wigan</span>
                    <i class="fa fa-envelope"></i><a href="mailto:info@{0}.test">info@{0}.test</a>
                </li>"#,
                title
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", items)
}

pub fn empty_page() -> String {
    "<html><body><p>No results found</p></body></html>".to_string()
}

/// Serve `body` for `/fsd/<page>?id=<id>`.
pub async fn mount(server: &MockServer, page: &str, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/fsd/{}", page)))
        .and(query_param("id", id))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, page: &str, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/fsd/{}", page)))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn url_for(server: &MockServer, page: &str, id: &str) -> Url {
    Url::parse(&format!("{}/fsd/{}?id={}", server.uri(), page, id)).unwrap()
}

pub fn http_config() -> HttpConfig {
    HttpConfig {
        timeout: Duration::from_secs(5),
        retries: 0,
        retry_backoff: Duration::from_millis(10),
        ..HttpConfig::default()
    }
}

pub fn explorer<K: OutputSink>(sink: K) -> CategoryExplorer<HttpSessionFactory, K> {
    let config = http_config();
    let profile = Arc::new(SiteProfile::default().compile().unwrap());
    let paginator = Paginator::new(
        HttpSessionFactory::new(config.clone()),
        RecordExtractor::new(profile),
    )
    .with_wait_timeout(Duration::from_millis(200))
    .with_page_delay(Duration::ZERO);
    CategoryExplorer::new(HttpFetcher::new(&config).unwrap(), paginator, sink)
}
