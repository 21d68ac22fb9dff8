// Browser-like page sessions and the HTTP fetcher behind them

use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "dircrawl/0.1 (+https://github.com/dircrawl/dircrawl)";

/// One stateful page session: navigate, wait, read, repeat.
///
/// A session is owned by exactly one leaf traversal and closed when it ends.
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` as the current page.
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// Wait until `selector` matches on the current page.
    ///
    /// Returns `Ok(false)` if it never appears. Callers bound the wait with their
    /// own timeout; a session backed by a live DOM may poll until then.
    async fn wait_for(&mut self, selector: &Selector) -> Result<bool>;

    /// Markup of the current page, empty before the first navigation.
    fn content(&self) -> &str;

    fn current_url(&self) -> Option<&Url>;

    /// Release whatever the session holds. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh [`PageSession`] per leaf traversal.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: PageSession;

    async fn open(&self) -> Result<Self::Session>;
}

/// Settings shared by every HTTP client this crate builds.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    fn client(&self, cookies: bool) -> Result<Client> {
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .cookie_store(cookies)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(client)
    }
}

/// GETs pages as text, retrying transient failures with linear backoff.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retries: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self::with_client(config.client(false)?, config))
    }

    fn with_client(client: Client, config: &HttpConfig) -> Self {
        Self {
            client,
            retries: config.retries,
            retry_backoff: config.retry_backoff,
        }
    }

    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{}",
                        url, e, attempt, self.retries
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::StatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// A session over plain HTTP with its own cookie jar.
///
/// The loaded document is static, so `wait_for` answers from the markup at hand.
pub struct HttpSession {
    fetcher: Option<HttpFetcher>,
    current_url: Option<Url>,
    content: String,
}

impl HttpSession {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_client(config.client(true)?, config);
        Ok(Self {
            fetcher: Some(fetcher),
            current_url: None,
            content: String::new(),
        })
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| ScrapeError::SessionError("session already closed".to_string()))?;
        let body = fetcher.fetch(url).await?;
        self.current_url = Some(url.clone());
        self.content = body;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &Selector) -> Result<bool> {
        let found = {
            let document = Html::parse_document(&self.content);
            document.select(selector).next().is_some()
        };
        Ok(found)
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    async fn close(&mut self) -> Result<()> {
        if self.fetcher.take().is_some() {
            debug!("Closed HTTP session");
        }
        self.content.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpSessionFactory {
    config: HttpConfig,
}

impl HttpSessionFactory {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession> {
        HttpSession::new(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn quick_config() -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(5),
            retries: 2,
            retry_backoff: Duration::from_millis(1),
            ..HttpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/home.page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&quick_config()).unwrap();
        let url = Url::parse(&format!("{}/home.page", mock_server.uri())).unwrap();
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, "<html>home</html>");
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&quick_config()).unwrap();
        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        match fetcher.fetch(&url).await {
            Err(ScrapeError::StatusError { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&quick_config()).unwrap();
        let url = Url::parse(&format!("{}/flaky", mock_server.uri())).unwrap();
        assert_eq!(fetcher.fetch(&url).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&quick_config()).unwrap();
        let url = Url::parse(&format!("{}/down", mock_server.uri())).unwrap();
        assert!(fetcher.fetch(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_session_keeps_cookies_between_pages() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "JSESSIONID=abc123; Path=/")
                    .set_body_string("<div class='result_hit'></div>"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .and(header("cookie", "JSESSIONID=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("second"))
            .mount(&mock_server)
            .await;

        let mut session = HttpSession::new(&quick_config()).unwrap();
        let page1 = Url::parse(&format!("{}/page1", mock_server.uri())).unwrap();
        let page2 = Url::parse(&format!("{}/page2", mock_server.uri())).unwrap();

        session.navigate(&page1).await.unwrap();
        let marker = Selector::parse(".result_hit").unwrap();
        assert!(session.wait_for(&marker).await.unwrap());
        assert_eq!(session.current_url(), Some(&page1));

        session.navigate(&page2).await.unwrap();
        assert_eq!(session.content(), "second");
        assert!(!session.wait_for(&marker).await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_session_refuses_navigation() {
        let mut session = HttpSession::new(&quick_config()).unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert!(matches!(
            session.navigate(&url).await,
            Err(ScrapeError::SessionError(_))
        ));
    }
}
