use crate::css::media_matches;
use crate::error::{Result, ScanError};
use crate::resolve::StyleResolver;
use crate::snapshot::PageSnapshot;
use crate::values::Viewport;
use futures::future::join_all;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A loaded page: its markup plus every stylesheet that applies to it, in
/// cascade order.
#[derive(Debug, Clone)]
pub struct Page {
    pub location: String,
    pub html: String,
    pub stylesheets: Vec<String>,
    pub viewport: Viewport,
}

impl Page {
    pub fn resolver(&self) -> StyleResolver {
        StyleResolver::with_stylesheets(self.viewport, self.stylesheets.iter().map(String::as_str))
    }

    /// Resolves the computed style of every element in document order.
    pub fn sample(&self) -> PageSnapshot {
        let resolver = self.resolver();
        debug!(
            "Resolving {} with {} rules",
            self.location,
            resolver.rule_count()
        );

        PageSnapshot {
            url: Some(self.location.clone()),
            elements: resolver.sample(&self.html),
        }
    }
}

/// A `<style>` block or a `<link rel="stylesheet">` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StyleSource {
    Inline(String),
    Linked(String),
}

/// What linked stylesheet references are resolved against.
enum Base {
    Url(Url),
    Dir(PathBuf),
}

enum StylesheetLocation {
    Remote(String),
    Local(PathBuf),
}

impl Base {
    fn locate(&self, href: &str) -> Option<StylesheetLocation> {
        if let Ok(absolute) = Url::parse(href)
            && matches!(absolute.scheme(), "http" | "https")
        {
            return Some(StylesheetLocation::Remote(absolute.to_string()));
        }

        match self {
            Base::Url(base) => resolve_url(base, href).map(StylesheetLocation::Remote),
            Base::Dir(dir) => {
                let relative = href.split(['?', '#']).next().unwrap_or_default();
                if relative.is_empty() || href.starts_with("//") {
                    return None;
                }
                Some(StylesheetLocation::Local(dir.join(relative)))
            }
        }
    }
}

pub struct PageLoader {
    client: Client,
    viewport: Viewport,
    external_stylesheets: bool,
    progress_callback: Option<ProgressCallback>,
}

impl PageLoader {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Swatch/0.1 (https://github.com/trapdoorsec/swatch)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            viewport: Viewport::default(),
            external_stylesheets: true,
            progress_callback: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_external_stylesheets(mut self, enabled: bool) -> Self {
        self.external_stylesheets = enabled;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report(&self, message: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(message);
        }
    }

    /// Fetches an HTML page and the stylesheets it links to.
    pub async fn load_url(&self, url: &str) -> Result<Page> {
        let parsed = Url::parse(url)
            .map_err(|e| ScanError::InvalidUrl(format!("Invalid URL: {}", e)))?;

        info!("Loading {}", parsed);
        self.report(format!("Fetching {}", parsed));

        let response = self.client.get(parsed.as_str()).send().await?.error_for_status()?;
        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref ct) = content_type
            && !ct.contains("html")
        {
            return Err(ScanError::ParseError(format!(
                "Expected an HTML page at {}, got {}",
                final_url, ct
            )));
        }

        let html = response.text().await?;
        let sources = self.collect_style_sources(&html)?;
        let stylesheets = self.gather_stylesheets(sources, &Base::Url(final_url.clone())).await;

        Ok(Page {
            location: final_url.to_string(),
            html,
            stylesheets,
            viewport: self.viewport,
        })
    }

    /// Reads a local HTML file; relative stylesheet links are read from disk.
    pub async fn load_file(&self, path: &Path) -> Result<Page> {
        info!("Loading {}", path.display());
        self.report(format!("Reading {}", path.display()));

        let html = tokio::fs::read_to_string(path).await?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let sources = self.collect_style_sources(&html)?;
        let stylesheets = self.gather_stylesheets(sources, &Base::Dir(dir)).await;

        Ok(Page {
            location: path.display().to_string(),
            html,
            stylesheets,
            viewport: self.viewport,
        })
    }

    /// Reads a JSON snapshot of already-resolved element styles.
    pub async fn load_snapshot(&self, path: &Path) -> Result<PageSnapshot> {
        info!("Loading snapshot {}", path.display());
        self.report(format!("Reading snapshot {}", path.display()));

        let json = tokio::fs::read_to_string(path).await?;
        PageSnapshot::from_json(&json)
    }

    /// Style sources in document order, minus those whose media never applies.
    fn collect_style_sources(&self, html: &str) -> Result<Vec<StyleSource>> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("style, link[rel][href]")
            .map_err(|e| ScanError::ParseError(format!("{:?}", e)))?;

        let mut sources = Vec::new();
        for element in document.select(&selector) {
            let value = element.value();
            if let Some(media) = value.attr("media")
                && !media_matches(media, self.viewport)
            {
                debug!("Skipping stylesheet for media '{}'", media);
                continue;
            }

            if value.name() == "style" {
                sources.push(StyleSource::Inline(element.text().collect()));
                continue;
            }

            let rel = value.attr("rel").unwrap_or_default().to_ascii_lowercase();
            let is_stylesheet = rel.split_whitespace().any(|r| r == "stylesheet")
                && !rel.split_whitespace().any(|r| r == "alternate");

            if is_stylesheet && let Some(href) = value.attr("href") {
                sources.push(StyleSource::Linked(href.trim().to_string()));
            }
        }

        debug!("Found {} style sources", sources.len());
        Ok(sources)
    }

    async fn gather_stylesheets(&self, sources: Vec<StyleSource>, base: &Base) -> Vec<String> {
        let fetches = sources.into_iter().map(|source| async move {
            match source {
                StyleSource::Inline(css) => Some(css),
                StyleSource::Linked(href) => {
                    if !self.external_stylesheets {
                        debug!("External stylesheets disabled, skipping {}", href);
                        return None;
                    }
                    let location = base.locate(&href)?;
                    match self.read_stylesheet(&location).await {
                        Ok(css) => Some(css),
                        Err(e) => {
                            warn!("Skipping stylesheet {}: {}", href, e);
                            None
                        }
                    }
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    async fn read_stylesheet(&self, location: &StylesheetLocation) -> Result<String> {
        match location {
            StylesheetLocation::Remote(url) => {
                self.report(format!("Fetching stylesheet {}", url));
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok(response.text().await?)
            }
            StylesheetLocation::Local(path) => {
                self.report(format!("Reading stylesheet {}", path.display()));
                Ok(tokio::fs::read_to_string(path).await?)
            }
        }
    }
}

impl Default for PageLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_url(base: &Url, href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with("data:") || href.starts_with("javascript:") {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_html(server: &MockServer, route: &str, html: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_bytes(html.as_bytes()),
            )
            .mount(server)
            .await;
    }

    async fn mount_css(server: &MockServer, route: &str, css: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/css")
                    .set_body_bytes(css.as_bytes()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_load_url_with_linked_and_inline_styles() {
        let mock_server = MockServer::start().await;

        mount_html(
            &mock_server,
            "/",
            r#"<html><head>
                <link rel="stylesheet" href="/site.css">
                <style>.lead { font-size: 24px }</style>
                <link rel="stylesheet" href="/print.css" media="print">
            </head><body><p class="lead">Hello</p></body></html>"#,
        )
        .await;
        mount_css(&mock_server, "/site.css", ".lead { color: #ff0000; padding: 10px }").await;
        mount_css(&mock_server, "/print.css", ".lead { color: black }").await;

        let loader = PageLoader::new();
        let page = loader.load_url(&mock_server.uri()).await.unwrap();

        assert_eq!(page.stylesheets.len(), 2);
        assert!(page.stylesheets[0].contains("#ff0000"));
        assert!(page.stylesheets[1].contains("24px"));

        let snapshot = page.sample();
        let p = snapshot.elements.iter().find(|e| e.tag == "P").unwrap();
        assert_eq!(p.style.color, "rgb(255, 0, 0)");
        assert_eq!(p.style.font_size, "24px");
        assert_eq!(p.style.padding, "10px");
        assert_eq!(p.text, "Hello");
    }

    #[tokio::test]
    async fn test_external_stylesheets_can_be_disabled() {
        let mock_server = MockServer::start().await;

        mount_html(
            &mock_server,
            "/",
            r#"<html><head><link rel="stylesheet" href="/site.css"></head><body></body></html>"#,
        )
        .await;
        mount_css(&mock_server, "/site.css", "body { color: red }").await;

        let loader = PageLoader::new().with_external_stylesheets(false);
        let page = loader.load_url(&mock_server.uri()).await.unwrap();

        assert!(page.stylesheets.is_empty());
    }

    #[tokio::test]
    async fn test_missing_stylesheet_is_skipped() {
        let mock_server = MockServer::start().await;

        mount_html(
            &mock_server,
            "/",
            r#"<html><head><link rel="stylesheet" href="/gone.css"><style>p { margin: 0 }</style></head></html>"#,
        )
        .await;

        let page = PageLoader::new().load_url(&mock_server.uri()).await.unwrap();

        assert_eq!(page.stylesheets, vec!["p { margin: 0 }".to_string()]);
    }

    #[tokio::test]
    async fn test_non_html_response_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(b"{}"),
            )
            .mount(&mock_server)
            .await;

        let result = PageLoader::new()
            .load_url(&format!("{}/data", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(ScanError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_http_error_status_is_an_error() {
        let mock_server = MockServer::start().await;

        let result = PageLoader::new()
            .load_url(&format!("{}/missing", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(ScanError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let result = PageLoader::new().load_url("not a url").await;
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_progress_callback_receives_messages() {
        let mock_server = MockServer::start().await;
        mount_html(&mock_server, "/", "<html><body></body></html>").await;

        let messages = Arc::new(Mutex::new(Vec::new()));
        let messages_clone = messages.clone();
        let loader = PageLoader::new().with_progress_callback(Arc::new(move |msg: String| {
            messages_clone.lock().unwrap().push(msg);
        }));

        loader.load_url(&mock_server.uri()).await.unwrap();

        let messages = messages.lock().unwrap();
        assert!(messages.iter().any(|m| m.starts_with("Fetching")));
    }

    #[tokio::test]
    async fn test_load_file_reads_relative_stylesheets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("theme.css"), "h1 { color: #00ff00 }").unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<html><head><link rel="stylesheet" href="theme.css?v=2"></head>
               <body><h1>Title</h1></body></html>"#,
        )
        .unwrap();

        let page = PageLoader::new()
            .load_file(&dir.path().join("index.html"))
            .await
            .unwrap();

        let snapshot = page.sample();
        let h1 = snapshot.elements.iter().find(|e| e.tag == "H1").unwrap();
        assert_eq!(h1.style.color, "rgb(0, 255, 0)");
        assert_eq!(h1.style.font_size, "32px");
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snapshot.json");
        std::fs::write(
            &file,
            r#"{ "url": "https://example.com", "elements": [ { "tag": "DIV", "style": { "gap": "4px" } } ] }"#,
        )
        .unwrap();

        let snapshot = PageLoader::new().load_snapshot(&file).await.unwrap();

        assert_eq!(snapshot.url.as_deref(), Some("https://example.com"));
        assert_eq!(snapshot.elements[0].style.gap, "4px");
    }

    #[test]
    fn test_resolve_url_strips_fragment() {
        let base = Url::parse("https://example.com/docs/index.html").unwrap();
        assert_eq!(
            resolve_url(&base, "../css/site.css#x"),
            Some("https://example.com/css/site.css".to_string())
        );
        assert_eq!(resolve_url(&base, ""), None);
        assert_eq!(resolve_url(&base, "data:text/css,p{}"), None);
    }
}
