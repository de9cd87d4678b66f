//! Page retrieval.
//!
//! One attempt per page, bounded by the client timeout. Every transport
//! problem comes back as an `Err`; the game loop turns it into a finished
//! run instead of letting it escape.

use crate::config::FetchConfig;
use crate::page::normalize_url;
use reqwest::{redirect, Client};
use tracing::debug;
use wikirace_error::{Error, Result};

/// Source of raw page markup
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetch the page body at the absolute `url`
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `PageFetcher` over HTTPS
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(redirect::Policy::limited(10))
            .build()
            .map_err(|e| {
                Error::config_invalid("failed to create HTTP client")
                    .with_operation("fetch::new")
                    .set_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Follow the site's random-article redirect and return where it lands.
    pub async fn resolve_random_start(&self) -> Result<String> {
        let url = self.config.random_page_url();
        let response = self.send(&url).await.map_err(|e| e.with_operation("fetch::random"))?;
        let landed = normalize_url(response.url().as_str());
        debug!(from = %url, to = %landed, "resolved random start page");
        Ok(landed)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), url).with_operation("fetch::get"));
        }
        Ok(response)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> Error {
        let error = if err.is_timeout() {
            Error::timeout("fetch::get", self.config.timeout)
        } else {
            Error::network_failed(err.to_string()).with_operation("fetch::get")
        };
        error.with_context("url", url).set_source(err)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching page");
        let response = self.send(url).await?;
        response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wikirace_error::ErrorKind;

    /// Serve `responses` in order, one per accepted connection.
    async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });
        format!("http://{}", addr)
    }

    fn http(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            headers,
            body
        )
    }

    fn fetcher(base_url: String) -> HttpFetcher {
        HttpFetcher::new(FetchConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let base = serve(vec![http("200 OK", "Content-Type: text/html\r\n", "<h1>Hi</h1>")]).await;
        let body = fetcher(base.clone()).fetch(&format!("{}/wiki/Hi", base)).await.unwrap();
        assert_eq!(body, "<h1>Hi</h1>");
    }

    #[tokio::test]
    async fn test_fetch_bad_status() {
        let base = serve(vec![http("404 Not Found", "", "gone")]).await;
        let err = fetcher(base.clone()).fetch(&format!("{}/wiki/Gone", base)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert!(err.context().iter().any(|(k, v)| *k == "status" && v == "404"));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{}", addr);
        let err = fetcher(base.clone()).fetch(&format!("{}/wiki/X", base)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        // Accept the connection, never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let fetcher = HttpFetcher::new(FetchConfig {
            base_url: base.clone(),
            timeout: Duration::from_millis(200),
            ..FetchConfig::default()
        })
        .unwrap();
        let err = fetcher.fetch(&format!("{}/wiki/Cisza", base)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.operation(), "fetch::get");
        assert_eq!(err.context()[0], ("timeout_ms", "200".to_string()));
        assert!(err.message().contains("200ms"));
    }

    #[tokio::test]
    async fn test_resolve_random_start_follows_redirect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let redirect = http(
            "302 Found",
            &format!("Location: {}/wiki/Pozna%C5%84#Historia\r\n", base),
            "",
        );
        let landing = http("200 OK", "", "<html></html>");
        tokio::spawn(async move {
            for response in [redirect, landing] {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        let start = fetcher(base.clone()).resolve_random_start().await.unwrap();
        assert_eq!(start, format!("{}/wiki/Pozna%C5%84", base));
    }
}
