// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{AssetsConfig, SourceConfig};

/// Create the client used for the bulletin page.
///
/// `accept_invalid_certs` disables certificate validation for every request
/// made through this client, so it must not be shared with other hosts.
pub fn create_source_client(config: &SourceConfig) -> Result<reqwest::Client> {
    if config.accept_invalid_certs {
        log::debug!("TLS certificate validation disabled for bulletin client");
    }
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}

/// Create the client used for map and flag providers.
pub fn create_assets_client(config: &AssetsConfig, user_agent: &str) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page and parse it as HTML.
pub async fn fetch_page_async(client: &reqwest::Client, url: &str) -> Result<Html> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("status {status}")));
    }
    let text = response.text().await?;
    Ok(Html::parse_document(&text))
}

/// Fetch a resource as raw bytes.
///
/// `context` names the resource in errors instead of the URL, which may carry
/// an API key.
pub async fn fetch_bytes(client: &reqwest::Client, context: &str, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::fetch(context, e.without_url()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(context, format!("status {status}")));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::fetch(context, e.without_url()))?;
    Ok(bytes.to_vec())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetsConfig, SourceConfig};

    fn assets_client() -> reqwest::Client {
        create_assets_client(&AssetsConfig::default(), "test").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_error_status() {
        let url = test_server::respond_with(503, "text/html", b"<a>stale</a>".to_vec()).await;
        let client = create_source_client(&SourceConfig::default()).unwrap();

        match fetch_page_async(&client, &url).await {
            Err(AppError::Fetch { message, .. }) => assert!(message.contains("503")),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_bytes_hides_url() {
        let url = test_server::respond_with(403, "text/plain", b"denied".to_vec()).await;
        let keyed = format!("{url}/staticmap?key=secret");

        match fetch_bytes(&assets_client(), "map tile", &keyed).await {
            Err(AppError::Fetch { context, message }) => {
                assert_eq!(context, "map tile");
                assert!(message.contains("403"));
                assert!(!message.contains("secret"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_bytes_ok() {
        let url = test_server::respond_with(200, "image/png", vec![0x89, b'P', b'N', b'G']).await;
        let bytes = fetch_bytes(&assets_client(), "flag", &url).await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }
}
