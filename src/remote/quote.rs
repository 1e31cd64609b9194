use super::FetchError;
use crate::core::quote::Quote;

/// Fetch one quote from the endpoint.
pub async fn fetch_quote(client: &reqwest::Client, url: &str) -> Result<Quote, FetchError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }
    Ok(resp.json::<Quote>().await?)
}

/// Fetch a quote, swallowing any failure.
///
/// Quotes are decorative: on error the caller keeps showing the old one.
pub async fn fetch_quote_quietly(client: reqwest::Client, url: String) -> Option<Quote> {
    match fetch_quote(&client, &url).await {
        Ok(quote) => Some(quote),
        Err(e) => {
            log::debug!("Quote fetch from {} failed: {}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn quote_server(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("c", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9,
                "hitokoto": "不积跬步，无以至千里",
                "type": "d",
                "from": "荀子",
                "from_who": null,
            })))
            .mount(&server)
            .await;

        let url = format!("{}/?c=i&c=k", server.uri());
        let quote = fetch_quote(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(quote.text, "不积跬步，无以至千里");
        assert_eq!(quote.attribution, "荀子");
    }

    #[tokio::test]
    async fn error_status_is_swallowed() {
        let server = quote_server(503, "busy").await;
        assert!(matches!(
            fetch_quote(&reqwest::Client::new(), &server.uri()).await,
            Err(FetchError::Status(_))
        ));
        assert!(fetch_quote_quietly(reqwest::Client::new(), server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_swallowed() {
        let server = quote_server(200, "{\"text\":1}").await;
        assert!(fetch_quote_quietly(reqwest::Client::new(), server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        // Port 9 (discard) on localhost is not expected to be listening.
        let url = "http://127.0.0.1:9/".to_string();
        assert!(fetch_quote_quietly(reqwest::Client::new(), url).await.is_none());
    }
}
