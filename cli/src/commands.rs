//! CLI Commands

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// API Client for interacting with an ITEMLEDGER node
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// URL of `/items/{id}[/tail...]` with the id kept as one escaped segment
    fn item_url(&self, id: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/items", self.base_url))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .push(id)
            .extend(tail);
        Ok(url)
    }

    fn item_request(&self, method: Method, id: &str, tail: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.request(method, self.item_url(id, tail)?))
    }

    /// Send a request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let resp: ApiResponse<T> = request.send().await?.json().await?;

        if resp.success {
            Ok(resp.data)
        } else {
            Err(ApiError::Server(resp.error.unwrap_or_default()))
        }
    }

    async fn send_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request).await?.ok_or(ApiError::EmptyResponse)
    }

    /// Get node status
    pub async fn status(&self) -> Result<NodeStatus, ApiError> {
        self.send_data(self.request(Method::GET, "/status")).await
    }

    /// Seed the ledger
    pub async fn init_ledger(&self) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "/init"))
            .await
            .map(|_| ())
    }

    /// Create or overwrite an item
    pub async fn create_item(&self, item: &ItemInfo) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "/items").json(item))
            .await
            .map(|_| ())
    }

    /// Read an item
    pub async fn read_item(&self, id: &str) -> Result<ItemInfo, ApiError> {
        self.send_data(self.item_request(Method::GET, id, &[])?).await
    }

    /// Update an item's name and price
    pub async fn update_item(&self, id: &str, name: &str, price: i64) -> Result<(), ApiError> {
        let body = UpdateItemRequest {
            name: name.to_string(),
            price,
        };
        self.send::<serde_json::Value>(self.item_request(Method::PUT, id, &[])?.json(&body))
            .await
            .map(|_| ())
    }

    /// Delete an item
    pub async fn delete_item(&self, id: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.item_request(Method::DELETE, id, &[])?)
            .await
            .map(|_| ())
    }

    /// Check whether an item exists
    pub async fn item_exists(&self, id: &str) -> Result<bool, ApiError> {
        self.send_data(self.item_request(Method::GET, id, &["exists"])?)
            .await
    }

    /// List every item
    pub async fn list_items(&self) -> Result<Vec<ItemInfo>, ApiError> {
        self.send_data(self.request(Method::GET, "/items")).await
    }

    /// Raw named-function invocation
    pub async fn invoke(
        &self,
        function: &str,
        args: Vec<String>,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        let body = InvokeRequest {
            function: function.to_string(),
            args,
        };
        self.send(self.request(Method::POST, "/invoke").json(&body))
            .await
    }
}

/// API response wrapper
#[derive(Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Node status
#[derive(Debug, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub state_version: u64,
    pub record_count: usize,
    pub committed_transactions: u64,
    pub storage: String,
}

/// Item as returned by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: String,
    pub name: String,
    pub price: i64,
}

#[derive(Serialize)]
struct UpdateItemRequest {
    name: String,
    price: i64,
}

#[derive(Serialize)]
struct InvokeRequest {
    function: String,
    args: Vec<String>,
}

/// API Error
#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    InvalidUrl(String),
    Server(String),
    EmptyResponse,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {}", e),
            ApiError::InvalidUrl(e) => write!(f, "Invalid node URL: {}", e),
            ApiError::Server(e) => write!(f, "Server error: {}", e),
            ApiError::EmptyResponse => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Render items as a fixed-width table
pub fn format_items(items: &[ItemInfo]) -> String {
    if items.is_empty() {
        return "No items found.".to_string();
    }

    let mut out = format!("{:<20} {:<30} {:>12}\n", "ID", "Name", "Price");
    out.push_str(&format!("{:-<20} {:-<30} {:->12}\n", "", "", ""));
    for item in items {
        out.push_str(&format!("{:<20} {:<30} {:>12}\n", item.id, item.name, item.price));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let ok: ApiResponse<ItemInfo> = serde_json::from_str(
            r#"{"success":true,"data":{"id":"item1","name":"Item 1","price":100},"error":null}"#,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.data.unwrap().price, 100);

        let err: ApiResponse<ItemInfo> = serde_json::from_str(
            r#"{"success":false,"data":null,"error":"ReadItem: the item x does not exist"}"#,
        )
        .unwrap();
        assert!(!err.success);
        assert_eq!(err.error.unwrap(), "ReadItem: the item x does not exist");
    }

    #[test]
    fn test_format_items() {
        assert_eq!(format_items(&[]), "No items found.");

        let table = format_items(&[ItemInfo {
            id: "item1".into(),
            name: "Item 1".into(),
            price: 100,
        }]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("item1"));
        assert!(lines[2].ends_with("100"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = ApiClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_item_ids_stay_in_one_path_segment() {
        let client = ApiClient::new("http://127.0.0.1:8080").unwrap();

        let cases = [
            ("x?y", "/items/x%3Fy"),
            ("a/b", "/items/a%2Fb"),
            ("p#q", "/items/p%23q"),
            ("item1", "/items/item1"),
        ];
        for (id, path) in cases {
            let request = client
                .item_request(Method::DELETE, id, &[])
                .unwrap()
                .build()
                .unwrap();
            let url = request.url();
            assert_eq!(url.path(), path, "id {:?}", id);
            assert_eq!(url.query(), None);
            assert_eq!(url.fragment(), None);
        }

        let url = client.item_url("a/b", &["exists"]).unwrap();
        assert_eq!(url.path(), "/items/a%2Fb/exists");
    }

    #[test]
    fn test_item_url_keeps_base_path() {
        let client = ApiClient::new("http://127.0.0.1:8080/ledger/").unwrap();
        let url = client.item_url("x?y", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/ledger/items/x%3Fy");
    }
}
