//! Ad-hoc request command

use super::print_json;
use anyhow::Context;
use conduit_core::{ApiRequest, ClientRegistry, HttpMethod};
use serde_json::{Value, json};

#[derive(Debug)]
pub struct RequestArgs {
    pub method: HttpMethod,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub data: Option<Value>,
    pub no_auth: bool,
}

impl RequestArgs {
    fn into_request(self) -> ApiRequest {
        let mut request = ApiRequest::new(self.method, self.endpoint);
        for (key, value) in self.query {
            request = request.with_query(key, value);
        }
        if let Some(data) = self.data {
            request = request.with_json(data);
        }
        if self.no_auth {
            request = request.without_auth();
        }
        request
    }
}

/// Send one request and print the normalized response, or the normalized error
pub async fn run(registry: &ClientRegistry, client: &str, args: RequestArgs) -> anyhow::Result<()> {
    let client = registry
        .get_client(client)
        .await
        .with_context(|| format!("Client '{}' is unavailable", client))?;

    match client.make_request(args.into_request()).await {
        Ok(response) => print_json(&json!(response)),
        Err(error) => {
            print_json(&json!({ "error": error }))?;
            Err(error).context("Request failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_request() {
        let request = RequestArgs {
            method: HttpMethod::Get,
            endpoint: "/models".to_string(),
            query: vec![("limit".to_string(), "5".to_string())],
            data: None,
            no_auth: true,
        }
        .into_request();

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.query, vec![("limit".to_string(), "5".to_string())]);
        assert!(!request.requires_auth);
    }
}
