//! REST client for the managed entity store.

use crate::errors::StoreError;
use crate::store::EntityStore;
use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

/// Talks to the managed backend's REST surface, forwarding the platform's
/// bearer token on every call.
#[derive(Clone)]
pub struct RestEntityStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestEntityStore {
    pub fn new(base_url: &str, token: &str) -> Self {
        RestEntityStore {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn entity_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base_url)
    }

    async fn check(
        &self,
        response: reqwest::Response,
        id: &str,
    ) -> Result<reqwest::Response, StoreError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(StoreError::Request {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}

#[async_trait]
impl EntityStore for RestEntityStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(self.entity_url(collection, id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(self.check(response, id).await?.json::<Value>().await?)
    }

    async fn filter(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        // Scalar predicate values go on the query string as their JSON text.
        let value_text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let response = self
            .client
            .get(format!("{}/{collection}", self.base_url))
            .query(&[("field", field), ("value", value_text.as_str())])
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(self
            .check(response, collection)
            .await?
            .json::<Vec<Value>>()
            .await?)
    }

    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.entity_url(collection, id))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;

        self.check(response, id).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.entity_url(collection, id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.check(response, id).await?;
        Ok(())
    }
}
