use crate::error::ApiError;
use crate::models::{NewTask, Stats, Task, TaskId, TaskUpdate};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

const TODOS_PATH: &str = "/todos";
const HEALTH_PATH: &str = "/health";

/// One HTTP round trip against the backend. No retries, no timeout.
pub trait Transport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> HttpTransport {
        HttpTransport {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%method, %url, "sending request");

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            // Serialises the body and sets `Content-Type: application/json`.
            req = req.json(&body);
        }

        let res = req
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "received response");

        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|err| ApiError::Network(format!("invalid JSON body: {}", err)))
    }
}

/// FastAPI puts the reason in `detail`; anything else is shown verbatim.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}

/// Typed endpoints of the TODO collection.
pub struct TodoApi<T> {
    transport: T,
}

impl<T: Transport> TodoApi<T> {
    pub fn new(transport: T) -> TodoApi<T> {
        TodoApi { transport }
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let value = self.transport.request(Method::GET, TODOS_PATH, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Task, ApiError> {
        let value = self
            .transport
            .request(Method::GET, &task_path(id), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let body = serde_json::to_value(task)?;
        let value = self
            .transport
            .request(Method::POST, TODOS_PATH, Some(body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, ApiError> {
        let body = serde_json::to_value(update)?;
        let value = self
            .transport
            .request(Method::PUT, &task_path(id), Some(body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.transport
            .request(Method::DELETE, &task_path(id), None)
            .await?;
        Ok(())
    }

    pub async fn fetch_stats(&self) -> Result<Stats, ApiError> {
        let value = self.transport.request(Method::GET, HEALTH_PATH, None).await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn task_path(id: &TaskId) -> String {
    format!("{}/{}", TODOS_PATH, id)
}
