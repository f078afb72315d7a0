use std::sync::Mutex;

use async_trait::async_trait;
use log::{ debug, info };
use reqwest::header::AUTHORIZATION;
use reqwest::{ RequestBuilder, Response, StatusCode };
use serde::de::DeserializeOwned;
use serde::{ Serialize, Deserialize };
use url::Url;

use crate::cli::Args;
use crate::models::agent::{ AgentUpdate, AiAgent, ModelConfig, NewAgent };
use crate::models::chat::ChatMessage;
use crate::models::device::AiDevice;
use crate::store::{
    BindReceipt,
    RecordStore,
    StoreError,
    AGENT_COLLECTION,
    CHAT_HISTORY_COLLECTION,
    DEVICE_COLLECTION,
    MODEL_CONFIG_COLLECTION,
};

/// Client for the hub's PocketBase-style record API and custom routes.
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: Url,
    token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct ListResult<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
struct AuthResult {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct HubEnvelope<T> {
    data: T,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    identity: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BindRequest<'a> {
    code: &'a str,
    agent_id: &'a str,
}

/// Quote a value for a record filter expression.
fn filter_eq(field: &str, value: &str) -> String {
    format!("{} = \"{}\"", field, value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl HttpRecordStore {
    pub fn new(args: &Args) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(&args.hub_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: Mutex::new(args.token.clone()),
        })
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &*self.token.lock().unwrap() {
            Some(token) => request.header(AUTHORIZATION, token.clone()),
            None => request,
        }
    }

    async fn rejection(response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json
            ::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        if status == StatusCode::NOT_FOUND {
            StoreError::NotFound(message)
        } else {
            StoreError::Rejected { status: status.as_u16(), message }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// Log in with an identity/password pair and keep the issued token for
    /// subsequent requests.
    pub async fn auth_with_password(
        &self,
        identity: &str,
        password: &str
    ) -> Result<(), StoreError> {
        let url = self.url("api/collections/users/auth-with-password")?;
        let response = self.client
            .post(url)
            .json(&(AuthRequest { identity, password })).send().await?;

        if !response.status().is_success() {
            let err = Self::rejection(response).await;
            return Err(StoreError::Auth(err.to_string()));
        }

        let auth: AuthResult = response.json().await?;
        *self.token.lock().unwrap() = Some(auth.token);
        info!("authenticated with hub as {}", identity);
        Ok(())
    }

    /// Validate the held token against the hub and replace it with the
    /// refreshed one.
    pub async fn auth_refresh(&self) -> Result<(), StoreError> {
        let url = self.url("api/collections/users/auth-refresh")?;
        let response = self.authorized(self.client.post(url)).send().await?;

        if !response.status().is_success() {
            let err = Self::rejection(response).await;
            return Err(StoreError::Auth(err.to_string()));
        }

        let auth: AuthResult = response.json().await?;
        *self.token.lock().unwrap() = Some(auth.token);
        Ok(())
    }

    async fn list_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &[(&str, String)]
    ) -> Result<Vec<T>, StoreError> {
        let url = self.url(&format!("api/collections/{}/records", collection))?;
        debug!("listing {} with {:?}", collection, query);
        let response = self.authorized(self.client.get(url)).query(query).send().await?;
        let result: ListResult<T> = Self::decode(response).await?;
        Ok(result.items)
    }

    async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str
    ) -> Result<T, StoreError> {
        let url = self.url(&format!("api/collections/{}/records/{}", collection, id))?;
        let response = self.authorized(self.client.get(url)).send().await?;
        Self::decode(response).await
    }

    async fn create_record<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &B
    ) -> Result<T, StoreError> {
        let url = self.url(&format!("api/collections/{}/records", collection))?;
        let response = self.authorized(self.client.post(url)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn patch_record<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        body: &B
    ) -> Result<T, StoreError> {
        let url = self.url(&format!("api/collections/{}/records/{}", collection, id))?;
        let response = self.authorized(self.client.patch(url)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("api/collections/{}/records/{}", collection, id))?;
        let response = self.authorized(self.client.delete(url)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_agents(&self) -> Result<Vec<AiAgent>, StoreError> {
        self.list_records(
            AGENT_COLLECTION,
            &[
                ("sort", "-created".to_string()),
                ("perPage", "200".to_string()),
            ]
        ).await
    }

    async fn get_agent(&self, id: &str) -> Result<AiAgent, StoreError> {
        self.get_record(AGENT_COLLECTION, id).await
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<AiAgent, StoreError> {
        self.create_record(AGENT_COLLECTION, agent).await
    }

    async fn update_agent(&self, id: &str, update: &AgentUpdate) -> Result<AiAgent, StoreError> {
        self.patch_record(AGENT_COLLECTION, id, update).await
    }

    async fn delete_agent(&self, id: &str) -> Result<(), StoreError> {
        self.delete_record(AGENT_COLLECTION, id).await
    }

    async fn list_model_configs(&self, model_type: &str) -> Result<Vec<ModelConfig>, StoreError> {
        let filter = format!("{} && is_enabled = true", filter_eq("model_type", model_type));
        self.list_records(
            MODEL_CONFIG_COLLECTION,
            &[
                ("filter", filter),
                ("sort", "-is_default,model_name".to_string()),
                ("perPage", "200".to_string()),
            ]
        ).await
    }

    async fn list_messages(
        &self,
        agent_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.list_records(
            CHAT_HISTORY_COLLECTION,
            &[
                ("filter", filter_eq("agent", agent_id)),
                ("sort", "-created".to_string()),
                ("perPage", limit.to_string()),
            ]
        ).await
    }

    async fn list_devices(&self, agent_id: &str) -> Result<Vec<AiDevice>, StoreError> {
        self.list_records(
            DEVICE_COLLECTION,
            &[
                ("filter", filter_eq("agent", agent_id)),
                ("sort", "-created".to_string()),
                ("perPage", "100".to_string()),
            ]
        ).await
    }

    async fn delete_device(&self, id: &str) -> Result<(), StoreError> {
        self.delete_record(DEVICE_COLLECTION, id).await
    }

    async fn bind_device(&self, code: &str, agent_id: &str) -> Result<BindReceipt, StoreError> {
        let url = self.url("hub/api/device/bind")?;
        let response = self.authorized(self.client.post(url)).json(
            &(BindRequest { code, agent_id })
        ).send().await?;
        let envelope: HubEnvelope<BindReceipt> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        format!("{}api/files/{}/{}/{}", self.base_url, collection, record_id, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn args_for(url: &str) -> Args {
        Args::parse_from(["hub-console", "--hub-url", url, "agents"])
    }

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let store = HttpRecordStore::new(&args_for("http://localhost:8090")).unwrap();
        assert_eq!(store.base_url.as_str(), "http://localhost:8090/");

        let store = HttpRecordStore::new(&args_for("http://localhost:8090/hub/")).unwrap();
        assert_eq!(store.base_url.as_str(), "http://localhost:8090/hub/");
    }

    #[test]
    fn file_urls_point_at_the_files_api() {
        let store = HttpRecordStore::new(&args_for("http://localhost:8090")).unwrap();
        assert_eq!(
            store.file_url(CHAT_HISTORY_COLLECTION, "rec1", "audio_1.mp3"),
            "http://localhost:8090/api/files/ai_agent_chat_history/rec1/audio_1.mp3"
        );
    }

    #[test]
    fn filter_values_are_quoted_and_escaped() {
        assert_eq!(filter_eq("agent", "a1"), "agent = \"a1\"");
        assert_eq!(filter_eq("agent", "a\"1"), "agent = \"a\\\"1\"");
    }

    #[test]
    fn rejects_an_invalid_base_url() {
        assert!(HttpRecordStore::new(&args_for("not a url")).is_err());
    }
}
