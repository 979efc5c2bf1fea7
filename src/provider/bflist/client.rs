use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::provider::{
    ServerQuery, StateProvider,
    error::{ProviderError, ProviderResult},
    models::ServerState,
};

use super::models::{BflistServer, ServerPage};

const SERVERS_PATH: &str = "v2/bf2/servers";
const PAGE_SIZE: &str = "100";

/// Polls server state from the public bflist API.
#[derive(Clone)]
pub struct BflistProvider {
    client: Client,
    base_url: Arc<str>,
}

impl BflistProvider {
    /// Build a provider talking to `base_url`, failing requests after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    async fn fetch_server(&self, query: &ServerQuery) -> ProviderResult<ServerState> {
        let path = format!("{SERVERS_PATH}/{}", query.address());
        let url = format!("{}/{path}", self.base_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProviderError::RequestSend {
                path: path.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound {
                address: query.address(),
            }),
            status if status.is_success() => response
                .json::<BflistServer>()
                .await
                .map(Into::into)
                .map_err(|source| ProviderError::DecodeResponse { path, source }),
            other => Err(ProviderError::RequestStatus {
                path,
                status: other,
            }),
        }
    }

    /// Walk every page of the server listing.
    async fn list_servers(&self) -> ProviderResult<Vec<BflistServer>> {
        let url = format!("{}/{SERVERS_PATH}", self.base_url);
        let mut servers = Vec::new();
        let mut cursor: Option<String> = None;
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("perPage", PAGE_SIZE.to_string())];
            if let (Some(cursor), Some(after)) = (&cursor, &after) {
                query.push(("cursor", cursor.clone()));
                query.push(("after", after.clone()));
            }

            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|source| ProviderError::RequestSend {
                    path: SERVERS_PATH.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(ProviderError::RequestStatus {
                    path: SERVERS_PATH.to_string(),
                    status: response.status(),
                });
            }

            let page = response.json::<ServerPage>().await.map_err(|source| {
                ProviderError::DecodeResponse {
                    path: SERVERS_PATH.to_string(),
                    source,
                }
            })?;

            if let Some(last) = page.servers.last() {
                after = Some(last.address());
            }
            cursor = page.cursor;
            servers.extend(page.servers);

            if !page.has_more {
                break;
            }
        }

        debug!(count = servers.len(), "fetched server listing");
        Ok(servers)
    }
}

impl StateProvider for BflistProvider {
    fn lookup(&self, query: ServerQuery) -> BoxFuture<'static, ProviderResult<ServerState>> {
        let provider = self.clone();
        Box::pin(async move { provider.fetch_server(&query).await })
    }

    /// One paginated listing scan answers every query.
    fn lookup_many(
        &self,
        queries: Vec<ServerQuery>,
    ) -> BoxFuture<'static, Vec<(ServerQuery, ProviderResult<ServerState>)>> {
        let provider = self.clone();
        Box::pin(async move {
            match provider.list_servers().await {
                Ok(servers) => match_listing(queries, servers),
                Err(err) => {
                    let reason = err.to_string();
                    queries
                        .into_iter()
                        .map(|query| {
                            (
                                query,
                                Err(ProviderError::Listing {
                                    reason: reason.clone(),
                                }),
                            )
                        })
                        .collect()
                }
            }
        })
    }
}

fn match_listing(
    queries: Vec<ServerQuery>,
    servers: Vec<BflistServer>,
) -> Vec<(ServerQuery, ProviderResult<ServerState>)> {
    let mut by_address: HashMap<String, BflistServer> = servers
        .into_iter()
        .map(|server| (server.address(), server))
        .collect();

    queries
        .into_iter()
        .map(|query| {
            let address = query.address();
            let outcome = match by_address.remove(&address) {
                Some(server) => Ok(server.into()),
                None => Err(ProviderError::NotFound { address }),
            };
            (query, outcome)
        })
        .collect()
}
