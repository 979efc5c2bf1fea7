pub mod bflist;
pub mod error;
pub mod models;

use futures::future::{BoxFuture, join_all};

pub use self::error::{ProviderError, ProviderResult};
pub use self::models::{PlayerState, ServerState};

/// Address of a server to look up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerQuery {
    /// Host (IPv4 address) of the server.
    pub host: String,
    /// Game port of the server.
    pub port: u16,
}

impl ServerQuery {
    /// Build a query for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` form used by the polling sources as lookup key.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Abstraction over the external source that polls live game server state.
pub trait StateProvider: Send + Sync {
    /// Look up the current state of a single server.
    fn lookup(&self, query: ServerQuery) -> BoxFuture<'static, ProviderResult<ServerState>>;

    /// Look up several servers at once, returning one outcome per query in query order.
    ///
    /// The default runs every single lookup concurrently.
    fn lookup_many(
        &self,
        queries: Vec<ServerQuery>,
    ) -> BoxFuture<'static, Vec<(ServerQuery, ProviderResult<ServerState>)>> {
        let lookups: Vec<_> = queries
            .iter()
            .cloned()
            .map(|query| self.lookup(query))
            .collect();
        Box::pin(async move {
            let outcomes = join_all(lookups).await;
            queries.into_iter().zip(outcomes).collect()
        })
    }
}
