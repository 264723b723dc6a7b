//! Execution engine backed by the `fred` client.
//!
//! `fred` is asynchronous; the bridge owns a dedicated tokio runtime and
//! blocks the calling thread on it for every call, so callers see a plain
//! synchronous API. Calling into the bridge from inside another tokio
//! runtime is rejected instead of panicking.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use fred::types::config::ClusterDiscoveryPolicy;
use fred::types::{ClusterHash, CustomCommand};
use futures::future::try_join_all;
use parking_lot::Mutex;
use rustls::pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tracing::{debug, instrument, warn};

use super::policy::{self, DefaultRouting};
use super::script_cache::script_hash;
use super::topology::ClusterTopology;
use super::{ExecutionBridge, RawResponse, ScriptCache};
use crate::error::BridgeError;
use crate::request::RequestType;
use crate::route::{NodeAddress, Route, SLOT_COUNT, SlotType};
use crate::value::Value;

/// TLS settings for engine connections.
///
/// Without a CA the platform's default roots are used.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// CA certificate(s) in PEM format.
    pub ca_cert_pem: Option<String>,
    /// Client certificate in PEM format, for mTLS.
    pub client_cert_pem: Option<String>,
    /// Client key in PEM format, for mTLS.
    pub client_key_pem: Option<String>,
}

/// Configuration for connecting the engine to a cluster.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Seed nodes for cluster discovery.
    pub hosts: Vec<NodeAddress>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: Option<TlsConfig>,
    pub connection_timeout: Duration,
    pub command_timeout: Duration,
    /// Worker threads of the engine's runtime.
    pub worker_threads: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            username: None,
            password: None,
            tls: None,
            connection_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            worker_threads: 2,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with seed hosts.
    pub fn new(hosts: Vec<NodeAddress>) -> Self {
        Self {
            hosts,
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    pub fn with_password(mut self, password: String) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Build an uninitialized `fred` client for `server` with these settings.
    fn build_client(&self, server: ServerConfig) -> Result<Client, BridgeError> {
        let mut config = Config {
            server,
            ..Default::default()
        };
        config.username = self.username.clone();
        config.password = self.password.clone();

        if let Some(ref tls) = self.tls {
            config.tls = Some(build_tls_connector(tls)?.into());
        }

        let command_timeout = self.command_timeout;
        let connection_timeout = self.connection_timeout;

        let client = Builder::from_config(config)
            .with_performance_config(|perf| {
                perf.default_command_timeout = command_timeout;
            })
            .with_connection_config(|conn| {
                conn.connection_timeout = connection_timeout;
            })
            .build()?;
        Ok(client)
    }
}

/// Where one engine call is sent.
#[derive(Debug, Clone)]
enum Dispatch {
    /// One node picked by the clustered client's hashing.
    Hash(ClusterHash),
    /// One node by address.
    Node(NodeAddress),
    /// A healthy replica of the primary serving a slot.
    ReplicaOfSlot(u16),
    Fanout(Fanout),
}

#[derive(Debug, Clone)]
enum Fanout {
    AllPrimaries,
    AllNodes,
    Nodes(Vec<NodeAddress>),
}

impl Dispatch {
    fn from_route(route: &Route) -> Result<Self, BridgeError> {
        let dispatch = match route {
            Route::AllNodes => Dispatch::Fanout(Fanout::AllNodes),
            Route::AllPrimaries => Dispatch::Fanout(Fanout::AllPrimaries),
            Route::MultiNode { nodes } => Dispatch::Fanout(Fanout::Nodes(nodes.clone())),
            Route::Random => Dispatch::Hash(ClusterHash::Random),
            Route::SlotKey { key, slot_type } => {
                Dispatch::for_slot(fred::util::redis_keyslot(key.as_bytes()), *slot_type)
            }
            Route::SlotId { id, .. } if *id >= SLOT_COUNT => {
                return Err(BridgeError::Routing(format!(
                    "Slot {} is out of range (0..{})",
                    id, SLOT_COUNT
                )));
            }
            Route::SlotId { id, slot_type } => Dispatch::for_slot(*id, *slot_type),
            Route::ByAddress { host, port } => Dispatch::Node(NodeAddress::new(host, *port)),
        };
        Ok(dispatch)
    }

    fn for_slot(slot: u16, slot_type: SlotType) -> Self {
        match slot_type {
            SlotType::Primary => Dispatch::Hash(ClusterHash::Custom(slot)),
            SlotType::Replica => Dispatch::ReplicaOfSlot(slot),
        }
    }

    fn from_default(routing: DefaultRouting) -> Self {
        match routing {
            DefaultRouting::AllPrimaries => Dispatch::Fanout(Fanout::AllPrimaries),
            DefaultRouting::AllNodes => Dispatch::Fanout(Fanout::AllNodes),
            DefaultRouting::FirstArgSlot => Dispatch::Hash(ClusterHash::FirstKey),
            DefaultRouting::Random => Dispatch::Hash(ClusterHash::Random),
        }
    }
}

/// `fred`-backed [`ExecutionBridge`].
pub struct FredBridge {
    client: Client,
    config: BridgeConfig,
    /// Direct connections to nodes the clustered client does not route to.
    direct: Mutex<HashMap<String, Client>>,
    scripts: ScriptCache,
    runtime: Runtime,
}

impl FredBridge {
    /// Start the engine runtime and connect to the cluster.
    #[instrument(skip(config), fields(hosts = ?config.hosts))]
    pub fn connect(config: BridgeConfig) -> Result<Self, BridgeError> {
        if config.hosts.is_empty() {
            return Err(BridgeError::InvalidConfig("No hosts provided".to_string()));
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(BridgeError::InvalidConfig(
                "FredBridge::connect called from inside an async runtime".to_string(),
            ));
        }

        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("valkey-bridge")
            .build()
            .map_err(|e| BridgeError::Connection(format!("Failed to start runtime: {}", e)))?;

        let servers: Vec<Server> = config
            .hosts
            .iter()
            .map(|addr| Server::new(addr.host.clone(), addr.port))
            .collect();

        let client = runtime.block_on(async {
            let client = config.build_client(ServerConfig::Clustered {
                hosts: servers,
                policy: ClusterDiscoveryPolicy::ConfigEndpoint,
            })?;
            debug!("Connecting to Valkey cluster");
            client.init().await?;
            debug!("Connected to Valkey cluster");
            Ok::<_, BridgeError>(client)
        })?;

        Ok(Self {
            client,
            config,
            direct: Mutex::new(HashMap::new()),
            scripts: ScriptCache::new(),
            runtime,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// The engine's script cache.
    pub fn script_cache(&self) -> &ScriptCache {
        &self.scripts
    }

    /// Quit the clustered connection and every direct node connection.
    #[instrument(skip(self))]
    pub fn close(&self) -> Result<(), BridgeError> {
        let direct: Vec<Client> = self.direct.lock().drain().map(|(_, c)| c).collect();
        self.block_on(async {
            for client in direct {
                client.quit().await?;
            }
            self.client.quit().await?;
            Ok(())
        })?
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, BridgeError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(BridgeError::InvalidConfig(
                "blocking bridge call made from inside an async runtime".to_string(),
            ));
        }
        Ok(self.runtime.block_on(fut))
    }

    async fn dispatch(&self, dispatch: &Dispatch, line: &[String]) -> Result<RawResponse, BridgeError> {
        match dispatch {
            Dispatch::Fanout(fanout) => {
                let replies = self.fanout(fanout, line).await?;
                policy::response_policy(line).apply(replies)
            }
            Dispatch::Hash(hash) => {
                let (cmd, args) = split_command(line, hash.clone())?;
                let value: fred::types::Value = self.client.custom(cmd, args).await?;
                Ok(RawResponse::Scalar(convert_value(value)))
            }
            Dispatch::Node(addr) => self.send_to_node(addr, line).await.map(RawResponse::Scalar),
            Dispatch::ReplicaOfSlot(slot) => {
                let topology = self.topology().await?;
                let replica = topology.replica_for_slot(*slot).ok_or_else(|| {
                    BridgeError::Routing(format!("No healthy replica serves slot {}", slot))
                })?;
                let addr = replica.address.clone();
                self.send_to_node(&addr, line).await.map(RawResponse::Scalar)
            }
        }
    }

    /// Run `line` on every node of `fanout`. All-or-nothing.
    async fn fanout(
        &self,
        fanout: &Fanout,
        line: &[String],
    ) -> Result<HashMap<String, Value>, BridgeError> {
        let nodes = self.resolve_fanout(fanout).await?;
        if nodes.is_empty() {
            return Err(BridgeError::Routing("Route resolved to no nodes".to_string()));
        }
        debug!(nodes = nodes.len(), "Fanning out command");

        let requests = nodes.into_iter().map(|addr| async move {
            let value = self.send_to_node(&addr, line).await?;
            Ok::<_, BridgeError>((addr.to_string(), value))
        });
        let replies = try_join_all(requests).await?;
        Ok(replies.into_iter().collect())
    }

    async fn resolve_fanout(&self, fanout: &Fanout) -> Result<Vec<NodeAddress>, BridgeError> {
        match fanout {
            Fanout::Nodes(nodes) => Ok(nodes.clone()),
            Fanout::AllPrimaries => {
                let cached = self
                    .client
                    .cached_cluster_state()
                    .map(|state| state.unique_primary_nodes())
                    .unwrap_or_default();
                if !cached.is_empty() {
                    return Ok(cached.iter().map(server_address).collect());
                }
                let topology = self.topology().await?;
                Ok(topology
                    .primaries()
                    .into_iter()
                    .map(|n| n.address.clone())
                    .collect())
            }
            Fanout::AllNodes => {
                let topology = self.topology().await?;
                Ok(topology
                    .healthy_nodes()
                    .into_iter()
                    .map(|n| n.address.clone())
                    .collect())
            }
        }
    }

    async fn topology(&self) -> Result<ClusterTopology, BridgeError> {
        let raw: String = self
            .client
            .custom(
                CustomCommand::new_static("CLUSTER", ClusterHash::Random, false),
                vec!["NODES"],
            )
            .await?;
        ClusterTopology::parse(&raw).map_err(|e| BridgeError::Routing(e.to_string()))
    }

    async fn send_to_node(&self, addr: &NodeAddress, line: &[String]) -> Result<Value, BridgeError> {
        let (cmd, args) = split_command(line, ClusterHash::Random)?;
        let args = args.into_iter().map(fred::types::Value::from).collect();
        self.send_custom(addr, cmd, args).await
    }

    async fn send_custom(
        &self,
        addr: &NodeAddress,
        cmd: CustomCommand,
        args: Vec<fred::types::Value>,
    ) -> Result<Value, BridgeError> {
        let server = Server::new(addr.host.clone(), addr.port);
        let is_primary = self
            .client
            .cached_cluster_state()
            .is_some_and(|state| state.unique_primary_nodes().contains(&server));

        let value: fred::types::Value = if is_primary {
            self.client.with_cluster_node(server).custom(cmd, args).await?
        } else {
            self.direct_client(addr).await?.custom(cmd, args).await?
        };
        Ok(convert_value(value))
    }

    /// Cached centralized connection to one node, opened on first use.
    async fn direct_client(&self, addr: &NodeAddress) -> Result<Client, BridgeError> {
        let key = addr.to_string();
        if let Some(client) = self.direct.lock().get(&key).cloned() {
            return Ok(client);
        }

        debug!(node = %key, "Opening direct node connection");
        let client = self.config.build_client(ServerConfig::Centralized {
            server: Server::new(addr.host.clone(), addr.port),
        })?;
        client.init().await?;

        let (client, loser) = keep_first(&self.direct, key, client);
        if let Some(loser) = loser {
            debug!(node = %addr, "Direct node connection opened concurrently, closing duplicate");
            if let Err(e) = loser.quit().await {
                warn!(node = %addr, error = %e, "Failed to close duplicate node connection");
            }
        }
        Ok(client)
    }

    /// Load a script body on the nodes `dispatch` may reach.
    ///
    /// The body is sent as raw bytes so the server's digest matches the
    /// cache key for any body, UTF-8 or not.
    async fn load_script(&self, dispatch: &Dispatch, code: &[u8]) -> Result<(), BridgeError> {
        let nodes = match dispatch {
            Dispatch::Node(addr) => vec![addr.clone()],
            Dispatch::Fanout(fanout) => self.resolve_fanout(fanout).await?,
            Dispatch::Hash(_) | Dispatch::ReplicaOfSlot(_) => {
                self.resolve_fanout(&Fanout::AllNodes).await?
            }
        };
        if nodes.is_empty() {
            return Err(BridgeError::Routing("Route resolved to no nodes".to_string()));
        }

        let expected = script_hash(code);
        let loads = nodes.into_iter().map(|addr| {
            let expected = expected.as_str();
            async move {
                let (cmd, args) = script_load_command(code);
                let sha = self.send_custom(&addr, cmd, args).await?;
                if sha.as_str() != Some(expected) {
                    return Err(BridgeError::Request(format!(
                        "SCRIPT LOAD on {} returned {} instead of {}",
                        addr, sha, expected
                    )));
                }
                Ok(())
            }
        });
        try_join_all(loads).await?;
        Ok(())
    }
}

impl ExecutionBridge for FredBridge {
    #[instrument(skip(self, args), fields(request = %request, args = args.len()))]
    fn execute(&self, request: RequestType, args: &[String]) -> Result<RawResponse, BridgeError> {
        let line = request.command_line(args);
        let routing = policy::default_routing(&line);
        debug!(?routing, "Using default routing");
        let dispatch = Dispatch::from_default(routing);
        self.block_on(self.dispatch(&dispatch, &line))?
    }

    #[instrument(skip(self, args), fields(request = %request, args = args.len(), route = %route))]
    fn execute_with_route(
        &self,
        request: RequestType,
        args: &[String],
        route: &Route,
    ) -> Result<RawResponse, BridgeError> {
        let line = request.command_line(args);
        let dispatch = Dispatch::from_route(route)?;
        self.block_on(self.dispatch(&dispatch, &line))?
    }

    fn store_script(&self, code: &[u8]) -> String {
        self.scripts.add(code)
    }

    fn drop_script(&self, hash: &str) -> Result<(), BridgeError> {
        self.scripts.remove(hash)
    }

    #[instrument(skip(self, keys, args), fields(keys = keys.len(), args = args.len()))]
    fn invoke_script(
        &self,
        hash: &str,
        keys: &[String],
        args: &[String],
        route: Option<&Route>,
    ) -> Result<RawResponse, BridgeError> {
        let code = self
            .scripts
            .get(hash)
            .ok_or_else(|| BridgeError::ScriptNotFound(hash.to_string()))?;

        let mut line = vec!["EVALSHA".to_string(), hash.to_string(), keys.len().to_string()];
        line.extend(keys.iter().cloned());
        line.extend(args.iter().cloned());

        let dispatch = match (route, keys.first()) {
            (Some(route), _) => Dispatch::from_route(route)?,
            (None, Some(key)) => {
                Dispatch::Hash(ClusterHash::Custom(fred::util::redis_keyslot(key.as_bytes())))
            }
            (None, None) => Dispatch::Hash(ClusterHash::Random),
        };

        self.block_on(async {
            match self.dispatch(&dispatch, &line).await {
                Err(BridgeError::Request(msg)) if msg.starts_with("NOSCRIPT") => {
                    debug!(hash, "Script not loaded on server, loading and retrying");
                    self.load_script(&dispatch, &code).await?;
                    self.dispatch(&dispatch, &line).await
                }
                other => other,
            }
        })?
    }
}

/// Split a command line into a `fred` custom command and its arguments.
fn split_command(
    line: &[String],
    hash: ClusterHash,
) -> Result<(CustomCommand, Vec<String>), BridgeError> {
    let (name, args) = line
        .split_first()
        .ok_or_else(|| BridgeError::Request("Empty command".to_string()))?;
    Ok((CustomCommand::new(name.clone(), hash, false), args.to_vec()))
}

/// `SCRIPT LOAD` with the body as a bulk byte string.
fn script_load_command(code: &[u8]) -> (CustomCommand, Vec<fred::types::Value>) {
    (
        CustomCommand::new_static("SCRIPT", ClusterHash::Random, false),
        vec![
            fred::types::Value::from("LOAD"),
            fred::types::Value::Bytes(code.to_vec().into()),
        ],
    )
}

/// Insert `candidate` under `key` unless another caller got there first.
///
/// Returns the entry to use and, when the slot was taken, the candidate
/// that lost and must be shut down by the caller.
fn keep_first<C: Clone>(
    slots: &Mutex<HashMap<String, C>>,
    key: String,
    candidate: C,
) -> (C, Option<C>) {
    let mut slots = slots.lock();
    match slots.entry(key) {
        Entry::Occupied(entry) => (entry.get().clone(), Some(candidate)),
        Entry::Vacant(entry) => (entry.insert(candidate).clone(), None),
    }
}

fn server_address(server: &Server) -> NodeAddress {
    NodeAddress::new(server.host.to_string(), server.port)
}

/// Convert a `fred` reply into the engine-neutral [`Value`].
fn convert_value(value: fred::types::Value) -> Value {
    use fred::types::Value as FredValue;

    match value {
        FredValue::Null => Value::Nil,
        FredValue::Queued => Value::String("QUEUED".to_string()),
        FredValue::Boolean(b) => Value::Bool(b),
        FredValue::Integer(i) => Value::Int(i),
        FredValue::Double(d) => Value::Float(d),
        FredValue::String(s) if &*s == "OK" => Value::Okay,
        FredValue::String(s) => Value::String(s.to_string()),
        FredValue::Bytes(b) => match String::from_utf8(b.to_vec()) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        FredValue::Array(items) => Value::Array(items.into_iter().map(convert_value).collect()),
        FredValue::Map(map) => Value::Map(
            map.inner()
                .into_iter()
                .map(|(k, v)| {
                    let key = match std::str::from_utf8(k.as_bytes()) {
                        Ok(s) => Value::String(s.to_string()),
                        Err(_) => Value::Bytes(k.as_bytes().to_vec()),
                    };
                    (key, convert_value(v))
                })
                .collect(),
        ),
    }
}

/// Build a TLS connector from PEM data.
///
/// Verification uses the supplied CA when present and the platform roots
/// otherwise. A client certificate and key together enable mTLS.
fn build_tls_connector(tls: &TlsConfig) -> Result<TlsConnector, BridgeError> {
    use rustls::{ClientConfig, RootCertStore};

    let Some(ref ca_pem) = tls.ca_cert_pem else {
        return TlsConnector::default_rustls()
            .map_err(|e| BridgeError::Connection(format!("TLS error: {}", e)));
    };

    let mut root_store = RootCertStore::empty();
    let ca_certs = rustls_pemfile::certs(&mut ca_pem.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| BridgeError::Connection(format!("Failed to parse CA certificate: {}", e)))?;
    for cert in ca_certs {
        root_store
            .add(cert)
            .map_err(|e| BridgeError::Connection(format!("Failed to add CA certificate: {}", e)))?;
    }

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| BridgeError::Connection(format!("Failed to build TLS config: {}", e)))?
        .with_root_certificates(root_store);

    let config = if let (Some(cert_pem), Some(key_pem)) = (&tls.client_cert_pem, &tls.client_key_pem)
    {
        let client_certs = rustls_pemfile::certs(&mut cert_pem.as_bytes())
            .collect::<Result<Vec<CertificateDer<'static>>, _>>()
            .map_err(|e| {
                BridgeError::Connection(format!("Failed to parse client certificate: {}", e))
            })?;
        let client_key = rustls_pemfile::private_key(&mut key_pem.as_bytes())
            .map_err(|e| BridgeError::Connection(format!("Failed to parse client key: {}", e)))?
            .ok_or_else(|| BridgeError::Connection("No private key found in PEM".to_string()))?;
        builder
            .with_client_auth_cert(client_certs, client_key)
            .map_err(|e| BridgeError::Connection(format!("Failed to build TLS config: {}", e)))?
    } else {
        builder.with_no_client_auth()
    };

    Ok(TlsConnector::from(config))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::bridge::ScriptCache;

    #[test]
    fn test_config_default() {
        let config = BridgeConfig::default();
        assert!(config.hosts.is_empty());
        assert!(config.tls.is_none());
        assert!(config.password.is_none());
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert_eq!(config.command_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = BridgeConfig::new(vec![NodeAddress::new("localhost", 7000)])
            .with_password("secret".to_string())
            .with_connection_timeout(Duration::from_secs(5))
            .with_command_timeout(Duration::from_secs(15))
            .with_worker_threads(4);

        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.hosts[0], NodeAddress::new("localhost", 7000));
        assert_eq!(config.password, Some("secret".to_string()));
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.command_timeout, Duration::from_secs(15));
        assert_eq!(config.worker_threads, 4);
    }

    #[test]
    fn test_connect_without_hosts() {
        let err = FredBridge::connect(BridgeConfig::default())
            .err()
            .expect("should fail");
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
    }

    #[test]
    fn test_dispatch_from_route() {
        assert!(matches!(
            Dispatch::from_route(&Route::AllPrimaries).unwrap(),
            Dispatch::Fanout(Fanout::AllPrimaries)
        ));
        assert!(matches!(
            Dispatch::from_route(&Route::Random).unwrap(),
            Dispatch::Hash(ClusterHash::Random)
        ));
        assert!(matches!(
            Dispatch::from_route(&Route::SlotId {
                id: 42,
                slot_type: SlotType::Replica
            })
            .unwrap(),
            Dispatch::ReplicaOfSlot(42)
        ));
        assert!(matches!(
            Dispatch::from_route(&Route::slot_id(7).unwrap()).unwrap(),
            Dispatch::Hash(ClusterHash::Custom(7))
        ));
        assert!(matches!(
            Dispatch::from_route(&Route::by_address("10.0.0.2", 7001)).unwrap(),
            Dispatch::Node(addr) if addr.port == 7001
        ));
    }

    #[test]
    fn test_dispatch_rejects_out_of_range_slot() {
        for slot_type in [SlotType::Primary, SlotType::Replica] {
            let route = Route::SlotId {
                id: SLOT_COUNT,
                slot_type,
            };
            assert!(matches!(
                Dispatch::from_route(&route),
                Err(BridgeError::Routing(_))
            ));
        }
        assert!(Dispatch::from_route(&Route::SlotId {
            id: SLOT_COUNT - 1,
            slot_type: SlotType::Primary
        })
        .is_ok());
    }

    #[test]
    fn test_script_load_sends_raw_bytes() {
        use fred::types::Value as FredValue;

        let code: &[u8] = b"return '\xff'";
        let (_, args) = script_load_command(code);
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0], FredValue::String(s) if &**s == "LOAD"));
        match &args[1] {
            FredValue::Bytes(body) => {
                assert_eq!(&body[..], code);
                assert_eq!(script_hash(body), ScriptCache::new().add(code));
            }
            other => panic!("body sent as {:?}", other),
        }
    }

    #[test]
    fn test_keep_first_returns_loser() {
        let slots = Mutex::new(HashMap::new());

        let (kept, loser) = keep_first(&slots, "node-a:6379".to_string(), "first");
        assert_eq!(kept, "first");
        assert!(loser.is_none());

        let (kept, loser) = keep_first(&slots, "node-a:6379".to_string(), "second");
        assert_eq!(kept, "first");
        assert_eq!(loser, Some("second"));
        assert_eq!(slots.lock().len(), 1);
    }

    #[test]
    fn test_split_command() {
        let line = vec!["GET".to_string(), "key".to_string()];
        let (_, args) = split_command(&line, ClusterHash::FirstKey).unwrap();
        assert_eq!(args, vec!["key".to_string()]);
        assert!(split_command(&[], ClusterHash::Random).is_err());
    }

    #[test]
    fn test_convert_value() {
        use fred::types::Value as FredValue;

        assert_eq!(convert_value(FredValue::Null), Value::Nil);
        assert_eq!(convert_value(FredValue::Integer(5)), Value::Int(5));
        assert_eq!(
            convert_value(FredValue::Array(vec![FredValue::Integer(1), FredValue::Null])),
            Value::Array(vec![Value::Int(1), Value::Nil])
        );
    }

    #[test]
    fn test_tls_rejects_garbage_ca() {
        let tls = TlsConfig {
            ca_cert_pem: Some("-----BEGIN CERTIFICATE-----\nnot base64!\n-----END CERTIFICATE-----\n".to_string()),
            ..Default::default()
        };
        assert!(build_tls_connector(&tls).is_err());
    }
}
