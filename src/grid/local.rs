//! In-process grid
//!
//! A complete, single-process implementation of the grid contracts. Members
//! execute functions synchronously on the calling thread, in member order,
//! which stands in for network arrival order. Members can be taken offline,
//! pools destroyed and sessions closed to exercise the transport failure paths.

use super::{
    CacheSession, Function, FunctionContext, FunctionRegistry, MemberId, MemberSet, Pool,
    PoolManager, PoolResolver, Region, RegionContext, ServerScope, TransportResult, Value,
};
use crate::error::{RemoteError, Result, TransportError};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// A member process of the in-process grid
pub struct LocalMember {
    id: MemberId,
    groups: Vec<String>,
    online: AtomicBool,
    functions: FunctionRegistry,
    executions: AtomicU64,
}

impl LocalMember {
    pub fn new(id: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            groups: Vec::new(),
            online: AtomicBool::new(true),
            functions: FunctionRegistry::new(),
            executions: AtomicU64::new(0),
        }
    }

    /// Set the member groups this member belongs to
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn in_any_group(&self, groups: &[String]) -> bool {
        self.groups.iter().any(|g| groups.contains(g))
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Number of function executions this member has run
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    fn execute(
        &self,
        function_id: &str,
        arguments: &[Value],
        region: Option<(&LocalRegion, &[Value])>,
    ) -> TransportResult {
        if !self.is_online() {
            return Err(TransportError::member_departed(self.id.clone()));
        }

        let Some(function) = self.functions.get(function_id) else {
            warn!(member = %self.id, function_id, "Function is not registered on member");
            return Ok(Err(RemoteError::function_not_registered(function_id)));
        };

        self.executions.fetch_add(1, Ordering::Relaxed);
        let mut context = FunctionContext::new(function_id, arguments, &self.id);
        if let Some((region, filter)) = region {
            context = context.with_region(RegionContext {
                name: region.name(),
                filter,
                entries: region.entries_for(filter),
            });
        }

        function.execute(&mut context);
        let outcome = context.into_sender().finish();
        trace!(member = %self.id, function_id, ok = outcome.is_ok(), "Member finished function");

        Ok(match outcome {
            Ok(_) if !function.has_result() => Ok(Vec::new()),
            other => other,
        })
    }
}

struct ClusterInner {
    members: RwLock<BTreeMap<MemberId, Arc<LocalMember>>>,
    regions: RwLock<HashMap<String, Arc<LocalRegion>>>,
}

/// A set of members plus the regions they host
#[derive(Clone)]
pub struct LocalCluster {
    inner: Arc<ClusterInner>,
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCluster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ClusterInner {
                members: RwLock::new(BTreeMap::new()),
                regions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// A cluster with one plain member per name
    pub fn with_members<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MemberId>,
    {
        let cluster = Self::new();
        for name in names {
            cluster.add_member(LocalMember::new(name));
        }
        cluster
    }

    pub fn add_member(&self, member: LocalMember) -> Arc<LocalMember> {
        let member = Arc::new(member);
        debug!(member = %member.id(), groups = ?member.groups(), "Member joined");
        self.inner
            .members
            .write()
            .insert(member.id().clone(), Arc::clone(&member));
        member
    }

    pub fn member(&self, id: &MemberId) -> Option<Arc<LocalMember>> {
        self.inner.members.read().get(id).cloned()
    }

    pub fn member_ids(&self) -> Vec<MemberId> {
        self.inner.members.read().keys().cloned().collect()
    }

    fn online_members(&self) -> Vec<Arc<LocalMember>> {
        self.inner
            .members
            .read()
            .values()
            .filter(|m| m.is_online())
            .cloned()
            .collect()
    }

    /// Register a function on every current member
    pub fn register_function(&self, function: Arc<dyn Function>) -> Result<()> {
        for member in self.inner.members.read().values() {
            member.functions().register(Arc::clone(&function))?;
        }
        Ok(())
    }

    /// Create (or return the existing) region with the given name
    pub fn create_region(&self, name: &str) -> Arc<LocalRegion> {
        let mut regions = self.inner.regions.write();
        let region = regions.entry(name.to_string()).or_insert_with(|| {
            Arc::new(LocalRegion {
                name: name.to_string(),
                entries: RwLock::new(BTreeMap::new()),
                cluster: Arc::downgrade(&self.inner),
            })
        });
        Arc::clone(region)
    }

    pub fn region(&self, name: &str) -> Option<Arc<LocalRegion>> {
        self.inner.regions.read().get(name).cloned()
    }

    /// Execute on each listed member, concatenating results in member order.
    ///
    /// The first exception sent back by any member fails the whole call.
    fn fan_out<'a, I>(&self, members: I, function_id: &str, arguments: &[Value]) -> TransportResult
    where
        I: IntoIterator<Item = &'a MemberId>,
    {
        let mut results = Vec::new();
        for id in members {
            let member = self
                .member(id)
                .ok_or_else(|| TransportError::member_departed(id.clone()))?;
            match member.execute(function_id, arguments, None)? {
                Ok(values) => results.extend(values),
                Err(exception) => return Ok(Err(exception)),
            }
        }
        Ok(Ok(results))
    }

    fn execute_on_online(
        &self,
        source_name: &str,
        candidates: Vec<Arc<LocalMember>>,
        function_id: &str,
        arguments: &[Value],
        scope: ServerScope,
    ) -> TransportResult {
        if candidates.is_empty() {
            return Err(TransportError::no_servers_available(source_name));
        }
        let ids: Vec<MemberId> = match scope {
            ServerScope::Any => candidates.iter().take(1).map(|m| m.id().clone()).collect(),
            ServerScope::All => candidates.iter().map(|m| m.id().clone()).collect(),
        };
        self.fan_out(&ids, function_id, arguments)
    }
}

/// A named entry map hosted by every member of its cluster
pub struct LocalRegion {
    name: String,
    entries: RwLock<BTreeMap<String, Value>>,
    cluster: Weak<ClusterInner>,
}

impl LocalRegion {
    pub fn put(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.write().insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn entries_for(&self, filter: &[Value]) -> BTreeMap<String, Value> {
        let entries = self.entries.read();
        if filter.is_empty() {
            return entries.clone();
        }
        filter
            .iter()
            .map(filter_key)
            .filter_map(|key| entries.get(&key).map(|v| (key, v.clone())))
            .collect()
    }
}

fn filter_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Region for LocalRegion {
    fn name(&self) -> &str {
        &self.name
    }

    /// Runs on the first online member; every member hosts a full copy
    fn execute(&self, function_id: &str, arguments: &[Value], filter: &[Value]) -> TransportResult {
        let inner = self.cluster.upgrade().ok_or_else(|| {
            TransportError::Connection(format!("grid hosting region [{}] is gone", self.name))
        })?;
        let cluster = LocalCluster { inner };
        let member = cluster
            .online_members()
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::no_servers_available(self.name.clone()))?;
        member.execute(function_id, arguments, Some((self, filter)))
    }
}

/// A named pool connected to a fixed list of servers
pub struct LocalPool {
    name: String,
    cluster: LocalCluster,
    servers: Vec<MemberId>,
    destroyed: AtomicBool,
}

impl LocalPool {
    pub fn new<I>(name: impl Into<String>, cluster: LocalCluster, servers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MemberId>,
    {
        Self {
            name: name.into(),
            cluster,
            servers: servers.into_iter().map(Into::into).collect(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn servers(&self) -> &[MemberId] {
        &self.servers
    }

    pub fn destroy(&self) {
        debug!(pool = %self.name, "Destroying pool");
        self.destroyed.store(true, Ordering::Release);
    }
}

impl Pool for LocalPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn execute(&self, function_id: &str, arguments: &[Value], scope: ServerScope) -> TransportResult {
        if self.is_destroyed() {
            return Err(TransportError::pool_destroyed(self.name.clone()));
        }
        let candidates = self
            .servers
            .iter()
            .filter_map(|id| self.cluster.member(id))
            .filter(|m| m.is_online())
            .collect();
        self.cluster
            .execute_on_online(&self.name, candidates, function_id, arguments, scope)
    }
}

/// A cache session connected to a [`LocalCluster`]
pub struct LocalSession {
    name: String,
    cluster: LocalCluster,
    pools: Arc<PoolManager>,
    closed: AtomicBool,
}

impl LocalSession {
    pub fn new(name: impl Into<String>, cluster: LocalCluster) -> Self {
        Self {
            name: name.into(),
            cluster,
            pools: Arc::new(PoolManager::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn cluster(&self) -> &LocalCluster {
        &self.cluster
    }

    /// Pools known to this session
    pub fn pools(&self) -> &Arc<PoolManager> {
        &self.pools
    }

    /// Create a pool over the given servers and register it with the session
    pub fn create_pool<I>(&self, name: &str, servers: I) -> Arc<LocalPool>
    where
        I: IntoIterator,
        I::Item: Into<MemberId>,
    {
        let pool = Arc::new(LocalPool::new(name, self.cluster.clone(), servers));
        self.pools.register(pool.clone());
        pool
    }

    pub fn close(&self) {
        debug!(session = %self.name, "Closing cache session");
        self.closed.store(true, Ordering::Release);
    }

    fn ensure_open(&self) -> std::result::Result<(), TransportError> {
        if self.is_closed() {
            Err(TransportError::session_closed(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl CacheSession for LocalSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn find_pool(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self.pools.resolve(name)
    }

    fn region(&self, name: &str) -> Option<Arc<dyn Region>> {
        self.cluster
            .region(name)
            .map(|region| region as Arc<dyn Region>)
    }

    fn members(&self) -> MemberSet {
        self.cluster
            .online_members()
            .iter()
            .map(|m| m.id().clone())
            .collect()
    }

    fn members_in_groups(&self, groups: &[String]) -> MemberSet {
        self.cluster
            .online_members()
            .iter()
            .filter(|m| m.in_any_group(groups))
            .map(|m| m.id().clone())
            .collect()
    }

    fn execute_on_servers(
        &self,
        function_id: &str,
        arguments: &[Value],
        scope: ServerScope,
    ) -> TransportResult {
        self.ensure_open()?;
        let candidates = self.cluster.online_members();
        self.cluster
            .execute_on_online(&self.name, candidates, function_id, arguments, scope)
    }

    fn execute_on_members(
        &self,
        members: &MemberSet,
        function_id: &str,
        arguments: &[Value],
    ) -> TransportResult {
        self.ensure_open()?;
        self.cluster.fan_out(members, function_id, arguments)
    }
}
