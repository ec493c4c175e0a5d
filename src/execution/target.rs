//! Execution target resolution
//!
//! Each template owns a [`TargetResolver`] that turns its configuration into
//! exactly one [`ExecutionTarget`] per call. Resolution reads the resolver's
//! configuration and collaborators only; it never mutates shared state other
//! than the best-effort last-known-good pool, and it never remembers a failure.

use crate::config::{self, MembersSection, RegionSection, ServerSection};
use crate::error::{FunctionError, Result};
use crate::grid::{
    display_members, CacheSession, MemberSet, Pool, PoolResolver, Region, ServerScope, Value,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The grid entity a call is dispatched against
#[derive(Debug, Clone)]
pub enum ExecutionTarget {
    /// A connection pool, by name
    Pool {
        name: String,
        pool: Arc<dyn Pool>,
        scope: ServerScope,
    },
    /// The servers of a cache session
    CacheSession {
        session: Arc<dyn CacheSession>,
        scope: ServerScope,
    },
    /// The members hosting a region, optionally restricted to routing keys
    Region {
        name: String,
        region: Arc<dyn Region>,
        filter: Vec<Value>,
    },
    /// An explicit set of members, dispatched through a session
    Members {
        members: MemberSet,
        session: Arc<dyn CacheSession>,
    },
}

impl ExecutionTarget {
    /// Short name of the variant
    pub fn kind(&self) -> TargetKind {
        match self {
            ExecutionTarget::Pool { .. } => TargetKind::Pool,
            ExecutionTarget::CacheSession { .. } => TargetKind::CacheSession,
            ExecutionTarget::Region { .. } => TargetKind::Region,
            ExecutionTarget::Members { .. } => TargetKind::Members,
        }
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionTarget::Pool { name, scope, .. } => write!(f, "pool [{}] ({})", name, scope),
            ExecutionTarget::CacheSession { session, scope } => {
                write!(f, "cache session [{}] ({})", session.name(), scope)
            }
            ExecutionTarget::Region { name, filter, .. } => {
                write!(f, "region [{}] ({} filter keys)", name, filter.len())
            }
            ExecutionTarget::Members { members, .. } => {
                write!(f, "members {}", display_members(members))
            }
        }
    }
}

/// Discriminant of [`ExecutionTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Pool,
    CacheSession,
    Region,
    Members,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Pool => write!(f, "pool"),
            TargetKind::CacheSession => write!(f, "cache_session"),
            TargetKind::Region => write!(f, "region"),
            TargetKind::Members => write!(f, "members"),
        }
    }
}

/// Produces the target for one call
pub trait TargetResolver: Send + Sync {
    fn resolve(&self) -> Result<ExecutionTarget>;
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Server targets
// ---------------------------------------------------------------------------

/// Resolves a pool or cache session for "on server(s)" execution.
///
/// Order, most specific first:
/// 1. the explicit pool reference
/// 2. the pool named by `pool_name` (failing hard if it does not resolve)
/// 3. the pool registered under [`config::DEFAULT_POOL_NAME`]
/// 4. the cache session itself
///
/// Without any of these the call fails with `No Pool was configured`.
pub struct ServerTargets {
    session: Option<Arc<dyn CacheSession>>,
    pool: Option<Arc<dyn Pool>>,
    pool_name: Option<String>,
    pool_resolver: Option<Arc<dyn PoolResolver>>,
    scope: ServerScope,
    last_resolved: RwLock<Option<Arc<dyn Pool>>>,
}

impl ServerTargets {
    fn empty() -> Self {
        Self {
            session: None,
            pool: None,
            pool_name: None,
            pool_resolver: None,
            scope: ServerScope::Any,
            last_resolved: RwLock::new(None),
        }
    }

    /// Target a cache session, or one of the pools it knows about
    pub fn with_session(session: Arc<dyn CacheSession>) -> Self {
        Self {
            session: Some(session),
            ..Self::empty()
        }
    }

    /// Target an explicit pool
    pub fn with_pool(pool: Arc<dyn Pool>) -> Self {
        Self {
            pool: Some(pool),
            ..Self::empty()
        }
    }

    /// Target the pool `name`, looked up through `resolver` on every call
    pub fn with_pool_name(name: impl Into<String>, resolver: Arc<dyn PoolResolver>) -> Self {
        Self {
            pool_name: Some(name.into()),
            pool_resolver: Some(resolver),
            ..Self::empty()
        }
    }

    /// Build from the `[server]` configuration section
    pub fn from_config(section: &ServerSection, session: Arc<dyn CacheSession>) -> Self {
        let mut targets = Self::with_session(session);
        targets.pool_name = section.pool_name.clone();
        targets.scope = section.scope.unwrap_or_default();
        targets
    }

    pub fn set_session(&mut self, session: Arc<dyn CacheSession>) {
        self.session = Some(session);
    }

    pub fn set_pool(&mut self, pool: Arc<dyn Pool>) {
        self.pool = Some(pool);
    }

    pub fn set_pool_name(&mut self, pool_name: impl Into<String>) {
        self.pool_name = Some(pool_name.into());
    }

    pub fn set_pool_resolver(&mut self, resolver: Arc<dyn PoolResolver>) {
        self.pool_resolver = Some(resolver);
    }

    pub fn set_scope(&mut self, scope: ServerScope) {
        self.scope = scope;
    }

    /// Dispatch to every server instead of one
    pub fn on_all_servers(mut self) -> Self {
        self.scope = ServerScope::All;
        self
    }

    pub fn pool_name(&self) -> Option<&str> {
        self.pool_name.as_deref()
    }

    pub fn scope(&self) -> ServerScope {
        self.scope
    }

    /// Pool returned by the most recent successful name-based resolution
    pub fn last_resolved_pool(&self) -> Option<Arc<dyn Pool>> {
        self.last_resolved.read().clone()
    }

    fn lookup_pool(&self, name: &str) -> Option<Arc<dyn Pool>> {
        match (&self.pool_resolver, &self.session) {
            (Some(resolver), _) => resolver.resolve(name),
            (None, Some(session)) => session.find_pool(name).filter(|p| !p.is_destroyed()),
            (None, None) => None,
        }
    }

    fn pool_target(&self, pool: Arc<dyn Pool>) -> ExecutionTarget {
        ExecutionTarget::Pool {
            name: pool.name().to_string(),
            pool,
            scope: self.scope,
        }
    }

    fn remember(&self, pool: Option<Arc<dyn Pool>>) {
        *self.last_resolved.write() = pool;
    }
}

impl TargetResolver for ServerTargets {
    fn resolve(&self) -> Result<ExecutionTarget> {
        if let Some(pool) = &self.pool {
            trace!(pool = pool.name(), "Using explicit pool");
            return Ok(self.pool_target(Arc::clone(pool)));
        }

        if let Some(name) = non_blank(self.pool_name.as_deref()) {
            return match self.lookup_pool(name) {
                Some(pool) => {
                    debug!(pool = name, "Resolved named pool");
                    self.remember(Some(Arc::clone(&pool)));
                    Ok(self.pool_target(pool))
                }
                None => {
                    self.remember(None);
                    Err(FunctionError::target_unresolved(format!(
                        "No Pool with name [{}] exists",
                        name
                    )))
                }
            };
        }

        if let Some(pool) = self.lookup_pool(config::DEFAULT_POOL_NAME) {
            debug!(pool = config::DEFAULT_POOL_NAME, "Resolved default pool");
            self.remember(Some(Arc::clone(&pool)));
            return Ok(self.pool_target(pool));
        }

        self.remember(None);
        match &self.session {
            Some(session) => {
                trace!(session = session.name(), "No pool resolved; using cache session");
                Ok(ExecutionTarget::CacheSession {
                    session: Arc::clone(session),
                    scope: self.scope,
                })
            }
            None => Err(FunctionError::target_unresolved("No Pool was configured")),
        }
    }
}

// ---------------------------------------------------------------------------
// Region targets
// ---------------------------------------------------------------------------

/// Resolves a region for "on region" execution.
///
/// An explicit region handle wins; otherwise the region name is looked up on
/// the session at call time.
pub struct RegionTargets {
    region: Option<Arc<dyn Region>>,
    region_name: Option<String>,
    session: Option<Arc<dyn CacheSession>>,
    filter: Vec<Value>,
}

impl RegionTargets {
    pub fn new(region: Arc<dyn Region>) -> Self {
        Self {
            region: Some(region),
            region_name: None,
            session: None,
            filter: Vec::new(),
        }
    }

    /// Target a region by name, looked up through `session` on every call
    pub fn named(session: Arc<dyn CacheSession>, region_name: impl Into<String>) -> Self {
        Self {
            region: None,
            region_name: Some(region_name.into()),
            session: Some(session),
            filter: Vec::new(),
        }
    }

    /// Build from the `[region]` configuration section
    pub fn from_config(section: &RegionSection, session: Arc<dyn CacheSession>) -> Self {
        let filter = section
            .filter
            .iter()
            .map(|key| Value::String(key.clone()))
            .collect();
        Self {
            region: None,
            region_name: section.name.clone(),
            session: Some(session),
            filter,
        }
    }

    /// Restrict execution to the given routing keys
    pub fn with_filter<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.filter = keys.into_iter().collect();
        self
    }

    pub fn filter(&self) -> &[Value] {
        &self.filter
    }
}

impl TargetResolver for RegionTargets {
    fn resolve(&self) -> Result<ExecutionTarget> {
        let region = match (&self.region, non_blank(self.region_name.as_deref()), &self.session) {
            (Some(region), _, _) => Arc::clone(region),
            (None, Some(name), Some(session)) => session.region(name).ok_or_else(|| {
                FunctionError::target_unresolved(format!("No Region with name [{}] exists", name))
            })?,
            _ => return Err(FunctionError::target_unresolved("No Region was configured")),
        };

        trace!(region = region.name(), filter = self.filter.len(), "Resolved region");
        Ok(ExecutionTarget::Region {
            name: region.name().to_string(),
            region,
            filter: self.filter.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Member targets
// ---------------------------------------------------------------------------

/// Which members an "on members" call fans out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSelection {
    /// Every member the session currently knows
    All,
    /// An explicit set of members
    Members(MemberSet),
    /// Members belonging to any of the groups
    Groups(Vec<String>),
}

/// Resolves a member set for "on members" execution
pub struct MemberTargets {
    session: Arc<dyn CacheSession>,
    selection: MemberSelection,
}

impl MemberTargets {
    pub fn new(session: Arc<dyn CacheSession>, selection: MemberSelection) -> Self {
        Self { session, selection }
    }

    pub fn all(session: Arc<dyn CacheSession>) -> Self {
        Self::new(session, MemberSelection::All)
    }

    pub fn members(session: Arc<dyn CacheSession>, members: MemberSet) -> Self {
        Self::new(session, MemberSelection::Members(members))
    }

    pub fn groups<I, S>(session: Arc<dyn CacheSession>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            session,
            MemberSelection::Groups(groups.into_iter().map(Into::into).collect()),
        )
    }

    /// Build from the `[members]` configuration section; no groups means all members
    pub fn from_config(section: &MembersSection, session: Arc<dyn CacheSession>) -> Self {
        if section.groups.is_empty() {
            Self::all(session)
        } else {
            Self::groups(session, section.groups.iter().cloned())
        }
    }

    pub fn selection(&self) -> &MemberSelection {
        &self.selection
    }
}

impl TargetResolver for MemberTargets {
    fn resolve(&self) -> Result<ExecutionTarget> {
        let members = match &self.selection {
            MemberSelection::All => self.session.members(),
            MemberSelection::Members(members) => members.clone(),
            MemberSelection::Groups(groups) => self.session.members_in_groups(groups),
        };

        if members.is_empty() {
            let message = match &self.selection {
                MemberSelection::All => "No members are available".to_string(),
                MemberSelection::Members(_) => "No members were specified".to_string(),
                MemberSelection::Groups(groups) => {
                    format!("No members found in groups [{}]", groups.join(", "))
                }
            };
            return Err(FunctionError::target_unresolved(message));
        }

        trace!(members = %display_members(&members), "Resolved members");
        Ok(ExecutionTarget::Members {
            members,
            session: Arc::clone(&self.session),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::local::{LocalCluster, LocalMember, LocalPool, LocalSession};
    use crate::grid::{member_set, PoolManager};

    fn session() -> Arc<LocalSession> {
        let cluster = LocalCluster::new();
        cluster.add_member(LocalMember::new("server1").with_groups(["east"]));
        cluster.add_member(LocalMember::new("server2").with_groups(["west"]));
        Arc::new(LocalSession::new("client", cluster))
    }

    fn unresolved_message(result: Result<ExecutionTarget>) -> String {
        match result {
            Err(FunctionError::TargetUnresolved(message)) => message,
            other => panic!("expected TargetUnresolved, got {:?}", other.map(|t| t.kind())),
        }
    }

    #[test]
    fn test_explicit_pool_wins() {
        let session = session();
        let pool = session.create_pool("serverPool", session.cluster().member_ids());
        session.create_pool("DEFAULT", session.cluster().member_ids());

        let mut targets = ServerTargets::with_session(session.clone());
        targets.set_pool(pool);
        targets.set_pool_name("missing");

        match targets.resolve().unwrap() {
            ExecutionTarget::Pool { name, .. } => assert_eq!(name, "serverPool"),
            other => panic!("unexpected target {}", other),
        }
    }

    #[test]
    fn test_named_pool_resolves_through_resolver() {
        let session = session();
        let manager = Arc::new(PoolManager::new());
        manager.register(Arc::new(LocalPool::new(
            "serverPool",
            session.cluster().clone(),
            session.cluster().member_ids(),
        )));

        let targets = ServerTargets::with_pool_name("serverPool", manager);
        assert_eq!(targets.resolve().unwrap().kind(), TargetKind::Pool);
        assert_eq!(targets.last_resolved_pool().unwrap().name(), "serverPool");
    }

    #[test]
    fn test_named_pool_failure_does_not_fall_through_to_default() {
        let session = session();
        session.create_pool("DEFAULT", session.cluster().member_ids());

        let mut targets = ServerTargets::with_session(session);
        targets.set_pool_name("X");

        assert_eq!(unresolved_message(targets.resolve()), "No Pool with name [X] exists");
    }

    #[test]
    fn test_failed_resolution_is_not_cached() {
        let session = session();
        let mut targets = ServerTargets::with_session(session.clone());
        targets.set_pool_name("late");

        assert!(targets.resolve().is_err());
        assert!(targets.last_resolved_pool().is_none());

        session.create_pool("late", session.cluster().member_ids());
        assert_eq!(targets.resolve().unwrap().kind(), TargetKind::Pool);

        session.pools().unregister("late");
        assert!(targets.resolve().is_err());
        assert!(targets.last_resolved_pool().is_none());
    }

    #[test]
    fn test_missing_default_pool_clears_last_resolved() {
        let session = session();
        session.create_pool("DEFAULT", session.cluster().member_ids());
        let targets = ServerTargets::with_session(session.clone());

        assert_eq!(targets.resolve().unwrap().kind(), TargetKind::Pool);
        assert_eq!(targets.last_resolved_pool().unwrap().name(), "DEFAULT");

        session.pools().unregister("DEFAULT");
        assert_eq!(targets.resolve().unwrap().kind(), TargetKind::CacheSession);
        assert!(targets.last_resolved_pool().is_none());
    }

    #[test]
    fn test_blank_pool_name_is_unset() {
        let session = session();
        session.create_pool("DEFAULT", session.cluster().member_ids());

        let mut targets = ServerTargets::with_session(session);
        targets.set_pool_name("  ");

        match targets.resolve().unwrap() {
            ExecutionTarget::Pool { name, .. } => assert_eq!(name, "DEFAULT"),
            other => panic!("unexpected target {}", other),
        }
    }

    #[test]
    fn test_falls_back_to_session_without_pools() {
        let targets = ServerTargets::with_session(session()).on_all_servers();
        match targets.resolve().unwrap() {
            ExecutionTarget::CacheSession { scope, .. } => assert_eq!(scope, ServerScope::All),
            other => panic!("unexpected target {}", other),
        }
    }

    #[test]
    fn test_no_pool_configured() {
        let resolver: Arc<dyn PoolResolver> = Arc::new(PoolManager::new());
        let mut targets = ServerTargets::with_pool_name("", resolver);
        targets.set_pool_name("");
        assert_eq!(unresolved_message(targets.resolve()), "No Pool was configured");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let targets = ServerTargets::with_session(session());
        let first = targets.resolve().unwrap().kind();
        let second = targets.resolve().unwrap().kind();
        assert_eq!(first, second);
    }

    #[test]
    fn test_region_by_handle_and_name() {
        let session = session();
        let region = session.cluster().create_region("Numbers");

        let by_handle = RegionTargets::new(region).with_filter([Value::from("one")]);
        match by_handle.resolve().unwrap() {
            ExecutionTarget::Region { name, filter, .. } => {
                assert_eq!(name, "Numbers");
                assert_eq!(filter.len(), 1);
            }
            other => panic!("unexpected target {}", other),
        }

        let by_name = RegionTargets::named(session.clone(), "Numbers");
        assert_eq!(by_name.resolve().unwrap().kind(), TargetKind::Region);

        let missing = RegionTargets::named(session, "Missing");
        assert_eq!(
            unresolved_message(missing.resolve()),
            "No Region with name [Missing] exists"
        );
    }

    #[test]
    fn test_region_not_configured() {
        let targets = RegionTargets::named(session(), " ");
        assert_eq!(unresolved_message(targets.resolve()), "No Region was configured");
    }

    #[test]
    fn test_member_selection() {
        let session = session();

        match MemberTargets::all(session.clone()).resolve().unwrap() {
            ExecutionTarget::Members { members, .. } => {
                assert_eq!(members, member_set(["server1", "server2"]))
            }
            other => panic!("unexpected target {}", other),
        }

        match MemberTargets::groups(session.clone(), ["west"]).resolve().unwrap() {
            ExecutionTarget::Members { members, .. } => assert_eq!(members, member_set(["server2"])),
            other => panic!("unexpected target {}", other),
        }

        assert_eq!(
            unresolved_message(MemberTargets::groups(session.clone(), ["north"]).resolve()),
            "No members found in groups [north]"
        );
        assert_eq!(
            unresolved_message(MemberTargets::members(session, MemberSet::new()).resolve()),
            "No members were specified"
        );
    }

    #[test]
    fn test_target_display() {
        let session = session();
        let target = MemberTargets::all(session).resolve().unwrap();
        assert_eq!(target.to_string(), "members [server1, server2]");
    }
}
