//! StateStore — redb-backed persistence for applied topology.
//!
//! Provides the idempotent mutation primitives the compiler's apply step
//! relies on. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::path::Path;
use std::sync::Arc;

use gridgate_core::{
    AutoscalingPolicy, ResourceKind, ResourceResolver, RouteRule, SecurityEdge, TargetGroup,
    TopologyResult, COMPOSITE_PLACEHOLDER,
};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

type Table = TableDefinition<'static, &'static str, &'static [u8]>;

/// Thread-safe provisioning backend backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        for table in [
            SECRETS,
            INGRESS,
            LISTENER_RULES,
            TARGET_GROUPS,
            SCALING_POLICIES,
            INVENTORY,
            APPLIED,
        ] {
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: Table, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn list_json<T: DeserializeOwned>(&self, table: Table, prefix: &str) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                results.push(serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?);
            }
        }
        Ok(results)
    }

    fn put_json<T: Serialize>(&self, table: Table, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Inventory ──────────────────────────────────────────────────

    /// Record an externally-owned resource. Returns true if it was new.
    pub fn register_external(&self, kind: ResourceKind, id: &str) -> StateResult<bool> {
        if self.has_external(kind, id)? {
            return Ok(false);
        }
        let resource = ExternalResource {
            kind,
            id: id.to_string(),
        };
        self.put_json(INVENTORY, &resource.table_key(), &resource)?;
        info!(%kind, %id, "external resource registered");
        Ok(true)
    }

    pub fn has_external(&self, kind: ResourceKind, id: &str) -> StateResult<bool> {
        Ok(self
            .get_json::<ExternalResource>(INVENTORY, &inventory_key(kind, id))?
            .is_some())
    }

    pub fn list_external(&self) -> StateResult<Vec<ExternalResource>> {
        self.list_json(INVENTORY, "")
    }

    // ── Secrets ────────────────────────────────────────────────────

    pub fn get_secret(&self, id: &str) -> StateResult<Option<SecretRecord>> {
        self.get_json(SECRETS, id)
    }

    /// Merge field writes into a secret inside one write transaction.
    ///
    /// `IfAbsent` writes leave existing fields untouched and require `actor`
    /// to hold a write grant. Grants are fixed when the secret is created.
    pub fn merge_secret(
        &self,
        id: &str,
        writers: &[String],
        actor: &str,
        writes: &[(String, FieldWrite)],
    ) -> StateResult<SecretMergeReport> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut report = SecretMergeReport::default();
        {
            let mut table = txn.open_table(SECRETS).map_err(map_err!(Table))?;
            let existing: Option<Vec<u8>> = table
                .get(id)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_vec());

            let mut record = match existing {
                Some(bytes) => serde_json::from_slice::<SecretRecord>(&bytes)
                    .map_err(map_err!(Deserialize))?,
                None => SecretRecord {
                    id: id.to_string(),
                    fields: Default::default(),
                    writers: writers.to_vec(),
                },
            };

            let needs_grant = writes
                .iter()
                .any(|(_, w)| matches!(w, FieldWrite::IfAbsent(_)));
            if needs_grant && !record.writers.iter().any(|w| w == actor) {
                return Err(StateError::WriteDenied {
                    secret: id.to_string(),
                    actor: actor.to_string(),
                });
            }

            for (field, write) in writes {
                match write {
                    FieldWrite::IfAbsent(value) => {
                        if record.fields.contains_key(field) {
                            report.unchanged.push(field.clone());
                        } else {
                            record.fields.insert(
                                field.clone(),
                                StoredValue::Plain {
                                    value: value.clone(),
                                },
                            );
                            report.created.push(field.clone());
                        }
                    }
                    FieldWrite::Overwrite(value) => match record.fields.get(field) {
                        Some(current) if current == value => report.unchanged.push(field.clone()),
                        Some(_) => {
                            record.fields.insert(field.clone(), value.clone());
                            report.updated.push(field.clone());
                        }
                        None => {
                            record.fields.insert(field.clone(), value.clone());
                            report.created.push(field.clone());
                        }
                    },
                }
            }

            let bytes = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(id, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            secret = %id,
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "secret merged"
        );
        Ok(report)
    }

    /// Resolve a field to its plaintext, following one composite reference.
    pub fn resolve_field(&self, id: &str, field: &str) -> StateResult<Option<String>> {
        let Some(record) = self.get_secret(id)? else {
            return Ok(None);
        };
        match record.fields.get(field) {
            Some(StoredValue::Plain { value }) => Ok(Some(value.clone())),
            Some(StoredValue::Composite {
                template,
                reference,
            }) => {
                let target = self
                    .get_secret(&reference.secret_id)?
                    .and_then(|r| r.fields.get(&reference.field).cloned());
                Ok(match target {
                    Some(StoredValue::Plain { value }) => {
                        Some(template.replace(COMPOSITE_PLACEHOLDER, &value))
                    }
                    _ => None,
                })
            }
            None => Ok(None),
        }
    }

    // ── Ingress ────────────────────────────────────────────────────

    /// Append an ingress permission unless one already covers the same
    /// `(dest, source, port)`. Returns true if the edge was added.
    pub fn add_ingress_if_absent(&self, edge: &SecurityEdge) -> StateResult<bool> {
        let key = edge.permission_key();
        let bytes = serde_json::to_vec(edge).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let added;
        {
            let mut table = txn.open_table(INGRESS).map_err(map_err!(Table))?;
            let present = table.get(key.as_str()).map_err(map_err!(Read))?.is_some();
            if !present {
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(map_err!(Write))?;
            }
            added = !present;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, added, "ingress permission");
        Ok(added)
    }

    /// Ingress permissions on one destination group.
    pub fn list_ingress(&self, dest_group: &str) -> StateResult<Vec<SecurityEdge>> {
        self.list_json(INGRESS, &format!("{dest_group}|"))
    }

    // ── Listener rules ─────────────────────────────────────────────

    /// Make the stored rules of `listener` equal `rules`.
    ///
    /// Rules are keyed by priority, so re-syncing an identical set is a no-op.
    pub fn sync_listener_rules(
        &self,
        listener: &str,
        rules: &[RouteRule],
    ) -> StateResult<RuleSyncReport> {
        let prefix = format!("{listener}:");
        let mut report = RuleSyncReport::default();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(LISTENER_RULES).map_err(map_err!(Table))?;

            let wanted: Vec<String> = rules.iter().map(|r| rule_key(listener, r.priority)).collect();
            let stale: Vec<String> = table
                .iter()
                .map_err(map_err!(Read))?
                .filter_map(|entry| {
                    let (key, _) = entry.ok()?;
                    let k = key.value().to_string();
                    (k.starts_with(&prefix) && !wanted.contains(&k)).then_some(k)
                })
                .collect();
            for key in &stale {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
                report.removed += 1;
            }

            for (rule, key) in rules.iter().zip(&wanted) {
                let bytes = serde_json::to_vec(rule).map_err(map_err!(Serialize))?;
                let current: Option<Vec<u8>> = table
                    .get(key.as_str())
                    .map_err(map_err!(Read))?
                    .map(|guard| guard.value().to_vec());
                match current {
                    Some(existing) if existing == bytes => report.unchanged += 1,
                    Some(_) => {
                        table
                            .insert(key.as_str(), bytes.as_slice())
                            .map_err(map_err!(Write))?;
                        report.replaced += 1;
                    }
                    None => {
                        table
                            .insert(key.as_str(), bytes.as_slice())
                            .map_err(map_err!(Write))?;
                        report.added += 1;
                    }
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            %listener,
            added = report.added,
            replaced = report.replaced,
            removed = report.removed,
            "listener rules synchronized"
        );
        Ok(report)
    }

    /// Stored rules of `listener`, priority-ascending.
    pub fn list_listener_rules(&self, listener: &str) -> StateResult<Vec<RouteRule>> {
        self.list_json(LISTENER_RULES, &format!("{listener}:"))
    }

    // ── Target groups ──────────────────────────────────────────────

    /// Create a target group. Returns false if an identical one exists;
    /// fails if one exists with a different definition.
    pub fn create_target_group(&self, stack: &str, group: &TargetGroup) -> StateResult<bool> {
        let key = format!("{stack}/{}", group.name);
        match self.get_json::<TargetGroup>(TARGET_GROUPS, &key)? {
            Some(existing) if existing == *group => Ok(false),
            Some(_) => Err(StateError::Immutable {
                kind: "target group",
                name: key,
            }),
            None => {
                self.put_json(TARGET_GROUPS, &key, group)?;
                info!(target_group = %key, port = group.port, "target group created");
                Ok(true)
            }
        }
    }

    pub fn get_target_group(&self, stack: &str, name: &str) -> StateResult<Option<TargetGroup>> {
        self.get_json(TARGET_GROUPS, &format!("{stack}/{name}"))
    }

    // ── Scaling ────────────────────────────────────────────────────

    /// Store the scaling policy of a service. Returns true if it changed.
    pub fn put_scaling_policy(
        &self,
        service: &str,
        policy: &AutoscalingPolicy,
    ) -> StateResult<bool> {
        if self.get_scaling_policy(service)?.as_ref() == Some(policy) {
            return Ok(false);
        }
        self.put_json(SCALING_POLICIES, service, policy)?;
        Ok(true)
    }

    pub fn get_scaling_policy(&self, service: &str) -> StateResult<Option<AutoscalingPolicy>> {
        self.get_json(SCALING_POLICIES, service)
    }

    // ── Applied plans ──────────────────────────────────────────────

    pub fn put_applied_fingerprint(&self, stack: &str, fingerprint: &str) -> StateResult<()> {
        self.put_json(APPLIED, stack, &fingerprint)
    }

    pub fn get_applied_fingerprint(&self, stack: &str) -> StateResult<Option<String>> {
        self.get_json(APPLIED, stack)
    }
}

impl ResourceResolver for StateStore {
    fn contains(&self, kind: ResourceKind, id: &str) -> TopologyResult<bool> {
        Ok(self.has_external(kind, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridgate_core::{HealthCheck, HttpMethod, Protocol, ScalingMetric, ScalingTrigger, SecretRef};
    use std::collections::BTreeSet;

    fn edge(source: &str, dest: &str, port: u16) -> SecurityEdge {
        SecurityEdge {
            source_group: source.to_string(),
            dest_group: dest.to_string(),
            port,
            description: "test".to_string(),
        }
    }

    fn rule(name: &str, priority: u32) -> RouteRule {
        RouteRule {
            name: name.to_string(),
            priority,
            path_patterns: vec![format!("/{name}")],
            http_methods: BTreeSet::from([HttpMethod::Get]),
            target_group: "middleware".to_string(),
        }
    }

    fn group(port: u16) -> TargetGroup {
        TargetGroup {
            name: "gateway".to_string(),
            port,
            protocol: Protocol::Http,
            health_check: HealthCheck {
                path: "/health/liveliness".to_string(),
                port,
                protocol: Protocol::Http,
                healthy_threshold: 2,
                unhealthy_threshold: 3,
                timeout_secs: 10,
                interval_secs: 30,
            },
        }
    }

    fn writers() -> Vec<String> {
        vec!["provisioner".to_string()]
    }

    // ── Inventory ──────────────────────────────────────────────────

    #[test]
    fn inventory_register_and_resolve() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.register_external(ResourceKind::Vpc, "vpc-1").unwrap());
        assert!(!store.register_external(ResourceKind::Vpc, "vpc-1").unwrap());

        assert!(store.require(ResourceKind::Vpc, "vpc-1").is_ok());
        assert!(store.require(ResourceKind::SecurityGroup, "vpc-1").is_err());
        assert_eq!(store.list_external().unwrap().len(), 1);
    }

    // ── Secrets ────────────────────────────────────────────────────

    #[test]
    fn if_absent_never_overwrites() {
        let store = StateStore::open_in_memory().unwrap();
        let first = store
            .merge_secret(
                "gw/master",
                &writers(),
                "provisioner",
                &[("KEY".to_string(), FieldWrite::IfAbsent("sk-1".to_string()))],
            )
            .unwrap();
        assert_eq!(first.created, vec!["KEY".to_string()]);

        let second = store
            .merge_secret(
                "gw/master",
                &writers(),
                "provisioner",
                &[("KEY".to_string(), FieldWrite::IfAbsent("sk-2".to_string()))],
            )
            .unwrap();
        assert_eq!(second.unchanged, vec!["KEY".to_string()]);
        assert_eq!(
            store.resolve_field("gw/master", "KEY").unwrap().as_deref(),
            Some("sk-1")
        );
    }

    #[test]
    fn overwrite_tracks_latest_value() {
        let store = StateStore::open_in_memory().unwrap();
        let write = |v: &str| {
            store
                .merge_secret(
                    "gw/keys",
                    &[],
                    "anyone",
                    &[(
                        "OPENAI_API_KEY".to_string(),
                        FieldWrite::Overwrite(StoredValue::Plain {
                            value: v.to_string(),
                        }),
                    )],
                )
                .unwrap()
        };
        assert_eq!(write("a").created.len(), 1);
        assert_eq!(write("a").unchanged.len(), 1);
        assert_eq!(write("b").updated.len(), 1);
        assert_eq!(
            store.resolve_field("gw/keys", "OPENAI_API_KEY").unwrap().as_deref(),
            Some("b")
        );
    }

    #[test]
    fn generated_writes_need_a_grant() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store
            .merge_secret(
                "gw/master",
                &writers(),
                "intruder",
                &[("KEY".to_string(), FieldWrite::IfAbsent("x".to_string()))],
            )
            .unwrap_err();
        assert!(matches!(err, StateError::WriteDenied { .. }));
        assert!(store.get_secret("gw/master").unwrap().is_none());
    }

    #[test]
    fn composite_resolves_through_reference() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .merge_secret(
                "db",
                &[],
                "ops",
                &[(
                    "password".to_string(),
                    FieldWrite::Overwrite(StoredValue::Plain {
                        value: "hunter2".to_string(),
                    }),
                )],
            )
            .unwrap();
        store
            .merge_secret(
                "gw/database-url",
                &[],
                "ops",
                &[(
                    "url".to_string(),
                    FieldWrite::Overwrite(StoredValue::Composite {
                        template: "postgresql://u:{secret}@h:5432/d".to_string(),
                        reference: SecretRef {
                            secret_id: "db".to_string(),
                            field: "password".to_string(),
                        },
                    }),
                )],
            )
            .unwrap();

        let stored = store.get_secret("gw/database-url").unwrap().unwrap();
        let raw = serde_json::to_string(&stored).unwrap();
        assert!(!raw.contains("hunter2"));
        assert_eq!(
            store.resolve_field("gw/database-url", "url").unwrap().as_deref(),
            Some("postgresql://u:hunter2@h:5432/d")
        );
    }

    // ── Ingress ────────────────────────────────────────────────────

    #[test]
    fn ingress_is_append_only() {
        let store = StateStore::open_in_memory().unwrap();
        store.add_ingress_if_absent(&edge("sg-bastion", "sg-db", 5432)).unwrap();

        assert!(store.add_ingress_if_absent(&edge("sg-app", "sg-db", 5432)).unwrap());
        assert!(!store.add_ingress_if_absent(&edge("sg-app", "sg-db", 5432)).unwrap());

        let rules = store.list_ingress("sg-db").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|e| e.source_group == "sg-bastion"));
        assert!(store.list_ingress("sg-cache").unwrap().is_empty());
    }

    // ── Listener rules ─────────────────────────────────────────────

    #[test]
    fn rule_sync_converges() {
        let store = StateStore::open_in_memory().unwrap();
        let rules = vec![rule("a", 10), rule("b", 9)];

        let first = store.sync_listener_rules("https", &rules).unwrap();
        assert_eq!(first.added, 2);

        let again = store.sync_listener_rules("https", &rules).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.unchanged, 2);

        let next = store
            .sync_listener_rules("https", &[rule("a", 10), rule("c", 11)])
            .unwrap();
        assert_eq!((next.added, next.removed, next.unchanged), (1, 1, 1));

        let stored = store.list_listener_rules("https").unwrap();
        let priorities: Vec<u32> = stored.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![10, 11]);
    }

    #[test]
    fn rule_listing_is_priority_ordered() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .sync_listener_rules("https", &[rule("x", 100), rule("y", 9), rule("z", 16)])
            .unwrap();
        let priorities: Vec<u32> = store
            .list_listener_rules("https")
            .unwrap()
            .iter()
            .map(|r| r.priority)
            .collect();
        assert_eq!(priorities, vec![9, 16, 100]);
    }

    // ── Target groups ──────────────────────────────────────────────

    #[test]
    fn target_groups_are_immutable() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.create_target_group("gw", &group(4000)).unwrap());
        assert!(!store.create_target_group("gw", &group(4000)).unwrap());
        let err = store.create_target_group("gw", &group(4001)).unwrap_err();
        assert!(matches!(err, StateError::Immutable { .. }));
        assert_eq!(
            store.get_target_group("gw", "gateway").unwrap().unwrap().port,
            4000
        );
    }

    // ── Scaling / applied ──────────────────────────────────────────

    #[test]
    fn scaling_policy_change_detection() {
        let store = StateStore::open_in_memory().unwrap();
        let mut policy = AutoscalingPolicy {
            min_capacity: 1,
            desired_capacity: 1,
            max_capacity: 3,
            triggers: vec![ScalingTrigger {
                name: "CpuScaling".to_string(),
                metric: ScalingMetric::Cpu,
                target_percent: 50.0,
            }],
        };
        assert!(store.put_scaling_policy("svc", &policy).unwrap());
        assert!(!store.put_scaling_policy("svc", &policy).unwrap());
        policy.max_capacity = 4;
        assert!(store.put_scaling_policy("svc", &policy).unwrap());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridgate.redb");
        {
            let store = StateStore::open(&path).unwrap();
            store.put_applied_fingerprint("gw", "abc").unwrap();
            store.register_external(ResourceKind::Certificate, "arn:cert").unwrap();
        }
        let store = StateStore::open(&path).unwrap();
        assert_eq!(
            store.get_applied_fingerprint("gw").unwrap().as_deref(),
            Some("abc")
        );
        assert!(store.has_external(ResourceKind::Certificate, "arn:cert").unwrap());
    }
}
