//! redb table definitions for the provisioning backend.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Stored secrets keyed by secret id (`{stack}/{name}`).
pub const SECRETS: TableDefinition<&str, &[u8]> = TableDefinition::new("secrets");

/// Ingress permissions keyed by `{dest}|{source}|{port}`.
pub const INGRESS: TableDefinition<&str, &[u8]> = TableDefinition::new("ingress");

/// Listener rules keyed by `{listener}:{priority:05}`.
pub const LISTENER_RULES: TableDefinition<&str, &[u8]> = TableDefinition::new("listener_rules");

/// Target groups keyed by `{stack}/{name}`.
pub const TARGET_GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("target_groups");

/// Scaling policies keyed by service name.
pub const SCALING_POLICIES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("scaling_policies");

/// Externally-owned resources keyed by `{kind}/{id}`.
pub const INVENTORY: TableDefinition<&str, &[u8]> = TableDefinition::new("inventory");

/// Last applied plan fingerprint keyed by stack name.
pub const APPLIED: TableDefinition<&str, &[u8]> = TableDefinition::new("applied");
