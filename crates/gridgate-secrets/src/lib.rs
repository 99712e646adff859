//! gridgate-secrets — credential provisioning for the gateway.
//!
//! Derives the credential sets a deployment needs and materializes them in
//! the secret store.
//!
//! # Credential kinds
//!
//! ```text
//! master-and-salt           Generated  (create-if-absent, write-granted)
//! provider-api-keys         Supplied   (verbatim from the descriptor, may be empty)
//! database-url              Composite  (template + reference to the tier's password)
//! database-middleware-url   Composite
//! ```
//!
//! Generated keys are `sk-` followed by 32 hex characters drawn from the
//! operating system CSPRNG. Re-running provisioning never replaces them;
//! supplied keys always reflect the latest descriptor.

pub mod keygen;
pub mod provisioner;

pub use keygen::generate_key;
pub use provisioner::{
    MASTER_KEY, PROVISIONER_ACTOR, ProvisionReport, SALT_KEY, SecretProvisioner, provision,
    secret_id,
};
