//! The revision chain, baseline first.

mod add_deployment_type;
mod add_workers;
mod baseline;
mod cascade_foreign_keys;
mod merge_credentials;

use super::Revision;

pub use add_deployment_type::AddDeploymentType;
pub use add_workers::AddWorkers;
pub use baseline::Baseline;
pub use cascade_foreign_keys::CascadeForeignKeys;
pub use merge_credentials::MergeCredentials;

/// Revision stamped onto databases created before revision tracking existed.
pub const INITIAL_REVISION: &str = "ca3626f62937";

/// Every revision in chain order.
pub fn all() -> Vec<Box<dyn Revision>> {
    vec![
        Box::new(Baseline),
        Box::new(AddDeploymentType),
        Box::new(MergeCredentials),
        Box::new(AddWorkers),
        Box::new(CascadeForeignKeys),
    ]
}
