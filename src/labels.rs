//! Well-known workload label keys.
//!
//! These follow the Kubernetes recommended label convention. A record that
//! lacks one of them reads it as the empty string.

pub const INSTANCE: &str = "app.kubernetes.io/instance";
pub const NAME: &str = "app.kubernetes.io/name";
pub const COMPONENT: &str = "app.kubernetes.io/component";
pub const VERSION: &str = "app.kubernetes.io/version";
