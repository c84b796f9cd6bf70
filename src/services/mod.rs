//! Service resolvers: turn the validated tenant, interface and route
//! declarations into fully resolved per-device plans.

pub mod interface;
pub mod route;
pub mod tenant;

pub use interface::{unused_interfaces, ResolvedInterface};
pub use route::RoutePlan;
pub use tenant::TenantPlan;
