// Middleware module - contains permissions, CORS, rate limiting and tracing setup

pub mod cors;
pub mod observability;
pub mod permissions;
pub mod rate_limit;

pub use cors::cors_layer_for;
pub use permissions::Permission;
pub use rate_limit::{RateLimiterState, create_rate_limiter_with_quota};
