pub mod handlers;
pub mod middleware;
pub mod pokemon;
pub mod rate_limit;
pub mod routes;

pub use rate_limit::RateLimiter;
pub use routes::create_router;
