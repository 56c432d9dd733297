pub mod cookies;
pub mod credentials;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod seed;

pub use middleware::AuthUser;
