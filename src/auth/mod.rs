pub mod middleware;
pub mod password;
pub mod throttle;
pub mod token;
pub mod validate;
