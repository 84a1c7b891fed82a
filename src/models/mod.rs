pub mod diet_plan;
pub mod user;
