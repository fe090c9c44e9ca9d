pub mod id;
pub mod task;
pub mod user;
