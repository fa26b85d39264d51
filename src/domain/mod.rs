pub mod schema;
pub mod task;
