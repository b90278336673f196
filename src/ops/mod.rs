pub mod id;
pub mod stats;
pub mod task_ops;
