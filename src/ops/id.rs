use rand::RngCore;

use crate::model::task::Task;

/// Prefix carried by every generated task id
pub const ID_PREFIX: &str = "t_";

/// Generate an id not used by any task in `existing`.
pub fn generate_task_id(existing: &[Task]) -> String {
    generate_task_id_with(&mut rand::thread_rng(), existing)
}

/// Like [`generate_task_id`] with an explicit random source.
/// Ids are `t_` followed by 16 lowercase hex digits.
pub fn generate_task_id_with<R: RngCore + ?Sized>(rng: &mut R, existing: &[Task]) -> String {
    loop {
        let id = format!("{}{:016x}", ID_PREFIX, rng.next_u64());
        if !existing.iter().any(|t| t.id == id) {
            return id;
        }
    }
}
