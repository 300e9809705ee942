use uuid::Uuid;

pub mod tracked_item;

pub use tracked_item::*;

// Helper function to generate IDs in the format expected by the database
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
