pub mod entity;
pub mod models;

pub use entity::EntityDescriptor;
pub use models::EntityKind;
pub use utils::tokenize::Record;
