pub mod entity;
pub mod export;
pub mod graphql;
pub mod notification;
pub mod privilege;
pub mod screen;
pub mod table;
