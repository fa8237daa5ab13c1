//! Generated by rowcast-gen. Do not edit.
pub mod image_value;
pub mod users_table_value;
pub use image_value::ImageValue;
pub use users_table_value::UsersTableValue;
