//! Generated by rowcast-gen from table `Image` (class `Image`). Do not edit.
/// One row of table `Image`, keyed by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageValue {
    /// Column `id` (INT, primary key).
    pub id: i32,
    /// Column `path` (TEXT).
    pub path: String,
}
impl ImageValue {
    /// Table the value type was generated from.
    pub const TABLE: &str = "Image";
    /// Primary key of this value.
    pub fn key(&self) -> ::rowcast_core::Key {
        ::rowcast_core::Key::from(self.id)
    }
}
impl ::rowcast_core::FromRow for ImageValue {
    fn from_row(
        value_type: &::rowcast_core::ValueTypeDescriptor,
        row: &::rowcast_core::Row,
    ) -> Result<Self, ::rowcast_core::RowError> {
        Ok(Self {
            id: row.checked_column(value_type.require_field("id")?)?,
            path: row.checked_column(value_type.require_field("path")?)?,
        })
    }
}
