//! Generated by rowcast-gen from table `Users` (class `UsersTable`). Do not edit.
/// One row of table `Users`, keyed by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct UsersTableValue {
    /// Column `id` (VARCHAR(10), primary key).
    pub id: String,
    /// Column `name` (VARCHAR(50)).
    pub name: String,
    /// Column `type` (ENUM(ADMIN, USER)).
    pub type_: String,
    /// Column `cityId` (INT, nullable).
    pub city_id: Option<i32>,
}
impl UsersTableValue {
    /// Table the value type was generated from.
    pub const TABLE: &str = "Users";
    /// Primary key of this value.
    pub fn key(&self) -> ::rowcast_core::Key {
        ::rowcast_core::Key::from(self.id.clone())
    }
}
impl ::rowcast_core::FromRow for UsersTableValue {
    fn from_row(
        value_type: &::rowcast_core::ValueTypeDescriptor,
        row: &::rowcast_core::Row,
    ) -> Result<Self, ::rowcast_core::RowError> {
        Ok(Self {
            id: row.checked_column(value_type.require_field("id")?)?,
            name: row.checked_column(value_type.require_field("name")?)?,
            type_: row.checked_column(value_type.require_field("type_")?)?,
            city_id: row.checked_column(value_type.require_field("city_id")?)?,
        })
    }
}
