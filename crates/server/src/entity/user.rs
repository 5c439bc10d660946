use crate::alerts::EmergencyContact;
use sea_orm::entity::prelude::*;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

/// A registered user and their emergency medical profile.
///
/// List fields are stored as JSON arrays.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub blood_type: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub allergies: Json,
    #[sea_orm(column_type = "Json")]
    pub conditions: Json,
    #[sea_orm(column_type = "Json")]
    pub medications: Json,
    #[sea_orm(column_type = "Json")]
    pub emergency_contacts: Json,
    #[sea_orm(unique)]
    pub public_token: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn allergies(&self) -> Vec<String> {
        self.json_list("allergies", &self.allergies)
    }

    pub fn conditions(&self) -> Vec<String> {
        self.json_list("conditions", &self.conditions)
    }

    pub fn medications(&self) -> Vec<String> {
        self.json_list("medications", &self.medications)
    }

    pub fn emergency_contacts(&self) -> Vec<EmergencyContact> {
        self.json_list("emergency_contacts", &self.emergency_contacts)
    }

    /// Decodes a JSON list column. A column that does not decode is logged
    /// and read as empty.
    fn json_list<T: DeserializeOwned>(&self, column: &'static str, value: &Json) -> Vec<T> {
        match serde_json::from_value(value.clone()) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(
                    name = "entity.user.corrupt_column",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    user_id = self.id,
                    column,
                    error = %e,
                    message = "Stored list column does not decode; treating it as empty"
                );
                Vec::new()
            }
        }
    }
}
