//! Stored profiles and the views handed out over HTTP.

use crate::alerts::EmergencyContact;
use crate::entity::user;
use crate::validation::{NewAccount, ValidProfile};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

/// What a signed-in user sees about their own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub blood_type: Option<String>,
    pub public_token: String,
}

impl From<&user::Model> for UserSummary {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            blood_type: u.blood_type.clone(),
            public_token: u.public_token.clone(),
        }
    }
}

/// The owner's full profile, including the link encoded in their QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub public_token: String,
    pub public_url: String,
}

impl ProfileView {
    pub fn new(u: &user::Model, public_url: String) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            blood_type: u.blood_type.clone(),
            allergies: u.allergies(),
            conditions: u.conditions(),
            medications: u.medications(),
            emergency_contacts: u.emergency_contacts(),
            public_token: u.public_token.clone(),
            public_url,
        }
    }
}

/// What a first responder sees after scanning the QR code. No account details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub name: String,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl From<&user::Model> for PublicProfile {
    fn from(u: &user::Model) -> Self {
        Self {
            name: u.name.clone(),
            blood_type: u.blood_type.clone(),
            allergies: u.allergies(),
            conditions: u.conditions(),
            medications: u.medications(),
            emergency_contacts: u.emergency_contacts(),
        }
    }
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Active users only; deactivated accounts behave as missing.
pub async fn find_active_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>, DbErr> {
    Ok(user::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|u| u.is_active))
}

pub async fn find_active_by_public_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::PublicToken.eq(token))
        .filter(user::Column::IsActive.eq(true))
        .one(db)
        .await
}

/// Inserts a new active user with an empty medical profile.
#[tracing::instrument(skip(db, account, password_hash, public_token), fields(email = %account.email))]
pub async fn create_user(
    db: &DatabaseConnection,
    account: &NewAccount,
    password_hash: String,
    public_token: String,
) -> Result<user::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    let empty = serde_json::json!([]);
    user::ActiveModel {
        name: Set(account.name.clone()),
        email: Set(account.email.clone()),
        password_hash: Set(password_hash),
        blood_type: Set(None),
        allergies: Set(empty.clone()),
        conditions: Set(empty.clone()),
        medications: Set(empty.clone()),
        emergency_contacts: Set(empty),
        public_token: Set(public_token),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Replaces the medical fields of `existing` with `profile`.
#[tracing::instrument(skip_all, fields(user_id = existing.id))]
pub async fn update_profile(
    db: &DatabaseConnection,
    existing: user::Model,
    profile: ValidProfile,
) -> Result<user::Model, DbErr> {
    let mut model: user::ActiveModel = existing.into();
    model.name = Set(profile.name);
    model.blood_type = Set(Some(profile.blood_type));
    model.allergies = Set(serde_json::json!(profile.allergies));
    model.conditions = Set(serde_json::json!(profile.conditions));
    model.medications = Set(serde_json::json!(profile.medications));
    model.emergency_contacts = Set(serde_json::json!(profile.emergency_contacts));
    model.updated_at = Set(OffsetDateTime::now_utc());
    model.update(db).await
}
