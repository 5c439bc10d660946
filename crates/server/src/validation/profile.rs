use super::{BLOOD_TYPES, FieldErrors, Validate, clean_contact_phone, is_valid_contact_phone};
use crate::alerts::EmergencyContact;
use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_ALLERGIES: usize = 20;
pub const MAX_CONDITIONS: usize = 20;
pub const MAX_MEDICATIONS: usize = 30;
pub const MAX_CONTACTS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

/// Body of `PUT /api/profile`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub name: String,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub emergency_contacts: Vec<ContactInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub blood_type: String,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    /// Phones are stored without separators.
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl Validate for ProfileUpdate {
    type Output = ValidProfile;

    fn validate(self) -> Result<ValidProfile, Vec<FieldError>> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim().to_string();
        errors.check_len(
            "name",
            &name,
            (1, "Name is required"),
            (100, "Name cannot exceed 100 characters"),
        );

        let blood_type = self.blood_type.unwrap_or_default();
        if !BLOOD_TYPES.contains(&blood_type.as_str()) {
            errors.push("bloodType", "Please select a valid blood type");
        }

        let allergies = clean_list(&mut errors, "allergies", self.allergies, MAX_ALLERGIES);
        let conditions = clean_list(&mut errors, "conditions", self.conditions, MAX_CONDITIONS);
        let medications =
            clean_list(&mut errors, "medications", self.medications, MAX_MEDICATIONS);

        if self.emergency_contacts.is_empty() {
            errors.push(
                "emergencyContacts",
                "At least one emergency contact is required",
            );
        } else if self.emergency_contacts.len() > MAX_CONTACTS {
            errors.push(
                "emergencyContacts",
                "Cannot have more than 10 emergency contacts",
            );
        }
        let emergency_contacts = self
            .emergency_contacts
            .into_iter()
            .enumerate()
            .map(|(i, contact)| clean_contact(&mut errors, i, contact))
            .collect();

        errors.finish(ValidProfile {
            name,
            blood_type,
            allergies,
            conditions,
            medications,
            emergency_contacts,
        })
    }
}

/// Trims entries and drops blanks. The size limit applies to the list as sent.
fn clean_list(errors: &mut FieldErrors, field: &str, items: Vec<String>, max: usize) -> Vec<String> {
    if items.len() > max {
        errors.push(field, format!("Cannot have more than {max} {field}"));
    }
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn clean_contact(errors: &mut FieldErrors, index: usize, contact: ContactInput) -> EmergencyContact {
    let path = |field: &str| format!("emergencyContacts.{index}.{field}");

    let name = contact.name.trim().to_string();
    errors.check_len(
        &path("name"),
        &name,
        (1, "Contact name is required"),
        (100, "Contact name cannot exceed 100 characters"),
    );

    let phone = clean_contact_phone(&contact.phone);
    if !is_valid_contact_phone(&phone) {
        errors.push(path("phone"), "Please enter a valid phone number");
    }

    let relationship = contact.relationship.trim().to_string();
    errors.check_len(
        &path("relationship"),
        &relationship,
        (1, "Relationship is required"),
        (50, "Relationship cannot exceed 50 characters"),
    );

    EmergencyContact {
        name,
        phone,
        relationship,
    }
}
