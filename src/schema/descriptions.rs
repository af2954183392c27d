use std::collections::BTreeMap;
use std::path::Path;

use super::ReportError;

/// Rendered for any field without a known description
pub const CUSTOM_FIELD: &str = "Custom field";

const BUILTIN: &[(&str, &[(&str, &str)])] = &[
    (
        "users",
        &[
            ("uid", "Unique user identifier"),
            ("email", "User email address"),
            ("displayName", "Display name"),
            ("photoURL", "Profile picture URL"),
            ("createdAt", "Account creation date"),
            ("updatedAt", "Last update date"),
            ("role", "Role of the user in the application"),
            ("firstName", "First name"),
            ("lastName", "Last name"),
            ("birthDate", "Date of birth"),
            ("phone", "Phone number"),
            ("professionId", "Profession of the user"),
            ("specialityIds", "Specialties of the user"),
            ("isProfileComplete", "Whether onboarding is finished"),
            ("onboardingStep", "Current onboarding step"),
        ],
    ),
    (
        "establishments",
        &[
            ("name", "Establishment name"),
            ("address", "Postal address"),
            ("phone", "Phone number"),
            ("email", "Contact email address"),
            ("type", "Kind of establishment"),
            ("specialties", "Specialties available on site"),
            ("createdAt", "Creation date"),
            ("updatedAt", "Last update date"),
            ("location", "Geographic coordinates"),
            ("description", "Description of the establishment"),
            ("website", "Website"),
        ],
    ),
    (
        "replacements",
        &[
            ("startDate", "Start of the replacement"),
            ("endDate", "End of the replacement"),
            ("status", "Replacement status (pending, accepted, completed, ...)"),
            ("description", "Detailed description"),
            ("requirements", "Specific requirements"),
            ("establishmentId", "Establishment offering the replacement"),
            ("professionId", "Required profession"),
            ("specialtyId", "Required specialty"),
            ("createdBy", "User who posted the replacement"),
            ("acceptedBy", "User who accepted the replacement"),
            ("payment", "Compensation details"),
            ("location", "Place of the replacement"),
            ("createdAt", "Creation date"),
            ("updatedAt", "Last update date"),
        ],
    ),
    (
        "conversations",
        &[
            ("participants", "Users taking part in the conversation"),
            ("lastMessage", "Summary of the newest message"),
            ("lastActivity", "Date of the newest message"),
            ("createdAt", "Conversation creation date"),
            ("type", "Conversation kind (private, group)"),
            ("title", "Conversation title (groups only)"),
            ("unreadCount", "Number of unread messages"),
        ],
    ),
    (
        "messages",
        &[
            ("senderId", "Author of the message"),
            ("conversationId", "Conversation the message belongs to"),
            ("type", "Message kind (user, establishment, mission, notification)"),
            ("content", "Message text"),
            ("readBy", "Users who have read the message"),
            ("createdAt", "Sending date"),
            ("attachments", "Attached files"),
        ],
    ),
    (
        "professions",
        &[
            ("title", "Profession title"),
            ("description", "Detailed description"),
            ("category", "Profession category"),
            ("requirements", "Legal requirements and qualifications"),
            ("specialties", "Possible specialties"),
            ("createdAt", "Creation date"),
            ("updatedAt", "Last update date"),
        ],
    ),
    (
        "specialties",
        &[
            ("name", "Specialty name"),
            ("description", "Detailed description"),
            ("category", "Specialty category"),
            ("professionId", "Associated profession"),
            ("requirements", "Specific requirements"),
            ("createdAt", "Creation date"),
            ("updatedAt", "Last update date"),
        ],
    ),
];

/// Field descriptions keyed by collection name, then field name.
///
/// Lookups never fall back to another collection's entry for the same field name.
#[derive(Debug, Clone, Default)]
pub struct FieldDescriptions {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl FieldDescriptions {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(collection, fields)| {
                let fields = fields
                    .iter()
                    .map(|(field, text)| (field.to_string(), text.to_string()))
                    .collect();
                (collection.to_string(), fields)
            })
            .collect();
        Self { entries }
    }

    /// Built-in descriptions extended with the YAML file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ReportError::DescriptionsIo {
            path: path.display().to_string(),
            source,
        })?;
        let mut descriptions = Self::builtin();
        descriptions
            .extend_from_yaml(&raw)
            .map_err(|source| ReportError::DescriptionsFormat {
                path: path.display().to_string(),
                source,
            })?;
        Ok(descriptions)
    }

    /// Merges a `collection: { field: description }` YAML mapping; later entries win
    pub fn extend_from_yaml(&mut self, yaml: &str) -> Result<(), serde_yaml::Error> {
        let extra: BTreeMap<String, BTreeMap<String, String>> = serde_yaml::from_str(yaml)?;
        for (collection, fields) in extra {
            self.entries.entry(collection).or_default().extend(fields);
        }
        Ok(())
    }

    pub fn describe(&self, collection: &str, field: &str) -> &str {
        self.entries
            .get(collection)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
            .unwrap_or(CUSTOM_FIELD)
    }
}
