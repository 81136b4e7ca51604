use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Directly-set display name; derived from first + last when absent.
    pub name: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    pub pronouns: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub medical_history: Vec<String>,
    pub active: bool,
    pub provider: String,
}

impl Patient {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Partial patient for shallow-merge updates: only provided fields
/// overwrite, and a provided list replaces the old list wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl PatientUpdate {
    pub fn apply(self, patient: &mut Patient) {
        if let Some(v) = self.first_name {
            patient.first_name = v;
        }
        if let Some(v) = self.last_name {
            patient.last_name = v;
        }
        if let Some(v) = self.name {
            patient.name = Some(v);
        }
        if let Some(v) = self.date_of_birth {
            patient.date_of_birth = v;
        }
        if let Some(v) = self.gender {
            patient.gender = v;
        }
        if let Some(v) = self.pronouns {
            patient.pronouns = Some(v);
        }
        if let Some(v) = self.email {
            patient.email = v;
        }
        if let Some(v) = self.phone {
            patient.phone = v;
        }
        if let Some(v) = self.address {
            patient.address = v;
        }
        if let Some(v) = self.medical_history {
            patient.medical_history = v;
        }
        if let Some(v) = self.active {
            patient.active = v;
        }
        if let Some(v) = self.provider {
            patient.provider = v;
        }
    }
}
