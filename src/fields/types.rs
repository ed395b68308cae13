use serde::{Deserialize, Serialize};

/// A template entry: what the extraction step should look for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hint: String,
}

/// A template field together with its accumulated value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub current_value: String,
}

impl Field {
    /// A field with no value yet
    pub fn empty(descriptor: &FieldDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            hint: descriptor.hint.clone(),
            current_value: String::new(),
        }
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            hint: self.hint.clone(),
        }
    }
}

/// Mirror of the client-visible document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub user_notes: String,
}
