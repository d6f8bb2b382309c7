//! Employee record model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use keyroster_core::{EmployeeId, Entity};

/// A stored employee record.
///
/// Only `id` and `name` are known fields; everything else the caller sent is
/// kept verbatim in `attributes` and flattened back into the JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,

    /// Display name. Serialized as `null` when absent.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Request body for create/update.
///
/// Any `id` the caller supplies is dropped when the payload becomes an
/// [`Employee`]; the store owns id assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayload {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl EmployeePayload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: Map::new(),
        }
    }

    /// Bind this payload to `id`, discarding any caller-provided id.
    pub fn into_employee(mut self, id: EmployeeId) -> Employee {
        self.attributes.remove("id");
        Employee {
            id,
            name: self.name,
            attributes: self.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_id_is_ignored() {
        let payload: EmployeePayload =
            serde_json::from_value(json!({ "id": 99, "name": "Ana", "dept": "ops" })).unwrap();

        let employee = payload.into_employee(EmployeeId::new(1));

        assert_eq!(
            serde_json::to_value(&employee).unwrap(),
            json!({ "id": 1, "name": "Ana", "dept": "ops" })
        );
    }

    #[test]
    fn missing_name_serializes_as_null() {
        let payload: EmployeePayload = serde_json::from_value(json!({ "role": "dev" })).unwrap();
        assert_eq!(payload.name, None);

        let employee = payload.into_employee(EmployeeId::new(4));
        assert_eq!(
            serde_json::to_value(&employee).unwrap(),
            json!({ "id": 4, "name": null, "role": "dev" })
        );
    }

    #[test]
    fn nested_attributes_are_preserved() {
        let body = json!({
            "name": "Bo",
            "address": { "city": "Lisbon", "zip": "1000" },
            "skills": ["rust", "sql"]
        });
        let payload: EmployeePayload = serde_json::from_value(body).unwrap();
        let employee = payload.into_employee(EmployeeId::new(2));

        assert_eq!(employee.attributes["address"]["city"], "Lisbon");
        assert_eq!(employee.attributes["skills"][1], "sql");
    }
}
