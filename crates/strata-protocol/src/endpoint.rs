//! HTTP endpoint paths and their query parameters.
//!
//! Parameter names are part of the wire contract and keep their camel-case
//! spelling on the wire.

use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

pub mod endpoints {
    pub const MANIFEST: &str = "/repo/manifest";
    pub const EXISTS: &str = "/repo/exists";
    /// Followed by `/<hex id>`.
    pub const OBJECTS: &str = "/repo/objects";
    pub const SEND_OBJECT: &str = "/repo/sendobject";
    pub const BEGIN_PUSH: &str = "/repo/beginpush";
    pub const END_PUSH: &str = "/repo/endpush";
    pub const REF_PARSE: &str = "/refparse";
    pub const UPDATE_REF: &str = "/updateref";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsQuery {
    pub oid: ObjectId,
    #[serde(rename = "internalIp")]
    pub internal_ip: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendObjectQuery {
    #[serde(rename = "internalIp")]
    pub internal_ip: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginPushQuery {
    #[serde(rename = "internalIp")]
    pub internal_ip: String,
}

/// Closes a push session. `originalRefValue` is the null id when the ref
/// did not exist on the remote before the push.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPushQuery {
    pub refspec: String,
    #[serde(rename = "objectId")]
    pub object_id: ObjectId,
    #[serde(rename = "internalIp")]
    pub internal_ip: String,
    #[serde(rename = "originalRefValue")]
    pub original_ref_value: ObjectId,
}

impl EndPushQuery {
    pub fn original(&self) -> Option<ObjectId> {
        (!self.original_ref_value.is_null()).then_some(self.original_ref_value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefParseQuery {
    pub name: String,
}

/// Either `newValue` or `delete=true` is expected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRefQuery {
    pub name: String,
    #[serde(rename = "newValue", default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl UpdateRefQuery {
    pub fn set(name: impl Into<String>, value: ObjectId) -> Self {
        Self {
            name: name.into(),
            new_value: Some(value),
            delete: None,
        }
    }

    pub fn delete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            new_value: None,
            delete: Some(true),
        }
    }

    pub fn is_delete(&self) -> bool {
        self.delete.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_push_original_null_means_absent() {
        let mut q = EndPushQuery {
            refspec: "refs/heads/main".into(),
            object_id: ObjectId::from_hash([1; 32]),
            internal_ip: "10.0.0.1".into(),
            original_ref_value: ObjectId::NULL,
        };
        assert_eq!(q.original(), None);
        q.original_ref_value = ObjectId::from_hash([2; 32]);
        assert_eq!(q.original(), Some(ObjectId::from_hash([2; 32])));
    }

    #[test]
    fn wire_parameter_names() {
        let q = ExistsQuery {
            oid: ObjectId::from_hash([3; 32]),
            internal_ip: "host".into(),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("internalIp").is_some());

        let del = serde_json::to_value(UpdateRefQuery::delete("refs/heads/x")).unwrap();
        assert_eq!(del["delete"], true);
        assert!(del.get("newValue").is_none());
    }

    #[test]
    fn update_ref_constructors() {
        assert!(UpdateRefQuery::delete("refs/heads/x").is_delete());
        assert!(!UpdateRefQuery::set("refs/heads/x", ObjectId::from_hash([1; 32])).is_delete());
    }
}
