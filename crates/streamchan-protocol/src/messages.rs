use serde::{Deserialize, Serialize};

/// Boolean acknowledgement sent in reply to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub ok: bool,
}

impl ResponseMessage {
    pub const ACCEPTED: Self = Self { ok: true };
    pub const REJECTED: Self = Self { ok: false };

    pub fn new(ok: bool) -> Self {
        Self { ok }
    }
}

/// Announcement that a peer is about to transfer content.
///
/// The fields are carried, never interpreted: `leaf` is whatever the content
/// model encodes, `public_key` and `signature` come from the signing
/// subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMessage {
    /// Content root identifier.
    pub root: String,
    /// Number of leaves that will follow.
    pub count: u64,
    /// Encoded leaf.
    pub leaf: Vec<u8>,
    /// Parent identifier, when the content hangs off an existing root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Submitter's public key.
    pub public_key: String,
    /// Signature over `root`.
    pub signature: String,
}

impl UploadMessage {
    pub fn new(
        root: impl Into<String>,
        count: u64,
        public_key: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            count,
            leaf: Vec::new(),
            parent: None,
            public_key: public_key.into(),
            signature: signature.into(),
        }
    }

    pub fn with_leaf(mut self, leaf: impl Into<Vec<u8>>) -> Self {
        self.leaf = leaf.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_json_shape() {
        let json = serde_json::to_string(&ResponseMessage::ACCEPTED).unwrap();
        assert_eq!(json, r#"{"ok":true}"#);
        let back: ResponseMessage = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert_eq!(back, ResponseMessage::REJECTED);
    }

    #[test]
    fn upload_builder_sets_optional_fields() {
        let msg = UploadMessage::new("bafyroot", 3, "pk", "sig")
            .with_leaf(vec![1, 2, 3])
            .with_parent("bafyparent");

        assert_eq!(msg.leaf, vec![1, 2, 3]);
        assert_eq!(msg.parent.as_deref(), Some("bafyparent"));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["root"], "bafyroot");
        assert_eq!(json["count"], 3);
        assert_eq!(json["public_key"], "pk");
    }

    #[test]
    fn absent_parent_is_omitted() {
        let msg = UploadMessage::new("bafyroot", 1, "pk", "sig");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("parent").is_none());

        let back: UploadMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
