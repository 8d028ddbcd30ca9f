use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use itembox_core::UserId;

/// Claim set signed into an API token.
///
/// Wire shape is `{"user_id": <int>}`. `user_id` is optional on decode so a
/// validly signed token without an identity is representable (and rejected
/// by the identity resolver). `exp` is never issued by this service but is
/// honoured when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Expiration as a unix timestamp (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl ClaimSet {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            exp: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.exp = Some(expires_at.timestamp());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_user_id_only() {
        let json = serde_json::to_value(ClaimSet::for_user(UserId::new(5))).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": 5 }));
    }

    #[test]
    fn missing_user_id_decodes_as_none() {
        let claims: ClaimSet = serde_json::from_str(r#"{"sub":"x"}"#).unwrap();
        assert_eq!(claims.user_id, None);
        assert_eq!(claims.exp, None);
    }
}
