use serde::Deserialize;

use itembox_core::{Item, User};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &Item) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.get(),
        "title": item.title,
        "description": item.description,
        "owner_id": item.owner_id.get(),
    })
}

pub fn user_to_json(user: &User, items: &[Item]) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.get(),
        "email": user.email,
        "is_active": user.is_active,
        "items": items.iter().map(item_to_json).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use itembox_core::{ItemId, UserId};

    #[test]
    fn user_json_embeds_items() {
        let user = User {
            id: UserId::new(1),
            email: "a@example.com".to_string(),
            is_active: true,
        };
        let item = Item {
            id: ItemId::new(10),
            title: "Item 1".to_string(),
            description: None,
            owner_id: user.id,
        };

        let json = user_to_json(&user, &[item]);
        assert_eq!(json["id"], 1);
        assert_eq!(json["is_active"], true);
        assert_eq!(json["items"][0]["owner_id"], 1);
        assert!(json["items"][0]["description"].is_null());
        assert!(json.get("hashed_password").is_none());
    }
}
