use crate::model::{generate_id, next_update_time, now, Id, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub address: String,
    pub image: String, // URI
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn new(new_user: NewUser) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            name: new_user.name,
            email: new_user.email,
            address: new_user.address,
            image: new_user.image,
            created_at,
            updated_at: created_at,
        }
    }

    /// Advance `updated_at` ahead of a save.
    pub fn touch(&mut self) {
        self.updated_at = next_update_time(self.updated_at);
    }
}

/// Validated input for creating a user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub address: String,
    pub image: String,
}

/// Validated sparse update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub image: Option<String>,
}

impl UserChanges {
    /// Overwrite every present field on `user`. Identity and timestamps are
    /// not part of a change set.
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
        if let Some(image) = self.image {
            user.image = image;
        }
    }
}

/// Equality filters for listing users; all present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.name.as_ref().map_or(true, |name| &user.name == name)
            && self.email.as_ref().map_or(true, |email| &user.email == email)
            && self.address.as_ref().map_or(true, |address| &user.address == address)
    }
}
