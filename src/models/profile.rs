//! Profile model, 1:1 with an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display profile owned by an identity's lifetime.
///
/// Created lazily: on first registration with a display name, or on
/// first federated login, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub identity_id: u64,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    pub phone: Option<String>,
    pub headline: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(identity_id: u64) -> Self {
        let now = Utc::now();
        Self {
            identity_id,
            display_name: None,
            picture_url: None,
            phone: None,
            headline: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fill display name and picture only where they are currently
    /// absent. Returns true if anything changed.
    pub fn backfill(&mut self, display_name: Option<&str>, picture_url: Option<&str>) -> bool {
        let mut changed = false;
        if self.display_name.is_none() {
            if let Some(name) = display_name {
                self.display_name = Some(name.to_string());
                changed = true;
            }
        }
        if self.picture_url.is_none() {
            if let Some(url) = picture_url {
                self.picture_url = Some(url.to_string());
                changed = true;
            }
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_never_overwrites_existing_fields() {
        let mut profile = Profile::new(1);
        profile.display_name = Some("Alice".to_string());

        let changed = profile.backfill(Some("Other"), Some("https://p.example/1.png"));

        assert!(changed);
        assert_eq!(profile.display_name.as_deref(), Some("Alice"));
        assert_eq!(
            profile.picture_url.as_deref(),
            Some("https://p.example/1.png")
        );

        assert!(!profile.backfill(Some("Other"), Some("https://p.example/2.png")));
    }
}
