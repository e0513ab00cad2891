//! Social links attached to an event.
//!
//! Links are cached with their event's reads but do not opt in to write
//! invalidation: adding a link never touches cached event payloads.

use evently_cache::CacheModel;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "social_net", rename_all = "lowercase")]
pub enum SocialNet {
    Instagram,
    Linkedin,
}

impl SocialNet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Link {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: SocialNet,
    pub link: String,
    pub event_id: Uuid,
}

impl CacheModel for Link {
    const MODEL_NAME: &'static str = "link";

    fn cache_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLinkDto {
    #[serde(rename = "type")]
    pub kind: SocialNet,
    #[validate(url, length(max = 200))]
    pub link: String,
}
