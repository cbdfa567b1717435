// src/models/user.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use super::not_blank;

/// Profile document in the `users` collection, keyed by the user id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,

    /// Shown on the leaderboard.
    pub name: String,
    pub email: String,
    pub phone_number: String,

    /// Formatted as `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub address: HashMap<String, String>,
    pub interests: Vec<String>,
    pub profile_picture_url: String,
    pub registered_user: bool,
}

/// DTO for updating the caller's profile. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100), custom(function = not_blank))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<HashMap<String, String>>,
    #[validate(length(max = 20))]
    pub interests: Option<Vec<String>>,
    #[validate(length(max = 500))]
    pub profile_picture_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Format checks the derive cannot express. Returns the offending field name.
    pub fn check_formats(&self) -> Result<(), &'static str> {
        if let Some(dob) = &self.date_of_birth {
            if chrono::NaiveDate::parse_from_str(dob, "%Y-%m-%d").is_err() {
                return Err("dateOfBirth");
            }
        }

        if let Some(picture) = &self.profile_picture_url {
            let valid = Url::parse(picture)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                return Err("profilePictureUrl");
            }
        }

        Ok(())
    }

    /// Applies the present fields onto an existing profile.
    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(name) = self.name {
            profile.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            profile.email = email;
        }
        if let Some(phone_number) = self.phone_number {
            profile.phone_number = phone_number;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            profile.date_of_birth = date_of_birth;
        }
        if let Some(address) = self.address {
            profile.address = address;
        }
        if let Some(interests) = self.interests {
            profile.interests = interests;
        }
        if let Some(profile_picture_url) = self.profile_picture_url {
            profile.profile_picture_url = profile_picture_url;
        }
    }
}
