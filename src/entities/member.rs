use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Directory entry for anyone who drives or rides.
#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[polar(attribute)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Profile fields a member may change, absent fields are kept.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
}

impl Member {
    pub fn new(spec: NewMember) -> Result<Self, Error> {
        let name = spec.name.trim();
        let email = spec.email.trim();

        if name.is_empty() {
            return Err(Error::invalid_input_error("name is required"));
        }

        if !is_email_like(email) {
            return Err(Error::invalid_input_error("invalid email address"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_lowercase(),
            phone: spec.phone.filter(|phone| !phone.trim().is_empty()),
            profile_image_url: spec.profile_image_url,
            push_token: None,
            created_at: Utc::now(),
        })
    }

    /// An empty `phone` clears the stored number.
    pub fn apply(&mut self, update: MemberUpdate) -> Result<(), Error> {
        if update.name.is_none() && update.phone.is_none() && update.profile_image_url.is_none() {
            return Err(Error::invalid_input_error("no fields to update"));
        }

        if let Some(name) = update.name {
            let name = name.trim();

            if name.is_empty() {
                return Err(Error::invalid_input_error("name is required"));
            }

            self.name = name.to_string();
        }

        if let Some(phone) = update.phone {
            let phone = phone.trim();
            self.phone = (!phone.is_empty()).then(|| phone.to_string());
        }

        if update.profile_image_url.is_some() {
            self.profile_image_url = update.profile_image_url;
        }

        Ok(())
    }
}

fn is_email_like(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, email: &str) -> NewMember {
        NewMember {
            name: name.into(),
            email: email.into(),
            phone: Some("".into()),
            profile_image_url: None,
        }
    }

    #[test]
    fn normalizes_fields() {
        let member = Member::new(spec(" Ayesha ", "Ayesha@Campus.edu ")).unwrap();

        assert_eq!(member.name, "Ayesha");
        assert_eq!(member.email, "ayesha@campus.edu");
        assert_eq!(member.phone, None);
        assert_eq!(member.push_token, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Member::new(spec("", "a@b.co")).unwrap_err().is_invalid_input_error());
        assert!(Member::new(spec("A", "not-an-email")).unwrap_err().is_invalid_input_error());
        assert!(Member::new(spec("A", "@b.co")).unwrap_err().is_invalid_input_error());
        assert!(Member::new(spec("A", "a@localhost")).unwrap_err().is_invalid_input_error());
    }

    #[test]
    fn apply_updates_profile_fields() {
        let mut member = Member::new(spec("Ayesha", "ayesha@campus.edu")).unwrap();

        member
            .apply(MemberUpdate {
                name: Some(" Ayesha K ".into()),
                phone: Some("0300 1234567".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(member.name, "Ayesha K");
        assert_eq!(member.phone.as_deref(), Some("0300 1234567"));

        member
            .apply(MemberUpdate {
                phone: Some(" ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(member.phone, None);
        assert_eq!(member.email, "ayesha@campus.edu");
    }

    #[test]
    fn apply_refuses_empty_or_blank_updates() {
        let mut member = Member::new(spec("Ayesha", "ayesha@campus.edu")).unwrap();

        assert!(member
            .apply(MemberUpdate::default())
            .unwrap_err()
            .is_invalid_input_error());
        assert!(member
            .apply(MemberUpdate {
                name: Some("  ".into()),
                ..Default::default()
            })
            .unwrap_err()
            .is_invalid_input_error());
        assert_eq!(member.name, "Ayesha");
    }
}
