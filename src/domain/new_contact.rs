use serde::Deserialize;

use crate::domain::contact_email::ContactEmail;
use crate::domain::contact_name::ContactName;
use crate::domain::contact_phone::ContactPhone;
use crate::domain::interest::Interest;
use crate::domain::lead_source::LeadSource;

pub const FORM_SUBMISSION_TAG: &str = "form_submission";

pub struct NewContact {
    pub email: ContactEmail,
    pub name: ContactName,
    pub phone: ContactPhone,
    pub age: Option<String>,
    pub interest: Interest,
    pub source: LeadSource,
    pub utm: UtmParameters,
}

#[derive(Debug, Default, Clone)]
pub struct UtmParameters {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
}

/// Form payload as sent by the landing pages. Every field is optional here so a missing field is
/// reported with our own error envelope instead of a deserialization failure.
#[derive(Deserialize, Debug, Default)]
pub struct NewContactBody {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<String>,
    pub interests: Option<String>,
    pub source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    // Sent by the ad links but not stored in Mailchimp
    pub utm_id: Option<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NewContactError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    InvalidField(String),
}

impl NewContact {
    /// Tags attached to a member on every submission.
    pub fn tags(&self) -> Vec<String> {
        vec![
            String::from(FORM_SUBMISSION_TAG),
            self.interest.tag_name(),
            self.source.tag_name(),
        ]
    }

    /// Tags sent inline with the creation request.
    pub fn creation_tags(&self) -> Vec<String> {
        vec![String::from(FORM_SUBMISSION_TAG), self.interest.tag_name()]
    }
}

impl NewContactBody {
    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("email", &self.email),
            ("name", &self.name),
            ("phone", &self.phone),
            ("interests", &self.interests),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(field, _)| field)
        .collect()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |value| value.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TryFrom<NewContactBody> for NewContact {
    type Error = NewContactError;

    fn try_from(body: NewContactBody) -> Result<Self, Self::Error> {
        let missing_fields = body.missing_fields();

        if !missing_fields.is_empty() {
            return Err(NewContactError::MissingFields(missing_fields));
        }

        let email = ContactEmail::parse(body.email.unwrap_or_default())
            .map_err(NewContactError::InvalidField)?;
        let name = ContactName::parse(body.name.unwrap_or_default())
            .map_err(NewContactError::InvalidField)?;
        let phone = ContactPhone::parse(body.phone.unwrap_or_default())
            .map_err(NewContactError::InvalidField)?;
        let interest = Interest::parse(body.interests.unwrap_or_default())
            .map_err(NewContactError::InvalidField)?;
        let source = LeadSource::for_submission(body.source.as_deref());

        Ok(NewContact {
            email,
            name,
            phone,
            age: non_blank(body.age),
            interest,
            source,
            utm: UtmParameters {
                source: non_blank(body.utm_source),
                medium: non_blank(body.utm_medium),
                campaign: non_blank(body.utm_campaign),
            },
        })
    }
}
