use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time;

use crate::domain::new_contact::NewContact;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);
// Mailchimp ignores the user name of the basic auth pair, only the api key matters
const BASIC_AUTH_USER: &str = "anystring";
const MEMBER_EXISTS_TITLE: &str = "Member Exists";

pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
    list_id: Option<String>,
    api_key: Option<Secret<String>>,
}

#[derive(Serialize)]
struct AddMemberBody<'a> {
    email_address: &'a str,
    status: &'a str,
    merge_fields: MergeFieldsBody<'a>,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct UpdateMemberBody<'a> {
    merge_fields: MergeFieldsBody<'a>,
}

#[derive(Serialize)]
struct MergeFieldsBody<'a> {
    #[serde(rename = "FNAME")]
    first_name: &'a str,
    #[serde(rename = "LNAME")]
    last_name: String,
    #[serde(rename = "PHONE")]
    phone: &'a str,
    #[serde(rename = "AGE", skip_serializing_if = "Option::is_none")]
    age: Option<&'a str>,
    #[serde(rename = "SOURCE")]
    source: &'a str,
    #[serde(rename = "MMERGE5")]
    interests: &'a str,
    #[serde(rename = "MMERGE11", skip_serializing_if = "Option::is_none")]
    utm_source: Option<&'a str>,
    #[serde(rename = "MMERGE12", skip_serializing_if = "Option::is_none")]
    utm_medium: Option<&'a str>,
    #[serde(rename = "MMERGE13", skip_serializing_if = "Option::is_none")]
    utm_campaign: Option<&'a str>,
}

#[derive(Serialize)]
struct MemberTagsBody<'a> {
    tags: Vec<MemberTagStatus<'a>>,
}

#[derive(Serialize)]
struct MemberTagStatus<'a> {
    name: &'a str,
    status: &'a str,
}

#[derive(Deserialize)]
struct AddMemberResponse {
    id: String,
}

/// Query of the list members endpoint. Values are forwarded untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMembersQuery {
    pub count: u32,
    pub offset: u32,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub members: Vec<ListMember>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListMember {
    pub id: String,
    pub email_address: String,
    pub unique_email_id: Option<String>,
    pub list_id: Option<String>,
    pub status: Option<String>,
    pub member_rating: Option<u8>,
    pub ip_signup: Option<String>,
    pub timestamp_signup: Option<String>,
    pub ip_opt: Option<String>,
    pub timestamp_opt: Option<String>,
    pub last_changed: Option<String>,
    pub merge_fields: MergeFields,
    pub tags: Vec<MemberTag>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberTag {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
}

/// Merge fields are typed per audience, so a field like AGE may arrive as a number or a string.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct MergeFields(serde_json::Map<String, Value>);

impl MergeFields {
    /// Text value of a merge field, empty when missing or null.
    pub fn text(&self, name: &str) -> String {
        match self.0.get(name) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Null) | None => String::new(),
            Some(value) => value.to_string(),
        }
    }
}

#[derive(thiserror::Error)]
pub enum MailchimpError {
    #[error("Mailchimp configuration not found")]
    MissingConfiguration,
    #[error("Mailchimp rejected the request with status {status}")]
    Api { status: StatusCode, body: Value },
    #[error("Failed to reach Mailchimp")]
    Transport(#[from] reqwest::Error),
}

impl std::fmt::Debug for MailchimpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailchimpError::Api { body, .. } => write!(f, "{}\nCaused by:\n\t{}", self, body),
            MailchimpError::Transport(err) => write!(f, "{}\nCaused by:\n\t{}", self, err),
            MailchimpError::MissingConfiguration => write!(f, "{}", self),
        }
    }
}

impl MailchimpError {
    /// Mailchimp refuses to create a member whose email is already on the list with a 400 whose
    /// problem title is "Member Exists".
    pub fn is_member_exists(&self) -> bool {
        match self {
            MailchimpError::Api { status, body } => {
                *status == StatusCode::BAD_REQUEST
                    && body.get("title").and_then(Value::as_str) == Some(MEMBER_EXISTS_TITLE)
            }
            _ => false,
        }
    }

    /// Human readable explanation given by Mailchimp, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            MailchimpError::Api { body, .. } => body
                .get("detail")
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        }
    }

    /// Payload echoed back to our own callers.
    pub fn payload(&self) -> Value {
        match self {
            MailchimpError::Api { body, .. } => body.clone(),
            MailchimpError::Transport(err) => Value::String(err.to_string()),
            MailchimpError::MissingConfiguration => {
                Value::String(String::from("Missing MAILCHIMP_API_KEY or MAILCHIMP_LIST_ID"))
            }
        }
    }
}

impl MailchimpClient {
    pub fn new(
        base_url: String,
        list_id: Option<String>,
        api_key: Option<Secret<String>>,
        timeout: Option<time::Duration>,
    ) -> Result<MailchimpClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(MailchimpClient {
            http_client,
            base_url,
            list_id: list_id.filter(|list_id| !list_id.trim().is_empty()),
            api_key: api_key.filter(|api_key| !api_key.expose_secret().trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.list_id.is_some() && self.api_key.is_some()
    }

    fn members_url(&self) -> Result<String, MailchimpError> {
        let list_id = self
            .list_id
            .as_deref()
            .ok_or(MailchimpError::MissingConfiguration)?;

        Ok(format!("{}/lists/{}/members", self.base_url, list_id))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, MailchimpError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(MailchimpError::MissingConfiguration)?;

        let response = request
            .basic_auth(BASIC_AUTH_USER, Some(api_key.expose_secret()))
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            Err(_) => Value::String(text),
        };

        Err(MailchimpError::Api { status, body })
    }

    /// Creates a subscribed member and returns its Mailchimp id.
    #[tracing::instrument(
        name = "Adding a member to the Mailchimp list",
        skip(self, contact),
        fields(contact_email = %contact.email.as_ref())
    )]
    pub async fn add_member(&self, contact: &NewContact) -> Result<String, MailchimpError> {
        let url = self.members_url()?;
        let body = AddMemberBody {
            email_address: contact.email.as_ref(),
            status: "subscribed",
            merge_fields: MergeFieldsBody::from(contact),
            tags: contact.creation_tags(),
        };

        let member: AddMemberResponse = self
            .execute(self.http_client.post(&url).json(&body))
            .await?
            .json()
            .await?;

        Ok(member.id)
    }

    /// Patches the merge fields of an existing member and returns its subscriber hash.
    #[tracing::instrument(
        name = "Updating a Mailchimp list member",
        skip(self, contact),
        fields(contact_email = %contact.email.as_ref())
    )]
    pub async fn update_member(&self, contact: &NewContact) -> Result<String, MailchimpError> {
        let subscriber_hash = contact.email.subscriber_hash();
        let url = format!("{}/{}", self.members_url()?, subscriber_hash);
        let body = UpdateMemberBody {
            merge_fields: MergeFieldsBody::from(contact),
        };

        self.execute(self.http_client.patch(&url).json(&body))
            .await?;

        Ok(subscriber_hash)
    }

    /// Marks the given tags as active on a member, leaving its other tags untouched.
    #[tracing::instrument(name = "Tagging a Mailchimp list member", skip(self))]
    pub async fn apply_tags(&self, member_id: &str, tags: &[String]) -> Result<(), MailchimpError> {
        let url = format!("{}/{}/tags", self.members_url()?, member_id);
        let body = MemberTagsBody {
            tags: tags
                .iter()
                .map(|name| MemberTagStatus {
                    name,
                    status: "active",
                })
                .collect(),
        };

        self.execute(self.http_client.post(&url).json(&body))
            .await?;

        Ok(())
    }

    #[tracing::instrument(name = "Listing Mailchimp list members", skip(self))]
    pub async fn list_members(
        &self,
        query: &ListMembersQuery,
    ) -> Result<MembersPage, MailchimpError> {
        let url = self.members_url()?;
        let request = self.http_client.get(&url).query(&[
            ("count", query.count.to_string()),
            ("offset", query.offset.to_string()),
            ("status", query.status.clone()),
        ]);

        let page = self.execute(request).await?.json().await?;

        Ok(page)
    }
}

impl<'a> From<&'a NewContact> for MergeFieldsBody<'a> {
    fn from(contact: &'a NewContact) -> Self {
        MergeFieldsBody {
            first_name: contact.name.first_name(),
            last_name: contact.name.last_name(),
            phone: contact.phone.as_ref(),
            age: contact.age.as_deref(),
            source: contact.source.as_ref(),
            interests: contact.interest.as_ref(),
            utm_source: contact.utm.source.as_deref(),
            utm_medium: contact.utm.medium.as_deref(),
            utm_campaign: contact.utm.campaign.as_deref(),
        }
    }
}
