use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::interest::Interest;
use crate::domain::lead_source::LeadSource;
use crate::mailchimp_client::ListMember;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A list member flattened into the columns of Mailchimp's audience CSV export. The dashboard and
/// the spreadsheets the school already keeps both read this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(rename = "Email Address")]
    pub email_address: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    #[serde(rename = "Birthday")]
    pub birthday: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Interests")]
    pub interests: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "UTM Source")]
    pub utm_source: String,
    #[serde(rename = "UTM Medium")]
    pub utm_medium: String,
    #[serde(rename = "UTM Campaign")]
    pub utm_campaign: String,
    #[serde(rename = "MEMBER_RATING")]
    pub member_rating: u8,
    #[serde(rename = "OPTIN_TIME")]
    pub optin_time: String,
    #[serde(rename = "OPTIN_IP")]
    pub optin_ip: String,
    #[serde(rename = "CONFIRM_TIME")]
    pub confirm_time: String,
    #[serde(rename = "CONFIRM_IP")]
    pub confirm_ip: String,
    #[serde(rename = "GMTOFF")]
    pub gmtoff: String,
    #[serde(rename = "DSTOFF")]
    pub dstoff: String,
    #[serde(rename = "TIMEZONE")]
    pub timezone: String,
    #[serde(rename = "CC")]
    pub cc: String,
    #[serde(rename = "REGION")]
    pub region: String,
    #[serde(rename = "LAST_CHANGED")]
    pub last_changed: String,
    #[serde(rename = "LEID")]
    pub leid: String,
    #[serde(rename = "EUID")]
    pub euid: String,
    #[serde(rename = "NOTES")]
    pub notes: String,
    #[serde(rename = "TAGS")]
    pub tags: String,
}

impl LeadRecord {
    pub fn lead_source(&self) -> LeadSource {
        LeadSource::for_member(Some(self.source.as_str()))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Interests split on commas, trimmed, empties dropped.
    pub fn interest_list(&self) -> impl Iterator<Item = &str> {
        self.interests
            .split(',')
            .map(str::trim)
            .filter(|interest| !interest.is_empty())
    }

    pub fn opted_in_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.optin_time, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

fn format_timestamp(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|timestamp| DateTime::parse_from_rfc3339(timestamp).ok())
        .map(|timestamp| {
            timestamp
                .with_timezone(&Utc)
                .format(TIMESTAMP_FORMAT)
                .to_string()
        })
        .unwrap_or_default()
}

impl From<ListMember> for LeadRecord {
    fn from(member: ListMember) -> Self {
        let merge_fields = member.merge_fields;
        let interest_tags: Vec<String> = member
            .tags
            .iter()
            .filter_map(|tag| Interest::from_tag_name(&tag.name))
            .collect();
        // Tags win over MMERGE5 because a member keeps every interest it was ever tagged with
        let interests = if interest_tags.is_empty() {
            merge_fields.text("MMERGE5")
        } else {
            interest_tags.join(",")
        };
        let tags = member
            .tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let source = LeadSource::for_member(Some(merge_fields.text("SOURCE").as_str()));

        LeadRecord {
            email_address: member.email_address,
            first_name: merge_fields.text("FNAME"),
            last_name: merge_fields.text("LNAME"),
            phone_number: merge_fields.text("PHONE"),
            interests,
            age: merge_fields.text("AGE"),
            source: source.as_ref().to_string(),
            utm_source: merge_fields.text("MMERGE11"),
            utm_medium: merge_fields.text("MMERGE12"),
            utm_campaign: merge_fields.text("MMERGE13"),
            member_rating: member.member_rating.unwrap_or_default(),
            optin_time: format_timestamp(member.timestamp_opt.as_deref()),
            optin_ip: member.ip_opt.unwrap_or_default(),
            confirm_time: format_timestamp(member.timestamp_signup.as_deref()),
            confirm_ip: member.ip_signup.unwrap_or_default(),
            last_changed: format_timestamp(member.last_changed.as_deref()),
            leid: member.list_id.unwrap_or_default(),
            euid: member.unique_email_id.unwrap_or_default(),
            tags,
            ..Default::default()
        }
    }
}
