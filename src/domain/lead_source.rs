/// Acquisition channel stored in the SOURCE merge field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadSource {
    Organic,
    EmailCampaign,
    Other(String),
}

impl LeadSource {
    /// Submissions that do not say where they come from are attributed to the email campaign.
    pub fn for_submission(source: Option<&str>) -> LeadSource {
        match source.map(str::trim) {
            None | Some("") => LeadSource::EmailCampaign,
            Some(source) => LeadSource::parse(source),
        }
    }

    /// Members that were imported or signed up without a SOURCE are organic.
    pub fn for_member(source: Option<&str>) -> LeadSource {
        match source.map(str::trim) {
            None | Some("") => LeadSource::Organic,
            Some(source) => LeadSource::parse(source),
        }
    }

    pub fn parse(source: &str) -> LeadSource {
        match source {
            "organic" => LeadSource::Organic,
            "email_campaign" => LeadSource::EmailCampaign,
            other => LeadSource::Other(other.to_string()),
        }
    }

    pub fn is_organic(&self) -> bool {
        matches!(self, LeadSource::Organic)
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, LeadSource::EmailCampaign)
    }

    pub fn tag_name(&self) -> String {
        format!("source_{}", self.as_ref())
    }
}

impl AsRef<str> for LeadSource {
    fn as_ref(&self) -> &str {
        match self {
            LeadSource::Organic => "organic",
            LeadSource::EmailCampaign => "email_campaign",
            LeadSource::Other(source) => source.as_str(),
        }
    }
}
