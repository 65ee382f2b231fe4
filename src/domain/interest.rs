const TAG_PREFIX: &str = "interest_";

/// Course a lead is interested in, e.g. `teatro` or `cine-tv`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Interest(String);

impl Interest {
    pub fn parse(interest: String) -> Result<Interest, String> {
        let interest = interest.trim();

        if interest.is_empty() {
            return Err(String::from("Interest can not be empty"));
        }

        Ok(Self(interest.to_string()))
    }

    /// Name of the Mailchimp tag that marks this interest. Tag names use underscores, so
    /// `cine-tv` becomes `interest_cine_tv`.
    pub fn tag_name(&self) -> String {
        format!("{}{}", TAG_PREFIX, self.0.replace('-', "_"))
    }

    /// Reverse of [`Interest::tag_name`]. Returns `None` for tags that do not mark an interest.
    pub fn from_tag_name(tag_name: &str) -> Option<String> {
        tag_name
            .strip_prefix(TAG_PREFIX)
            .filter(|interest| !interest.is_empty())
            .map(|interest| interest.replace('_', "-"))
    }
}

impl AsRef<str> for Interest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
