use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGHT: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContactName(String);

impl ContactName {
    pub fn parse(name: String) -> Result<ContactName, String> {
        let is_empty_or_whitespace = name.trim().is_empty();
        let is_too_long = name.graphemes(true).count() > MAX_CHAR_LENGHT;
        let contains_forbidden_chars = name.chars().any(|char| FORBIDDEN_CHARS.contains(&char));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_chars {
            return Err(format!("{} is not a valid contact name", name));
        }

        Ok(Self(name.trim().to_string()))
    }

    /// The first word, stored by Mailchimp as FNAME.
    pub fn first_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or_default()
    }

    /// Every word after the first one, stored by Mailchimp as LNAME.
    pub fn last_name(&self) -> String {
        self.0.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
    }
}

impl AsRef<str> for ContactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
