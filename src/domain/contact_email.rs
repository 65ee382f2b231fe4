use validator::validate_email;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContactEmail(String);

impl ContactEmail {
    pub fn parse(email: String) -> Result<ContactEmail, String> {
        let email = email.trim().to_string();

        if !validate_email(&email) {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email))
    }

    /// Mailchimp addresses list members by the MD5 hex digest of the lower-cased email.
    pub fn subscriber_hash(&self) -> String {
        format!("{:x}", md5::compute(self.0.to_lowercase().as_bytes()))
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
