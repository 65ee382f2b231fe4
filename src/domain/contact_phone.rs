use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGHT: usize = 32;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContactPhone(String);

impl ContactPhone {
    pub fn parse(phone: String) -> Result<ContactPhone, String> {
        let phone = phone.trim();

        if phone.is_empty() || phone.graphemes(true).count() > MAX_CHAR_LENGHT {
            return Err(format!("{} is not a valid phone number", phone));
        }

        Ok(Self(phone.to_string()))
    }
}

impl AsRef<str> for ContactPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
