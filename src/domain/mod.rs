pub mod contact_email;
pub mod contact_name;
pub mod contact_phone;
pub mod interest;
pub mod lead_record;
pub mod lead_source;
pub mod new_contact;
