use actix_web::{web, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    domain::lead_record::LeadRecord,
    mailchimp_client::{ListMembersQuery, MailchimpClient, MailchimpError},
    routes::mailchimp_error_envelope,
};

const DEFAULT_COUNT: u32 = 1000;
const DEFAULT_OFFSET: u32 = 0;
const DEFAULT_STATUS: &str = "subscribed";

#[derive(Deserialize, Debug)]
pub struct GetMembersParameters {
    pub count: Option<u32>,
    pub offset: Option<u32>,
    pub status: Option<String>,
}

impl From<GetMembersParameters> for ListMembersQuery {
    fn from(parameters: GetMembersParameters) -> Self {
        ListMembersQuery {
            count: parameters.count.unwrap_or(DEFAULT_COUNT),
            offset: parameters.offset.unwrap_or(DEFAULT_OFFSET),
            status: parameters
                .status
                .filter(|status| !status.trim().is_empty())
                .unwrap_or_else(|| String::from(DEFAULT_STATUS)),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct GetMembersResponse {
    pub success: bool,
    pub total_items: u64,
    pub members: Vec<LeadRecord>,
}

#[tracing::instrument(
    name = "Listing lead records handler",
    skip(mailchimp_client),
    fields(
        count = ?parameters.count,
        offset = ?parameters.offset,
        status = ?parameters.status
    )
)]
pub async fn handle_get_members(
    parameters: web::Query<GetMembersParameters>,
    mailchimp_client: web::Data<MailchimpClient>,
) -> Result<HttpResponse, GetMembersError> {
    let query = ListMembersQuery::from(parameters.into_inner());
    let (total_items, members) = fetch_lead_records(&mailchimp_client, &query).await?;

    Ok(HttpResponse::Ok().json(GetMembersResponse {
        success: true,
        total_items,
        members,
    }))
}

/// Fetches one page of members and flattens them into lead records.
pub async fn fetch_lead_records(
    mailchimp_client: &MailchimpClient,
    query: &ListMembersQuery,
) -> Result<(u64, Vec<LeadRecord>), GetMembersError> {
    let page = mailchimp_client.list_members(query).await?;
    let members = page.members.into_iter().map(LeadRecord::from).collect();

    Ok((page.total_items, members))
}

#[derive(thiserror::Error)]
#[error("Failed to fetch members")]
pub struct GetMembersError(#[from] MailchimpError);

impl std::fmt::Debug for GetMembersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\nCaused by:\n\t{:?}", self, self.0)
    }
}

impl ResponseError for GetMembersError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!("{:?}", self);

        HttpResponse::build(self.status_code())
            .json(mailchimp_error_envelope(&self.0, "Failed to fetch members"))
    }
}
