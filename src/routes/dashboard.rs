use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::DashboardSettings,
    dashboard::{
        audience_breakdown, filter_options,
        insights::{AudienceSlice, FilterOptions},
        DatePreset, Insights, LeadFilter, LeadPage, Segment,
    },
    domain::lead_record::LeadRecord,
    mailchimp_client::{ListMembersQuery, MailchimpClient},
    routes::{fetch_lead_records, GetMembersError},
};

#[derive(Serialize)]
pub struct DashboardInsightsResponse {
    pub success: bool,
    pub total_items: u64,
    pub insights: Insights,
    pub audience: Vec<AudienceSlice>,
    pub filters: FilterOptions,
}

#[derive(Serialize)]
pub struct DashboardLeadsResponse<'a> {
    pub success: bool,
    #[serde(flatten)]
    pub page: LeadPage<'a>,
}

#[derive(Serialize)]
pub struct DashboardSegmentResponse<'a> {
    pub success: bool,
    pub title: &'static str,
    pub leads: Vec<&'a LeadRecord>,
}

#[derive(Deserialize, Debug)]
pub struct LeadsParameters {
    pub source: Option<String>,
    pub interest: Option<String>,
    pub campaign: Option<String>,
    pub date: Option<DatePreset>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub q: Option<String>,
    pub page: Option<usize>,
}

impl LeadsParameters {
    fn filter(&self) -> LeadFilter {
        LeadFilter {
            source: self.source.clone(),
            interest: self.interest.clone(),
            campaign: self.campaign.clone(),
            date: self.date.unwrap_or_default(),
            start: self.start,
            end: self.end,
            search: self.q.clone(),
        }
    }
}

/// The dashboard works over the first `member_fetch_count` subscribed members.
async fn fetch_dashboard_leads(
    mailchimp_client: &MailchimpClient,
    settings: &DashboardSettings,
) -> Result<(u64, Vec<LeadRecord>), GetMembersError> {
    let query = ListMembersQuery {
        count: settings.member_fetch_count,
        offset: 0,
        status: String::from("subscribed"),
    };

    fetch_lead_records(mailchimp_client, &query).await
}

#[tracing::instrument(name = "Dashboard insights handler", skip(mailchimp_client, settings))]
pub async fn handle_dashboard_insights(
    mailchimp_client: web::Data<MailchimpClient>,
    settings: web::Data<DashboardSettings>,
) -> Result<HttpResponse, GetMembersError> {
    let (total_items, leads) = fetch_dashboard_leads(&mailchimp_client, &settings).await?;

    Ok(HttpResponse::Ok().json(DashboardInsightsResponse {
        success: true,
        total_items,
        insights: Insights::compute(&leads, Utc::now()),
        audience: audience_breakdown(&leads),
        filters: filter_options(&leads),
    }))
}

#[tracing::instrument(
    name = "Dashboard leads table handler",
    skip(mailchimp_client, settings)
)]
pub async fn handle_dashboard_leads(
    parameters: web::Query<LeadsParameters>,
    mailchimp_client: web::Data<MailchimpClient>,
    settings: web::Data<DashboardSettings>,
) -> Result<HttpResponse, GetMembersError> {
    let (_, leads) = fetch_dashboard_leads(&mailchimp_client, &settings).await?;
    let matches = parameters.filter().apply(&leads, Utc::now());
    let page = LeadPage::paginate(matches, parameters.page.unwrap_or(1), settings.page_size);

    Ok(HttpResponse::Ok().json(DashboardLeadsResponse {
        success: true,
        page,
    }))
}

#[tracing::instrument(
    name = "Dashboard segment handler",
    skip(mailchimp_client, settings)
)]
pub async fn handle_dashboard_segment(
    segment: web::Path<String>,
    mailchimp_client: web::Data<MailchimpClient>,
    settings: web::Data<DashboardSettings>,
) -> Result<HttpResponse, GetMembersError> {
    let (_, leads) = fetch_dashboard_leads(&mailchimp_client, &settings).await?;

    let response = match Segment::parse(&segment) {
        Some(segment) => DashboardSegmentResponse {
            success: true,
            title: segment.title(),
            leads: segment.select(&leads, Utc::now()),
        },
        None => DashboardSegmentResponse {
            success: true,
            title: "",
            leads: Vec::new(),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}
