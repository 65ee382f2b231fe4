use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::lead_record::LeadRecord;

const UNTRACKED_CAMPAIGN: &str = "Untracked";
const NO_CAMPAIGN: &str = "N/A";
const PAID_FILTER: &str = "paid";

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub total_leads: usize,
    pub organic_leads_this_week: usize,
    pub paid_campaign_leads_this_week: usize,
    pub total_organic_leads: usize,
    pub total_paid_leads: usize,
    pub leads_by_interest: BTreeMap<String, usize>,
    pub average_age: u32,
    pub top_campaign: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct AudienceSlice {
    pub name: &'static str,
    pub value: usize,
}

/// Values offered by the dashboard filter selectors, in first-seen order.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub sources: Vec<String>,
    pub interests: Vec<String>,
    pub campaigns: Vec<String>,
}

/// A lead counts for "this week" when it opted in during the last seven days.
pub fn opted_in_this_week(lead: &LeadRecord, now: DateTime<Utc>) -> bool {
    let one_week_ago = now - Duration::days(7);

    lead.opted_in_at()
        .map_or(false, |opted_in_at| opted_in_at >= one_week_ago)
}

impl Insights {
    pub fn compute(leads: &[LeadRecord], now: DateTime<Utc>) -> Insights {
        let organic: Vec<&LeadRecord> = leads
            .iter()
            .filter(|lead| lead.lead_source().is_organic())
            .collect();
        let paid: Vec<&LeadRecord> = leads
            .iter()
            .filter(|lead| lead.lead_source().is_paid())
            .collect();

        let mut leads_by_interest = BTreeMap::new();
        for interest in leads.iter().flat_map(|lead| lead.interest_list()) {
            *leads_by_interest.entry(interest.to_string()).or_insert(0) += 1;
        }

        Insights {
            total_leads: leads.len(),
            organic_leads_this_week: organic
                .iter()
                .filter(|lead| opted_in_this_week(lead, now))
                .count(),
            paid_campaign_leads_this_week: paid
                .iter()
                .filter(|lead| opted_in_this_week(lead, now))
                .count(),
            total_organic_leads: organic.len(),
            total_paid_leads: paid.len(),
            leads_by_interest,
            average_age: average_age(leads),
            top_campaign: top_campaign(&paid),
        }
    }
}

/// Rounded mean of the ages that parse to a positive number.
fn average_age(leads: &[LeadRecord]) -> u32 {
    let ages: Vec<u32> = leads
        .iter()
        .filter_map(|lead| lead.age.trim().parse::<u32>().ok())
        .filter(|age| *age > 0)
        .collect();

    if ages.is_empty() {
        return 0;
    }

    let total: u64 = ages.iter().map(|age| u64::from(*age)).sum();

    (total as f64 / ages.len() as f64).round() as u32
}

/// Most frequent campaign among paid leads. Ties go to the campaign seen first.
fn top_campaign(paid: &[&LeadRecord]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for lead in paid {
        let campaign = if lead.utm_campaign.is_empty() {
            UNTRACKED_CAMPAIGN
        } else {
            lead.utm_campaign.as_str()
        };

        match counts.iter_mut().find(|(name, _)| *name == campaign) {
            Some((_, count)) => *count += 1,
            None => counts.push((campaign, 1)),
        }
    }

    let mut top: Option<(&str, usize)> = None;
    for (campaign, count) in counts {
        if top.map_or(true, |(_, top_count)| count > top_count) {
            top = Some((campaign, count));
        }
    }

    top.map_or_else(|| String::from(NO_CAMPAIGN), |(campaign, _)| campaign.to_string())
}

/// Organic vs paid vs everything else, omitting empty slices.
pub fn audience_breakdown(leads: &[LeadRecord]) -> Vec<AudienceSlice> {
    let organic = leads
        .iter()
        .filter(|lead| lead.lead_source().is_organic())
        .count();
    let paid = leads
        .iter()
        .filter(|lead| lead.lead_source().is_paid())
        .count();
    let other = leads
        .iter()
        .filter(|lead| {
            let source = lead.lead_source();
            !source.is_organic() && !source.is_paid()
        })
        .count();

    [
        AudienceSlice {
            name: "Organic",
            value: organic,
        },
        AudienceSlice {
            name: "Paid Campaigns",
            value: paid,
        },
        AudienceSlice {
            name: "Other",
            value: other,
        },
    ]
    .into_iter()
    .filter(|slice| slice.value > 0)
    .collect()
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|known| known == value) {
        values.push(value.to_string());
    }
}

pub fn filter_options(leads: &[LeadRecord]) -> FilterOptions {
    let mut options = FilterOptions::default();

    for lead in leads {
        push_unique(&mut options.sources, &lead.source);
        for interest in lead.interest_list() {
            push_unique(&mut options.interests, interest);
        }
        push_unique(&mut options.campaigns, &lead.utm_campaign);
    }

    // "paid" is a shortcut for the email campaign source
    if options.sources.iter().any(|source| source == "email_campaign") {
        options.sources.insert(0, String::from(PAID_FILTER));
    }

    options
}
