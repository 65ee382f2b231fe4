use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead_record::LeadRecord;

const ALL: &str = "all";
const PAID: &str = "paid";
const NO_CAMPAIGN: &str = "none";

/// Opt-in date windows offered by the dashboard. Every window ends at the end of today and
/// starts at midnight, UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DatePreset {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "2days")]
    TwoDays,
    #[serde(rename = "5days")]
    FiveDays,
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "14days")]
    FourteenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "custom")]
    Custom,
}

impl DatePreset {
    fn days(&self) -> Option<i64> {
        match self {
            DatePreset::Today => Some(1),
            DatePreset::TwoDays => Some(2),
            DatePreset::FiveDays => Some(5),
            DatePreset::SevenDays => Some(7),
            DatePreset::FourteenDays => Some(14),
            DatePreset::ThirtyDays => Some(30),
            DatePreset::All | DatePreset::Custom => None,
        }
    }
}

/// Half-open `[start, end)` range of opt-in instants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Midnight closing `date`.
fn day_after(date: NaiveDate) -> DateTime<Utc> {
    midnight(date)
        .checked_add_signed(Duration::days(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Default, Clone)]
pub struct LeadFilter {
    pub source: Option<String>,
    pub interest: Option<String>,
    pub campaign: Option<String>,
    pub date: DatePreset,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Treats missing, blank and "all" selector values alike.
fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != ALL)
}

impl LeadFilter {
    /// Range selected by the date preset. A custom range without both ends disables the filter.
    /// Bounds that fall outside the representable range are clamped, leaving that side open.
    pub fn date_range(&self, now: DateTime<Utc>) -> Option<DateRange> {
        if self.date == DatePreset::Custom {
            let (start, end) = self.start.zip(self.end)?;

            return Some(DateRange {
                start: midnight(start),
                end: day_after(end),
            });
        }

        let tomorrow = day_after(now.date_naive());

        self.date.days().map(|days| DateRange {
            start: tomorrow
                .checked_sub_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: tomorrow,
        })
    }

    fn matches_source(&self, lead: &LeadRecord) -> bool {
        match selected(&self.source) {
            None => true,
            Some(PAID) => lead.lead_source().is_paid(),
            Some(source) => lead.source == source,
        }
    }

    fn matches_interest(&self, lead: &LeadRecord) -> bool {
        selected(&self.interest).map_or(true, |interest| lead.interests.contains(interest))
    }

    fn matches_campaign(&self, lead: &LeadRecord) -> bool {
        match selected(&self.campaign) {
            None => true,
            Some(NO_CAMPAIGN) => lead.utm_campaign.is_empty(),
            Some(campaign) => lead.utm_campaign == campaign,
        }
    }

    fn matches_search(&self, lead: &LeadRecord) -> bool {
        let query = match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => query.to_lowercase(),
            _ => return true,
        };
        let searchable_text = [
            lead.email_address.as_str(),
            lead.first_name.as_str(),
            lead.last_name.as_str(),
            lead.full_name().as_str(),
            lead.phone_number.as_str(),
            lead.interests.as_str(),
            lead.source.as_str(),
            lead.utm_campaign.as_str(),
            lead.utm_source.as_str(),
            lead.utm_medium.as_str(),
        ]
        .join(" ")
        .to_lowercase();

        searchable_text.contains(&query)
    }

    fn matches(&self, lead: &LeadRecord, date_range: Option<DateRange>) -> bool {
        let within_dates = match date_range {
            None => true,
            // Leads without an opt-in time never match an active date filter
            Some(range) => lead
                .opted_in_at()
                .map_or(false, |opted_in_at| {
                    opted_in_at >= range.start && opted_in_at < range.end
                }),
        };

        within_dates
            && self.matches_source(lead)
            && self.matches_interest(lead)
            && self.matches_campaign(lead)
            && self.matches_search(lead)
    }

    pub fn apply<'a>(&self, leads: &'a [LeadRecord], now: DateTime<Utc>) -> Vec<&'a LeadRecord> {
        let date_range = self.date_range(now);

        leads
            .iter()
            .filter(|lead| self.matches(lead, date_range))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct LeadPage<'a> {
    pub total_matches: usize,
    pub page: usize,
    pub total_pages: usize,
    pub leads: Vec<&'a LeadRecord>,
}

impl<'a> LeadPage<'a> {
    /// Cuts the 1-based `page` out of `matches`. Pages past the end are empty.
    pub fn paginate(matches: Vec<&'a LeadRecord>, page: usize, page_size: usize) -> LeadPage<'a> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_matches = matches.len();
        let leads = match (page - 1).checked_mul(page_size) {
            Some(offset) => matches.into_iter().skip(offset).take(page_size).collect(),
            None => Vec::new(),
        };

        LeadPage {
            total_matches,
            page,
            total_pages: total_matches.div_ceil(page_size),
            leads,
        }
    }
}
