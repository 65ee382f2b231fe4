use chrono::{DateTime, Utc};

use crate::dashboard::insights::opted_in_this_week;
use crate::domain::lead_record::LeadRecord;

/// Groups of leads behind each insight card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Total,
    OrganicThisWeek,
    PaidThisWeek,
    OrganicTotal,
    PaidTotal,
}

impl Segment {
    pub fn parse(segment: &str) -> Option<Segment> {
        match segment {
            "total" => Some(Segment::Total),
            "organic-this-week" => Some(Segment::OrganicThisWeek),
            "paid-this-week" => Some(Segment::PaidThisWeek),
            "organic-total" => Some(Segment::OrganicTotal),
            "paid-total" => Some(Segment::PaidTotal),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Segment::Total => "All Leads",
            Segment::OrganicThisWeek => "Organic Leads (This Week)",
            Segment::PaidThisWeek => "Paid Campaign Leads",
            Segment::OrganicTotal => "All Organic Leads",
            Segment::PaidTotal => "All Paid Campaign Leads",
        }
    }

    pub fn select<'a>(&self, leads: &'a [LeadRecord], now: DateTime<Utc>) -> Vec<&'a LeadRecord> {
        leads
            .iter()
            .filter(|lead| {
                let source = lead.lead_source();

                match self {
                    Segment::Total => true,
                    Segment::OrganicThisWeek => source.is_organic() && opted_in_this_week(lead, now),
                    // The paid card drills down into every paid lead, not only this week's
                    Segment::PaidThisWeek | Segment::PaidTotal => source.is_paid(),
                    Segment::OrganicTotal => source.is_organic(),
                }
            })
            .collect()
    }
}
