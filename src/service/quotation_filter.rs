use crate::model::quotation::{Quotation, QuotationStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status selector of the quotation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub fn matches(&self, status: QuotationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == QuotationStatus::Pending,
            StatusFilter::Approved => status == QuotationStatus::Approved,
            StatusFilter::Rejected => status == QuotationStatus::Rejected,
        }
    }
}

impl From<QuotationStatus> for StatusFilter {
    fn from(status: QuotationStatus) -> Self {
        match status {
            QuotationStatus::Pending => StatusFilter::Pending,
            QuotationStatus::Approved => StatusFilter::Approved,
            QuotationStatus::Rejected => StatusFilter::Rejected,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse::<QuotationStatus>().map(StatusFilter::from)
    }
}

/// Returns the quotations whose title or client contains `query`
/// (case-insensitive) and whose status passes `filter`. Input order is kept.
pub fn filter_quotations<'a>(
    quotations: &'a [Quotation],
    query: &str,
    filter: StatusFilter,
) -> Vec<&'a Quotation> {
    let needle = query.to_lowercase();
    quotations
        .iter()
        .filter(|q| filter.matches(q.status))
        .filter(|q| {
            needle.is_empty()
                || q.title.to_lowercase().contains(&needle)
                || q.client.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total,
            StatusFilter::Pending => self.pending,
            StatusFilter::Approved => self.approved,
            StatusFilter::Rejected => self.rejected,
        }
    }
}

pub fn status_counts(quotations: &[Quotation]) -> StatusCounts {
    quotations.iter().fold(StatusCounts::default(), |mut acc, q| {
        acc.total += 1;
        match q.status {
            QuotationStatus::Pending => acc.pending += 1,
            QuotationStatus::Approved => acc.approved += 1,
            QuotationStatus::Rejected => acc.rejected += 1,
        }
        acc
    })
}
