use crate::error::{AnalyticsError, Result};
use crate::schema::{AccountRecord, EligibilityPolicy};
use crate::utils::{parse_open_date, start_of_day};
use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityStatus {
    Eligible,
    #[serde(rename = "Not Eligible")]
    NotEligible,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAccount {
    pub card_name: String,
    pub issuer: String,
    /// The open date exactly as it appeared on the record.
    pub open_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub cards_in_24_months: usize,
    pub is_eligible: bool,
    pub remaining_slots: usize,
    pub recent_cards: Vec<RecentAccount>,
    pub status: EligibilityStatus,
    pub recommendation: String,
}

impl EligibilityReport {
    /// Report used when the window count could not be computed. Assumes eligibility.
    pub fn fail_open(policy: &EligibilityPolicy) -> Self {
        Self {
            cards_in_24_months: 0,
            is_eligible: true,
            remaining_slots: policy.max_recent_accounts as usize,
            recent_cards: Vec::new(),
            status: EligibilityStatus::Unknown,
            recommendation: "Unable to calculate 5/24 status".to_string(),
        }
    }

    /// Report for an owner with no accounts on file.
    pub fn no_accounts(policy: &EligibilityPolicy) -> Self {
        Self {
            cards_in_24_months: 0,
            is_eligible: true,
            remaining_slots: policy.max_recent_accounts as usize,
            recent_cards: Vec::new(),
            status: EligibilityStatus::Eligible,
            recommendation: "No cards found to analyze".to_string(),
        }
    }
}

pub struct EligibilityCalculator<'a> {
    policy: &'a EligibilityPolicy,
}

impl<'a> EligibilityCalculator<'a> {
    pub fn new(policy: &'a EligibilityPolicy) -> Self {
        Self { policy }
    }

    /// Computes the report, falling back to [`EligibilityReport::fail_open`] on any error.
    pub fn compute(&self, records: &[AccountRecord], now: NaiveDateTime) -> EligibilityReport {
        match self.try_compute(records, now) {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    "5/24 calculation failed, assuming eligibility: {} ({} records, now = {})",
                    e,
                    records.len(),
                    now
                );
                EligibilityReport::fail_open(self.policy)
            }
        }
    }

    pub fn try_compute(
        &self,
        records: &[AccountRecord],
        now: NaiveDateTime,
    ) -> Result<EligibilityReport> {
        let cutoff = self.cutoff(now)?;

        let recent_cards: Vec<RecentAccount> = records
            .iter()
            .filter(|record| record.status().is_active())
            .filter(|record| {
                parse_open_date(record.open_date())
                    .is_some_and(|opened| start_of_day(opened) >= cutoff)
            })
            .map(|record| RecentAccount {
                card_name: record.card_name().to_string(),
                issuer: record.issuer().to_string(),
                open_date: record.open_date().to_string(),
            })
            .collect();

        let limit = self.policy.max_recent_accounts as usize;
        let count = recent_cards.len();
        let is_eligible = count < limit;
        let remaining_slots = limit.saturating_sub(count);

        debug!(
            "5/24 window since {}: {} recent active accounts, {} slots remaining",
            cutoff, count, remaining_slots
        );

        let (status, recommendation) = if is_eligible {
            (
                EligibilityStatus::Eligible,
                format!(
                    "You can apply for {} more {} cards",
                    remaining_slots, self.policy.issuer_family
                ),
            )
        } else {
            (
                EligibilityStatus::NotEligible,
                "Wait for older cards to age out of 24-month window".to_string(),
            )
        };

        Ok(EligibilityReport {
            cards_in_24_months: count,
            is_eligible,
            remaining_slots,
            recent_cards,
            status,
            recommendation,
        })
    }

    /// `now` minus the window, using fixed-length days rather than calendar months.
    fn cutoff(&self, now: NaiveDateTime) -> Result<NaiveDateTime> {
        let window = Duration::days(i64::from(self.policy.window_days));
        now.checked_sub_signed(window).ok_or_else(|| {
            AnalyticsError::DateError(format!(
                "{} days before {} is out of range",
                self.policy.window_days, now
            ))
        })
    }
}
