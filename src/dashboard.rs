use crate::eligibility::{EligibilityCalculator, EligibilityReport};
use crate::error::Result;
use crate::portfolio::{AgeAnalysis, CardUtilization, PortfolioAggregator, PortfolioReport};
use crate::schema::{AccountRecord, AnalyticsConfig};
use crate::utils::percentage;
use chrono::NaiveDateTime;
use log::info;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The dashboard's average-age field.
///
/// Consumers distinguish three shapes: a number, `null` when accounts exist but none has a
/// usable open date, and the string `"N/A"` when there are no accounts at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageAgeDisplay {
    Years(f64),
    Unavailable,
    NotApplicable,
}

impl Serialize for AverageAgeDisplay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Years(years) => serializer.serialize_f64(*years),
            Self::Unavailable => serializer.serialize_none(),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_cards: usize,
    pub active_cards: usize,
    /// Every account that is not active, including unknown statuses.
    pub closed_cards: usize,
    pub average_age_years: AverageAgeDisplay,
    pub total_credit_limit: f64,
    pub total_balance: f64,
    pub credit_utilization: f64,
    pub total_annual_fees: f64,
    pub five_24_status: EligibilityReport,
    #[serde(serialize_with = "empty_object_if_none")]
    pub portfolio_analysis: Option<PortfolioReport>,
    pub top_utilization_cards: Vec<CardUtilization>,
    pub issuer_breakdown: BTreeMap<String, usize>,
    #[serde(serialize_with = "empty_object_if_none")]
    pub age_analysis: Option<AgeAnalysis>,
}

impl DashboardStats {
    /// Payload for an owner with no accounts on file.
    pub fn empty(config: &AnalyticsConfig) -> Self {
        Self {
            total_cards: 0,
            active_cards: 0,
            closed_cards: 0,
            average_age_years: AverageAgeDisplay::NotApplicable,
            total_credit_limit: 0.0,
            total_balance: 0.0,
            credit_utilization: 0.0,
            total_annual_fees: 0.0,
            five_24_status: EligibilityReport::no_accounts(&config.eligibility),
            portfolio_analysis: None,
            top_utilization_cards: Vec::new(),
            issuer_breakdown: BTreeMap::new(),
            age_analysis: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct DashboardBuilder<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> DashboardBuilder<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Runs both calculators over the snapshot and merges their output.
    ///
    /// Eligibility never fails (it falls back to assuming eligibility); an aggregation
    /// error is returned to the caller.
    pub fn build(&self, records: &[AccountRecord], now: NaiveDateTime) -> Result<DashboardStats> {
        info!("Building dashboard for {} accounts", records.len());

        let aggregator = PortfolioAggregator::new(&self.config.portfolio);
        let Some(portfolio) = aggregator.aggregate(records, now)? else {
            return Ok(DashboardStats::empty(self.config));
        };

        let five_24_status =
            EligibilityCalculator::new(&self.config.eligibility).compute(records, now);

        let policy = &self.config.portfolio;
        let total_cards = records.len();
        let active_cards = records
            .iter()
            .filter(|record| record.status().is_active())
            .count();

        let total_credit_limit = policy
            .total_amount_policy
            .sum(records.iter().map(|record| record.credit_limit));
        let total_balance = policy
            .total_amount_policy
            .sum(records.iter().map(|record| record.current_balance));

        let credit_utilization = if total_credit_limit > 0.0 {
            percentage(total_balance, total_credit_limit)
        } else {
            0.0
        };

        let top_utilization_cards: Vec<CardUtilization> = portfolio
            .utilization_breakdown
            .iter()
            .filter(|entry| entry.utilization > policy.high_utilization_threshold)
            .take(policy.top_utilization_limit)
            .cloned()
            .collect();

        let average_age_years = portfolio
            .age_analysis
            .average_age_years
            .map_or(AverageAgeDisplay::Unavailable, AverageAgeDisplay::Years);

        Ok(DashboardStats {
            total_cards,
            active_cards,
            closed_cards: total_cards - active_cards,
            average_age_years,
            total_credit_limit,
            total_balance,
            credit_utilization,
            total_annual_fees: portfolio.annual_fees.total,
            five_24_status,
            top_utilization_cards,
            issuer_breakdown: portfolio.issuer_breakdown.clone(),
            age_analysis: Some(portfolio.age_analysis.clone()),
            portfolio_analysis: Some(portfolio),
        })
    }
}

fn empty_object_if_none<T, S>(value: &Option<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}
