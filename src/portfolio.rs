use crate::error::{AnalyticsError, Result};
use crate::schema::{AccountRecord, AmountSumPolicy, PortfolioPolicy};
use crate::utils::{days_since, parse_open_date, percentage, round_to_tenth};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCard {
    pub card_name: String,
    pub annual_fee: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualFeeSummary {
    pub total: f64,
    pub fee_cards: Vec<FeeCard>,
    pub no_fee_cards: Vec<String>,
    pub fee_cards_count: usize,
    pub no_fee_cards_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardUtilization {
    pub card_name: String,
    /// Balance over limit as a percentage, one decimal place.
    pub utilization: f64,
    pub balance: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeAnalysis {
    pub oldest_card_date: Option<NaiveDate>,
    pub newest_card_date: Option<NaiveDate>,
    /// Months since the oldest account was opened.
    pub average_age_months: Option<f64>,
    pub average_age_years: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_cards: usize,
    pub active_cards: usize,
    pub closed_cards: usize,
    pub unique_issuers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub issuer_breakdown: BTreeMap<String, usize>,
    pub issuer_limits: BTreeMap<String, f64>,
    pub annual_fees: AnnualFeeSummary,
    /// Sorted by utilization, highest first. Equal values keep input order.
    pub utilization_breakdown: Vec<CardUtilization>,
    pub age_analysis: AgeAnalysis,
    pub portfolio_stats: PortfolioStats,
}

pub struct PortfolioAggregator<'a> {
    policy: &'a PortfolioPolicy,
}

impl<'a> PortfolioAggregator<'a> {
    pub fn new(policy: &'a PortfolioPolicy) -> Self {
        Self { policy }
    }

    /// Aggregates the snapshot in a single pass.
    ///
    /// Returns `Ok(None)` for an empty snapshot so that "no data" stays distinguishable
    /// from a portfolio whose figures are all zero. Non-finite amounts are a hard error.
    pub fn aggregate(
        &self,
        records: &[AccountRecord],
        now: NaiveDateTime,
    ) -> Result<Option<PortfolioReport>> {
        if records.is_empty() {
            return Ok(None);
        }

        let mut report = PortfolioReport::default();
        let mut oldest: Option<NaiveDate> = None;
        let mut newest: Option<NaiveDate> = None;
        let mut undated = 0usize;

        for record in records {
            check_amounts(record)?;

            let card_name = record.card_name();
            let issuer = record.issuer();

            *report
                .issuer_breakdown
                .entry(issuer.to_string())
                .or_insert(0) += 1;

            if let Some(limit) = self.policy.issuer_limit_policy.contribution(record.credit_limit)
            {
                *report
                    .issuer_limits
                    .entry(issuer.to_string())
                    .or_insert(0.0) += limit;
            }

            let fee = record.annual_fee_or_zero();
            report.annual_fees.total += fee;
            if fee > 0.0 {
                report.annual_fees.fee_cards.push(FeeCard {
                    card_name: card_name.to_string(),
                    annual_fee: fee,
                });
            } else {
                report.annual_fees.no_fee_cards.push(card_name.to_string());
            }

            // A zero limit is treated as unknown, so no division by zero.
            if let (Some(limit), Some(balance)) = (
                AmountSumPolicy::PresentNonZero.contribution(record.credit_limit),
                record.current_balance,
            ) {
                report.utilization_breakdown.push(CardUtilization {
                    card_name: card_name.to_string(),
                    utilization: percentage(balance, limit),
                    balance,
                    limit,
                });
            }

            match parse_open_date(record.open_date()) {
                Some(opened) => {
                    if oldest.map_or(true, |d| opened < d) {
                        oldest = Some(opened);
                    }
                    if newest.map_or(true, |d| opened > d) {
                        newest = Some(opened);
                    }
                }
                None => undated += 1,
            }

            let status = record.status();
            report.portfolio_stats.active_cards += usize::from(status.is_active());
            report.portfolio_stats.closed_cards += usize::from(status.is_closed());
        }

        report
            .utilization_breakdown
            .sort_by(|a, b| b.utilization.total_cmp(&a.utilization));

        report.annual_fees.fee_cards_count = report.annual_fees.fee_cards.len();
        report.annual_fees.no_fee_cards_count = report.annual_fees.no_fee_cards.len();

        report.age_analysis = self.age_analysis(oldest, newest, now);

        report.portfolio_stats.total_cards = records.len();
        report.portfolio_stats.unique_issuers = report.issuer_breakdown.len();

        debug!(
            "Aggregated {} records: {} issuers, {} utilization entries, {} without a usable open date",
            records.len(),
            report.portfolio_stats.unique_issuers,
            report.utilization_breakdown.len(),
            undated
        );

        Ok(Some(report))
    }

    fn age_analysis(
        &self,
        oldest: Option<NaiveDate>,
        newest: Option<NaiveDate>,
        now: NaiveDateTime,
    ) -> AgeAnalysis {
        let average_age_months = oldest
            .map(|date| round_to_tenth(days_since(date, now) as f64 / self.policy.days_per_month));

        // A zero-month age reports no year figure.
        let average_age_years = average_age_months
            .filter(|months| *months != 0.0)
            .map(|months| round_to_tenth(months / 12.0));

        AgeAnalysis {
            oldest_card_date: oldest,
            newest_card_date: newest,
            average_age_months,
            average_age_years,
        }
    }
}

fn check_amounts(record: &AccountRecord) -> Result<()> {
    let amounts = [
        ("credit_limit", record.credit_limit),
        ("current_balance", record.current_balance),
        ("annual_fee", record.annual_fee),
    ];

    for (field, amount) in amounts {
        if let Some(value) = amount.filter(|v| !v.is_finite()) {
            return Err(AnalyticsError::NonFiniteAmount {
                card_name: record.card_name().to_string(),
                field,
                value,
            });
        }
    }

    Ok(())
}
