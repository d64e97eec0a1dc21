use crate::error::{AnalyticsError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccountRecord {
    #[serde(default)]
    #[schemars(
        description = "The product name of the card (e.g., 'Chase Freedom Unlimited', 'Discover it')"
    )]
    pub card_name: Option<String>,

    #[serde(default)]
    #[schemars(description = "The bank or company that issued the card (e.g., 'Chase', 'Citi')")]
    pub issuer: Option<String>,

    #[serde(default)]
    #[schemars(description = "Last 4 digits of the account number, or '****' if not shown")]
    pub account_number: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Date the account was opened. Preferably YYYY-MM-DD; MM/YYYY, YYYY-MM and MM-DD-YYYY are also accepted. Use 'Unknown' when not stated."
    )]
    pub open_date: Option<String>,

    #[serde(default)]
    #[schemars(description = "'Active' or 'Closed' as reported on the credit report")]
    pub status: Option<String>,

    #[serde(default)]
    #[schemars(description = "Credit limit as a plain number, without currency symbols or commas")]
    pub credit_limit: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Current balance as a plain number, without currency symbols or commas")]
    pub current_balance: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Annual fee as a plain number. Use 0 for no-fee cards.")]
    pub annual_fee: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Kind of account, normally 'Credit Card'")]
    pub account_type: Option<String>,
}

impl AccountRecord {
    pub fn card_name(&self) -> &str {
        self.card_name.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn issuer(&self) -> &str {
        self.issuer.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn open_date(&self) -> &str {
        self.open_date.as_deref().unwrap_or("")
    }

    pub fn status(&self) -> AccountStatus {
        AccountStatus::from_label(self.status.as_deref())
    }

    /// Annual fee with absent treated as zero.
    pub fn annual_fee_or_zero(&self) -> f64 {
        self.annual_fee.unwrap_or(0.0)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AccountRecord)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Closed,
    Unknown,
}

impl AccountStatus {
    /// Case-insensitive match on the whole label. Surrounding whitespace is not stripped.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::to_lowercase).as_deref() {
            Some("active") => Self::Active,
            Some("closed") => Self::Closed,
            _ => Self::Unknown,
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

/// How an optional monetary amount contributes to a sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AmountSumPolicy {
    #[schemars(description = "Only present, non-zero amounts are summed. A zero amount is skipped.")]
    PresentNonZero,

    #[schemars(description = "Present amounts are summed, absent amounts count as zero.")]
    PresentOrZero,
}

/// Per-issuer limit sums skip zero and absent limits.
pub const ISSUER_LIMIT_POLICY: AmountSumPolicy = AmountSumPolicy::PresentNonZero;

/// Portfolio-wide limit and balance totals treat absent amounts as zero.
pub const TOTAL_AMOUNT_POLICY: AmountSumPolicy = AmountSumPolicy::PresentOrZero;

impl AmountSumPolicy {
    /// The value this amount adds to a sum, or `None` if it is skipped entirely.
    pub fn contribution(self, amount: Option<f64>) -> Option<f64> {
        match self {
            Self::PresentNonZero => amount.filter(|v| *v != 0.0),
            Self::PresentOrZero => Some(amount.unwrap_or(0.0)),
        }
    }

    pub fn sum<I>(self, amounts: I) -> f64
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        amounts
            .into_iter()
            .filter_map(|amount| self.contribution(amount))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EligibilityPolicy {
    #[schemars(
        description = "Length of the trailing window in days. 720 approximates 24 months of 30 days."
    )]
    pub window_days: u32,

    #[schemars(description = "Number of recent accounts at which new applications are refused")]
    pub max_recent_accounts: u32,

    #[schemars(description = "Issuer family named in the recommendation text")]
    pub issuer_family: String,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            window_days: 24 * 30,
            max_recent_accounts: 5,
            issuer_family: "Chase".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct PortfolioPolicy {
    #[schemars(description = "Average month length used to express account age in months")]
    pub days_per_month: f64,

    #[schemars(
        description = "Utilization percentage above which a card is reported as a high-utilization alert"
    )]
    pub high_utilization_threshold: f64,

    #[schemars(description = "Maximum number of high-utilization alerts on the dashboard")]
    pub top_utilization_limit: usize,

    pub issuer_limit_policy: AmountSumPolicy,

    pub total_amount_policy: AmountSumPolicy,
}

impl Default for PortfolioPolicy {
    fn default() -> Self {
        Self {
            days_per_month: 30.44,
            high_utilization_threshold: 30.0,
            top_utilization_limit: 3,
            issuer_limit_policy: ISSUER_LIMIT_POLICY,
            total_amount_policy: TOTAL_AMOUNT_POLICY,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub eligibility: EligibilityPolicy,
    pub portfolio: PortfolioPolicy,
}

impl AnalyticsConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let eligibility = &self.eligibility;
        if eligibility.window_days == 0 {
            return Err(invalid("eligibility.window_days", "must be greater than 0"));
        }
        if eligibility.max_recent_accounts == 0 {
            return Err(invalid(
                "eligibility.max_recent_accounts",
                "must be greater than 0",
            ));
        }
        if eligibility.issuer_family.trim().is_empty() {
            return Err(invalid("eligibility.issuer_family", "must not be empty"));
        }

        let portfolio = &self.portfolio;
        if !portfolio.days_per_month.is_finite() || portfolio.days_per_month <= 0.0 {
            return Err(invalid(
                "portfolio.days_per_month",
                &format!("must be a positive number, got {}", portfolio.days_per_month),
            ));
        }
        if !portfolio.high_utilization_threshold.is_finite() {
            return Err(invalid(
                "portfolio.high_utilization_threshold",
                "must be a finite number",
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsConfig)
    }
}

fn invalid(field: &str, details: &str) -> AnalyticsError {
    AnalyticsError::InvalidConfig {
        field: field.to_string(),
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = AccountRecord::schema_as_json().unwrap();
        assert!(schema_json.contains("card_name"));
        assert!(schema_json.contains("open_date"));
        assert!(schema_json.contains("annual_fee"));
    }

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!(AccountStatus::from_label(Some("ACTIVE")), AccountStatus::Active);
        assert_eq!(AccountStatus::from_label(Some("Closed")), AccountStatus::Closed);
        assert_eq!(AccountStatus::from_label(Some(" active")), AccountStatus::Unknown);
        assert_eq!(AccountStatus::from_label(Some("Charged Off")), AccountStatus::Unknown);
        assert_eq!(AccountStatus::from_label(None), AccountStatus::Unknown);
    }

    #[test]
    fn test_missing_text_fields_default_to_unknown() {
        let record: AccountRecord = serde_json::from_str(r#"{"status": "Active"}"#).unwrap();
        assert_eq!(record.card_name(), "Unknown");
        assert_eq!(record.issuer(), "Unknown");
        assert_eq!(record.open_date(), "");
        assert_eq!(record.annual_fee_or_zero(), 0.0);
    }

    #[test]
    fn test_null_and_absent_amounts_are_equivalent() {
        let record: AccountRecord =
            serde_json::from_str(r#"{"credit_limit": null, "current_balance": 0}"#).unwrap();
        assert_eq!(record.credit_limit, None);
        assert_eq!(record.current_balance, Some(0.0));
        assert_eq!(record.annual_fee, None);
    }

    #[test]
    fn test_sum_policies_disagree_on_zero() {
        let amounts = [Some(1000.0), Some(0.0), None];

        assert_eq!(AmountSumPolicy::PresentNonZero.contribution(Some(0.0)), None);
        assert_eq!(AmountSumPolicy::PresentOrZero.contribution(Some(0.0)), Some(0.0));
        assert_eq!(AmountSumPolicy::PresentOrZero.contribution(None), Some(0.0));
        assert_eq!(ISSUER_LIMIT_POLICY.contribution(None), None);
        assert_eq!(TOTAL_AMOUNT_POLICY.contribution(Some(250.0)), Some(250.0));

        assert_eq!(AmountSumPolicy::PresentNonZero.sum(amounts), 1000.0);
        assert_eq!(AmountSumPolicy::PresentOrZero.sum(amounts), 1000.0);
    }

    #[test]
    fn test_default_config_matches_reference_constants() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.eligibility.window_days, 720);
        assert_eq!(config.eligibility.max_recent_accounts, 5);
        assert_eq!(config.portfolio.days_per_month, 30.44);
        assert_eq!(config.portfolio.top_utilization_limit, 3);
        assert_eq!(config.portfolio.issuer_limit_policy, ISSUER_LIMIT_POLICY);
        assert_eq!(config.portfolio.total_amount_policy, TOTAL_AMOUNT_POLICY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config =
            AnalyticsConfig::from_json(r#"{"eligibility": {"max_recent_accounts": 4}}"#).unwrap();
        assert_eq!(config.eligibility.max_recent_accounts, 4);
        assert_eq!(config.eligibility.window_days, 720);
        assert_eq!(config.portfolio, PortfolioPolicy::default());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let err = AnalyticsConfig::from_json(r#"{"portfolio": {"days_per_month": 0.0}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InvalidConfig { ref field, .. } if field == "portfolio.days_per_month"
        ));

        let err = AnalyticsConfig::from_json(r#"{"eligibility": {"window_days": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfig { .. }));

        let err = AnalyticsConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, AnalyticsError::SerializationError(_)));
    }
}
