//! Loyalty program models: tiers, rewards and the singleton settings row.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{parse_json_list, string_enum};

string_enum!(
    /// Whether a reward can currently be redeemed
    RewardStatus {
        Active => "Active",
        Inactive => "Inactive",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyTier {
    pub id: String,
    pub name: String,
    pub points_threshold: i64,
    /// JSON list of benefit descriptions
    pub benefits: String,
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyTierResponse {
    pub id: String,
    pub name: String,
    pub points_threshold: i64,
    pub benefits: Vec<String>,
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LoyaltyTier> for LoyaltyTierResponse {
    fn from(tier: LoyaltyTier) -> Self {
        Self {
            benefits: parse_json_list(&tier.benefits),
            id: tier.id,
            name: tier.name,
            points_threshold: tier.points_threshold,
            color: tier.color,
            created_at: tier.created_at,
            updated_at: tier.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLoyaltyTierRequest {
    pub name: String,
    pub points_threshold: i64,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoyaltyTierRequest {
    pub name: Option<String>,
    pub points_threshold: Option<i64>,
    pub benefits: Option<Vec<String>>,
    pub color: Option<String>,
}

impl LoyaltyTier {
    /// All tiers, lowest threshold first
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<LoyaltyTier>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM loyalty_tiers ORDER BY points_threshold ASC, name ASC")
            .fetch_all(db)
            .await
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<LoyaltyTier>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM loyalty_tiers WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

/// Highest tier whose threshold the balance reaches.
pub fn tier_for_points(tiers: &[LoyaltyTier], points: i64) -> Option<&LoyaltyTier> {
    tiers
        .iter()
        .filter(|t| t.points_threshold <= points)
        .max_by_key(|t| t.points_threshold)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyReward {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub category: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLoyaltyRewardRequest {
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub category: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoyaltyRewardRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points_cost: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewardListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

impl LoyaltyReward {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<LoyaltyReward>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM loyalty_rewards WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

/// Global point-accrual parameters. Exactly one row exists (id = 1).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltySettings {
    #[serde(skip_serializing)]
    pub id: i64,
    pub points_per_currency_unit: f64,
    pub signup_bonus: i64,
    pub referral_bonus: i64,
    pub points_expiry_months: i64,
    pub program_enabled: bool,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoyaltySettingsRequest {
    pub points_per_currency_unit: Option<f64>,
    pub signup_bonus: Option<i64>,
    pub referral_bonus: Option<i64>,
    pub points_expiry_months: Option<i64>,
    pub program_enabled: Option<bool>,
}

impl LoyaltySettings {
    pub async fn get(db: &SqlitePool) -> Result<LoyaltySettings, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO loyalty_settings (id) VALUES (1)")
            .execute(db)
            .await?;
        sqlx::query_as("SELECT * FROM loyalty_settings WHERE id = 1")
            .fetch_one(db)
            .await
    }

    /// Points earned for spending `amount`, rounded down
    pub fn points_for_amount(&self, amount: f64) -> i64 {
        if !self.program_enabled || amount <= 0.0 {
            return 0;
        }
        (amount * self.points_per_currency_unit).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, threshold: i64) -> LoyaltyTier {
        LoyaltyTier {
            id: name.to_lowercase(),
            name: name.to_string(),
            points_threshold: threshold,
            benefits: "[]".to_string(),
            color: "#000000".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_tier_for_points() {
        let tiers = vec![tier("Gold", 5000), tier("Bronze", 0), tier("Silver", 1000)];
        assert_eq!(tier_for_points(&tiers, 0).unwrap().name, "Bronze");
        assert_eq!(tier_for_points(&tiers, 999).unwrap().name, "Bronze");
        assert_eq!(tier_for_points(&tiers, 1000).unwrap().name, "Silver");
        assert_eq!(tier_for_points(&tiers, 80_000).unwrap().name, "Gold");
    }

    #[test]
    fn test_no_tier_below_lowest_threshold() {
        let tiers = vec![tier("Silver", 1000)];
        assert!(tier_for_points(&tiers, 10).is_none());
        assert!(tier_for_points(&[], 10).is_none());
    }

    #[test]
    fn test_points_for_amount() {
        let mut settings = LoyaltySettings {
            id: 1,
            points_per_currency_unit: 1.5,
            signup_bonus: 0,
            referral_bonus: 0,
            points_expiry_months: 12,
            program_enabled: true,
            updated_at: String::new(),
        };
        assert_eq!(settings.points_for_amount(99.9), 149);
        assert_eq!(settings.points_for_amount(-5.0), 0);

        settings.program_enabled = false;
        assert_eq!(settings.points_for_amount(100.0), 0);
    }

    #[test]
    fn test_tier_response_parses_benefits() {
        let mut t = tier("Gold", 5000);
        t.benefits = r#"["Late checkout","Upgrade"]"#.to_string();
        let resp = LoyaltyTierResponse::from(t);
        assert_eq!(resp.benefits, vec!["Late checkout", "Upgrade"]);
    }
}
