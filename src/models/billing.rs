use serde::{Deserialize, Serialize};

/// `actions_limit` value meaning "no limit"
pub const UNLIMITED_ACTIONS: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub id: String,
    pub name: String,
    pub price_monthly: f64,
    pub price_yearly: f64,
    pub actions_limit: i64,
    /// Display order is significant
    pub features: Vec<String>,
}

impl PricingPlan {
    pub fn is_unlimited(&self) -> bool {
        self.actions_limit == UNLIMITED_ACTIONS
    }
}

/// Current user's subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: String,
    pub status: String,
    pub actions_used: i64,
    pub actions_limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_features_keep_order() {
        let plan: PricingPlan = serde_json::from_value(json!({
            "id": "enterprise",
            "name": "Enterprise",
            "price_monthly": 199,
            "price_yearly": 1990,
            "features": ["Unlimited actions", "Full policy engine", "SLA guarantee"],
            "actions_limit": -1
        }))
        .unwrap();

        assert!(plan.is_unlimited());
        assert_eq!(
            plan.features,
            vec!["Unlimited actions", "Full policy engine", "SLA guarantee"]
        );
        assert_eq!(plan.price_monthly, 199.0);
    }

    #[test]
    fn test_limited_plan() {
        let plan: PricingPlan = serde_json::from_value(json!({
            "id": "free",
            "name": "Free",
            "price_monthly": 0,
            "price_yearly": 0,
            "features": [],
            "actions_limit": 100
        }))
        .unwrap();
        assert!(!plan.is_unlimited());
    }
}
