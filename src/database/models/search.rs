use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Buyer-defined saved search; new listings are matched against these in the
/// listing-created webhook fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActiveSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_type: String,
    pub brand_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub max_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ActiveSearch {
    /// Whether a newly created listing satisfies this search
    pub fn matches(
        &self,
        listing_type: &str,
        brand_id: Uuid,
        model_id: Option<Uuid>,
        price: Decimal,
    ) -> bool {
        if self.listing_type != listing_type {
            return false;
        }
        if let Some(wanted_brand) = self.brand_id {
            if wanted_brand != brand_id {
                return false;
            }
        }
        if let Some(wanted_model) = self.model_id {
            if model_id != Some(wanted_model) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if price > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn search(brand: Option<Uuid>, model: Option<Uuid>, max: Option<i64>) -> ActiveSearch {
        ActiveSearch {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            listing_type: "watch".to_string(),
            brand_id: brand,
            model_id: model,
            max_price: max.map(Decimal::from),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn matches_on_type_brand_and_price() {
        let brand = Uuid::new_v4();
        let s = search(Some(brand), None, Some(5000));
        assert!(s.matches("watch", brand, None, Decimal::from(4500)));
        assert!(!s.matches("accessory", brand, None, Decimal::from(4500)));
        assert!(!s.matches("watch", Uuid::new_v4(), None, Decimal::from(4500)));
        assert!(!s.matches("watch", brand, None, Decimal::from(5001)));
    }

    #[test]
    fn model_filter_requires_exact_model() {
        let brand = Uuid::new_v4();
        let model = Uuid::new_v4();
        let s = search(Some(brand), Some(model), None);
        assert!(s.matches("watch", brand, Some(model), Decimal::from(100)));
        assert!(!s.matches("watch", brand, None, Decimal::from(100)));
        assert!(!s.matches("watch", brand, Some(Uuid::new_v4()), Decimal::from(100)));
    }

    #[test]
    fn unconstrained_search_matches_any_brand() {
        let s = search(None, None, None);
        assert!(s.matches("watch", Uuid::new_v4(), None, Decimal::from(999_999)));
    }
}
