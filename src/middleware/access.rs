use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

use crate::cache::TtlLruCache;
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Everything the access decision needs, resolved from one query
#[derive(Clone, Debug, FromRow)]
pub struct AccessProfile {
    pub seller_id: Option<Uuid>,
    pub identity_verified: bool,
    pub identity_rejected: bool,
    pub billing_status: Option<String>,
}

impl AccessProfile {
    fn absent() -> Self {
        Self {
            seller_id: None,
            identity_verified: false,
            identity_rejected: false,
            billing_status: None,
        }
    }
}

/// Seller context injected for seller-gated handlers
#[derive(Clone, Debug)]
pub struct SellerAccess {
    pub user_id: Uuid,
    pub seller_id: Uuid,
}

static PROFILE_CACHE: Lazy<TtlLruCache<AccessProfile>> = Lazy::new(|| {
    let security = &config::config().security;
    TtlLruCache::new(
        security.profile_cache_capacity,
        Duration::from_secs(security.profile_cache_ttl_secs),
    )
});

/// Drop the cached access profile for a user. Every write that changes the
/// underlying rows (seller registration/update, billing webhook) calls this
/// so access decisions never outlive the data they were derived from.
pub fn invalidate_profile(user_id: &Uuid) {
    PROFILE_CACHE.invalidate(user_id);
}

/// Onboarding decision tree: seller record, then identity flags, then
/// billing status. The error code tells the client which step to resolve.
pub fn evaluate_access(user_id: Uuid, profile: &AccessProfile) -> Result<SellerAccess, ApiError> {
    let seller_id = profile.seller_id.ok_or_else(|| {
        ApiError::forbidden_with_code("Seller registration required", "SELLER_REQUIRED")
    })?;

    if profile.identity_rejected {
        return Err(ApiError::forbidden_with_code(
            "Identity verification was rejected",
            "IDENTITY_REJECTED",
        ));
    }
    if !profile.identity_verified {
        return Err(ApiError::forbidden_with_code(
            "Identity verification is pending",
            "IDENTITY_PENDING",
        ));
    }

    let billing_ok = profile
        .billing_status
        .as_deref()
        .map(crate::database::models::billing::status_grants_access)
        .unwrap_or(false);
    if !billing_ok {
        return Err(ApiError::forbidden_with_code(
            "An active subscription is required",
            "SUBSCRIPTION_REQUIRED",
        ));
    }

    Ok(SellerAccess { user_id, seller_id })
}

async fn load_profile(user_id: Uuid) -> Result<AccessProfile, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let profile = sqlx::query_as::<_, AccessProfile>(
        "SELECT s.id AS seller_id, s.identity_verified, s.identity_rejected, b.status AS billing_status \
         FROM sellers s \
         LEFT JOIN billing_subscriptions b ON b.seller_id = s.id \
         WHERE s.user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    Ok(profile.unwrap_or_else(AccessProfile::absent))
}

/// Seller access-control middleware. Runs after JWT auth; resolves the access
/// profile (cached), walks the decision tree and injects `SellerAccess`.
/// Concurrent misses for the same user may both hit the database; the second
/// insert just refreshes the entry.
pub async fn seller_access_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let profile = match PROFILE_CACHE.get(&auth_user.user_id) {
        Some(profile) => profile,
        None => {
            let profile = load_profile(auth_user.user_id).await?;
            PROFILE_CACHE.insert(auth_user.user_id, profile.clone());
            profile
        }
    };

    let access = evaluate_access(auth_user.user_id, &profile)?;
    request.extensions_mut().insert(access);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        seller: Option<Uuid>,
        verified: bool,
        rejected: bool,
        billing: Option<&str>,
    ) -> AccessProfile {
        AccessProfile {
            seller_id: seller,
            identity_verified: verified,
            identity_rejected: rejected,
            billing_status: billing.map(|s| s.to_string()),
        }
    }

    #[test]
    fn missing_seller_record_is_first_gate() {
        let err = evaluate_access(Uuid::new_v4(), &profile(None, true, false, Some("active")))
            .unwrap_err();
        assert_eq!(err.error_code(), "SELLER_REQUIRED");
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn rejection_takes_precedence_over_pending() {
        let seller = Some(Uuid::new_v4());
        let err =
            evaluate_access(Uuid::new_v4(), &profile(seller, false, true, None)).unwrap_err();
        assert_eq!(err.error_code(), "IDENTITY_REJECTED");
    }

    #[test]
    fn unverified_identity_is_pending() {
        let seller = Some(Uuid::new_v4());
        let err = evaluate_access(Uuid::new_v4(), &profile(seller, false, false, Some("active")))
            .unwrap_err();
        assert_eq!(err.error_code(), "IDENTITY_PENDING");
    }

    #[test]
    fn inactive_billing_blocks_access() {
        let seller = Some(Uuid::new_v4());
        for status in [None, Some("canceled"), Some("past_due")] {
            let err = evaluate_access(Uuid::new_v4(), &profile(seller, true, false, status))
                .unwrap_err();
            assert_eq!(err.error_code(), "SUBSCRIPTION_REQUIRED");
        }
    }

    #[test]
    fn verified_and_subscribed_passes() {
        let seller_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        for status in ["active", "trialing"] {
            let access = evaluate_access(
                user_id,
                &profile(Some(seller_id), true, false, Some(status)),
            )
            .unwrap();
            assert_eq!(access.seller_id, seller_id);
            assert_eq!(access.user_id, user_id);
        }
    }
}
