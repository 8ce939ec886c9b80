use axum::extract::{Path, Query};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::listing_query::{bind_params, ListingQuery, Sort};
use crate::database::manager::DatabaseManager;
use crate::database::models::listing::{Listing, ListingImage};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub brand: Option<Uuid>,
    pub model: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub condition: Option<String>,
    pub query: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl From<BrowseQuery> for ListingQuery {
    fn from(q: BrowseQuery) -> Self {
        ListingQuery {
            listing_type: q.listing_type,
            brand_id: q.brand,
            model_id: q.model,
            seller_id: q.seller_id,
            condition: q.condition,
            query: q.query,
            min_price: q.min_price,
            max_price: q.max_price,
            sort: Some(Sort::parse(q.sort.as_deref())),
            page: q.page,
            per_page: q.per_page,
        }
    }
}

/// GET /api/listings - public marketplace browse with filters and pagination
pub async fn listing_list(Query(query): Query<BrowseQuery>) -> ApiResult<Value> {
    let listing_query = ListingQuery::from(query);
    let pool = DatabaseManager::pool().await?;

    let (sql, params) = listing_query.to_sql();
    let listings = bind_params(sqlx::query_as::<_, Listing>(&sql), &params)
        .fetch_all(&pool)
        .await?;

    let (count_sql, count_params) = listing_query.to_count_sql();
    let (total,): (i64,) = bind_params(sqlx::query_as(&count_sql), &count_params)
        .fetch_one(&pool)
        .await?;

    let per_page = listing_query.page_size();
    let page = listing_query.page_number();
    let total_pages = if total == 0 { 0 } else { (total + per_page - 1) / per_page };

    Ok(ApiResponse::success(json!({
        "items": listings,
        "pagination": {
            "page": page,
            "per_page": per_page,
            "total": total,
            "total_pages": total_pages,
        }
    })))
}

/// GET /api/listings/:id - single listing with its images
pub async fn listing_get(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let listing = sqlx::query_as::<_, Listing>(
        "SELECT * FROM listings WHERE id = $1 AND status <> 'hold'",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let images = sqlx::query_as::<_, ListingImage>(
        "SELECT * FROM listing_images WHERE listing_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(json!({
        "listing": listing,
        "images": images,
    })))
}
