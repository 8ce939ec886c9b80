use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

use crate::config;

/// Typed bind parameter for the listing browse query
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Str(String),
    Id(Uuid),
    Money(Decimal),
    Int(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Newest,
    PriceAsc,
    PriceDesc,
}

impl Sort {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("price_asc") => Sort::PriceAsc,
            Some("price_desc") => Sort::PriceDesc,
            _ => Sort::Newest,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            Sort::Newest => "created_at DESC",
            Sort::PriceAsc => "price ASC",
            Sort::PriceDesc => "price DESC",
        }
    }
}

/// Filterable, paginated query over public listings. Builds one parameterized
/// SQL string; every user-supplied value is bound, never interpolated.
#[derive(Debug, Default)]
pub struct ListingQuery {
    pub listing_type: Option<String>,
    pub brand_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub condition: Option<String>,
    pub query: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<Sort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListingQuery {
    pub fn page_size(&self) -> i64 {
        let api = &config::config().api;
        self.per_page
            .unwrap_or(api.default_page_size)
            .clamp(1, api.max_page_size)
    }

    pub fn page_number(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn where_sql(&self, params: &mut Vec<Param>) -> String {
        let mut clauses: Vec<String> = Vec::new();

        // `hold` listings are never publicly visible
        clauses.push(format!("status <> '{}'", super::models::listing::STATUS_HOLD));
        if let Some(t) = &self.listing_type {
            params.push(Param::Str(t.clone()));
            clauses.push(format!("listing_type = ${}", params.len()));
        }
        if let Some(b) = self.brand_id {
            params.push(Param::Id(b));
            clauses.push(format!("brand_id = ${}", params.len()));
        }
        if let Some(m) = self.model_id {
            params.push(Param::Id(m));
            clauses.push(format!("model_id = ${}", params.len()));
        }
        if let Some(s) = self.seller_id {
            params.push(Param::Id(s));
            clauses.push(format!("seller_id = ${}", params.len()));
        }
        if let Some(c) = &self.condition {
            params.push(Param::Str(c.clone()));
            clauses.push(format!("condition = ${}", params.len()));
        }
        if let Some(q) = &self.query {
            params.push(Param::Str(format!("%{}%", q)));
            clauses.push(format!(
                "(title ILIKE ${} OR reference ILIKE ${})",
                params.len(),
                params.len()
            ));
        }
        if let Some(min) = self.min_price {
            params.push(Param::Money(min));
            clauses.push(format!("price >= ${}", params.len()));
        }
        if let Some(max) = self.max_price {
            params.push(Param::Money(max));
            clauses.push(format!("price <= ${}", params.len()));
        }

        format!(" WHERE {}", clauses.join(" AND "))
    }

    /// SELECT statement plus bind parameters, in order
    pub fn to_sql(&self) -> (String, Vec<Param>) {
        let mut params = Vec::new();
        let where_sql = self.where_sql(&mut params);

        let per_page = self.page_size();
        let offset = (self.page_number() - 1) * per_page;
        params.push(Param::Int(per_page));
        let limit_idx = params.len();
        params.push(Param::Int(offset));
        let offset_idx = params.len();

        let sql = format!(
            "SELECT * FROM listings{} ORDER BY {} LIMIT ${} OFFSET ${}",
            where_sql,
            self.sort.unwrap_or(Sort::Newest).order_clause(),
            limit_idx,
            offset_idx
        );
        (sql, params)
    }

    /// COUNT statement over the same filters
    pub fn to_count_sql(&self) -> (String, Vec<Param>) {
        let mut params = Vec::new();
        let where_sql = self.where_sql(&mut params);
        (
            format!("SELECT COUNT(*) FROM listings{}", where_sql),
            params,
        )
    }
}

pub fn bind_params<'q, T>(
    mut q: QueryAs<'q, Postgres, T, PgArguments>,
    params: &'q [Param],
) -> QueryAs<'q, Postgres, T, PgArguments>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    for p in params {
        q = match p {
            Param::Str(s) => q.bind(s),
            Param::Id(id) => q.bind(id),
            Param::Money(d) => q.bind(d),
            Param::Int(i) => q.bind(i),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_hides_hold_listings() {
        let (sql, params) = ListingQuery::default().to_sql();
        assert!(sql.contains("WHERE status <> 'hold'"));
        assert!(sql.contains("ORDER BY created_at DESC"));
        // limit + offset only
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], Param::Int(24));
        assert_eq!(params[1], Param::Int(0));
    }

    #[test]
    fn filters_are_parameterized_in_order() {
        let brand = Uuid::new_v4();
        let q = ListingQuery {
            listing_type: Some("watch".to_string()),
            brand_id: Some(brand),
            min_price: Some(Decimal::from(1000)),
            max_price: Some(Decimal::from(9000)),
            sort: Some(Sort::PriceAsc),
            ..Default::default()
        };
        let (sql, params) = q.to_sql();
        assert!(sql.contains("listing_type = $1"));
        assert!(sql.contains("brand_id = $2"));
        assert!(sql.contains("price >= $3"));
        assert!(sql.contains("price <= $4"));
        assert!(sql.contains("LIMIT $5 OFFSET $6"));
        assert!(sql.contains("ORDER BY price ASC"));
        assert_eq!(params[1], Param::Id(brand));
    }

    #[test]
    fn text_search_matches_title_and_reference() {
        let q = ListingQuery {
            query: Some("daytona".to_string()),
            ..Default::default()
        };
        let (sql, params) = q.to_sql();
        assert!(sql.contains("title ILIKE $1 OR reference ILIKE $1"));
        assert_eq!(params[0], Param::Str("%daytona%".to_string()));
    }

    #[test]
    fn pagination_is_clamped() {
        let q = ListingQuery {
            page: Some(0),
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(q.page_number(), 1);
        assert_eq!(q.page_size(), 100);

        let q = ListingQuery {
            page: Some(3),
            per_page: Some(10),
            ..Default::default()
        };
        let (sql, params) = q.to_sql();
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
        assert_eq!(params, vec![Param::Int(10), Param::Int(20)]);
    }

    #[test]
    fn count_sql_shares_filters() {
        let q = ListingQuery {
            condition: Some("new".to_string()),
            ..Default::default()
        };
        let (sql, params) = q.to_count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM listings WHERE status <> 'hold' AND condition = $1"
        );
        assert_eq!(params.len(), 1);
    }
}
