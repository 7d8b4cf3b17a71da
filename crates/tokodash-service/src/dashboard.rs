//! # Dashboard Analytics
//!
//! The sales summary and low-stock widgets, served through [`QueryCache`].
//! Results may be up to one TTL stale; writes never invalidate them, the
//! caller does through [`DashboardService::invalidate`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::instrument;

use tokodash_core::validation::validate_uuid;
use tokodash_core::{DateRange, Money, ProductVariant};
use tokodash_db::{DailyRevenue, Database, StatusCount};

use crate::cache::{cache_key, QueryCache};
use crate::error::{ApiError, ApiResult};
use crate::notify::NotificationHub;

/// Headline numbers for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub range: DateRange,
    pub store_id: Option<String>,
    /// Orders in any status.
    pub order_count: i64,
    /// Delivered orders only.
    pub revenue: Money,
    pub by_status: Vec<StatusCount>,
    pub daily: Vec<DailyRevenue>,
}

#[derive(Serialize)]
struct SummaryQuery<'a> {
    range: DateRange,
    store_id: Option<&'a str>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Database,
    hub: NotificationHub,
    summaries: Arc<QueryCache<SalesSummary>>,
    low_stock: Arc<QueryCache<Vec<ProductVariant>>>,
}

impl DashboardService {
    pub fn new(db: Database, hub: NotificationHub, ttl: Duration) -> Self {
        DashboardService {
            db,
            hub,
            summaries: Arc::new(QueryCache::new(ttl)),
            low_stock: Arc::new(QueryCache::new(ttl)),
        }
    }

    #[instrument(skip(self))]
    pub async fn sales_summary(
        &self,
        range: DateRange,
        store_id: Option<&str>,
    ) -> ApiResult<Arc<SalesSummary>> {
        if let Some(store_id) = store_id {
            validate_uuid("store_id", store_id)?;
        }

        let key = cache_key("sales", &SummaryQuery { range, store_id })
            .map_err(|e| ApiError::internal(e.to_string()))?;

        self.summaries
            .get_or_fetch(key, || async {
                let by_status = self.db.sales().status_counts(range, store_id).await?;
                let daily = self.db.sales().daily_revenue(range, store_id).await?;

                Ok::<_, ApiError>(SalesSummary {
                    range,
                    store_id: store_id.map(str::to_string),
                    order_count: by_status.iter().map(|s| s.order_count).sum(),
                    revenue: daily.iter().map(|d| Money::from_amount(d.revenue)).sum(),
                    by_status,
                    daily,
                })
            })
            .await
    }

    /// Low-stock variants at the tenant's current threshold.
    pub async fn low_stock(&self) -> ApiResult<Arc<Vec<ProductVariant>>> {
        let threshold = self.hub.low_stock_threshold().await?;
        let key = cache_key("product_variants", &threshold)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        self.low_stock
            .get_or_fetch(key, || async {
                Ok::<_, ApiError>(self.db.products().low_stock(threshold).await?)
            })
            .await
    }

    /// Drops every cached widget so the next read refetches.
    pub async fn invalidate(&self) {
        self.summaries.clear().await;
        self.low_stock.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StockAdjustment;
    use crate::sales::{NewSale, NewSaleItem};
    use crate::testing;
    use tokodash_core::SaleStatus;

    fn march() -> DateRange {
        DateRange::new(testing::day("2026-03-01"), testing::day("2026-03-31")).unwrap()
    }

    fn delivered(store_id: &str, variant_id: &str, number: &str) -> NewSale {
        NewSale {
            store_id: store_id.to_string(),
            platform_id: None,
            order_number: number.to_string(),
            customer_name: None,
            status: Some(SaleStatus::Delivered),
            sale_date: testing::day("2026-03-07"),
            shipping_cost: 10_000,
            discount: 0,
            notes: None,
            items: vec![NewSaleItem {
                variant_id: variant_id.to_string(),
                quantity: 1,
                unit_price: Some(90_000),
            }],
        }
    }

    fn dashboard_with_ttl(fx: &testing::Fixture, ttl: Duration) -> DashboardService {
        DashboardService::new(fx.office.database().clone(), fx.office.notifications(), ttl)
    }

    #[tokio::test]
    async fn test_summary_served_from_cache() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let dashboard = fx.office.dashboard();
        let sales = fx.office.sales();

        sales.create_sale(delivered(&fx.store.id, &kaos.id, "INV-1")).await.unwrap();
        let first = dashboard.sales_summary(march(), None).await.unwrap();
        assert_eq!(first.order_count, 1);
        assert_eq!(first.revenue.amount(), 100_000);

        sales.create_sale(delivered(&fx.store.id, &kaos.id, "INV-2")).await.unwrap();
        let stale = dashboard.sales_summary(march(), None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &stale));
        assert_eq!(stale.order_count, 1);

        dashboard.invalidate().await;
        let fresh = dashboard.sales_summary(march(), None).await.unwrap();
        assert_eq!(fresh.order_count, 2);
        assert_eq!(fresh.revenue.amount(), 200_000);
        assert_eq!(fresh.daily.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_summary_refetches() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let dashboard = dashboard_with_ttl(&fx, Duration::ZERO);

        let before = dashboard.sales_summary(march(), None).await.unwrap();
        assert_eq!(before.order_count, 0);

        fx.office
            .sales()
            .create_sale(delivered(&fx.store.id, &kaos.id, "INV-1"))
            .await
            .unwrap();
        let after = dashboard.sales_summary(march(), None).await.unwrap();
        assert_eq!(after.order_count, 1);
    }

    #[tokio::test]
    async fn test_low_stock_cached_until_invalidated() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let dashboard = dashboard_with_ttl(&fx, Duration::from_secs(3600));

        assert!(dashboard.low_stock().await.unwrap().is_empty());

        fx.office
            .stock()
            .adjust_stock(StockAdjustment {
                variant_id: kaos.id.clone(),
                new_quantity: 1,
                notes: None,
            })
            .await
            .unwrap();
        assert!(dashboard.low_stock().await.unwrap().is_empty());

        dashboard.invalidate().await;
        assert_eq!(dashboard.low_stock().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_keys_by_store() {
        let fx = testing::fixture().await;
        let kaos = testing::variant(&fx.office, "KOS-M", 10).await;
        let dashboard = fx.office.dashboard();

        fx.office
            .sales()
            .create_sale(delivered(&fx.store.id, &kaos.id, "INV-1"))
            .await
            .unwrap();

        let all = dashboard.sales_summary(march(), None).await.unwrap();
        let one = dashboard
            .sales_summary(march(), Some(&fx.store.id))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&all, &one));
        assert_eq!(one.store_id.as_deref(), Some(fx.store.id.as_str()));
        assert_eq!(
            dashboard.sales_summary(march(), Some("nope")).await.unwrap_err().code,
            crate::error::ErrorCode::ValidationError
        );
    }
}
