//! Order orchestration
//!
//! Checkout pipeline: reserve stock → resolve coupon → price → mint the
//! order number → create the workflow record. Later status changes
//! (payment confirmation, fulfilment steps, cancellation) go through the
//! workflow engine only.

use super::events::{EVENT_CHANNEL_CAPACITY, StatusChanged};
use crate::pricing::{CouponBook, PricingEngine};
use crate::sequence::{MintError, SequenceMinter};
use crate::stock::{StockError, StockLedger, StockRequest};
use crate::storage::{CoreStorage, ORDERS_TABLE};
use crate::workflow::{WorkflowEngine, WorkflowError, WorkflowRecord};
use shared::models::{CustomerInfo, LineItem, OrderPayload, PriceBreakdown};
use shared::status::OrderStatus;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Identifier prefix for order numbers (public format contract)
pub const ORDER_PREFIX: &str = "ORD";

/// Checkout request from the (out-of-scope) cart UI
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
    pub coupon_code: Option<String>,
}

/// Returned to the customer after a successful checkout
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order_no: String,
    pub pricing: PriceBreakdown,
    /// Set when the supplied coupon code was unknown; the order went
    /// through with zero discount
    pub coupon_warning: Option<String>,
}

/// Checkout and order-management errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Mint(#[from] MintError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

pub type OrderResult<T> = Result<T, CheckoutError>;

/// Orchestrates order creation and lifecycle
#[derive(Debug, Clone)]
pub struct OrderService {
    minter: SequenceMinter,
    stock: StockLedger,
    pricing: PricingEngine,
    coupons: Arc<CouponBook>,
    orders: WorkflowEngine<OrderStatus, OrderPayload>,
    event_tx: broadcast::Sender<StatusChanged>,
}

impl OrderService {
    pub fn new(storage: CoreStorage, pricing: PricingEngine) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            minter: SequenceMinter::new(storage.clone()),
            stock: StockLedger::new(storage.clone()),
            pricing,
            coupons: Arc::new(CouponBook::new()),
            orders: WorkflowEngine::new(storage, ORDERS_TABLE),
            event_tx,
        }
    }

    /// Coupon registry (back-office seeding)
    pub fn coupons(&self) -> &CouponBook {
        &self.coupons
    }

    /// Stock ledger (catalog seeding and inspection)
    pub fn stock(&self) -> &StockLedger {
        &self.stock
    }

    /// Subscribe to status-change broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.event_tx.subscribe()
    }

    /// Turn a cart into a durable order
    ///
    /// Stock is reserved first; if minting or record creation fails
    /// afterwards, the reservation is rolled back. An unknown coupon code
    /// does not abort checkout: the order is priced with zero discount and
    /// the confirmation carries a warning.
    pub fn checkout(&self, request: CheckoutRequest) -> OrderResult<OrderConfirmation> {
        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let reservation: Vec<StockRequest> = request
            .items
            .iter()
            .map(|item| StockRequest::new(item.catalog_id.clone(), item.quantity))
            .collect();
        self.stock.reserve(&reservation)?;

        let (coupon, coupon_warning) = match request.coupon_code.as_deref() {
            None => (None, None),
            Some(code) => match self.coupons.resolve(code) {
                Ok(coupon) => (Some(coupon), None),
                Err(e) => {
                    tracing::warn!(code = %code, "Coupon rejected, pricing without discount");
                    (None, Some(e.to_string()))
                }
            },
        };

        let pricing = self.pricing.quote(&request.items, coupon.as_ref());

        let order_no = match self
            .minter
            .mint(ORDER_PREFIX, chrono::Utc::now().date_naive())
        {
            Ok(no) => no,
            Err(e) => {
                self.rollback_reservation(&reservation);
                return Err(e.into());
            }
        };

        let payload = OrderPayload {
            customer: request.customer,
            items: request.items,
            pricing: pricing.clone(),
            coupon_code: coupon.map(|c| c.code),
        };

        let record = match self.orders.create(&order_no, payload) {
            Ok(record) => record,
            Err(e) => {
                self.rollback_reservation(&reservation);
                return Err(e.into());
            }
        };

        self.emit(&record, None, None);
        tracing::info!(order_no = %order_no, total = pricing.total, "Order placed");
        Ok(OrderConfirmation {
            order_no,
            pricing,
            coupon_warning,
        })
    }

    /// Opaque "payment confirmed" signal from the gateway callback
    pub fn confirm_payment(
        &self,
        order_no: &str,
    ) -> OrderResult<WorkflowRecord<OrderStatus, OrderPayload>> {
        let record = self
            .orders
            .get(order_no)?
            .ok_or_else(|| WorkflowError::NotFound(order_no.to_string()))?;
        let updated = self.orders.transition(
            order_no,
            record.version,
            OrderStatus::Confirmed,
            Some("payment confirmed".to_string()),
            Some("payment-gateway".to_string()),
        )?;
        self.emit(&updated, None, None);
        Ok(updated)
    }

    /// Admin-driven status change
    ///
    /// `expected_version` is the version the admin UI displayed; a stale
    /// one surfaces `ConcurrentModification` so the admin can refresh.
    pub fn update_status(
        &self,
        order_no: &str,
        expected_version: u64,
        next: OrderStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> OrderResult<WorkflowRecord<OrderStatus, OrderPayload>> {
        let updated =
            self.orders
                .transition(order_no, expected_version, next, note.clone(), actor.clone())?;
        // Cancellation through this path releases stock too
        if updated.status == OrderStatus::Cancelled {
            self.release_order_stock(&updated);
        }
        self.emit(&updated, note, actor);
        Ok(updated)
    }

    /// Cancel an order and release its stock reservation
    pub fn cancel(
        &self,
        order_no: &str,
        note: Option<String>,
        actor: Option<String>,
    ) -> OrderResult<WorkflowRecord<OrderStatus, OrderPayload>> {
        let record = self
            .orders
            .get(order_no)?
            .ok_or_else(|| WorkflowError::NotFound(order_no.to_string()))?;
        let updated = self.orders.transition(
            order_no,
            record.version,
            OrderStatus::Cancelled,
            note.clone(),
            actor.clone(),
        )?;
        self.release_order_stock(&updated);
        self.emit(&updated, note, actor);
        Ok(updated)
    }

    /// Load an order by number
    pub fn get(
        &self,
        order_no: &str,
    ) -> OrderResult<Option<WorkflowRecord<OrderStatus, OrderPayload>>> {
        Ok(self.orders.get(order_no)?)
    }

    fn rollback_reservation(&self, reservation: &[StockRequest]) {
        if let Err(e) = self.stock.release(reservation) {
            tracing::error!(error = %e, "Failed to roll back stock reservation");
        }
    }

    /// Restore the stock reserved for a cancelled order
    ///
    /// The cancellation itself stands; a release failure is logged for
    /// operator attention.
    fn release_order_stock(&self, record: &WorkflowRecord<OrderStatus, OrderPayload>) {
        let reservation: Vec<StockRequest> = record
            .payload
            .items
            .iter()
            .map(|item| StockRequest::new(item.catalog_id.clone(), item.quantity))
            .collect();
        if let Err(e) = self.stock.release(&reservation) {
            tracing::error!(order_no = %record.id, error = %e, "Failed to release stock after cancellation");
        }
    }

    fn emit(
        &self,
        record: &WorkflowRecord<OrderStatus, OrderPayload>,
        note: Option<String>,
        actor: Option<String>,
    ) {
        // No subscribers is fine; notification delivery is optional
        let _ = self.event_tx.send(StatusChanged::new(
            &record.id,
            record.status.to_string(),
            note,
            actor,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingConfig;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
            email: None,
        }
    }

    fn service() -> OrderService {
        let storage = CoreStorage::open_in_memory().unwrap();
        let pricing = PricingEngine::new(PricingConfig {
            tax_rate_percent: 5.0,
            delivery_fee: 40.0,
            free_delivery_threshold: 200.0,
        });
        let service = OrderService::new(storage, pricing);
        service.stock().set_quantity("soap", 100).unwrap();
        service.stock().set_quantity("rice", 100).unwrap();
        service
            .coupons()
            .register(shared::models::Coupon::percentage("WELCOME10", 10.0, 100.0));
        service
    }

    fn cart() -> Vec<LineItem> {
        vec![
            LineItem::new("soap", "Soap", 40.0, 2),
            LineItem::new("rice", "Rice 5kg", 120.0, 1),
        ]
    }

    #[test]
    fn test_checkout_end_to_end_pricing() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: Some("WELCOME10".to_string()),
            })
            .unwrap();

        assert!(confirmation.order_no.starts_with("ORD"));
        assert_eq!(confirmation.pricing.subtotal, 200.0);
        assert_eq!(confirmation.pricing.discount, 20.0);
        assert_eq!(confirmation.pricing.tax, 10.0);
        assert_eq!(confirmation.pricing.delivery_fee, 0.0);
        assert_eq!(confirmation.pricing.total, 190.0);
        assert!(confirmation.coupon_warning.is_none());

        // Stock was decremented
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 98);
        assert_eq!(service.stock().quantity_of("rice").unwrap(), 99);

        // Record exists in the initial state with the authoritative total
        let record = service.get(&confirmation.order_no).unwrap().unwrap();
        assert_eq!(record.status, OrderStatus::Placed);
        assert_eq!(record.payload.pricing.total, 190.0);
        assert_eq!(record.payload.coupon_code.as_deref(), Some("WELCOME10"));
    }

    #[test]
    fn test_checkout_with_unknown_coupon_proceeds() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: Some("BOGUS".to_string()),
            })
            .unwrap();

        assert_eq!(confirmation.pricing.discount, 0.0);
        assert!(confirmation.coupon_warning.is_some());
    }

    #[test]
    fn test_checkout_insufficient_stock_reserves_nothing() {
        let service = service();
        let err = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: vec![
                    LineItem::new("soap", "Soap", 40.0, 5),
                    LineItem::new("rice", "Rice 5kg", 120.0, 1000),
                ],
                coupon_code: None,
            })
            .unwrap_err();

        match err {
            CheckoutError::Stock(StockError::Insufficient { shortages }) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].catalog_id, "rice");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 100);
        assert_eq!(service.stock().quantity_of("rice").unwrap(), 100);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let service = service();
        let err = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: vec![],
                coupon_code: None,
            })
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_payment_confirmation_and_fulfilment() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: None,
            })
            .unwrap();

        let record = service.confirm_payment(&confirmation.order_no).unwrap();
        assert_eq!(record.status, OrderStatus::Confirmed);
        assert_eq!(
            record.history.last().unwrap().actor.as_deref(),
            Some("payment-gateway")
        );

        let mut version = record.version;
        for status in [
            OrderStatus::Processing,
            OrderStatus::Packed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            let record = service
                .update_status(
                    &confirmation.order_no,
                    version,
                    status,
                    None,
                    Some("admin".to_string()),
                )
                .unwrap();
            version = record.version;
        }

        let record = service.get(&confirmation.order_no).unwrap().unwrap();
        assert_eq!(record.status, OrderStatus::Delivered);
        assert_eq!(record.history.len(), 6);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_cancel_releases_stock() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: None,
            })
            .unwrap();
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 98);

        let record = service
            .cancel(
                &confirmation.order_no,
                Some("customer request".to_string()),
                Some("support".to_string()),
            )
            .unwrap();
        assert_eq!(record.status, OrderStatus::Cancelled);
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 100);
        assert_eq!(service.stock().quantity_of("rice").unwrap(), 100);
    }

    #[test]
    fn test_update_status_cancellation_releases_stock() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: None,
            })
            .unwrap();
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 98);

        // Admin cancels through the generic passthrough, not cancel()
        let record = service.get(&confirmation.order_no).unwrap().unwrap();
        let updated = service
            .update_status(
                &confirmation.order_no,
                record.version,
                OrderStatus::Cancelled,
                Some("out of delivery area".to_string()),
                Some("admin".to_string()),
            )
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(service.stock().quantity_of("soap").unwrap(), 100);
        assert_eq!(service.stock().quantity_of("rice").unwrap(), 100);
    }

    #[test]
    fn test_delivered_order_cannot_be_cancelled() {
        let service = service();
        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: None,
            })
            .unwrap();

        let record = service.confirm_payment(&confirmation.order_no).unwrap();
        let mut version = record.version;
        for status in [
            OrderStatus::Processing,
            OrderStatus::Packed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            version = service
                .update_status(&confirmation.order_no, version, status, None, None)
                .unwrap()
                .version;
        }

        let err = service
            .cancel(&confirmation.order_no, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Workflow(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_status_events_broadcast() {
        let service = service();
        let mut rx = service.subscribe();

        let confirmation = service
            .checkout(CheckoutRequest {
                customer: customer(),
                items: cart(),
                coupon_code: None,
            })
            .unwrap();
        service.confirm_payment(&confirmation.order_no).unwrap();

        let placed = rx.try_recv().unwrap();
        assert_eq!(placed.record_id, confirmation.order_no);
        assert_eq!(placed.status, "placed");
        let confirmed = rx.try_recv().unwrap();
        assert_eq!(confirmed.status, "confirmed");
    }
}
