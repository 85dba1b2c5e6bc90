//! The transaction ledger: orchestrates validate → decrement → persist.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{ItemId, LineId, Money, ReceiptId};
use store::{AdjustOutcome, NewGroup, NewLine, RetailStore};

use crate::error::{LedgerError, Result};
use crate::reconcile::{PricedLine, SaleLine, StockReconciler};
use crate::unit_of_work::UnitOfWork;

const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PAYMENT_METHOD: &str = "cash";
const DEFAULT_CUSTOMER_NAME: &str = "N/A";

/// An incoming sale: optional receipt metadata plus the requested lines.
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub payment_method: Option<String>,
    pub customer_name: Option<String>,
    pub lines: Vec<SaleLine>,
}

/// A committed receipt as returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub receipt_id: ReceiptId,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub customer_name: String,
    pub lines: Vec<ReceiptLine>,
}

impl Receipt {
    /// Sum of the line totals, all captured at validation time.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.total_price).sum()
    }
}

/// One committed line of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity_sold: i64,
    pub total_price: Money,
}

/// Write side of the sales ledger.
///
/// `record_sale` is the one entry point that mutates stock, and it is safe
/// to call concurrently against overlapping item sets: the store's
/// conditional decrement keeps each item's quantity non-negative, and the
/// unit of work undoes every partial effect when any step fails.
pub struct LedgerService<S: RetailStore> {
    store: S,
    reconciler: StockReconciler<S>,
    commit_timeout: Duration,
}

impl<S: RetailStore + Clone> LedgerService<S> {
    /// Creates a ledger over the given store with the default commit timeout.
    pub fn new(store: S) -> Self {
        Self {
            reconciler: StockReconciler::new(store.clone()),
            store,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout applied to commit-phase store calls.
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }
}

impl<S: RetailStore> LedgerService<S> {
    /// Records a grouped sale: all lines commit together or not at all.
    ///
    /// Input is screened before any store access, then validated by the
    /// reconciler, then committed under a unit of work. Any commit-phase
    /// failure rolls back every mutation already applied, so an error
    /// return always means the store is unchanged.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn record_sale(&self, request: SaleRequest) -> Result<Receipt> {
        metrics::counter!("ledger_sales_total").increment(1);
        let started = std::time::Instant::now();

        if request.lines.is_empty() {
            metrics::counter!("ledger_sales_rejected_total").increment(1);
            return Err(LedgerError::EmptyReceipt);
        }
        for line in &request.lines {
            if line.quantity_sold <= 0 {
                metrics::counter!("ledger_sales_rejected_total").increment(1);
                return Err(LedgerError::InvalidQuantity {
                    item_id: line.item_id,
                    quantity: line.quantity_sold,
                });
            }
        }

        let priced = match self.reconciler.validate(&request.lines).await {
            Ok(priced) => priced,
            Err(e) => {
                metrics::counter!("ledger_sales_rejected_total").increment(1);
                return Err(e);
            }
        };

        let mut uow = UnitOfWork::new();
        match self.commit(&request, &priced, &mut uow).await {
            Ok(receipt) => {
                metrics::counter!("ledger_sales_committed_total").increment(1);
                metrics::histogram!("ledger_sale_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    receipt_id = %receipt.receipt_id,
                    lines = receipt.lines.len(),
                    total = %receipt.total(),
                    "sale committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "sale commit failed, rolling back");
                uow.rollback(&self.store).await;
                metrics::counter!("ledger_sales_failed_total").increment(1);
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        request: &SaleRequest,
        priced: &[PricedLine],
        uow: &mut UnitOfWork,
    ) -> Result<Receipt> {
        let group = self
            .timed(self.store.insert_group(NewGroup {
                public_id: ReceiptId::new(),
                date: Utc::now(),
                payment_method: request
                    .payment_method
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
                customer_name: request
                    .customer_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            }))
            .await?;
        uow.record_group(group.id);

        // Decrement in ascending item id order so receipts sharing items
        // always touch them in the same sequence.
        let mut decrement_order: Vec<usize> = (0..priced.len()).collect();
        decrement_order.sort_by_key(|&i| priced[i].item_id);

        for &i in &decrement_order {
            let line = &priced[i];
            match self
                .timed(self.store.adjust_quantity(line.item_id, -line.quantity_sold))
                .await?
            {
                AdjustOutcome::Adjusted { .. } => {
                    uow.record_decrement(line.item_id, line.quantity_sold);
                }
                // Another sale drained the stock between validate and
                // commit; surface it as the validation error it would have
                // been a moment later.
                AdjustOutcome::Conflict { available } => {
                    return Err(LedgerError::InsufficientStock {
                        item_id: line.item_id,
                        requested: line.quantity_sold,
                        available,
                    });
                }
                AdjustOutcome::NotFound => {
                    return Err(LedgerError::ItemNotFound(line.item_id));
                }
            }
        }

        // Lines persist in input order.
        let mut receipt_lines = Vec::with_capacity(priced.len());
        for line in priced {
            let record = self
                .timed(self.store.insert_line(NewLine {
                    group_id: group.id,
                    item_id: line.item_id,
                    quantity_sold: line.quantity_sold,
                    total_price: line.total_price,
                }))
                .await?;
            uow.record_line(record.id);
            receipt_lines.push(ReceiptLine {
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity_sold: line.quantity_sold,
                total_price: line.total_price,
            });
        }

        Ok(Receipt {
            receipt_id: group.public_id,
            date: group.date,
            payment_method: group.payment_method,
            customer_name: group.customer_name,
            lines: receipt_lines,
        })
    }

    /// Deletes a single sale line by id.
    ///
    /// The item's stock is deliberately not restored: sales are permanent
    /// and corrections are manual catalogue edits.
    #[tracing::instrument(skip(self))]
    pub async fn delete_line(&self, id: LineId) -> Result<()> {
        let line = self
            .store
            .get_line(id)
            .await?
            .ok_or(LedgerError::LineNotFound(id))?;

        if !self.store.delete_line(id).await? {
            return Err(LedgerError::LineNotFound(id));
        }

        metrics::counter!("ledger_lines_deleted_total").increment(1);
        tracing::info!(
            line_id = %id,
            item_id = %line.item_id,
            quantity_sold = line.quantity_sold,
            "sale line deleted; stock not restored"
        );
        Ok(())
    }

    /// Wraps a commit-phase store call in the configured timeout. A timeout
    /// is indistinguishable from any other persistence failure: the caller
    /// rolls back and reports.
    async fn timed<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = store::Result<T>>,
    {
        match tokio::time::timeout(self.commit_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(LedgerError::Persistence(e.to_string())),
            Err(_) => Err(LedgerError::Persistence(format!(
                "storage call timed out after {:?}",
                self.commit_timeout
            ))),
        }
    }
}
