//! Customer repository: records, derived balances and the legacy backfill.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use cemtrade_core::customer::{
    Customer, CustomerBalance, CustomerOwned, CustomerService, CustomerStatement, LegacyNameMatch,
    PaymentTransaction, SalesTransaction,
};
use cemtrade_shared::types::CustomerId;

use crate::error::RepositoryError;
use crate::records::{decode, encode, fetch, fetch_all, require};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Input for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct CreateCustomerInput {
    /// Display name.
    pub name: String,
    /// Contact number.
    pub phone: Option<String>,
    /// Registration date.
    pub register_date: Option<NaiveDate>,
    /// Opening balance, positive if the customer owes.
    pub opening_balance: Decimal,
    /// Date of the opening balance.
    pub opening_balance_date: Option<NaiveDate>,
    /// Free-form grouping.
    pub category: Option<String>,
}

/// Input for updating a customer's details. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerInput {
    /// New name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<Option<String>>,
    /// New category.
    pub category: Option<Option<String>>,
}

/// A sale or payment still referring to its customer by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    /// `sales` or `payments`.
    pub collection: Collection,
    /// Record id.
    pub id: Uuid,
    /// Customer name on the record.
    pub customer: String,
}

/// Outcome of [`CustomerRepository::backfill_customer_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Sales that received a `customerId`.
    pub sales_assigned: usize,
    /// Payments that received a `customerId`.
    pub payments_assigned: usize,
    /// Records whose name matches no customer.
    pub unmatched: Vec<LegacyRecord>,
    /// Records whose name matches several customers.
    pub ambiguous: Vec<LegacyRecord>,
}

impl BackfillReport {
    /// Total number of records that received an id.
    #[must_use]
    pub const fn assigned(&self) -> usize {
        self.sales_assigned + self.payments_assigned
    }
}

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    store: Arc<dyn EntityStore>,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Creates a customer.
    pub async fn create_customer(&self, input: CreateCustomerInput) -> Result<Customer, RepositoryError> {
        let customer = Customer {
            id: CustomerId::new(),
            name: input.name.trim().to_string(),
            phone: input.phone,
            register_date: input.register_date,
            opening_balance: input.opening_balance,
            opening_balance_date: input.opening_balance_date,
            category: input.category,
        };
        let mut batch = WriteBatch::new();
        batch.put(Collection::Customers, customer.id.into_inner(), encode(&customer)?);
        self.store.commit(batch).await?;

        info!(customer_id = %customer.id, name = %customer.name, "Created customer");
        Ok(customer)
    }

    /// Updates a customer's descriptive fields.
    pub async fn update_customer(
        &self,
        id: CustomerId,
        input: UpdateCustomerInput,
    ) -> Result<Customer, RepositoryError> {
        let mut customer = self.require_customer(id).await?;
        if let Some(name) = input.name {
            customer.name = name.trim().to_string();
        }
        if let Some(phone) = input.phone {
            customer.phone = phone;
        }
        if let Some(category) = input.category {
            customer.category = category;
        }

        let mut batch = WriteBatch::new();
        batch.put(Collection::Customers, id.into_inner(), encode(&customer)?);
        self.store.commit(batch).await?;

        info!(customer_id = %id, "Updated customer");
        Ok(customer)
    }

    /// Sets the opening balance and its date.
    pub async fn set_opening_balance(
        &self,
        id: CustomerId,
        opening_balance: Decimal,
        opening_balance_date: Option<NaiveDate>,
    ) -> Result<Customer, RepositoryError> {
        let mut customer = self.require_customer(id).await?;
        customer.opening_balance = opening_balance;
        customer.opening_balance_date = opening_balance_date;

        let mut batch = WriteBatch::new();
        batch.merge(
            Collection::Customers,
            id.into_inner(),
            json!({
                "openingBalance": opening_balance,
                "openingBalanceDate": opening_balance_date,
            }),
        );
        self.store.commit(batch).await?;

        info!(customer_id = %id, opening_balance = %opening_balance, "Set customer opening balance");
        Ok(customer)
    }

    /// Returns the customer, if it exists.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        fetch(self.store.as_ref(), Collection::Customers, id.into_inner()).await
    }

    /// Lists every customer in creation order.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        fetch_all(self.store.as_ref(), Collection::Customers).await
    }

    /// Derives the customer's current balance from the live collections.
    pub async fn customer_balance(&self, id: CustomerId) -> Result<CustomerBalance, RepositoryError> {
        let customer = self.require_customer(id).await?;
        let (sales, payments) = self.sales_and_payments().await?;
        Ok(CustomerService::compute_balance(&customer, &sales, &payments))
    }

    /// Derives every customer's balance.
    pub async fn customer_balances(&self) -> Result<Vec<CustomerBalance>, RepositoryError> {
        let customers = self.list_customers().await?;
        let (sales, payments) = self.sales_and_payments().await?;
        Ok(customers
            .iter()
            .map(|customer| CustomerService::compute_balance(customer, &sales, &payments))
            .collect())
    }

    /// Builds the customer's chronological statement.
    pub async fn statement(&self, id: CustomerId) -> Result<CustomerStatement, RepositoryError> {
        let customer = self.require_customer(id).await?;
        let (sales, payments) = self.sales_and_payments().await?;
        Ok(CustomerService::statement(&customer, &sales, &payments))
    }

    /// Assigns `customerId` to sales and payments that only carry a customer name.
    ///
    /// A record is assigned only when exactly one customer has its name; the
    /// rest are reported. All assignments land in one commit.
    pub async fn backfill_customer_ids(&self) -> Result<BackfillReport, RepositoryError> {
        let customers = self.list_customers().await?;
        let mut batch = WriteBatch::new();
        let mut report = BackfillReport::default();

        report.sales_assigned = self
            .backfill_collection::<SalesTransaction>(Collection::Sales, &customers, &mut batch, &mut report)
            .await?;
        report.payments_assigned = self
            .backfill_collection::<PaymentTransaction>(Collection::Payments, &customers, &mut batch, &mut report)
            .await?;
        self.store.commit(batch).await?;

        if !report.unmatched.is_empty() || !report.ambiguous.is_empty() {
            warn!(
                unmatched = report.unmatched.len(),
                ambiguous = report.ambiguous.len(),
                "Some legacy records could not be linked to a customer"
            );
        }
        info!(assigned = report.assigned(), "Backfilled customer ids");
        Ok(report)
    }

    async fn backfill_collection<T>(
        &self,
        collection: Collection,
        customers: &[Customer],
        batch: &mut WriteBatch,
        report: &mut BackfillReport,
    ) -> Result<usize, RepositoryError>
    where
        T: CustomerOwned + DeserializeOwned,
    {
        let mut assigned = 0;
        for raw in self.store.list(collection).await? {
            let Some(id) = raw.get("id").and_then(|id| id.as_str()).and_then(|id| Uuid::parse_str(id).ok()) else {
                continue;
            };
            let record: T = decode(raw)?;
            if record.customer_id().is_some() {
                continue;
            }
            let Some(name) = record.customer_name().map(str::to_string) else {
                continue;
            };

            match CustomerService::resolve_legacy_name(&name, customers) {
                LegacyNameMatch::Unique(customer_id) => {
                    batch.merge(collection, id, json!({ "customerId": customer_id }));
                    assigned += 1;
                }
                LegacyNameMatch::Ambiguous(_) => report.ambiguous.push(LegacyRecord {
                    collection,
                    id,
                    customer: name,
                }),
                LegacyNameMatch::Unmatched => report.unmatched.push(LegacyRecord {
                    collection,
                    id,
                    customer: name,
                }),
            }
        }
        Ok(assigned)
    }

    async fn require_customer(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        require(self.store.as_ref(), Collection::Customers, id.into_inner()).await
    }

    async fn sales_and_payments(
        &self,
    ) -> Result<(Vec<SalesTransaction>, Vec<PaymentTransaction>), RepositoryError> {
        Ok((
            fetch_all(self.store.as_ref(), Collection::Sales).await?,
            fetch_all(self.store.as_ref(), Collection::Payments).await?,
        ))
    }
}
