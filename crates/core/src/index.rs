//! Transaction index: the ledger grouped per client.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::directory::Directories;
use crate::domain::task::DateRange;
use crate::domain::transaction::{RawTransaction, Transaction};

/// Everything the engine knows about one client for one evaluation pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClientAggregate {
    pub client_id: String,
    pub name: String,
    pub sphere: String,
    /// First non-empty manager seen in ledger order.
    pub manager: Option<String>,
    pub link: Option<String>,
    pub transactions: Vec<Transaction>,
}

impl ClientAggregate {
    pub fn total_revenue(&self) -> f64 {
        self.transactions.iter().map(|transaction| transaction.revenue).sum()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn last_date(&self) -> Option<NaiveDateTime> {
        self.transactions.iter().filter_map(|transaction| transaction.date).max()
    }

    pub fn first_date(&self) -> Option<NaiveDateTime> {
        self.transactions.iter().filter_map(|transaction| transaction.date).min()
    }

    /// Transactions whose product is in `products`.
    pub fn transactions_in<'a>(
        &'a self,
        products: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |transaction| products.contains(&transaction.product_code))
    }

    pub fn bought_any(&self, products: &BTreeSet<String>) -> bool {
        self.transactions_in(products).next().is_some()
    }
}

/// Per-client view of a ledger, keyed and iterated by client id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClientIndex {
    clients: BTreeMap<String, ClientAggregate>,
}

impl ClientIndex {
    /// Groups the ledger by client, skipping lines without a client id.
    pub fn build(ledger: &[RawTransaction], directories: &Directories) -> Self {
        Self::build_within(ledger, directories, None)
    }

    /// Same as [`ClientIndex::build`], keeping only lines dated inside `range`.
    pub fn build_within(
        ledger: &[RawTransaction],
        directories: &Directories,
        range: Option<&DateRange>,
    ) -> Self {
        let transactions = ledger.iter().filter_map(RawTransaction::normalize).filter(
            |transaction| match (range, transaction.date) {
                (None, _) => true,
                (Some(range), Some(date)) => range.contains(date),
                (Some(_), None) => false,
            },
        );

        Self::from_transactions(transactions, directories)
    }

    pub fn from_transactions(
        transactions: impl IntoIterator<Item = Transaction>,
        directories: &Directories,
    ) -> Self {
        let mut clients: BTreeMap<String, ClientAggregate> = BTreeMap::new();

        for transaction in transactions {
            let aggregate =
                clients.entry(transaction.client_id.clone()).or_insert_with(|| ClientAggregate {
                    client_id: transaction.client_id.clone(),
                    name: String::new(),
                    sphere: String::new(),
                    manager: None,
                    link: directories.link(&transaction.client_id).map(str::to_string),
                    transactions: Vec::new(),
                });

            if aggregate.name.is_empty() && !transaction.client_name.is_empty() {
                aggregate.name = transaction.client_name.clone();
            }
            if aggregate.sphere.is_empty() && !transaction.sphere.is_empty() {
                aggregate.sphere = transaction.sphere.clone();
            }
            if aggregate.manager.is_none() && !transaction.manager.is_empty() {
                aggregate.manager = Some(transaction.manager.clone());
            }
            aggregate.transactions.push(transaction);
        }

        for aggregate in clients.values_mut() {
            if aggregate.name.is_empty() {
                aggregate.name = directories.display_name(&aggregate.client_id).to_string();
            }
        }

        tracing::debug!(
            event_name = "index.build.completed",
            clients = clients.len(),
            "client index built"
        );

        Self { clients }
    }

    pub fn get(&self, client_id: &str) -> Option<&ClientAggregate> {
        self.clients.get(client_id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientAggregate> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
