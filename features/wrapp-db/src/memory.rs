use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use futures::future::BoxFuture;
use wrapp_db::{
    ClientEvent, ClientEventKind, ClientLike, Disconnect, EventListener, Middleware,
    MiddlewareParams, QueryValue, RawQuery, TransactionOptions,
};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Client for '{0}' is not connected")]
    NotConnected(String),
    #[error("Middleware rejected '{action}': {reason}")]
    Rejected { action: String, reason: String },
}

type Record = Vec<QueryValue>;

/// Keeps every inserted row in a single table
pub struct MemoryClient {
    url: String,
    connected: Mutex<bool>,
    rows: Mutex<Vec<Record>>,
    listeners: Mutex<Vec<(Vec<ClientEventKind>, EventListener)>>,
    middlewares: Mutex<Vec<Middleware>>,
}

pub struct MemoryTransaction {
    pending: Mutex<Vec<Record>>,
}
impl MemoryTransaction {
    pub fn insert(&self, row: Record) {
        lock(&self.pending).push(row);
    }
}

impl MemoryClient {
    pub fn new(url: &str) -> Self {
        MemoryClient {
            url: url.to_string(),
            connected: Mutex::new(false),
            rows: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            middlewares: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, event: ClientEvent) {
        let listeners = lock(&self.listeners).clone();
        for (kinds, listener) in listeners {
            if kinds.contains(&event.kind) {
                listener(&event);
            }
        }
    }

    async fn run(&self, action: &str, sql: &str, params: &[QueryValue]) -> Result<u64, MemoryError> {
        if !*lock(&self.connected) {
            return Err(MemoryError::NotConnected(self.url.clone()));
        }

        let middlewares = lock(&self.middlewares).clone();
        for middleware in middlewares {
            let params = MiddlewareParams {
                model: None,
                action: action.to_string(),
                args: params.to_vec(),
                data_path: Vec::new(),
                run_in_transaction: false,
            };
            middleware(params)
                .await
                .map_err(|error| MemoryError::Rejected {
                    action: action.to_string(),
                    reason: error.to_string(),
                })?;
        }

        let started = Instant::now();
        let affected = if sql.trim_start().to_uppercase().starts_with("INSERT") {
            lock(&self.rows).push(params.to_vec());
            1
        } else {
            0
        };
        self.emit(ClientEvent {
            kind: ClientEventKind::Query,
            message: sql.to_string(),
            duration: Some(started.elapsed()),
        });
        Ok(affected)
    }

    fn info(&self, message: String) {
        self.emit(ClientEvent {
            kind: ClientEventKind::Info,
            message,
            duration: None,
        });
    }
}

impl Disconnect for MemoryClient {
    type Error = MemoryError;

    async fn disconnect(&self) -> Result<(), MemoryError> {
        *lock(&self.connected) = false;
        self.info(format!("Disconnected from {}", self.url));
        Ok(())
    }
}

impl ClientLike for MemoryClient {
    type Row = Record;
    type Transaction = MemoryTransaction;

    async fn connect(&self) -> Result<(), MemoryError> {
        *lock(&self.connected) = true;
        self.info(format!("Connected to {}", self.url));
        Ok(())
    }

    async fn transaction_batch<T: Send + 'static>(
        &self,
        operations: Vec<BoxFuture<'static, Result<T, Self::Error>>>,
        _options: TransactionOptions,
    ) -> Result<Vec<T>, Self::Error> {
        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            results.push(operation.await?);
        }
        Ok(results)
    }

    async fn transaction<R, F>(
        &self,
        operation: F,
        _options: TransactionOptions,
    ) -> Result<R, Self::Error>
    where
        R: Send + 'static,
        F: for<'tx> FnOnce(&'tx Self::Transaction) -> BoxFuture<'tx, Result<R, Self::Error>>
            + Send
            + 'static,
    {
        let transaction = MemoryTransaction {
            pending: Mutex::new(Vec::new()),
        };
        let result = operation(&transaction).await?;

        let pending = transaction
            .pending
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        lock(&self.rows).extend(pending);
        Ok(result)
    }

    fn on(&self, events: &[ClientEventKind], listener: EventListener) {
        lock(&self.listeners).push((events.to_vec(), listener));
    }

    fn use_middleware(&self, middleware: Middleware) {
        lock(&self.middlewares).push(middleware);
    }

    async fn query_raw(&self, query: RawQuery) -> Result<Vec<Self::Row>, Self::Error> {
        self.run("queryRaw", query.sql(), query.params()).await?;
        Ok(lock(&self.rows).clone())
    }

    async fn execute_raw(&self, query: RawQuery) -> Result<u64, Self::Error> {
        self.run("executeRaw", query.sql(), query.params()).await
    }

    async fn query_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> Result<Vec<Self::Row>, Self::Error> {
        self.run("queryRawUnchecked", sql, &params).await?;
        Ok(lock(&self.rows).clone())
    }

    async fn execute_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> Result<u64, Self::Error> {
        self.run("executeRawUnchecked", sql, &params).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
