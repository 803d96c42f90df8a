#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures::future::BoxFuture;
use wrapp_db::{
    ClientEvent, ClientEventKind, ClientLike, ClientOptions, Disconnect, EventListener,
    Middleware, MiddlewareParams, QueryValue, RawQuery, TransactionOptions,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FakeError {
    #[error("disconnect failed: {0}")]
    Disconnect(&'static str),
    #[error("query failed: {0}")]
    Query(String),
}

/// In memory client recording every call
#[derive(Default)]
pub struct FakeClient {
    pub url: String,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    disconnect_failures: Mutex<Vec<FakeError>>,
    statements: Mutex<Vec<String>>,
    listeners: Mutex<Vec<(Vec<ClientEventKind>, EventListener)>>,
    middlewares: Mutex<Vec<Middleware>>,
}

impl FakeClient {
    pub fn with_url(url: &str) -> Self {
        FakeClient {
            url: url.to_string(),
            ..FakeClient::default()
        }
    }

    pub fn failing_disconnect(reason: &'static str) -> Self {
        FakeClient {
            disconnect_failures: Mutex::new(vec![FakeError::Disconnect(reason)]),
            ..FakeClient::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn emit(&self, kind: ClientEventKind, message: &str) {
        let event = ClientEvent {
            kind,
            message: message.to_string(),
            duration: None,
        };
        let listeners = self.listeners.lock().unwrap().clone();
        for (kinds, listener) in listeners {
            if kinds.contains(&kind) {
                listener(&event);
            }
        }
    }

    async fn run(&self, action: &str, sql: &str, params: &[QueryValue]) -> Result<(), FakeError> {
        let middlewares = self.middlewares.lock().unwrap().clone();
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
                .map_err(|error| FakeError::Query(error.to_string()))?;
        }

        self.statements.lock().unwrap().push(sql.to_string());
        self.emit(ClientEventKind::Query, sql);
        Ok(())
    }
}

impl std::fmt::Debug for FakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeClient")
            .field("url", &self.url)
            .field("connects", &self.connects())
            .field("disconnects", &self.disconnects())
            .finish_non_exhaustive()
    }
}

/// Collects the statements of an interactive transaction
pub struct FakeTransaction {
    pub options: TransactionOptions,
    statements: Mutex<Vec<String>>,
}
impl FakeTransaction {
    pub fn execute(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }
}

impl Disconnect for FakeClient {
    type Error = FakeError;

    async fn disconnect(&self) -> Result<(), FakeError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        match self.disconnect_failures.lock().unwrap().pop() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl ClientLike for FakeClient {
    type Row = Vec<QueryValue>;
    type Transaction = FakeTransaction;

    async fn connect(&self) -> Result<(), FakeError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.emit(ClientEventKind::Info, "connected");
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
        options: TransactionOptions,
    ) -> Result<R, Self::Error>
    where
        R: Send + 'static,
        F: for<'tx> FnOnce(&'tx Self::Transaction) -> BoxFuture<'tx, Result<R, Self::Error>>
            + Send
            + 'static,
    {
        let transaction = FakeTransaction {
            options,
            statements: Mutex::new(Vec::new()),
        };

        let result = operation(&transaction).await;
        if result.is_ok() {
            let committed = transaction.statements.into_inner().unwrap();
            self.statements.lock().unwrap().extend(committed);
        }
        result
    }

    fn on(&self, events: &[ClientEventKind], listener: EventListener) {
        self.listeners
            .lock()
            .unwrap()
            .push((events.to_vec(), listener));
    }

    fn use_middleware(&self, middleware: Middleware) {
        self.middlewares.lock().unwrap().push(middleware);
    }

    async fn query_raw(&self, query: RawQuery) -> Result<Vec<Self::Row>, Self::Error> {
        self.run("queryRaw", query.sql(), query.params()).await?;
        Ok(vec![query.params().to_vec()])
    }

    async fn execute_raw(&self, query: RawQuery) -> Result<u64, Self::Error> {
        self.run("executeRaw", query.sql(), query.params()).await?;
        Ok(1)
    }

    async fn query_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> Result<Vec<Self::Row>, Self::Error> {
        self.run("queryRawUnchecked", sql, &params).await?;
        Ok(vec![params])
    }

    async fn execute_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> Result<u64, Self::Error> {
        self.run("executeRawUnchecked", sql, &params).await?;
        Ok(1)
    }
}

/// Options handing out `client` and counting factory calls
pub fn counting_options(client: &Arc<FakeClient>) -> (ClientOptions<FakeClient>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let options = ClientOptions::new({
        let client = client.clone();
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            client.clone()
        }
    });
    (options, calls)
}
