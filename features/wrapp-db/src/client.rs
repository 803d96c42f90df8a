//! Capabilities a database client has to offer to be managed by [crate::ClientService].

use std::{fmt, future::Future, ops::Deref, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use wrapp_di::DynError;

/// The minimal capability the lifecycle service relies on
pub trait Disconnect: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Closes the connection to the database
    fn disconnect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Full set of operations a managed database client exposes
///
/// Any driver can be plugged in by implementing this trait, the lifecycle
/// service itself only ever calls [Disconnect::disconnect].
pub trait ClientLike: Disconnect {
    /// Row type returned by raw queries
    type Row: Send + 'static;
    /// Handle passed to interactive transactions
    type Transaction: Send + Sync;

    fn connect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Runs independent operations in a single transaction, returning their results in order
    fn transaction_batch<T: Send + 'static>(
        &self,
        operations: Vec<BoxFuture<'static, Result<T, Self::Error>>>,
        options: TransactionOptions,
    ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send;

    /// Runs `operation` with a transactional handle, committing if it succeeds
    fn transaction<R, F>(
        &self,
        operation: F,
        options: TransactionOptions,
    ) -> impl Future<Output = Result<R, Self::Error>> + Send
    where
        R: Send + 'static,
        F: for<'tx> FnOnce(&'tx Self::Transaction) -> BoxFuture<'tx, Result<R, Self::Error>>
            + Send
            + 'static;

    /// Subscribes to client events
    fn on(&self, events: &[ClientEventKind], listener: EventListener);

    /// Registers a middleware which runs before every operation
    fn use_middleware(&self, middleware: Middleware);

    /// Runs a parameterized query
    fn query_raw(
        &self,
        query: RawQuery,
    ) -> impl Future<Output = Result<Vec<Self::Row>, Self::Error>> + Send;

    /// Runs a parameterized statement, returning the number of affected rows
    fn execute_raw(&self, query: RawQuery) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Runs a query from a plain string, the caller is responsible for escaping
    fn query_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> impl Future<Output = Result<Vec<Self::Row>, Self::Error>> + Send;

    /// Runs a statement from a plain string, the caller is responsible for escaping
    fn execute_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Combines the client with the additional capabilities built by `extension`
    fn extend<E, F>(self: Arc<Self>, extension: F) -> Extended<Self, E>
    where
        Self: Sized,
        E: Send + Sync + 'static,
        F: FnOnce(&Arc<Self>) -> E,
    {
        let extension = extension(&self);
        Extended {
            client: self,
            extension,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Maximum time to wait for a connection to start the transaction
    pub max_wait: Option<Duration>,
    /// Maximum time the transaction may run before it is rolled back
    pub timeout: Option<Duration>,
    pub isolation_level: Option<IsolationLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
}
impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Snapshot => "SNAPSHOT",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}
impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A value bound to a query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}
impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}
impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}
impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}
impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}
impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}
impl From<Vec<u8>> for QueryValue {
    fn from(value: Vec<u8>) -> Self {
        QueryValue::Bytes(value)
    }
}
impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

/// SQL with separately bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuery {
    sql: String,
    params: Vec<QueryValue>,
}
impl RawQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        RawQuery {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<QueryValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[QueryValue] {
        &self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEventKind {
    Query,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct ClientEvent {
    pub kind: ClientEventKind,
    pub message: String,
    /// Set for query events
    pub duration: Option<Duration>,
}

pub type EventListener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// What a middleware gets to see of an operation
#[derive(Debug, Clone)]
pub struct MiddlewareParams {
    pub model: Option<String>,
    pub action: String,
    pub args: Vec<QueryValue>,
    pub data_path: Vec<String>,
    pub run_in_transaction: bool,
}

pub type Middleware =
    Arc<dyn Fn(MiddlewareParams) -> BoxFuture<'static, Result<(), DynError>> + Send + Sync>;

/// A client combined with extra capabilities
///
/// Derefs to the original client and is itself a [ClientLike], so it can be managed
/// in place of the client it extends.
pub struct Extended<C, E> {
    client: Arc<C>,
    extension: E,
}
impl<C, E> Extended<C, E> {
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }
}
impl<C, E> Deref for Extended<C, E> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl<C: Disconnect, E: Send + Sync + 'static> Disconnect for Extended<C, E> {
    type Error = C::Error;

    fn disconnect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.client.disconnect()
    }
}

impl<C: ClientLike, E: Send + Sync + 'static> ClientLike for Extended<C, E> {
    type Row = C::Row;
    type Transaction = C::Transaction;

    fn connect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.client.connect()
    }

    fn transaction_batch<T: Send + 'static>(
        &self,
        operations: Vec<BoxFuture<'static, Result<T, Self::Error>>>,
        options: TransactionOptions,
    ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send {
        self.client.transaction_batch(operations, options)
    }

    fn transaction<R, F>(
        &self,
        operation: F,
        options: TransactionOptions,
    ) -> impl Future<Output = Result<R, Self::Error>> + Send
    where
        R: Send + 'static,
        F: for<'tx> FnOnce(&'tx Self::Transaction) -> BoxFuture<'tx, Result<R, Self::Error>>
            + Send
            + 'static,
    {
        self.client.transaction(operation, options)
    }

    fn on(&self, events: &[ClientEventKind], listener: EventListener) {
        self.client.on(events, listener)
    }

    fn use_middleware(&self, middleware: Middleware) {
        self.client.use_middleware(middleware)
    }

    fn query_raw(
        &self,
        query: RawQuery,
    ) -> impl Future<Output = Result<Vec<Self::Row>, Self::Error>> + Send {
        self.client.query_raw(query)
    }

    fn execute_raw(&self, query: RawQuery) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        self.client.execute_raw(query)
    }

    fn query_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> impl Future<Output = Result<Vec<Self::Row>, Self::Error>> + Send {
        self.client.query_raw_unchecked(sql, params)
    }

    fn execute_raw_unchecked(
        &self,
        sql: &str,
        params: Vec<QueryValue>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        self.client.execute_raw_unchecked(sql, params)
    }
}
