use std::{sync::Arc, time::Duration};

use futures::{executor::block_on, FutureExt};
use tracing_subscriber::EnvFilter;
use wrapp_db::{
    AsyncClientOptions, ClientEvent, ClientEventKind, ClientLike, ClientModule, ClientOptions,
    ClientService, RawQuery, TransactionOptions,
};
use wrapp_di::{DiBuilder, DynError, InjectError, InjectionToken};

mod memory;

use memory::MemoryClient;

const DATABASE_URL: InjectionToken = InjectionToken::named("DATABASE_URL");

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    block_on(run())
}

async fn run() -> Result<(), DynError> {
    let options = AsyncClientOptions::from_factory(|dependencies| async move {
        let url = dependencies.get::<String>(0)?;
        Ok::<_, InjectError>(ClientOptions::new(move || Arc::new(MemoryClient::new(&url))))
    })
    .inject([DATABASE_URL]);

    let container = DiBuilder::new()
        .add_value(DATABASE_URL, "memory://demo".to_string())
        .import(ClientModule::<MemoryClient>::register_async(options))
        .build_timeout(Duration::from_secs(5))
        .await?;

    let service = container.require_type::<ClientService<MemoryClient>>()?;
    let client = service.client()?;
    client.on(
        &[ClientEventKind::Query, ClientEventKind::Info],
        Arc::new(|event: &ClientEvent| tracing::info!("{:?}: {}", event.kind, event.message)),
    );

    client.connect().await?;
    client
        .execute_raw(RawQuery::new("INSERT INTO users (name) VALUES ($1)").bind("ada"))
        .await?;
    client
        .transaction(
            |tx| {
                async move {
                    tx.insert(vec!["grace".into()]);
                    tx.insert(vec!["linus".into()]);
                    Ok(())
                }
                .boxed()
            },
            TransactionOptions::default(),
        )
        .await?;

    let rows = client.query_raw(RawQuery::new("SELECT name FROM users")).await?;
    tracing::info!("Fetched {} rows: {rows:?}", rows.len());

    container.shutdown().await?;
    if let Err(error) = service.client() {
        tracing::info!("After shutdown: {error}");
    }

    Ok(())
}
