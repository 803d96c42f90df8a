mod common;

use std::sync::{atomic::Ordering, Arc};

use common::{counting_options, FakeClient, FakeError};
use futures::executor::block_on;
use wrapp_di::{
    Dependency, DiBuilder, InitError, InjectError, InjectionToken, ModuleDescriptor, Provider,
};
use wrapp_db::{
    AsyncClientOptions, ClientModule, ClientOptions, ClientService, CLIENT_OPTIONS, NOT_INITIALIZED,
};

const TOKEN_A: InjectionToken = InjectionToken::named("TOKEN_A");
const DATABASE_URL: InjectionToken = InjectionToken::named("DATABASE_URL");

type Module = ClientModule<FakeClient>;

fn fixed_options(client: &Arc<FakeClient>) -> AsyncClientOptions<FakeClient> {
    let client = client.clone();
    AsyncClientOptions::from_sync_factory(move |_| {
        Ok::<_, InjectError>(ClientOptions::new(move || client.clone()))
    })
}

#[test]
fn module_exports_only_the_service() {
    let module = Module::register_async(fixed_options(&Arc::new(FakeClient::default())));

    assert_eq!(module.name(), "ClientModule");
    assert!(module.is_global());
    assert!(module.imports().is_empty());
    assert_eq!(module.exports(), &[Module::service_token()]);

    let tokens: Vec<_> = module.providers().iter().map(Provider::token).collect();
    assert_eq!(tokens, vec![*CLIENT_OPTIONS, Module::service_token()]);

    let service = module.provider(&Module::service_token()).unwrap();
    assert!(service.is_managed());
    assert_eq!(service.dependencies(), &[Dependency::required(*CLIENT_OPTIONS)]);

    let options = module.provider(&CLIENT_OPTIONS).unwrap();
    assert!(!options.is_managed());
    assert!(!module.exports_token(&CLIENT_OPTIONS));
}

#[test]
fn injected_tokens_become_dependencies_of_the_options() {
    let client = Arc::new(FakeClient::default());

    let module = Module::register_async(fixed_options(&client).inject([TOKEN_A]));
    let options = module.provider(&CLIENT_OPTIONS).unwrap();
    assert_eq!(options.dependencies(), &[Dependency::required(TOKEN_A)]);

    let module = Module::register_async(fixed_options(&client));
    let options = module.provider(&CLIENT_OPTIONS).unwrap();
    assert!(options.dependencies().is_empty());
}

#[test]
fn client_options_token_is_a_unique_symbol() {
    assert!(CLIENT_OPTIONS.is_symbol());
    assert!(CLIENT_OPTIONS.to_string().contains("CLIENT_OPTIONS"));
    assert_ne!(*CLIENT_OPTIONS, InjectionToken::symbol("CLIENT_OPTIONS"));
    assert_ne!(*CLIENT_OPTIONS, InjectionToken::named("CLIENT_OPTIONS"));
}

#[test]
fn container_creates_the_client_and_disconnects_it_on_shutdown() {
    block_on(async {
        let client = Arc::new(FakeClient::default());
        let (options, calls) = counting_options(&client);

        let container = DiBuilder::new()
            .import(Module::register_async(AsyncClientOptions::from_sync_factory(
                move |_| Ok::<_, InjectError>(options),
            )))
            .build()
            .await
            .unwrap();

        let resolved = container
            .require::<ClientOptions<FakeClient>>(&CLIENT_OPTIONS)
            .unwrap();
        assert!(Arc::ptr_eq(&resolved.create_client().unwrap(), &client));

        let service = container.require_type::<ClientService<FakeClient>>().unwrap();
        assert!(service.is_initialized());
        assert!(Arc::ptr_eq(&service.client().unwrap(), &client));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.connects(), 0);

        container.shutdown().await.unwrap();
        assert_eq!(client.disconnects(), 1);
        assert_eq!(service.client().unwrap_err().message(), NOT_INITIALIZED);

        container.shutdown().await.unwrap();
        assert_eq!(client.disconnects(), 1);
    })
}

#[test]
fn use_factory_receives_injected_values_from_imports() {
    block_on(async {
        let config = ModuleDescriptor::new("ConfigModule")
            .with_providers([Provider::value(
                DATABASE_URL,
                "postgres://localhost/app".to_string(),
            )])
            .with_exports([DATABASE_URL]);

        let options = AsyncClientOptions::from_factory(|dependencies| async move {
            let url = dependencies.get::<String>(0)?;
            Ok::<_, InjectError>(ClientOptions::new(move || {
                Arc::new(FakeClient::with_url(&url))
            }))
        })
        .inject([DATABASE_URL])
        .imports([config]);

        let container = DiBuilder::new()
            .import(Module::register_async(options))
            .build()
            .await
            .unwrap();

        let service = container.require_type::<ClientService<FakeClient>>().unwrap();
        assert_eq!(service.client().unwrap().url, "postgres://localhost/app");
    })
}

#[test]
fn optional_injected_value_may_be_absent() {
    block_on(async {
        let options = AsyncClientOptions::from_sync_factory(|dependencies| {
            let url = dependencies
                .get_optional::<String>(0)?
                .map(|url| url.to_string())
                .unwrap_or_else(|| "memory://".to_string());
            Ok::<_, InjectError>(ClientOptions::new(move || {
                Arc::new(FakeClient::with_url(&url))
            }))
        })
        .inject([Dependency::optional(DATABASE_URL)]);

        let container = DiBuilder::new()
            .import(Module::register_async(options))
            .build()
            .await
            .unwrap();

        let service = container.require_type::<ClientService<FakeClient>>().unwrap();
        assert_eq!(service.client().unwrap().url, "memory://");
    })
}

#[test]
fn missing_injected_value_fails_the_graph_check() {
    block_on(async {
        let options = fixed_options(&Arc::new(FakeClient::default())).inject([TOKEN_A]);

        let error = DiBuilder::new()
            .import(Module::register_async(options))
            .build()
            .await
            .unwrap_err();

        assert!(matches!(error, InitError::DependencyGraphError(_)));
        assert!(error.to_string().contains("TOKEN_A"));
    })
}

#[test]
fn failing_use_factory_aborts_startup() {
    block_on(async {
        let options = AsyncClientOptions::<FakeClient>::from_factory(|_| async {
            Err::<ClientOptions<FakeClient>, _>("config unavailable")
        });

        let error = DiBuilder::new()
            .import(Module::register_async(options))
            .build()
            .await
            .unwrap_err();

        let (token, error) = match error {
            InitError::FactoryFailed { token, error } => (token, error),
            other => panic!("expected a factory failure, got {other:?}"),
        };
        assert_eq!(token, *CLIENT_OPTIONS);
        assert_eq!(error.to_string(), "config unavailable");
    })
}

#[test]
fn failing_client_factory_aborts_startup() {
    block_on(async {
        let options = AsyncClientOptions::from_sync_factory(|_| {
            Ok::<_, InjectError>(ClientOptions::<FakeClient>::try_new(|| {
                Err::<Arc<FakeClient>, _>(FakeError::Query("refused".into()))
            }))
        });

        let error = DiBuilder::new()
            .import(Module::register_async(options))
            .build()
            .await
            .unwrap_err();

        let (token, error) = match error {
            InitError::HookFailed { token, error } => (token, error),
            other => panic!("expected a hook failure, got {other:?}"),
        };
        assert_eq!(token, Module::service_token());
        assert_eq!(
            error.downcast_ref::<FakeError>(),
            Some(&FakeError::Query("refused".into()))
        );
    })
}

#[test]
fn shutdown_reports_a_failing_disconnect() {
    block_on(async {
        let client = Arc::new(FakeClient::failing_disconnect("socket closed"));

        let container = DiBuilder::new()
            .import(Module::register_async(fixed_options(&client)))
            .build()
            .await
            .unwrap();
        let service = container.require_type::<ClientService<FakeClient>>().unwrap();

        let error = container.shutdown().await.unwrap_err();
        assert_eq!(error.failures.len(), 1);

        let (token, failure) = &error.failures[0];
        assert_eq!(*token, Module::service_token());
        assert_eq!(
            failure.downcast_ref::<FakeError>(),
            Some(&FakeError::Disconnect("socket closed"))
        );

        // the service keeps the client so the disconnect can be retried
        assert!(service.is_initialized());
        service.disconnect().await.unwrap();
        assert!(!service.is_initialized());
        assert_eq!(client.disconnects(), 2);
    })
}
