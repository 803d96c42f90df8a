use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    thread::{self, sleep},
    time::Duration,
};

use futures::{stream::FuturesUnordered, SinkExt, StreamExt};
use futures_channel::{mpsc, oneshot};

use crate::{
    builder::DiBuilder,
    container::DiContainer,
    dependency_graph::DependencyGraph,
    errors::{InitError, InjectError, RequireError},
    factories::{Dependency, ResolvedDependencies},
    lifecycle::{Hooks, ManagedInstance},
    provider::{Provider, ProviderSource},
    token::InjectionToken,
    types::{DynError, Instance},
};

/// Initiates the DiContainer
pub(crate) struct DiInitiator {
    request_rx: mpsc::Receiver<DiRequest>,
    request_tx: mpsc::Sender<DiRequest>,

    all_registered_tokens: HashSet<InjectionToken>,

    /// Waiters for instance results
    instance_waiters: HashMap<InjectionToken, Vec<DiResponseSender<Instance>>>,

    /// All produced instances
    instances: HashMap<InjectionToken, Instance>,
    /// Tokens in the order their instances became available
    construction_order: Vec<InjectionToken>,
    /// Hooks of all managed providers
    hooks: HashMap<InjectionToken, Hooks>,
}
impl DiInitiator {
    pub(crate) fn new() -> DiInitiator {
        let (injection_request_sender, injection_request_receiver) = mpsc::channel(10);
        DiInitiator {
            request_rx: injection_request_receiver,
            request_tx: injection_request_sender,
            all_registered_tokens: HashSet::new(),
            instance_waiters: HashMap::new(),
            instances: HashMap::new(),
            construction_order: Vec::new(),
            hooks: HashMap::new(),
        }
    }

    pub async fn initiate(
        mut self,
        blueprint: DiBuilder,
        timeout: Option<Duration>,
    ) -> Result<DiContainer, InitError> {
        // If we have a timeout - spawn a thread to signal once it's done
        // Otherwise hold on to the sender so the receiver never resolves
        let (timeout_tx, timeout_rx) = oneshot::channel::<()>();
        let _pending_timeout = match timeout {
            Some(timeout) => {
                // We don't join the thread - it will just die after the timeout
                thread::spawn(move || {
                    sleep(timeout);
                    let _ = timeout_tx.send(());
                });
                None
            }
            None => Some(timeout_tx),
        };

        // Build and check Graph
        let graph = DependencyGraph::new(&blueprint);
        graph.check()?;

        // Start initiating all Instances
        if let Err(e) = self.try_initiate(blueprint, timeout_rx).await {
            // On fail - inform all waiters
            let msg: Result<Instance, RequireError> = Err(e.clone().into());
            for (_, waiters) in self.instance_waiters {
                for waiter in waiters.into_iter() {
                    let _ = waiter.send(msg.clone());
                }
            }

            return Err(e);
        }

        let managed = self.managed_in_construction_order();
        run_init_hooks(&managed).await?;

        tracing::debug!(
            "Container initiated with {} instances, {} of them managed",
            self.instances.len(),
            managed.len()
        );

        Ok(DiContainer::new(self.instances, graph, managed))
    }

    /// Starts all registered factories and waits for them to complete
    async fn try_initiate(
        &mut self,
        blueprint: DiBuilder,
        mut timeout: oneshot::Receiver<()>,
    ) -> Result<(), InitError> {
        let DiBuilder { providers, .. } = blueprint;

        tracing::debug!("Initializing container with {} providers", providers.len());

        // ###############################################
        // Begin instantiation of all factories
        let mut factory_futures = FuturesUnordered::new();
        for provider in providers {
            let Provider {
                token,
                dependencies,
                source,
                hooks,
                ..
            } = provider;

            self.all_registered_tokens.insert(token);
            if let Some(hooks) = hooks {
                self.hooks.insert(token, hooks);
            }

            let factory = match source {
                // Values are ready right away
                ProviderSource::Value(instance) => {
                    self.instances.insert(token, instance);
                    self.construction_order.push(token);
                    continue;
                }
                ProviderSource::Factory(factory) => factory,
            };

            let mut handle = self.get_handle();
            let factory_future = async move {
                let result = async {
                    let resolved = handle.resolve_all(&dependencies).await?;
                    let instance = factory.construct(resolved).await?;

                    tracing::debug!(
                        "Constructed instance of {} for '{token}'",
                        instance.info.type_name
                    );
                    Ok::<_, DynError>(instance)
                }
                .await;

                (token, result)
            };

            factory_futures.push(factory_future);
        }

        // Start handling injection requests and wait for all factories to finish
        let factory_count = factory_futures.len();

        loop {
            let factories_left = factory_futures.len();
            tracing::debug!(
                "Waiting for factories to finish [{} of {factory_count} complete]",
                factory_count - factories_left
            );

            futures::select! {
                request = self.request_rx.select_next_some() => {
                    self.handle_injection_request(request);
                }
                result = factory_futures.next() => {
                    if self.handle_factory_result(result)? {
                        break;
                    }
                }
                _ = timeout => {
                    return Err(InitError::Timeout)
                }
            }
        }

        Ok(())
    }

    /// Handle the result of a factory future
    ///
    /// Returns true if complete
    fn handle_factory_result(
        &mut self,
        result: Option<(InjectionToken, Result<Instance, DynError>)>,
    ) -> Result<bool, InitError> {
        let (token, result) = match result {
            Some(result) => result,
            None => {
                // If no more tasks are left, exit the loop
                // all injection requests must now also be handled as nothing is left to be build
                debug_assert!(
                    self.instance_waiters.is_empty(),
                    "Not all waiters were satisfied"
                );
                return Ok(true);
            }
        };

        let instance = match result {
            Ok(instance) => instance,
            Err(err) => {
                // If one factory fails - abort DI
                tracing::error!("Factory for '{token}' failed: {err}");
                return Err(InitError::FactoryFailed {
                    token,
                    error: Arc::new(err),
                });
            }
        };

        // Add instance to results
        self.instances.insert(token, instance.clone());
        self.construction_order.push(token);

        // Inform all waiters with a result
        for waiter in self
            .instance_waiters
            .remove(&token)
            .into_iter()
            .flat_map(Vec::into_iter)
        {
            let _ = waiter.send(Ok(instance.clone()));
        }

        Ok(false)
    }

    fn managed_in_construction_order(&self) -> Vec<ManagedInstance> {
        self.construction_order
            .iter()
            .filter_map(|token| {
                let hooks = self.hooks.get(token)?;
                let instance = self.instances.get(token)?;
                Some(ManagedInstance {
                    token: *token,
                    hooks: *hooks,
                    instance: instance.clone(),
                })
            })
            .collect()
    }

    /// Get a handle to the DiInitiator
    ///
    /// The handle is only valid before and during Initiation.
    pub(crate) fn get_handle(&self) -> DiHandle {
        DiHandle {
            request_sender: self.request_tx.clone(),
        }
    }
}

/// Runs all init hooks in order
///
/// If one fails, the already initialised instances are destroyed again in reverse order
async fn run_init_hooks(managed: &[ManagedInstance]) -> Result<(), InitError> {
    for (position, instance) in managed.iter().enumerate() {
        tracing::debug!("Running init hook of '{}'", instance.token);

        let Err(error) = instance.init().await else {
            continue;
        };

        let error = InitError::HookFailed {
            token: instance.token,
            error: Arc::new(error),
        };
        tracing::error!("{error}");

        for initialised in managed[..position].iter().rev() {
            if let Err(destroy_error) = initialised.destroy().await {
                tracing::error!(
                    "Destroy hook of '{}' failed while rolling back: {destroy_error}",
                    initialised.token
                );
            }
        }

        return Err(error);
    }

    Ok(())
}

// Injection Request handlers
impl DiInitiator {
    fn handle_injection_request(&mut self, request: DiRequest) {
        match request {
            DiRequest::Require {
                token,
                response_channel,
            } => {
                self.handle_instance_require(token, response_channel);
            }
        }
    }

    fn handle_instance_require(
        &mut self,
        token: InjectionToken,
        response_channel: DiResponseSender<Instance>,
    ) {
        // Check if the token is registered
        if !self.all_registered_tokens.contains(&token) {
            tracing::debug!("Required an unregistered token: {token}");
            let _ = response_channel.send(Err(RequireError::TokenMissing(token)));
            return;
        }

        // Check if we already have a result
        if let Some(instance) = self.instances.get(&token) {
            let _ = response_channel.send(Ok(instance.clone()));
            return;
        }

        // Otherwise add the request to the waiters list
        self.instance_waiters
            .entry(token)
            .or_default()
            .push(response_channel);
    }
}

/// DI Handle for resolving dependencies of a factory.
/// The DI Handle is only valid during instantiation of the Container.
#[derive(Clone)]
pub(crate) struct DiHandle {
    request_sender: mpsc::Sender<DiRequest>,
}
impl DiHandle {
    pub async fn require(&mut self, token: InjectionToken) -> Result<Instance, InjectError> {
        let (tx, rx) = oneshot::channel();
        self.request_sender
            .send(DiRequest::Require {
                token,
                response_channel: tx,
            })
            .await?;

        Ok(rx.await??)
    }

    /// Resolves every dependency in order, waiting for factories which are not done yet
    pub async fn resolve_all(
        &mut self,
        dependencies: &[Dependency],
    ) -> Result<ResolvedDependencies, InjectError> {
        let mut entries = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let resolved = match self.require(dependency.token).await {
                Ok(instance) => Some(instance),
                Err(InjectError::RequireError(RequireError::TokenMissing(_)))
                    if dependency.optional =>
                {
                    None
                }
                Err(e) => return Err(e),
            };
            entries.push((*dependency, resolved));
        }

        Ok(ResolvedDependencies::new(entries))
    }
}

pub(crate) type DiResponseSender<For> = oneshot::Sender<Result<For, RequireError>>;

/// Requests between [DiHandle] and [DiInitiator]
pub(crate) enum DiRequest {
    /// Requires the instance registered for a token
    Require {
        token: InjectionToken,
        response_channel: DiResponseSender<Instance>,
    },
}
