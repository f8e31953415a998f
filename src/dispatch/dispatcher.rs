//! Dispatcher: the per-request state machine.
//!
//! path -> service -> method -> verb -> permission gate -> parameters ->
//! (transaction) invoke -> encode. The first failure ends the request and is
//! encoded as an error envelope.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::router::RoutePath;
use crate::auth::{PermissionGate, PermissionValidator};
use crate::encoder::{encode_error, encode_reply};
use crate::params::{DynamicParameter, DynamicResolvers, ParameterResolver};
use crate::registry::Registry;
use crate::transaction::{TransactionWrapper, TransactionalResource};
use crate::types::{DispatchConfig, Error, Result};
use crate::wire::{Request, RequestContext, Response};

/// Routes requests to registered service methods.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    gate: PermissionGate,
    transactions: Option<TransactionWrapper>,
    resolvers: DynamicResolvers,
    config: DispatchConfig,
}

/// Builder for [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherBuilder {
    registry: Arc<Registry>,
    config: DispatchConfig,
    validator: Option<Arc<dyn PermissionValidator>>,
    resource: Option<Arc<dyn TransactionalResource>>,
    resolvers: DynamicResolvers,
}

impl DispatcherBuilder {
    pub fn config(mut self, config: &DispatchConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn permission_validator(mut self, validator: Arc<dyn PermissionValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn transactional_resource(mut self, resource: Arc<dyn TransactionalResource>) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Register the resolver for parameters keyed `$<name>`.
    pub fn dynamic_parameter(mut self, name: impl Into<String>, resolver: Arc<dyn DynamicParameter>) -> Self {
        self.resolvers.insert(name, resolver);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            gate: PermissionGate::new(self.config.validate_permissions, self.validator),
            transactions: self.resource.map(TransactionWrapper::new),
            registry: self.registry,
            resolvers: self.resolvers,
            config: self.config,
        }
    }
}

impl Dispatcher {
    pub fn builder(registry: Arc<Registry>) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            config: DispatchConfig::default(),
            validator: None,
            resource: None,
            resolvers: DynamicResolvers::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one request in a fresh context.
    pub async fn dispatch(&self, request: Request) -> Response {
        let mut ctx = RequestContext::new(request);
        self.dispatch_in(&mut ctx).await
    }

    /// Handle a request in a caller-provided context (to share a transaction
    /// scope or a cancellation token with the transport).
    pub async fn dispatch_in(&self, ctx: &mut RequestContext) -> Response {
        let started = Instant::now();
        let target = ctx.target();
        let mut response = Response::new();

        if let Err(e) = self.call(ctx, &mut response).await {
            encode_error(&target, &mut response, &e);
        }

        info!(
            request_id = %ctx.id(),
            target = %target,
            status = response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Call finished"
        );
        response
    }

    async fn call(&self, ctx: &mut RequestContext, response: &mut Response) -> Result<()> {
        let route = RoutePath::parse(ctx.request().path())?;

        let service = self.registry.service(&route.service).ok_or_else(|| {
            Error::unknown_service(format!("Service {} is not mapped", route.service))
        })?;
        let method = service.method(&route.method).ok_or_else(|| {
            Error::unknown_method(format!("Method {} is not mapped", route.method))
        })?;

        if !method.verbs().allows(ctx.request().verb()) {
            response.set_header("Allow", method.verbs().allow_header());
            return Err(Error::method_not_allowed(method.name(), method.verbs().clone()));
        }

        self.gate.check(ctx, method.policy()).await?;

        let args = ParameterResolver::new(&self.resolvers, &self.config)
            .resolve_all(method, ctx, response)
            .await?;

        info!(
            request_id = %ctx.id(),
            service = %service.name(),
            method = %method.name(),
            "Call {}.{}",
            service.name(),
            method.name()
        );

        let invocation = async { method.invoke(args).await.map_err(Error::from) };
        let reply = match (&self.transactions, method.is_transactioned()) {
            (Some(wrapper), true) => {
                wrapper
                    .run(ctx.scope(), ctx.cancellation(), invocation)
                    .await?
            }
            (None, true) => {
                warn!(
                    method = %method.name(),
                    "Method is transactioned but no transactional resource is configured"
                );
                invocation.await?
            }
            (_, false) => invocation.await?,
        };
        debug!(request_id = %ctx.id(), reply = reply.kind(), "Encoding reply");

        encode_reply(response, reply, method.ttl()).await
    }
}
