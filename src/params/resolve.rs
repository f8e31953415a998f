//! Parameter resolution pipeline: declared parameters -> bound arguments.

use serde_json::Value;
use tracing::debug;

use super::convert::convert;
use super::dynamic::DynamicResolvers;
use super::upload::read_file_param;
use super::validate::{check_length, check_validation};
use super::value::{Arguments, ParamValue};
use crate::descriptor::{MethodDescriptor, ParameterDescriptor};
use crate::types::{DispatchConfig, Error, Result};
use crate::wire::{RequestContext, Response};

/// Resolves every declared parameter of a method, in declaration order.
#[derive(Debug)]
pub struct ParameterResolver<'a> {
    resolvers: &'a DynamicResolvers,
    config: &'a DispatchConfig,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(resolvers: &'a DynamicResolvers, config: &'a DispatchConfig) -> Self {
        Self { resolvers, config }
    }

    /// Bind all parameters. The first failure aborts the whole list.
    pub async fn resolve_all(
        &self,
        method: &MethodDescriptor,
        ctx: &mut RequestContext,
        response: &mut Response,
    ) -> Result<Arguments> {
        let mut args = Arguments::new(ctx.scope().clone());
        for param in method.parameters() {
            let value = self.resolve(param, ctx, response).await?;
            args.push(param.key(), value);
        }
        Ok(args)
    }

    /// Resolve one parameter.
    pub async fn resolve(
        &self,
        param: &ParameterDescriptor,
        ctx: &mut RequestContext,
        response: &mut Response,
    ) -> Result<ParamValue> {
        let value = match param.dynamic_name() {
            Some(name) => match self.resolvers.get(name) {
                Some(resolver) => resolver.resolve(ctx, response, name).await?,
                None if param.is_required() => {
                    return Err(Error::parameter_required(format!(
                        "Dynamic parameter '{}' is required",
                        param.key()
                    )));
                }
                None => {
                    debug!(key = %param.key(), "No resolver registered, using null");
                    ParamValue::Null
                }
            },
            None if param.is_file() => read_file_param(ctx, param, self.config).await?,
            None => self.resolve_static(param, ctx)?,
        };

        if param.is_required() && value.is_null() {
            return Err(Error::parameter_required(format!(
                "Parameter '{}' is required",
                param.key()
            )));
        }
        Ok(value)
    }

    fn resolve_static(&self, param: &ParameterDescriptor, ctx: &mut RequestContext) -> Result<ParamValue> {
        let mut raw = read_raw(param.key(), ctx)?;

        if let Some(value) = &raw {
            check_length(param, value)?;
        }
        if raw.is_none() {
            raw = param.default_value().map(str::to_string);
        }
        if let Some(value) = &raw {
            check_validation(param, value)?;
        }

        convert(param, raw)
    }
}

/// Raw textual value of a static parameter, taken from the source the
/// request's content type selects.
fn read_raw(key: &str, ctx: &mut RequestContext) -> Result<Option<String>> {
    if ctx.request().is_structured() {
        let body = ctx.json_body()?;
        return Ok(match body.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        });
    }
    if ctx.request().is_multipart() {
        return ctx.part_text(key);
    }
    Ok(ctx.request().param_value(key).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AccessPolicy, MethodSpec, ParamSpec};
    use crate::outcome::Fault;
    use crate::params::DynamicParameter;
    use crate::reply::Reply;
    use crate::wire::{Part, Request};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    async fn noop(_args: Arguments) -> std::result::Result<Reply, Fault> {
        Ok(Reply::Null)
    }

    fn method(params: Vec<ParamSpec>) -> MethodDescriptor {
        let spec = params
            .into_iter()
            .fold(MethodSpec::named("m", noop), |spec, p| spec.param(p));
        MethodDescriptor::build(spec, "s", &AccessPolicy::default()).unwrap()
    }

    struct Locale;

    #[async_trait]
    impl DynamicParameter for Locale {
        async fn resolve(&self, _ctx: &RequestContext, response: &mut Response, key: &str) -> Result<ParamValue> {
            response.set_header("X-Resolved", key);
            Ok(ParamValue::from("a-value-much-longer-than-any-limit"))
        }
    }

    async fn resolve(
        method: &MethodDescriptor,
        request: Request,
        resolvers: &DynamicResolvers,
    ) -> (Result<Arguments>, Response) {
        let config = DispatchConfig::default();
        let mut ctx = RequestContext::new(request);
        let mut response = Response::new();
        let result = ParameterResolver::new(resolvers, &config)
            .resolve_all(method, &mut ctx, &mut response)
            .await;
        (result, response)
    }

    #[tokio::test]
    async fn test_sources_by_content_type() {
        let m = method(vec![ParamSpec::text("name"), ParamSpec::int("limit")]);
        let resolvers = DynamicResolvers::new();

        let (args, _) = resolve(&m, Request::get("/s/m").param("name", "ali").param("limit", "3"), &resolvers).await;
        let args = args.unwrap();
        assert_eq!(args.text("name").unwrap(), Some("ali"));
        assert_eq!(args.int("limit").unwrap(), Some(3));

        let (args, _) = resolve(&m, Request::post("/s/m").json(&json!({"name": "ali", "limit": 3})), &resolvers).await;
        let args = args.unwrap();
        assert_eq!(args.int("limit").unwrap(), Some(3));

        let request = Request::post("/s/m").multipart(vec![Part::text("name", "ali")]);
        let (args, _) = resolve(&m, request, &resolvers).await;
        let args = args.unwrap();
        assert_eq!(args.text("name").unwrap(), Some("ali"));
        assert_eq!(args.int("limit").unwrap(), None);
    }

    #[tokio::test]
    async fn test_required_without_default() {
        let m = method(vec![ParamSpec::text("name").required()]);
        let (result, _) = resolve(&m, Request::get("/s/m"), &DynamicResolvers::new()).await;
        assert!(matches!(result, Err(Error::ParameterRequired(_))));
    }

    #[tokio::test]
    async fn test_default_is_validated_and_converted() {
        let m = method(vec![ParamSpec::int("limit").required().default_value("25")]);
        let (result, _) = resolve(&m, Request::get("/s/m"), &DynamicResolvers::new()).await;
        assert_eq!(result.unwrap().int("limit").unwrap(), Some(25));

        let m = method(vec![ParamSpec::uuid("id").default_value("not-a-uuid")]);
        let (result, _) = resolve(&m, Request::get("/s/m"), &DynamicResolvers::new()).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_too_long_from_any_source() {
        let m = method(vec![ParamSpec::text("name").max_length(3)]);
        let resolvers = DynamicResolvers::new();

        let (result, _) = resolve(&m, Request::get("/s/m").param("name", "abcd"), &resolvers).await;
        assert!(matches!(result, Err(Error::ParameterTooLong(_))));

        let (result, _) = resolve(&m, Request::post("/s/m").json(&json!({"name": "abcd"})), &resolvers).await;
        assert!(matches!(result, Err(Error::ParameterTooLong(_))));

        let request = Request::post("/s/m").multipart(vec![Part::text("name", "abcd")]);
        let (result, _) = resolve(&m, request, &resolvers).await;
        assert!(matches!(result, Err(Error::ParameterTooLong(_))));
    }

    #[tokio::test]
    async fn test_uuid_validation() {
        let m = method(vec![ParamSpec::uuid("id")]);
        let resolvers = DynamicResolvers::new();
        let id = uuid::Uuid::new_v4();

        let (result, _) = resolve(&m, Request::get("/s/m").param("id", id.to_string()), &resolvers).await;
        assert_eq!(result.unwrap().uuid("id").unwrap(), Some(id));

        let (result, _) = resolve(&m, Request::get("/s/m").param("id", "1234"), &resolvers).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_dynamic_parameters() {
        let mut resolvers = DynamicResolvers::new();
        resolvers.insert("locale", Arc::new(Locale));

        let m = method(vec![ParamSpec::dynamic("locale").max_length(1)]);
        let (result, response) = resolve(&m, Request::get("/s/m"), &resolvers).await;
        let args = result.unwrap();
        assert_eq!(args.text("$locale").unwrap(), Some("a-value-much-longer-than-any-limit"));
        assert_eq!(response.header("x-resolved"), Some("locale"));

        let m = method(vec![ParamSpec::dynamic("session").required()]);
        let (result, _) = resolve(&m, Request::get("/s/m"), &resolvers).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Dynamic parameter '$session' is required");

        let m = method(vec![ParamSpec::dynamic("session")]);
        let (result, _) = resolve(&m, Request::get("/s/m"), &resolvers).await;
        assert!(result.unwrap().get("$session").unwrap().is_null());
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let m = method(vec![
            ParamSpec::int("a"),
            ParamSpec::text("b").required(),
        ]);
        let (result, _) = resolve(&m, Request::get("/s/m").param("a", "x"), &DynamicResolvers::new()).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
