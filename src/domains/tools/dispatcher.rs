//! Tool dispatch: lookup, validation, invocation, envelope.
//!
//! The dispatcher is the single entry point both transports use to run a tool.
//! It never returns an error to its caller: unknown tools, invalid arguments,
//! handler errors and handler panics all come back as failure envelopes.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use super::handlers::{ErrorCode, ToolOutput};
use super::registry::ToolRegistry;
use super::schema::{ValidationError, json_type_name};
use super::ToolError;

/// Routes tool invocations to their registered handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Invoke a tool with raw JSON arguments.
    ///
    /// `null` is treated as an empty argument object; any other non-object
    /// value is a type mismatch.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolOutput {
        match arguments {
            Value::Object(map) => self.invoke_map(name, map).await,
            Value::Null => self.invoke_map(name, Map::new()).await,
            other => {
                let err = ValidationError::TypeMismatch {
                    name: "arguments".to_string(),
                    expected: "object",
                    found: json_type_name(&other),
                };
                warn!("Rejected arguments for '{}': {}", name, err);
                ToolError::from(err).into()
            }
        }
    }

    /// Invoke a tool with an argument map.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn invoke_map(&self, name: &str, arguments: Map<String, Value>) -> ToolOutput {
        let Some(entry) = self.registry.resolve(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolError::unknown_tool(name).into();
        };

        let validated = match entry.descriptor.schema.validate(&arguments) {
            Ok(validated) => validated,
            Err(e) => {
                warn!("Invalid arguments for '{}': {}", name, e);
                return ToolError::from(e).into();
            }
        };

        info!("Invoking tool '{}' ({})", name, entry.group);

        let outcome = AssertUnwindSafe(entry.handler.handle(name, validated))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Tool '{}' failed: {}", name, e);
                ToolOutput::failure(format!("Tool execution error: {e}")).with_code(ErrorCode::HandlerFault)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Tool '{}' panicked: {}", name, message);
                ToolOutput::failure(format!("Tool execution error: {message}"))
                    .with_code(ErrorCode::HandlerFault)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handlers::CapabilityGroup;
    use crate::domains::tools::registry::ToolDescriptor;
    use crate::domains::tools::schema::{ParameterSchema, ParameterSpec};
    use crate::domains::tools::testing::EchoGroup;
    use serde_json::json;

    fn dispatcher_with(group: Arc<EchoGroup>) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry.register_group(group.clone()).unwrap();

        let handler: Arc<dyn CapabilityGroup> = group;
        registry
            .register(ToolDescriptor::new("fail", "Always fails", ParameterSchema::new()), handler.clone())
            .unwrap();
        registry
            .register(ToolDescriptor::new("panic", "Always panics", ParameterSchema::new()), handler.clone())
            .unwrap();
        registry
            .register(
                ToolDescriptor::new(
                    "pick",
                    "Pick a source",
                    ParameterSchema::new().param(
                        "source",
                        ParameterSpec::one_of(["public", "private"], "Source").with_default("public"),
                    ),
                ),
                handler,
            )
            .unwrap();

        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_echo_scenario() {
        let group = Arc::new(EchoGroup::default());
        let dispatcher = dispatcher_with(group.clone());

        let ok = dispatcher.invoke("echo", json!({ "msg": "hi" })).await;
        assert!(ok.is_success());
        assert_eq!(ok.data["echo"], "hi");

        let missing = dispatcher.invoke("echo", json!({})).await;
        assert!(!missing.is_success());
        assert_eq!(missing.code, Some(ErrorCode::MissingRequiredParameter));
        assert_eq!(group.calls(), 1, "handler must not run on validation failure");
    }

    #[tokio::test]
    async fn test_greet_receives_default() {
        let group = Arc::new(EchoGroup::default());
        let dispatcher = dispatcher_with(group.clone());

        let output = dispatcher.invoke("greet", json!({})).await;
        assert!(output.is_success());
        assert_eq!(group.last_args(), Some(json!({ "name": "Developer" })));
        assert_eq!(output.data["greeting"], "Hello, Developer!");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));
        let output = dispatcher.invoke("does_not_exist", json!({ "x": 1 })).await;
        assert!(!output.is_success());
        assert_eq!(output.code, Some(ErrorCode::UnknownTool));
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));
        let output = dispatcher.invoke("echo", json!({ "msg": 42 })).await;
        assert_eq!(output.code, Some(ErrorCode::TypeMismatch));

        let output = dispatcher.invoke("echo", json!(["hi"])).await;
        assert_eq!(output.code, Some(ErrorCode::TypeMismatch));
    }

    #[tokio::test]
    async fn test_enum_values() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));

        let bad = dispatcher.invoke("pick", json!({ "source": "internal" })).await;
        assert_eq!(bad.code, Some(ErrorCode::InvalidEnumValue));

        let good = dispatcher.invoke("pick", json!({ "source": "private" })).await;
        assert!(good.is_success());
        assert_eq!(good.data["source"], "private");

        let defaulted = dispatcher.invoke("pick", json!({})).await;
        assert_eq!(defaulted.data["source"], "public");
    }

    #[tokio::test]
    async fn test_handler_error_is_wrapped() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));
        let output = dispatcher.invoke("fail", Value::Null).await;
        assert!(!output.is_success());
        assert_eq!(output.code, Some(ErrorCode::HandlerFault));
        assert!(output.error.unwrap().contains("deliberate failure"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));
        let output = dispatcher.invoke("panic", json!({})).await;
        assert_eq!(output.code, Some(ErrorCode::HandlerFault));
        assert!(output.error.unwrap().contains("handler exploded"));

        // The dispatcher keeps working afterwards.
        assert!(dispatcher.invoke("echo", json!({ "msg": "still here" })).await.is_success());
    }

    #[tokio::test]
    async fn test_pure_tool_is_idempotent() {
        let dispatcher = dispatcher_with(Arc::new(EchoGroup::default()));
        let first = dispatcher.invoke("echo", json!({ "msg": "same" })).await;
        let second = dispatcher.invoke("echo", json!({ "msg": "same" })).await;
        assert_eq!(first, second);
    }
}
