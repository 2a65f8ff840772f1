//! Test fixtures shared by the tools domain tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use super::handlers::{CapabilityGroup, ToolOutput};
use super::registry::ToolDescriptor;
use super::schema::{ParameterSchema, ParameterSpec, ValidatedArgs};
use super::ToolError;

pub fn echo_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "echo",
        "Echo a message back",
        ParameterSchema::new().param("msg", ParameterSpec::string("Message to echo").required()),
    )
}

pub fn greet_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "greet",
        "Greet someone",
        ParameterSchema::new().param(
            "name",
            ParameterSpec::string("Who to greet").with_default("Developer"),
        ),
    )
}

/// Group with `echo`, `greet`, `pick`, a failing tool and a panicking tool.
///
/// Only `echo` and `greet` are advertised; the others are registered by tests
/// that need them.
#[derive(Default)]
pub struct EchoGroup {
    pub calls: AtomicUsize,
    pub last_args: Mutex<Option<Value>>,
}

impl EchoGroup {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_args(&self) -> Option<Value> {
        self.last_args.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CapabilityGroup for EchoGroup {
    fn name(&self) -> &'static str {
        "test"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![echo_descriptor(), greet_descriptor()]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = Some(Value::Object(args.as_map().clone()));

        match tool {
            "echo" => Ok(ToolOutput::from_json(json!({ "echo": args.require_str("msg")? }))),
            "greet" => Ok(ToolOutput::from_json(json!({
                "greeting": format!("Hello, {}!", args.require_str("name")?)
            }))),
            "pick" => Ok(ToolOutput::from_json(json!({ "source": args.require_str("source")? }))),
            "fail" => Err(ToolError::execution_failed("deliberate failure")),
            "panic" => panic!("handler exploded"),
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

/// Validate `value` against a descriptor's schema, panicking on failure.
pub fn validated(descriptor: &ToolDescriptor, value: Value) -> ValidatedArgs {
    match value {
        Value::Object(map) => descriptor.schema.validate(&map).expect("arguments should validate"),
        _ => panic!("expected an argument object"),
    }
}
