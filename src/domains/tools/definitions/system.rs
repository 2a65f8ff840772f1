//! System capability group: connectivity check and server status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::core::session::SessionTracker;
use crate::domains::tools::{
    CapabilityGroup, ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput,
    ValidatedArgs,
};

const FEATURES: [&str; 5] = [
    "filesystem management",
    "key/value cache",
    "page store",
    "documentation search",
    "system monitoring",
];

/// Handler for `hello_world` and `system_status`.
pub struct SystemTools {
    server_name: String,
    version: String,
    sessions: Arc<SessionTracker>,
    started_at: Instant,
}

impl SystemTools {
    pub const HELLO_WORLD: &'static str = "hello_world";
    pub const SYSTEM_STATUS: &'static str = "system_status";

    pub fn new(
        server_name: impl Into<String>,
        version: impl Into<String>,
        sessions: Arc<SessionTracker>,
        started_at: Instant,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            version: version.into(),
            sessions,
            started_at,
        }
    }

    fn hello_world(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let name = args.require_str("name")?;
        Ok(ToolOutput::from_json(json!({
            "message": format!("Hello, {}!", name),
            "server": format!("{} v{}", self.server_name, self.version),
            "status": "running",
            "uptime": format_uptime(self.started_at.elapsed()),
            "timestamp": Utc::now().to_rfc3339(),
            "features": FEATURES,
        })))
    }

    fn system_status(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let detailed = args.bool("detailed").unwrap_or(false);
        let uptime = self.started_at.elapsed();
        let stats = self.sessions.snapshot();

        let mut status = json!({
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "version": self.version,
            "uptime": uptime.as_secs(),
            "uptime_human": format_uptime(uptime),
            "active_sessions": stats.active,
            "sessions": stats,
            "info": format!(
                "Platform: {}\nVersion: {}\nUptime: {}\nActive sessions: {}",
                std::env::consts::OS,
                self.version,
                format_uptime(uptime),
                stats.active
            ),
        });

        if detailed {
            debug!("Collecting detailed system status");
            status["detailed"] = json!({
                "cpus": std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
                "family": std::env::consts::FAMILY,
                "environment": {
                    "pwd": std::env::current_dir().ok().map(|p| p.display().to_string()),
                    "pid": std::process::id(),
                    "executable": std::env::current_exe().ok().map(|p| p.display().to_string()),
                },
            });
        }

        Ok(ToolOutput::from_json(status))
    }
}

#[async_trait]
impl CapabilityGroup for SystemTools {
    fn name(&self) -> &'static str {
        "system"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                Self::HELLO_WORLD,
                "Check the connection to the server and greet the caller",
                ParameterSchema::new().param(
                    "name",
                    ParameterSpec::string("Name to greet").with_default("Developer"),
                ),
            ),
            ToolDescriptor::new(
                Self::SYSTEM_STATUS,
                "Report server and host status",
                ParameterSchema::new().param(
                    "detailed",
                    ParameterSpec::boolean("Include process and host details").with_default(false),
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        match tool {
            Self::HELLO_WORLD => self.hello_world(&args),
            Self::SYSTEM_STATUS => self.system_status(&args),
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

/// `"1h 2m 3s"`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::validated;

    fn tools() -> SystemTools {
        SystemTools::new("test-server", "1.2.3", Arc::new(SessionTracker::new()), Instant::now())
    }

    fn descriptor(group: &SystemTools, name: &str) -> ToolDescriptor {
        group.tools().into_iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(3723)), "1h 2m 3s");
        assert_eq!(format_uptime(Duration::from_secs(90061)), "25h 1m 1s");
    }

    #[tokio::test]
    async fn test_hello_world_default_name() {
        let group = tools();
        let args = validated(&descriptor(&group, SystemTools::HELLO_WORLD), json!({}));

        let output = group.handle(SystemTools::HELLO_WORLD, args).await.unwrap();

        assert_eq!(output.data["message"], "Hello, Developer!");
        assert_eq!(output.data["server"], "test-server v1.2.3");
        assert_eq!(output.data["features"].as_array().unwrap().len(), FEATURES.len());
    }

    #[tokio::test]
    async fn test_system_status_reports_sessions() {
        let group = tools();
        group.sessions.on_open();
        group.sessions.on_open();
        group.sessions.on_close();

        let args = validated(&descriptor(&group, SystemTools::SYSTEM_STATUS), json!({}));
        let output = group.handle(SystemTools::SYSTEM_STATUS, args).await.unwrap();

        assert_eq!(output.data["active_sessions"], 1);
        assert_eq!(output.data["sessions"]["total"], 2);
        assert!(output.data.get("detailed").is_none());
    }

    #[tokio::test]
    async fn test_system_status_detailed() {
        let group = tools();
        let args = validated(
            &descriptor(&group, SystemTools::SYSTEM_STATUS),
            json!({ "detailed": true }),
        );
        let output = group.handle(SystemTools::SYSTEM_STATUS, args).await.unwrap();

        assert_eq!(output.data["detailed"]["environment"]["pid"], std::process::id());
        assert!(output.data["detailed"]["cpus"].as_u64().unwrap() >= 1);
    }
}
