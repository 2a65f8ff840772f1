//! Page-store capability group (`notion_create_page`, `notion_update_page`).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

use crate::core::config::BackendKind;
use crate::domains::tools::{
    CapabilityGroup, ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput,
    ValidatedArgs,
};

/// A stored page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Document store behind the page tools.
#[async_trait]
pub trait PageStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn create(&self, parent_id: &str, title: &str, content: &str) -> Result<Page, ToolError>;

    async fn update(&self, page_id: &str, content: &str) -> Result<Page, ToolError>;
}

/// Backend that echoes requests back without storing anything.
#[derive(Debug, Default)]
pub struct StubPages;

#[async_trait]
impl PageStore for StubPages {
    fn kind(&self) -> BackendKind {
        BackendKind::Stub
    }

    async fn create(&self, parent_id: &str, title: &str, content: &str) -> Result<Page, ToolError> {
        let now = Utc::now().to_rfc3339();
        Ok(Page {
            id: "simulated-page".to_string(),
            parent_id: parent_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update(&self, page_id: &str, content: &str) -> Result<Page, ToolError> {
        let now = Utc::now().to_rfc3339();
        Ok(Page {
            id: page_id.to_string(),
            parent_id: String::new(),
            title: String::new(),
            content: content.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// In-process page store. Ids are `page-<n>`, assigned in creation order.
#[derive(Default)]
pub struct MemoryPages {
    pages: RwLock<HashMap<String, Page>>,
    next_id: AtomicU64,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }
}

#[async_trait]
impl PageStore for MemoryPages {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn create(&self, parent_id: &str, title: &str, content: &str) -> Result<Page, ToolError> {
        let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Utc::now().to_rfc3339();
        let page = Page {
            id: id.clone(),
            parent_id: parent_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.pages.write().await.insert(id, page.clone());
        Ok(page)
    }

    async fn update(&self, page_id: &str, content: &str) -> Result<Page, ToolError> {
        let mut pages = self.pages.write().await;
        let page = pages
            .get_mut(page_id)
            .ok_or_else(|| ToolError::execution_failed(format!("Page not found: {}", page_id)))?;
        page.content = content.to_string();
        page.updated_at = Utc::now().to_rfc3339();
        Ok(page.clone())
    }
}

/// Handler for the page tools.
pub struct PageTools {
    store: Arc<dyn PageStore>,
}

impl PageTools {
    pub const CREATE: &'static str = "notion_create_page";
    pub const UPDATE: &'static str = "notion_update_page";

    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    pub fn from_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Stub => Self::new(Arc::new(StubPages)),
            BackendKind::Memory => Self::new(Arc::new(MemoryPages::new())),
        }
    }

    fn simulated(&self) -> bool {
        self.store.kind() == BackendKind::Stub
    }

    async fn create(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let parent_id = args.require_str("parent_id")?;
        let title = args.require_str("title")?;
        let content = args.str("content").unwrap_or_default();

        let page = self.store.create(parent_id, title, content).await?;
        info!("Created page '{}' under '{}'", page.id, page.parent_id);

        let text = format!(
            "Page created\n\ntitle: {}\nparent: {}\ncontent: {}{}",
            page.title,
            page.parent_id,
            if page.content.is_empty() { "(empty)" } else { page.content.as_str() },
            if self.simulated() { "\n\n(simulated)" } else { "" }
        );
        Ok(ToolOutput::from_json(json!({
            "page": page,
            "simulated": self.simulated(),
            "text": text,
        })))
    }

    async fn update(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let page_id = args.require_str("page_id")?;
        let content = args.require_str("content")?;

        let page = self.store.update(page_id, content).await?;
        info!("Updated page '{}'", page.id);

        let text = format!(
            "Page updated\n\npage: {}\nnew content: {}{}",
            page.id,
            page.content,
            if self.simulated() { "\n\n(simulated)" } else { "" }
        );
        Ok(ToolOutput::from_json(json!({
            "page": page,
            "simulated": self.simulated(),
            "text": text,
        })))
    }
}

#[async_trait]
impl CapabilityGroup for PageTools {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                Self::CREATE,
                "Create a page under a parent page",
                ParameterSchema::new()
                    .param("parent_id", ParameterSpec::string("Id of the parent page").required())
                    .param("title", ParameterSpec::string("Page title").required())
                    .param("content", ParameterSpec::string("Initial page content")),
            ),
            ToolDescriptor::new(
                Self::UPDATE,
                "Replace the content of an existing page",
                ParameterSchema::new()
                    .param("page_id", ParameterSpec::string("Id of the page to update").required())
                    .param("content", ParameterSpec::string("New content").required()),
            ),
        ]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        match tool {
            Self::CREATE => self.create(&args).await,
            Self::UPDATE => self.update(&args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}
