//! MCP servers on the integrations page, and the tool tests run against them.
//!
//! Connecting a server is a short sequence that passes through `connecting`
//! before landing on `connected`. Testing a tool replays canned invocation
//! output into a [`ToolTest`] keyed `<server>-<tool>`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::script::LogLine;
use crate::target::Target;
use crate::types::{Lifecycle, McpStatus, TargetKind, ToolTestStatus};

const CONNECTED_LINES: &[&str] = &["[CONNECTED] Session established"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResource {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServer {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub status: McpStatus,
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub resources: Vec<McpResource>,
    /// Human-readable, e.g. `2m ago`. `None` while disconnected.
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub connection_log: Vec<LogLine>,
}

fn tool(name: &str, description: &str, params: &[(&str, &str, bool)]) -> McpTool {
    McpTool {
        name: name.to_string(),
        description: description.to_string(),
        parameters: params
            .iter()
            .map(|(n, k, r)| ToolParameter {
                name: n.to_string(),
                kind: k.to_string(),
                required: *r,
            })
            .collect(),
    }
}

fn resource(uri: &str, name: &str) -> McpResource {
    McpResource {
        uri: uri.to_string(),
        name: name.to_string(),
        mime_type: "application/json".to_string(),
    }
}

impl McpServer {
    #[allow(clippy::too_many_arguments)]
    fn fixture(
        id: &str,
        name: &str,
        description: &str,
        category: &str,
        status: McpStatus,
        tools: Vec<McpTool>,
        resources: Vec<McpResource>,
        last_sync: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            status,
            tools,
            resources,
            last_sync: last_sync.map(str::to_string),
            connection_log: Vec::new(),
        }
    }

    /// The servers listed on a fresh integrations page.
    pub fn seed() -> Vec<McpServer> {
        vec![
            Self::fixture(
                "netlify",
                "Netlify",
                "Deploy and host web applications with serverless functions",
                "Deployment",
                McpStatus::Connected,
                vec![
                    tool(
                        "deploy-site",
                        "Deploy a site to Netlify",
                        &[("siteId", "string", true), ("deployDirectory", "string", true)],
                    ),
                    tool("get-deploy", "Get deployment status", &[("deployId", "string", true)]),
                    tool("create-new-project", "Create a new Netlify project", &[("name", "string", true)]),
                    tool(
                        "manage-env-vars",
                        "Manage environment variables",
                        &[("siteId", "string", true), ("vars", "object", true)],
                    ),
                ],
                vec![
                    resource("netlify://sites", "All Sites"),
                    resource("netlify://deploys", "Recent Deploys"),
                ],
                Some("2m ago"),
            ),
            Self::fixture(
                "supabase",
                "Supabase",
                "Open source Firebase alternative with PostgreSQL database",
                "Database",
                McpStatus::Connected,
                vec![
                    tool(
                        "execute_sql",
                        "Execute SQL queries",
                        &[("query", "string", true), ("project_id", "string", true)],
                    ),
                    tool(
                        "apply_migration",
                        "Apply database migration",
                        &[("name", "string", true), ("query", "string", true)],
                    ),
                    tool(
                        "deploy_edge_function",
                        "Deploy edge function",
                        &[("name", "string", true), ("files", "array", true)],
                    ),
                    tool("list_tables", "List all database tables", &[("project_id", "string", true)]),
                    tool("get_logs", "Get service logs", &[("service", "string", true)]),
                ],
                vec![
                    resource("supabase://projects", "Projects"),
                    resource("supabase://functions", "Edge Functions"),
                ],
                Some("30s ago"),
            ),
            Self::fixture(
                "perplexity",
                "Perplexity AI",
                "AI-powered search and research assistant",
                "AI",
                McpStatus::Connected,
                vec![tool(
                    "perplexity_ask",
                    "Ask questions using Sonar API",
                    &[("messages", "array", true)],
                )],
                Vec::new(),
                Some("1m ago"),
            ),
            Self::fixture(
                "github",
                "GitHub",
                "Version control and code collaboration platform",
                "Development",
                McpStatus::Disconnected,
                vec![
                    tool("create_repo", "Create a new repository", &[("name", "string", true)]),
                    tool(
                        "create_pull_request",
                        "Create a pull request",
                        &[("title", "string", true), ("base", "string", true)],
                    ),
                    tool("list_issues", "List repository issues", &[("repo", "string", true)]),
                ],
                vec![resource("github://repos", "Repositories")],
                None,
            ),
            Self::fixture(
                "aws",
                "AWS",
                "Amazon Web Services cloud infrastructure",
                "Cloud",
                McpStatus::Error,
                vec![
                    tool("deploy_lambda", "Deploy Lambda function", &[("functionName", "string", true)]),
                    tool("manage_s3", "Manage S3 buckets", &[("bucket", "string", true)]),
                    tool("describe_ec2", "Describe EC2 instances", &[]),
                ],
                vec![
                    resource("aws://ec2", "EC2 Instances"),
                    resource("aws://s3", "S3 Buckets"),
                ],
                Some("Failed"),
            ),
        ]
    }

    pub fn tool(&self, name: &str) -> Option<&McpTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Drop the session. Allowed from any status.
    pub fn disconnect(&mut self) {
        self.status = McpStatus::Disconnected;
        self.last_sync = None;
    }
}

impl Target for McpServer {
    const KIND: TargetKind = TargetKind::McpServer;

    fn id(&self) -> &str {
        &self.id
    }

    fn lifecycle(&self) -> Lifecycle {
        self.status.lifecycle()
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn resolution_lines(&self) -> &'static [&'static str] {
        CONNECTED_LINES
    }

    fn sequence_log(&self) -> &[LogLine] {
        &self.connection_log
    }

    fn enter_in_progress(&mut self) {
        self.status = McpStatus::Connecting;
        self.connection_log.clear();
    }

    fn record(&mut self, line: LogLine, _emitted: usize, _total: usize) {
        self.connection_log.push(line);
    }

    fn resolve(&mut self, suffix: Vec<LogLine>) {
        self.status = McpStatus::Connected;
        self.last_sync = Some("now".to_string());
        self.connection_log.extend(suffix);
    }

    fn interrupt(&mut self) {
        self.disconnect();
    }
}

// ---------------------------------------------------------------------------
// ToolTest
// ---------------------------------------------------------------------------

/// Output of the most recent test invocation of one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTest {
    /// `<server>-<tool>`
    pub id: String,
    pub server_id: String,
    pub tool: String,
    pub status: ToolTestStatus,
    #[serde(default)]
    pub output: Vec<LogLine>,
}

impl ToolTest {
    pub fn id_for(server_id: &str, tool: &str) -> String {
        format!("{server_id}-{tool}")
    }

    pub fn new(server_id: &str, tool: &str) -> Self {
        Self {
            id: Self::id_for(server_id, tool),
            server_id: server_id.to_string(),
            tool: tool.to_string(),
            status: ToolTestStatus::Idle,
            output: Vec::new(),
        }
    }
}

impl Target for ToolTest {
    const KIND: TargetKind = TargetKind::ToolTest;

    fn id(&self) -> &str {
        &self.id
    }

    fn lifecycle(&self) -> Lifecycle {
        self.status.lifecycle()
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn resolution_lines(&self) -> &'static [&'static str] {
        &[]
    }

    fn sequence_log(&self) -> &[LogLine] {
        &self.output
    }

    fn enter_in_progress(&mut self) {
        self.status = ToolTestStatus::Running;
        self.output.clear();
    }

    fn record(&mut self, line: LogLine, _emitted: usize, _total: usize) {
        self.output.push(line);
    }

    fn resolve(&mut self, suffix: Vec<LogLine>) {
        self.status = ToolTestStatus::Succeeded;
        self.output.extend(suffix);
    }

    fn interrupt(&mut self) {
        self.status = ToolTestStatus::Cancelled;
    }

    /// A tool can be tested again after a run succeeds.
    fn begin(&mut self) -> Result<()> {
        self.enter_in_progress();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_statuses_match_integrations_page() {
        let seed = McpServer::seed();
        let statuses: Vec<McpStatus> = seed.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                McpStatus::Connected,
                McpStatus::Connected,
                McpStatus::Connected,
                McpStatus::Disconnected,
                McpStatus::Error,
            ]
        );
        assert_eq!(seed[1].tools.len(), 5);
        assert!(seed[4].tool("describe_ec2").unwrap().parameters.is_empty());
    }

    #[test]
    fn connected_server_cannot_reconnect() {
        let mut netlify = McpServer::seed().remove(0);
        assert!(netlify.begin().is_err());
    }

    #[test]
    fn errored_server_can_connect() {
        let mut aws = McpServer::seed().remove(4);
        aws.begin().unwrap();
        assert_eq!(aws.status, McpStatus::Connecting);
        aws.resolve(Vec::new());
        assert_eq!(aws.status, McpStatus::Connected);
        assert_eq!(aws.last_sync.as_deref(), Some("now"));
    }

    #[test]
    fn interrupted_connect_is_disconnected() {
        let mut github = McpServer::seed().remove(3);
        github.begin().unwrap();
        github.interrupt();
        assert_eq!(github.status, McpStatus::Disconnected);
        assert!(github.last_sync.is_none());
    }

    #[test]
    fn tool_test_reruns_after_success() {
        let mut t = ToolTest::new("supabase", "list_tables");
        assert_eq!(t.id, "supabase-list_tables");
        t.begin().unwrap();
        t.record(LogLine::now("> Invoking list_tables..."), 1, 1);
        t.resolve(Vec::new());
        assert_eq!(t.status, ToolTestStatus::Succeeded);

        t.begin().unwrap();
        assert_eq!(t.status, ToolTestStatus::Running);
        assert!(t.output.is_empty());
    }

    #[test]
    fn parameter_kind_serializes_as_type() {
        let json = serde_json::to_value(&McpServer::seed()[2].tools[0]).unwrap();
        assert_eq!(json["parameters"][0]["type"], "array");
    }
}
