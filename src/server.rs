//! MCP server: tool definitions using `rmcp` macros.
//!
//! Each tool below mirrors one `gdb_tools_handle_*` entry point of the
//! original implementation's `tools/gdb-tools-*.c` files: the same MI
//! command strings, the same success/error message templates, dispatched
//! against a named session instead of a singleton.

use crate::bridge;
use crate::error::GdbError;
use crate::registry::SessionRegistry;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::tool;
use rmcp::tool_handler;
use rmcp::tool_router;
use rmcp::{ErrorData as McpError, ServerHandler};

// ---------------------------------------------------------------------------
// Parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    /// Path to the `gdb` binary. Defaults to the server's configured path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdb_path: Option<String>,
    /// Working directory for the GDB process. Defaults to the server's cwd.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Per-command timeout in milliseconds. Defaults to 30000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdParams {
    pub session_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadParams {
    pub session_id: String,
    /// Path to the executable to debug.
    pub program: String,
    /// Arguments to pass to the program when it runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachParams {
    pub session_id: String,
    pub pid: i64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadCoreParams {
    pub session_id: String,
    pub program: String,
    pub core_path: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SteppingParams {
    pub session_id: String,
    /// Step by machine instruction rather than by source line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<bool>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointParams {
    pub session_id: String,
    /// A file:line, function name, or address.
    pub location: String,
    /// Optional condition expression (e.g. `i == 10`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BacktraceParams {
    pub session_id: String,
    /// Include full argument and local variable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,
    /// Limit the number of frames reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionParams {
    pub session_id: String,
    pub expression: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamineParams {
    pub session_id: String,
    pub expression: String,
    /// GDB `x` format letter (x, d, u, o, t, a, c, f, s, i). Defaults to `x`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Number of units to examine. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoRegistersParams {
    pub session_id: String,
    /// A single register name. Omit to list all registers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandParams {
    pub session_id: String,
    /// A literal GDB command, passed through unmodified.
    pub command: String,
}

// ---------------------------------------------------------------------------
// MCP server
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GdbMcpServer {
    registry: std::sync::Arc<SessionRegistry>,
    tool_router: ToolRouter<GdbMcpServer>,
}

impl GdbMcpServer {
    #[must_use]
    pub fn new(default_gdb_path: impl Into<String>) -> Self {
        Self {
            registry: std::sync::Arc::new(SessionRegistry::new(default_gdb_path)),
            tool_router: Self::tool_router(),
        }
    }

    /// Terminate every live session. Called on SIGINT/SIGTERM so no GDB
    /// subprocess outlives the server.
    pub async fn shutdown(&self) {
        self.registry.terminate_all().await;
    }

    /// Look up a session and run one command through the sync bridge,
    /// returning its raw MI text. The error variant is already a rendered
    /// tool result: an unresolved session gets the common "No active GDB
    /// session with ID: {id}" wording, and a command failure gets the
    /// "Failed to {action}: {message}" template every tool in the original
    /// (`gdb-tools-*.c`) uses, per spec §7.
    async fn run(
        &self,
        session_id: &str,
        command: &str,
        action: &str,
    ) -> Result<String, CallToolResult> {
        let session = self
            .registry
            .get(session_id)
            .await
            .ok_or_else(|| session_not_found(session_id))?;
        bridge::guarded(session.timeout_ms(), session.execute(command))
            .await
            .map_err(|e| failed(action, e))
    }
}

fn text(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(msg.into())]))
}

fn error_text(msg: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(msg.into())])
}

/// The "Failed to {action}: {message}" template shared by every tool that
/// wraps a command failure, per spec §7 and `gdb_tools_create_error_result`
/// call sites in the original's `tools/gdb-tools-*.c`.
fn failed(action: &str, e: GdbError) -> CallToolResult {
    error_text(format!("Failed to {action}: {e}"))
}

/// The common tool-boundary message for an unresolved `sessionId`, shared by
/// every tool (`gdb-tools-internal.h`/`gdb-tools-common.c` in the original).
fn session_not_found(session_id: &str) -> CallToolResult {
    error_text(format!("No active GDB session with ID: {session_id}"))
}

/// Pull the breakpoint number out of a `break` command's output, e.g.
/// "Breakpoint 3 at 0x4005d6: file main.c, line 12." -> `Some(3)`.
fn extract_breakpoint_number(output: &str) -> Option<i64> {
    let idx = output.find("Breakpoint")?;
    let rest = &output[idx + "Breakpoint".len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<i64>().ok()
}

#[tool_router]
impl GdbMcpServer {
    #[tool(
        description = "Start a new GDB debugging session. Returns a session ID used by every other gdb_* tool. Optionally pick a gdb binary, a working directory, and a per-command timeout."
    )]
    async fn gdb_start(
        &self,
        Parameters(params): Parameters<StartParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(gdb_path = ?params.gdb_path, "gdb_start");
        match self
            .registry
            .create_session(params.gdb_path.clone(), params.working_dir.clone(), params.timeout_ms)
            .await
        {
            Ok(session) => text(format!(
                "GDB session started successfully.\n\nSession ID: {}\nGDB Path: {}\nWorking Directory: {}",
                session.id(),
                session.gdb_path(),
                session.working_dir().unwrap_or("(current)"),
            )),
            Err(e) => Ok(failed("start GDB", e)),
        }
    }

    #[tool(description = "Terminate a GDB session and kill its subprocess.")]
    async fn gdb_terminate(
        &self,
        Parameters(params): Parameters<SessionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(session = %params.session_id, "gdb_terminate");
        if self.registry.remove(&params.session_id).await {
            text(format!("GDB session terminated: {}", params.session_id))
        } else {
            Ok(session_not_found(&params.session_id))
        }
    }

    #[tool(description = "List every active GDB session with its target program, state, and working directory.")]
    async fn gdb_list_sessions(&self) -> Result<CallToolResult, McpError> {
        let sessions = self.registry.list().await;
        if sessions.is_empty() {
            return text("No active sessions.");
        }
        let mut out = String::new();
        for s in sessions {
            out.push_str(&format!(
                "Session ID: {}\nTarget: {}\nState: {}\nWorking Directory: {}\n\n",
                s.id,
                s.target_program.as_deref().unwrap_or("(none)"),
                s.state.as_str(),
                s.working_dir.as_deref().unwrap_or("(default)"),
            ));
        }
        text(out)
    }

    #[tool(
        description = "Load a program into a GDB session for debugging. Accepts optional command-line arguments the program should run with."
    )]
    async fn gdb_load(
        &self,
        Parameters(params): Parameters<LoadParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let file_cmd = format!("file \"{}\"", params.program);
        let file_out = match bridge::guarded(session.timeout_ms(), session.execute(&file_cmd)).await {
            Ok(out) => out,
            Err(e) => return Ok(failed("load program", e)),
        };

        let mut args_out = String::new();
        if let Some(args) = &params.arguments {
            if !args.is_empty() {
                let set_args_cmd = format!("set args {}", args.join(" "));
                args_out = match bridge::guarded(session.timeout_ms(), session.execute(&set_args_cmd)).await {
                    Ok(out) => out,
                    Err(e) => return Ok(failed("load program", e)),
                };
            }
        }

        session.set_target_program(params.program.clone()).await;
        text(format!(
            "Program loaded: {}\n\nOutput:\n{}{}",
            params.program, file_out, args_out
        ))
    }

    #[tool(description = "Attach a GDB session to a running process by PID.")]
    async fn gdb_attach(
        &self,
        Parameters(params): Parameters<AttachParams>,
    ) -> Result<CallToolResult, McpError> {
        let cmd = format!("attach {}", params.pid);
        match self.run(&params.session_id, &cmd, "attach to process").await {
            Ok(out) => text(format!(
                "Attached to process {}\n\nOutput:\n{out}",
                params.pid
            )),
            Err(result) => Ok(result),
        }
    }

    #[tool(
        description = "Load a program and a core dump into a GDB session for post-mortem analysis. Reports an initial backtrace when available."
    )]
    async fn gdb_load_core(
        &self,
        Parameters(params): Parameters<LoadCoreParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let file_cmd = format!("file \"{}\"", params.program);
        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute(&file_cmd)).await {
            return Ok(failed("load program", e));
        }

        let core_cmd = format!("core-file \"{}\"", params.core_path);
        let core_out = match bridge::guarded(session.timeout_ms(), session.execute(&core_cmd)).await {
            Ok(out) => out,
            Err(e) => return Ok(failed("load core file", e)),
        };

        let backtrace = bridge::guarded(session.timeout_ms(), session.execute("backtrace"))
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());

        session.set_target_program(params.program.clone()).await;
        text(format!(
            "Program loaded: {}\n\nOutput:\n{core_out}\n\nInitial backtrace:\n{backtrace}",
            params.program
        ))
    }

    #[tool(description = "Resume execution of a stopped program until the next breakpoint, signal, or exit.")]
    async fn gdb_continue(
        &self,
        Parameters(params): Parameters<SessionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.run(&params.session_id, "continue", "continue").await {
            Ok(out) => text(format!("Continued execution.\n\nOutput:\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Step one source line (or, with instructions=true, one machine instruction), stepping into function calls.")]
    async fn gdb_step(
        &self,
        Parameters(params): Parameters<SteppingParams>,
    ) -> Result<CallToolResult, McpError> {
        let cmd = if params.instructions.unwrap_or(false) {
            "stepi"
        } else {
            "step"
        };
        match self.run(&params.session_id, cmd, "step").await {
            Ok(out) => text(format!("Stepped.\n\nOutput:\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Step one source line (or, with instructions=true, one machine instruction), stepping over function calls.")]
    async fn gdb_next(
        &self,
        Parameters(params): Parameters<SteppingParams>,
    ) -> Result<CallToolResult, McpError> {
        let cmd = if params.instructions.unwrap_or(false) {
            "nexti"
        } else {
            "next"
        };
        match self.run(&params.session_id, cmd, "step over").await {
            Ok(out) => text(format!("Stepped over.\n\nOutput:\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Run until the current function returns.")]
    async fn gdb_finish(
        &self,
        Parameters(params): Parameters<SessionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.run(&params.session_id, "finish", "finish").await {
            Ok(out) => text(format!("Finished current function.\n\nOutput:\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(
        description = "Set a breakpoint at a file:line, function name, or address, optionally conditioned on an expression."
    )]
    async fn gdb_set_breakpoint(
        &self,
        Parameters(params): Parameters<SetBreakpointParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let break_cmd = format!("break {}", params.location);
        let break_out = match bridge::guarded(session.timeout_ms(), session.execute(&break_cmd)).await {
            Ok(out) => out,
            Err(e) => return Ok(failed("set breakpoint", e)),
        };

        let mut condition_note = String::new();
        if let Some(condition) = &params.condition {
            if !condition.is_empty() {
                if let Some(bp_num) = extract_breakpoint_number(&break_out) {
                    let cond_cmd = format!("condition {bp_num} {condition}");
                    // A failing condition command is not fatal to the breakpoint itself.
                    let _ = bridge::guarded(session.timeout_ms(), session.execute(&cond_cmd)).await;
                    condition_note = format!(" (condition: {condition})");
                }
            }
        }

        text(format!(
            "Breakpoint set at: {}{}\n\nOutput:\n{}",
            params.location, condition_note, break_out
        ))
    }

    #[tool(
        description = "Print a backtrace of the current call stack. Set full=true for local variables and arguments, and limit to cap the number of frames."
    )]
    async fn gdb_backtrace(
        &self,
        Parameters(params): Parameters<BacktraceParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut cmd = "backtrace".to_string();
        let mut suffix = String::new();
        if params.full.unwrap_or(false) {
            cmd.push_str(" full");
            suffix.push_str(" (full)");
        }
        if let Some(limit) = params.limit {
            cmd.push_str(&format!(" {limit}"));
            suffix.push_str(&format!(" (limit: {limit})"));
        }
        match self.run(&params.session_id, &cmd, "get backtrace").await {
            Ok(out) => text(format!("Backtrace{suffix}:\n\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Print the value of an expression in the current frame.")]
    async fn gdb_print(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        let cmd = format!("print {}", params.expression);
        match self.run(&params.session_id, &cmd, "print expression").await {
            Ok(out) => text(format!("Print {}:\n\n{out}", params.expression)),
            Err(result) => Ok(result),
        }
    }

    #[tool(
        description = "Examine raw memory at an address or expression, using GDB's `x` command format letters (x, d, u, o, t, a, c, f, s, i)."
    )]
    async fn gdb_examine(
        &self,
        Parameters(params): Parameters<ExamineParams>,
    ) -> Result<CallToolResult, McpError> {
        let format = params.format.clone().unwrap_or_else(|| "x".to_string());
        let count = params.count.unwrap_or(1);
        let cmd = format!("x/{count}{format} {}", params.expression);
        match self.run(&params.session_id, &cmd, "examine memory").await {
            Ok(out) => text(format!(
                "Examine {} (format: {format}, count: {count}):\n\n{out}",
                params.expression
            )),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Show CPU register values, optionally limited to a single named register.")]
    async fn gdb_info_registers(
        &self,
        Parameters(params): Parameters<InfoRegistersParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut cmd = "info registers".to_string();
        let mut suffix = String::new();
        if let Some(reg) = &params.register {
            if !reg.is_empty() {
                cmd.push(' ');
                cmd.push_str(reg);
                suffix = format!(" ({reg})");
            }
        }
        match self.run(&params.session_id, &cmd, "get register info").await {
            Ok(out) => text(format!("Register info{suffix}:\n\n{out}")),
            Err(result) => Ok(result),
        }
    }

    #[tool(description = "Send a literal GDB command and return its raw output. Escape hatch for anything not covered by a dedicated tool.")]
    async fn gdb_command(
        &self,
        Parameters(params): Parameters<CommandParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.run(&params.session_id, &params.command, "execute command").await {
            Ok(out) => text(format!("Command: {}\n\nOutput:\n{out}", params.command)),
            Err(result) => Ok(result),
        }
    }

    #[tool(
        description = "Pretty-print a GObject*: its dynamic type name, reference count, and raw struct contents."
    )]
    async fn gdb_glib_print_gobject(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        let expr = &params.expression;
        let type_cmd = format!("print g_type_name(G_OBJECT_TYPE({expr}))");
        let refcount_cmd = format!("print ((GObject*)({expr}))->ref_count");
        let raw_cmd = format!("print *({expr})");

        let type_out = self
            .run(&params.session_id, &type_cmd, "print GObject")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());
        let refcount_out = self
            .run(&params.session_id, &refcount_cmd, "print GObject")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());
        let raw_out = self
            .run(&params.session_id, &raw_cmd, "print GObject")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());

        text(format!(
            "GObject at {expr}:\n\nType:\n{type_out}\nReference count:\n{refcount_out}\nRaw contents:\n{raw_out}"
        ))
    }

    #[tool(
        description = "Walk a GLib GList/GSList starting at an expression, printing up to 20 node contents."
    )]
    async fn gdb_glib_print_glist(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        const MAX_ITEMS: usize = 20;
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let init_cmd = format!("set $glist_iter = (GList*)({})", params.expression);
        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute(&init_cmd)).await {
            return Ok(failed("print GList", e));
        }

        let mut out = String::new();
        for i in 0..MAX_ITEMS {
            let check = bridge::guarded(session.timeout_ms(), session.execute("print $glist_iter"))
                .await
                .unwrap_or_default();
            if check.contains("(nil)") || check.trim_end().ends_with("0x0") {
                break;
            }
            let data = bridge::guarded(
                session.timeout_ms(),
                session.execute("print $glist_iter->data"),
            )
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());
            out.push_str(&format!("[{i}] {data}"));
            let advance = bridge::guarded(
                session.timeout_ms(),
                session.execute("set $glist_iter = $glist_iter->next"),
            )
            .await;
            if advance.is_err() {
                break;
            }
        }

        if out.is_empty() {
            out.push_str("(empty list)\n");
        }
        text(format!("GList at {}:\n\n{out}", params.expression))
    }

    #[tool(
        description = "Summarize a GLib GHashTable: its allocated size, node count, and raw struct contents."
    )]
    async fn gdb_glib_print_ghash(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        let expr = &params.expression;
        let size_cmd = format!("print ((GHashTable*)({expr}))->size");
        let nnodes_cmd = format!("print ((GHashTable*)({expr}))->nnodes");
        let raw_cmd = format!("print *((GHashTable*)({expr}))");

        let size_out = self
            .run(&params.session_id, &size_cmd, "print GHashTable")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());
        let nnodes_out = self
            .run(&params.session_id, &nnodes_cmd, "print GHashTable")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());
        let raw_out = self
            .run(&params.session_id, &raw_cmd, "print GHashTable")
            .await
            .unwrap_or_else(|_| "(unavailable)".to_string());

        text(format!(
            "GHashTable at {expr}:\n\nSize:\n{size_out}\nEntries (nnodes):\n{nnodes_out}\nRaw contents:\n{raw_out}\n\nNote: to enumerate entries, use gdb_command with a call to g_hash_table_foreach and a breakpoint-based callback."
        ))
    }

    #[tool(
        description = "Walk a GType's parent chain from an instance or type expression, printing an indented hierarchy up to 20 levels deep."
    )]
    async fn gdb_glib_type_hierarchy(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        const MAX_DEPTH: usize = 20;
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let init_cmd = format!("set $gtype = G_OBJECT_TYPE({})", params.expression);
        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute(&init_cmd)).await {
            return Ok(failed("walk type hierarchy", e));
        }

        let mut out = String::new();
        for depth in 0..MAX_DEPTH {
            let name = bridge::guarded(session.timeout_ms(), session.execute("print g_type_name($gtype)"))
                .await
                .unwrap_or_else(|_| "(unavailable)".to_string());
            let indent = "  ".repeat(depth);
            let connector = if depth == 0 { "" } else { "\u{2514}\u{2500} " };
            out.push_str(&format!("{indent}{connector}{name}"));
            if name.contains("\"\"") || name.contains("G_TYPE_INVALID") {
                break;
            }
            let advance = bridge::guarded(
                session.timeout_ms(),
                session.execute("set $gtype = g_type_parent($gtype)"),
            )
            .await;
            if advance.is_err() {
                break;
            }
        }

        text(format!("Type hierarchy of {}:\n\n{out}", params.expression))
    }

    #[tool(
        description = "List the signal names registered on a GObject's GType, resolved via g_signal_list_ids, up to 50 signals."
    )]
    async fn gdb_glib_signal_info(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, McpError> {
        const MAX_SIGNALS: usize = 50;
        let session = match self.registry.get(&params.session_id).await {
            Some(s) => s,
            None => return Ok(session_not_found(&params.session_id)),
        };

        let type_cmd = format!("set $gtype = G_OBJECT_TYPE({})", params.expression);
        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute(&type_cmd)).await {
            return Ok(failed("list signal info", e));
        }

        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute("set $n_ids = 0")).await {
            return Ok(failed("list signal info", e));
        }

        let call_cmd = "call $signal_ids = g_signal_list_ids($gtype, &$n_ids)".to_string();
        if let Err(e) = bridge::guarded(session.timeout_ms(), session.execute(&call_cmd)).await {
            return Ok(failed("list signal info", e));
        }

        let mut out = String::new();
        for i in 0..MAX_SIGNALS {
            let name_cmd = format!("print g_signal_name($signal_ids[{i}])");
            match bridge::guarded(session.timeout_ms(), session.execute(&name_cmd)).await {
                Ok(name) if !name.contains("(nil)") => out.push_str(&format!("[{i}] {name}")),
                _ => break,
            }
        }

        if out.is_empty() {
            out.push_str("(no signals found)\n");
        }
        text(format!("Signals on {}:\n\n{out}", params.expression))
    }
}

#[tool_handler]
impl ServerHandler for GdbMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gdb-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "gdb-mcp-server drives GDB debugging sessions over the Machine Interface (MI) \
                 protocol. Call gdb_start to launch a session and get a session_id, then pass \
                 that session_id to every other tool. Typical flow: gdb_start -> gdb_load (or \
                 gdb_attach / gdb_load_core) -> gdb_set_breakpoint -> gdb_continue -> gdb_backtrace \
                 / gdb_print / gdb_examine / gdb_info_registers to inspect state, gdb_step / \
                 gdb_next / gdb_finish to advance -> gdb_terminate when done. gdb_command sends a \
                 literal GDB command for anything not covered by a dedicated tool. The gdb_glib_* \
                 tools pretty-print common GLib/GObject structures (GObject, GList, GHashTable, \
                 GType hierarchies, and signal registries) when debugging a GLib-based program."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_breakpoint_number_from_output() {
        assert_eq!(
            extract_breakpoint_number("Breakpoint 3 at 0x4005d6: file main.c, line 12."),
            Some(3)
        );
        assert_eq!(extract_breakpoint_number("no number here"), None);
    }

    #[tokio::test]
    async fn gdb_terminate_on_unknown_session_reports_not_found() {
        let server = GdbMcpServer::new("gdb");
        let result = server
            .gdb_terminate(Parameters(SessionIdParams {
                session_id: "nope".into(),
            }))
            .await
            .unwrap();
        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(t) => t.text.clone(),
            other => panic!("unexpected content: {other:?}"),
        };
        assert!(text.contains("No active GDB session"));
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn gdb_list_sessions_on_empty_registry_reports_none() {
        let server = GdbMcpServer::new("gdb");
        let result = server.gdb_list_sessions().await.unwrap();
        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(t) => t.text.clone(),
            other => panic!("unexpected content: {other:?}"),
        };
        assert_eq!(text, "No active sessions.");
    }
}
