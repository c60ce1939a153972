//! Command-line surface. Grounded on `main.c`'s `option_entries` table and
//! `LICENSE_TEXT` constant in the original implementation.

use clap::Parser;

const LICENSE_TEXT: &str = "\
gdb-mcp-server: an MCP gateway for GDB debugging sessions.

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published
by the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program. If not, see <https://www.gnu.org/licenses/>.
";

/// An MCP server exposing GDB debugging sessions over stdio.
#[derive(Debug, Parser)]
#[command(name = "gdb-mcp-server", disable_version_flag = true)]
pub struct Cli {
    /// Print version information and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Print license information and exit.
    #[arg(short = 'l', long = "license")]
    pub license: bool,

    /// Path to the gdb binary to launch for each session.
    #[arg(short = 'g', long = "gdb-path", value_name = "PATH")]
    pub gdb_path: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn version_text() -> String {
        format!(
            "gdb-mcp-server {}\nCopyright (C) 2025 gdb-mcp-server contributors.\nLicense: AGPLv3+ (GNU Affero General Public License version 3 or later)\n<https://www.gnu.org/licenses/agpl-3.0.html>",
            env!("CARGO_PKG_VERSION")
        )
    }

    #[must_use]
    pub fn license_text() -> &'static str {
        LICENSE_TEXT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_gdb_path_short_and_long() {
        let cli = Cli::parse_from(["gdb-mcp-server", "-g", "/usr/bin/gdb"]);
        assert_eq!(cli.gdb_path.as_deref(), Some("/usr/bin/gdb"));
        let cli = Cli::parse_from(["gdb-mcp-server", "--gdb-path", "/usr/bin/gdb"]);
        assert_eq!(cli.gdb_path.as_deref(), Some("/usr/bin/gdb"));
    }

    #[test]
    fn version_and_license_flags_parse() {
        let cli = Cli::parse_from(["gdb-mcp-server", "-v"]);
        assert!(cli.version);
        let cli = Cli::parse_from(["gdb-mcp-server", "-l"]);
        assert!(cli.license);
    }
}
