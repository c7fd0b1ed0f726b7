//! Parser for `uv tool list --show-paths --show-version-specifiers
//! --show-with --show-extras` output.
//!
//! The report is a sequence of header lines, each followed by the tool's
//! executables:
//!
//! ```text
//! black v23.1.0 [required: >=23,<24] [extras: jupyter] [with: click, mypy] (/home/me/.local/share/uv/tools/black)
//! - black (/home/me/.local/bin/black)
//! - blackd (/home/me/.local/bin/blackd)
//! ruff v0.5.0 (/home/me/.local/share/uv/tools/ruff)
//! - ruff (/home/me/.local/bin/ruff)
//! ```
//!
//! Parsing is total: a line that does not fit is skipped and never aborts
//! the rest of the report.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::uv::types::{Executable, ManagedTool};

/// Prefix marking an executable line.
const EXECUTABLE_PREFIX: &str = "- ";

/// Diagnostic prefixes `uv` may interleave with the report.
const NOISE_PREFIXES: &[&str] = &["warning:", "hint:"];

/// `<name> v<version>`; version allows `.postN` and an `a1`/`rc2` suffix.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) v(\d+(?:\.\d+)*(?:\.post\d+)?(?:[a-z]+\d+)?)")
        .expect("valid header regex")
});

/// `<executable-name> (<path>)`
static EXECUTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \((.+)\)$").expect("valid executable regex"));

// ============================================================================
// Header Extractor Rules
// ============================================================================

/// A value pulled out of a header line by one [`ExtractorRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    InstallPath(String),
    VersionSpecifier(String),
    Extras(Vec<String>),
    WithPackages(Vec<String>),
}

impl HeaderField {
    fn apply(self, tool: &mut ManagedTool) {
        match self {
            Self::InstallPath(path) => tool.install_path = path,
            Self::VersionSpecifier(spec) => tool.required_version_specifier = Some(spec),
            Self::Extras(extras) => tool.extras = extras,
            Self::WithPackages(packages) => tool.with_packages = packages,
        }
    }
}

/// One independent, optional extraction applied to every header line.
pub struct ExtractorRule {
    pub name: &'static str,
    pattern: LazyLock<Regex>,
    build: fn(&str) -> HeaderField,
}

impl ExtractorRule {
    /// Runs the rule against `line`; `None` when the segment is absent.
    pub fn extract(&self, line: &str) -> Option<HeaderField> {
        let caps = self.pattern.captures(line)?;
        let value = caps.get(1)?.as_str();
        Some((self.build)(value))
    }
}

/// Rules in application order. Each one reads the same line; none depends
/// on another having matched.
pub static HEADER_RULES: [ExtractorRule; 4] = [
    ExtractorRule {
        name: "install_path",
        pattern: LazyLock::new(|| Regex::new(r"\(([^)]+)\)$").expect("valid path regex")),
        build: |v| HeaderField::InstallPath(v.to_string()),
    },
    ExtractorRule {
        name: "required",
        pattern: LazyLock::new(|| {
            Regex::new(r"\[required: ([^\]]+)\]").expect("valid required regex")
        }),
        build: |v| HeaderField::VersionSpecifier(v.to_string()),
    },
    ExtractorRule {
        name: "extras",
        pattern: LazyLock::new(|| Regex::new(r"\[extras: ([^\]]+)\]").expect("valid extras regex")),
        build: |v| HeaderField::Extras(split_list(v)),
    },
    ExtractorRule {
        name: "with",
        pattern: LazyLock::new(|| Regex::new(r"\[with: ([^\]]+)\]").expect("valid with regex")),
        build: |v| HeaderField::WithPackages(split_list(v)),
    },
];

/// Splits `a, b, c` keeping declared order and casing.
fn split_list(value: &str) -> Vec<String> {
    value.split(", ").map(str::to_string).collect()
}

// ============================================================================
// Line Parsing
// ============================================================================

enum Line<'a> {
    Skip,
    Executable(&'a str),
    Header(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || NOISE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return Line::Skip;
    }
    match line.strip_prefix(EXECUTABLE_PREFIX) {
        Some(rest) => Line::Executable(rest.trim()),
        None => Line::Header(line.trim_end()),
    }
}

/// Parses a header line into a tool with no executables yet.
///
/// Returns `None` when the line does not start with `<name> v<version>`.
pub fn parse_header(line: &str) -> Option<ManagedTool> {
    let caps = HEADER.captures(line)?;
    let mut tool = ManagedTool::new(caps.get(1)?.as_str(), caps.get(2)?.as_str());

    for rule in &HEADER_RULES {
        if let Some(field) = rule.extract(line) {
            field.apply(&mut tool);
        }
    }

    Some(tool)
}

/// Parses the part of an executable line after the `- ` prefix.
pub fn parse_executable(line: &str) -> Option<Executable> {
    let caps = EXECUTABLE.captures(line)?;
    Some(Executable {
        name: caps.get(1)?.as_str().to_string(),
        path: caps.get(2)?.as_str().to_string(),
    })
}

/// Converts a full listing report into tools, in report order.
pub fn parse_tool_listing(text: &str) -> Vec<ManagedTool> {
    let mut tools = Vec::new();
    let mut current: Option<ManagedTool> = None;

    for line in text.lines() {
        match classify(line) {
            Line::Skip => {}
            Line::Executable(rest) => {
                let Some(tool) = current.as_mut() else {
                    debug!(line, "Dropping executable line with no open tool");
                    continue;
                };
                match parse_executable(rest) {
                    Some(executable) => tool.executables.push(executable),
                    None => debug!(line, "Skipping unparseable executable line"),
                }
            }
            Line::Header(header) => {
                if let Some(tool) = current.take() {
                    tools.push(tool);
                }
                current = parse_header(header);
                if current.is_none() {
                    debug!(line, "Skipping unparseable header line");
                }
            }
        }
    }

    if let Some(tool) = current {
        tools.push(tool);
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LISTING: &str = "\
black v23.1.0 [required: >=23,<24] [extras: jupyter] [with: click, mypy] (/home/me/.local/share/uv/tools/black)
- black (/home/me/.local/bin/black)
- blackd (/home/me/.local/bin/blackd)
httpie v3.2.2.post1 (/home/me/.local/share/uv/tools/httpie)
- http (/home/me/.local/bin/http)
- https (/home/me/.local/bin/https)
ruff v0.5.0 (/home/me/.local/share/uv/tools/ruff)
- ruff (/home/me/.local/bin/ruff)
";

    fn names(tools: &[ManagedTool]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_tool_with_executable() {
        let tools = parse_tool_listing("ruff v0.5.0 (/path/ruff)\n- ruff (/path/bin/ruff)\n");

        assert_eq!(tools.len(), 1);
        let ruff = &tools[0];
        assert_eq!(ruff.name, "ruff");
        assert_eq!(ruff.version, "0.5.0");
        assert_eq!(ruff.install_path, "/path/ruff");
        assert_eq!(
            ruff.executables,
            vec![Executable {
                name: "ruff".to_string(),
                path: "/path/bin/ruff".to_string(),
            }]
        );
    }

    #[test]
    fn test_bracketed_metadata() {
        let tools = parse_tool_listing(
            "black v23.1.0 [required: >=23,<24] [extras: jupyter] [with: click, mypy]\n",
        );

        assert_eq!(tools.len(), 1);
        let black = &tools[0];
        assert_eq!(black.required_version_specifier.as_deref(), Some(">=23,<24"));
        assert_eq!(black.extras, vec!["jupyter"]);
        assert_eq!(black.with_packages, vec!["click", "mypy"]);
        assert_eq!(black.install_path, "");
    }

    #[test]
    fn test_noise_lines_do_not_disturb_parsing() {
        let text = "warning: deprecated flag\nruff v0.5.0 (/path/ruff)\nhint: try --help\n- ruff (/path/bin/ruff)\n";
        let tools = parse_tool_listing(text);

        assert_eq!(names(&tools), vec!["ruff"]);
        assert_eq!(tools[0].executables.len(), 1);
    }

    #[test]
    fn test_full_listing_preserves_order() {
        let tools = parse_tool_listing(FULL_LISTING);

        assert_eq!(names(&tools), vec!["black", "httpie", "ruff"]);
        let black_exes: Vec<&str> = tools[0].executables.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(black_exes, vec!["black", "blackd"]);
        assert_eq!(tools[1].version, "3.2.2.post1");
        let httpie_exes: Vec<&str> = tools[1].executables.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(httpie_exes, vec!["http", "https"]);
        assert_eq!(tools[2].executables.len(), 1);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        assert_eq!(parse_tool_listing(FULL_LISTING), parse_tool_listing(FULL_LISTING));
    }

    #[test]
    fn test_count_matches_valid_headers_only() {
        let text = "\
- orphan (/bin/orphan)
warning: `uv tool list` is experimental
ruff v0.5.0
not a header at all
- stray (/bin/stray)
mypy v1.10.0
- mypy (/bin/mypy)
- garbage line without path
";
        let tools = parse_tool_listing(text);

        assert_eq!(names(&tools), vec!["ruff", "mypy"]);
        // Lines after an unparseable header belong to no tool
        assert!(tools[0].executables.is_empty());
        assert_eq!(tools[1].executables.len(), 1);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(parse_tool_listing("").is_empty());
        assert!(parse_tool_listing("\n   \n\t\n").is_empty());
        assert!(parse_tool_listing("No tools installed\n").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let tools = parse_tool_listing("ruff v0.5.0 (/path/ruff)\r\n- ruff (/path/bin/ruff)\r\n");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].install_path, "/path/ruff");
        assert_eq!(tools[0].executables[0].path, "/path/bin/ruff");
    }

    #[test]
    fn test_lists_keep_order_casing_and_duplicates() {
        let tools = parse_tool_listing("tool v1.0.0 [with: Zeta, alpha, Zeta]\n");
        assert_eq!(tools[0].with_packages, vec!["Zeta", "alpha", "Zeta"]);
    }

    // -------------------------------------------------------------------------
    // Header rules
    // -------------------------------------------------------------------------

    #[test]
    fn test_header_versions() {
        let cases = [
            ("pkg v1.2.3", "1.2.3"),
            ("pkg v0.1.0a1", "0.1.0a1"),
            ("pkg v2.0.0rc2 (/p)", "2.0.0rc2"),
            ("pkg v3.2.2.post1", "3.2.2.post1"),
            ("pkg v24", "24"),
        ];
        for (line, version) in cases {
            let tool = parse_header(line).unwrap_or_else(|| panic!("no match for {line}"));
            assert_eq!(tool.version, version, "line: {line}");
        }
    }

    #[test]
    fn test_header_rejects_missing_version() {
        assert!(parse_header("pkg 1.2.3").is_none());
        assert!(parse_header("pkg v").is_none());
        assert!(parse_header(" pkg v1.0.0").is_none());
    }

    #[test]
    fn test_rules_are_independent() {
        let line = "pkg v1.0.0 [extras: a, b] (/tools/pkg)";
        let fields: Vec<(&str, HeaderField)> = HEADER_RULES
            .iter()
            .filter_map(|rule| rule.extract(line).map(|f| (rule.name, f)))
            .collect();

        assert_eq!(
            fields,
            vec![
                ("install_path", HeaderField::InstallPath("/tools/pkg".to_string())),
                (
                    "extras",
                    HeaderField::Extras(vec!["a".to_string(), "b".to_string()])
                ),
            ]
        );
    }

    #[test]
    fn test_path_rule_only_matches_at_end() {
        assert_eq!(HEADER_RULES[0].extract("pkg v1.0.0 (/p) [with: x]"), None);
    }

    #[test]
    fn test_parse_executable() {
        assert_eq!(
            parse_executable("my tool (/bin/my tool)"),
            Some(Executable {
                name: "my tool".to_string(),
                path: "/bin/my tool".to_string(),
            })
        );
        assert_eq!(parse_executable("ruff"), None);
        assert_eq!(parse_executable("(/bin/x)"), None);
    }
}
