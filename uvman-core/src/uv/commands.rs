//! Argument vectors for the `uv` invocations the manager issues.

use std::fmt;

/// Every invocation disables colour so the output stays parseable.
const NO_COLOR: [&str; 2] = ["--color", "never"];

/// A `uv` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UvCommand {
    /// `uv --version`
    Version,
    /// `uv tool dir`
    ToolDir,
    /// `uv tool list` with paths, specifiers, with-packages and extras.
    ToolList,
    /// `uv tool install <name>`
    Install {
        name: String,
        with_packages: Vec<String>,
        force: bool,
    },
    /// `uv tool upgrade <name>`
    Upgrade { name: String },
    /// `uv tool upgrade --all`
    UpgradeAll,
    /// `uv tool uninstall <name>`
    Uninstall { name: String },
    /// `uv self update`
    SelfUpdate,
}

impl UvCommand {
    /// Builds the argument vector passed to the `uv` binary.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |parts: &[&str]| args.extend(parts.iter().map(|s| s.to_string()));

        match self {
            Self::Version => {
                push(&["--version"]);
                return args;
            }
            Self::ToolDir => push(&["tool", "dir"]),
            Self::ToolList => push(&[
                "tool",
                "list",
                "--show-paths",
                "--show-version-specifiers",
                "--show-with",
                "--show-extras",
            ]),
            Self::Install {
                name,
                with_packages,
                force,
            } => {
                push(&["tool", "install", name.as_str()]);
                if !with_packages.is_empty() {
                    let joined = with_packages.join(",");
                    push(&["--with", joined.as_str()]);
                }
                if *force {
                    push(&["--force"]);
                }
                push(&["-v"]);
            }
            Self::Upgrade { name } => push(&["tool", "upgrade", name.as_str(), "-v"]),
            Self::UpgradeAll => push(&["tool", "upgrade", "--all", "-v"]),
            Self::Uninstall { name } => push(&["tool", "uninstall", name.as_str(), "-v"]),
            Self::SelfUpdate => push(&["self", "update"]),
        }

        push(&NO_COLOR);
        args
    }
}

impl fmt::Display for UvCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uv {}", self.args().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: UvCommand) -> Vec<String> {
        cmd.args()
    }

    #[test]
    fn test_version_args() {
        assert_eq!(args(UvCommand::Version), vec!["--version"]);
    }

    #[test]
    fn test_tool_dir_args() {
        assert_eq!(
            args(UvCommand::ToolDir),
            vec!["tool", "dir", "--color", "never"]
        );
    }

    #[test]
    fn test_tool_list_args() {
        assert_eq!(
            args(UvCommand::ToolList),
            vec![
                "tool",
                "list",
                "--show-paths",
                "--show-version-specifiers",
                "--show-with",
                "--show-extras",
                "--color",
                "never"
            ]
        );
    }

    #[test]
    fn test_install_args_full() {
        let cmd = UvCommand::Install {
            name: "black".to_string(),
            with_packages: vec!["click".to_string(), "mypy".to_string()],
            force: true,
        };
        assert_eq!(
            args(cmd),
            vec![
                "tool", "install", "black", "--with", "click,mypy", "--force", "-v", "--color",
                "never"
            ]
        );
    }

    #[test]
    fn test_install_args_minimal() {
        let cmd = UvCommand::Install {
            name: "ruff".to_string(),
            with_packages: Vec::new(),
            force: false,
        };
        assert_eq!(
            args(cmd),
            vec!["tool", "install", "ruff", "-v", "--color", "never"]
        );
    }

    #[test]
    fn test_upgrade_args() {
        assert_eq!(
            args(UvCommand::Upgrade {
                name: "ruff".to_string()
            }),
            vec!["tool", "upgrade", "ruff", "-v", "--color", "never"]
        );
        assert_eq!(
            args(UvCommand::UpgradeAll),
            vec!["tool", "upgrade", "--all", "-v", "--color", "never"]
        );
    }

    #[test]
    fn test_uninstall_args() {
        assert_eq!(
            args(UvCommand::Uninstall {
                name: "ruff".to_string()
            }),
            vec!["tool", "uninstall", "ruff", "-v", "--color", "never"]
        );
    }

    #[test]
    fn test_self_update_args() {
        assert_eq!(
            args(UvCommand::SelfUpdate),
            vec!["self", "update", "--color", "never"]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(UvCommand::ToolDir.to_string(), "uv tool dir --color never");
    }
}
