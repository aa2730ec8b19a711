//! Command-line argument parsing.
//!
//! Usage:
//!   hades [-skd] [-f[<file>]] [-I<dir>] [-c<code>] [<script>...]

use std::path::PathBuf;

use directories::ProjectDirs;

// ── Public types ───────────────────────────────────────────────────────────

/// Which `hadesrc` to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigFile {
    /// Look in the standard locations.
    #[default]
    Search,
    /// `-f` alone: run on defaults.
    Skip,
    /// `-f<file>`: load exactly this file.
    Explicit(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliArgs {
    /// `-s`: route `echo` into the message log.
    pub silent: bool,
    /// `-k`: keep going after errors (`throw_errors = false`).
    pub keep_going: bool,
    /// `-d`: debug logging.
    pub debug: bool,
    pub config: ConfigFile,
    /// `-I<dir>`: base directory for `import`.
    pub import_dir: Option<PathBuf>,
    /// `-c<code>`: inline code, run before any script file.
    pub code: Option<String>,
    /// Script files, run in order.
    pub scripts: Vec<PathBuf>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.
pub fn parse_args() -> Result<CliArgs, String> {
    let argv: Vec<String> = std::env::args().collect();
    parse_argv(&argv[1..])
}

/// Parse an explicit argument list (without the program name).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--" {
            args.scripts.extend(argv[i + 1..].iter().map(PathBuf::from));
            break;
        }

        // `-` alone reads the script from stdin.
        if !arg.starts_with('-') || arg == "-" {
            args.scripts.push(PathBuf::from(arg));
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                's' => args.silent = true,
                'k' => args.keep_going = true,
                'd' => args.debug = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -c<code> / -c <code>
                'c' => {
                    let code = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires code".to_owned());
                    };
                    args.code = Some(code);
                }

                // -I<dir> / -I <dir>
                'I' => {
                    let dir = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-I requires a directory argument".to_owned());
                    };
                    args.import_dir = Some(PathBuf::from(dir));
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if args.code.is_none() && args.scripts.is_empty() {
        return Err("nothing to run".to_owned());
    }
    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Locate the user's `hadesrc`.
///
/// Priority: `HADESRC` env var → platform config dir (`hadesrc` inside, e.g.
/// `~/.config/hades/hadesrc`) → `./.hadesrc`.  Only existing files count,
/// except that an explicit `HADESRC` is returned even if missing so the
/// caller can report it.
pub fn find_user_config() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("HADESRC") {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("", "", "hades")
        .map(|dirs| dirs.config_dir().join("hadesrc"))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(".hadesrc")))
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
