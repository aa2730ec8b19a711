use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use hades::cli::{self, CliArgs, ConfigFile};
use hades::script::fs_loader;
use hades::{Config, Interpreter, ScriptError};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("hades: {e}");
            eprintln!("Usage: hades [-skd] [-f[<file>]] [-I<dir>] [-c<code>] [<script>...]");
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.debug);

    let config = load_config(&args);
    let mut interp = Interpreter::with_config(config);

    let mut failed = false;
    if let Some(code) = &args.code {
        failed |= report(&mut interp, |i| i.execute_in(code, "-c"));
    }
    for script in &args.scripts {
        if failed {
            break;
        }
        failed |= run_script(&mut interp, script);
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// `HADES_LOG` takes an `EnvFilter` directive; `-d` raises the default.
/// Script messages are printed by [`report`], so their `hades::diag`
/// mirror stays off unless asked for.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn,hades::diag=off" };
    let filter = EnvFilter::try_from_env("HADES_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the config file and fold CLI flags over it.
fn load_config(args: &CliArgs) -> Config {
    let path = match &args.config {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => cli::find_user_config(),
    };

    let mut config = match path {
        None => Config::default(),
        Some(path) => match Config::load_file(&path) {
            Ok((config, errors)) => {
                for e in errors {
                    eprintln!("hades: {}: {e}", path.display());
                }
                config
            }
            Err(e) => {
                eprintln!("hades: warning: {}: {e}", path.display());
                Config::default()
            }
        },
    };

    config.silent |= args.silent;
    if args.keep_going {
        config.throw_errors = false;
    }
    if let Some(dir) = &args.import_dir {
        config.import_dir = Some(dir.clone());
    }
    config
}

/// Run one script file (`-` reads stdin).  Returns true on failure.
fn run_script(interp: &mut Interpreter, path: &Path) -> bool {
    let source = if path == Path::new("-") {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s).map(|_| s)
    } else {
        std::fs::read_to_string(path)
    };
    let code = match source {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hades: {}: {e}", path.display());
            return true;
        }
    };

    // Relative imports resolve beside the script unless -I/import_dir says otherwise.
    if interp.config.import_dir.is_none() {
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        interp.set_loader(fs_loader(dir));
    }

    let zone = path.display().to_string();
    report(interp, |i| i.execute_in(&code, &zone))
}

/// Flush output and messages after one execution.  Returns true on failure.
fn report(interp: &mut Interpreter, run: impl FnOnce(&mut Interpreter) -> Result<hades::Value, ScriptError>) -> bool {
    let result = run(interp);
    for line in interp.output.drain(..) {
        println!("{line}");
    }
    for msg in interp.take_messages() {
        eprintln!("{msg}");
    }
    result.is_err()
}
