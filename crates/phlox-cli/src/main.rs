use std::{
    fs,
    io::{self, BufRead, Write},
    process::ExitCode,
};

use clap::Parser;
use phlox::{NoLimitTracker, Object, ReplSession, Runner, StdPrint};

/// A tree-walking interpreter for a small PHP-dialect scripting language.
#[derive(Parser)]
#[command(name = "phlox", version, about)]
struct Cli {
    /// Source file to interpret, or `repl` to start an interactive session.
    target: String,

    /// Print the parsed module as JSON instead of evaluating it.
    #[arg(long)]
    dump_ast: bool,

    /// Arguments exposed to the script through `os\args()`.
    #[arg(trailing_var_arg = true)]
    script_args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.target == "repl" {
        return repl();
    }
    run_file(&cli.target, cli.dump_ast, cli.script_args)
}

fn run_file(path: &str, dump_ast: bool, script_args: Vec<String>) -> ExitCode {
    let code = match fs::read_to_string(path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runner = match Runner::new(code, path) {
        Ok(runner) => runner,
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            return ExitCode::FAILURE;
        }
    };

    if dump_ast {
        match serde_json::to_string_pretty(runner.module()) {
            Ok(json) => {
                println!("{json}");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                eprintln!("error serializing module: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    // os\args() sees everything after the program name
    let mut argv = vec![path.to_owned()];
    argv.extend(script_args);
    match runner.with_args(argv).run(NoLimitTracker, &mut StdPrint) {
        Ok(_) => ExitCode::SUCCESS,
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            ExitCode::FAILURE
        }
    }
}

fn repl() -> ExitCode {
    let mut session = ReplSession::new("<console>");
    let stdin = io::stdin();
    loop {
        print!("phlox> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return ExitCode::SUCCESS;
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("error reading input: {err}");
                return ExitCode::FAILURE;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        match session.execute(&line, &mut StdPrint) {
            Ok(Object::Null) => {}
            Ok(value) => println!("{value}"),
            Err(diagnostic) => eprintln!("{diagnostic}"),
        }
    }
}
