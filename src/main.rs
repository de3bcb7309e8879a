mod cli;
mod lexer;
mod parser;
mod repl;
mod runtime;

use cli::args::{CliArgs, CliCommand};
use cli::io::load_source;
use parser::parser::Parser;
use runtime::executor::Executor;

fn main() {
    let args = CliArgs::parse();
    if args.command == CliCommand::Repl {
        if let Err(err) = repl::run() {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return;
    }

    let (source, filename) = match load_source(&args) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut parser = Parser::new(&source);
    let program = match parser.parse_program() {
        Ok(p) => p,
        Err(err) => {
            eprintln!("{filename}: {err}");
            std::process::exit(1);
        }
    };

    if args.command == CliCommand::Ast {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("{filename}: failed to render AST: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut executor = Executor::new();
    if let Err(err) = executor.execute(&program) {
        eprintln!("{filename}: {err}");
        std::process::exit(1);
    }
}
