pub mod cli;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;

use std::sync::{Arc, Mutex};

use parser::parser::Parser;
use runtime::executor::Executor;

/// Parse and run a script; `say` output goes to stdout. Returns an error
/// string on parse or runtime failure.
pub fn run_script(source: &str, filename: &str) -> Result<(), String> {
    let mut parser = Parser::new(source);
    let program = parser
        .parse_program()
        .map_err(|e| format!("{filename}: {e}"))?;
    let mut executor = Executor::new();
    executor
        .execute(&program)
        .map_err(|e| format!("{filename}: {e}"))?;
    Ok(())
}

/// Run a script and capture every line `say` produced, in order.
pub fn run_script_capture(source: &str) -> Result<Vec<String>, String> {
    let mut parser = Parser::new(source);
    let program = parser.parse_program()?;
    let mut executor = Executor::new();
    let output = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = output.clone();
    executor.set_output_sink(Some(Arc::new(move |line: String| {
        if let Ok(mut lines) = sink.lock() {
            lines.push(line);
        }
    })));
    executor.execute(&program).map_err(|e| e.to_string())?;
    Ok(output.lock().map(|lines| lines.clone()).unwrap_or_default())
}
