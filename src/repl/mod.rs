use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::lexer::scanner::Lexer;
use crate::lexer::token::TokenKind;
use crate::parser::parser::Parser;
use crate::runtime::executor::Executor;

const COMMANDS: &str = ":help :quit :clear :vars :load <file> :ast <code> :tokens <code>";

type OutputQueue = Arc<Mutex<Vec<String>>>;

/// Line-oriented REPL. Statements run against one persistent executor;
/// the value of the last expression on a line is echoed back. A trailing
/// `\` continues input on the next line.
pub fn run() -> Result<(), String> {
    let pending_output: OutputQueue = Arc::new(Mutex::new(Vec::new()));
    let mut executor = Executor::new();
    {
        let output = pending_output.clone();
        executor.set_output_sink(Some(Arc::new(move |line: String| {
            if let Ok(mut lines) = output.lock() {
                lines.push(line);
            }
        })));
    }

    let history_path = history_path();
    let mut history = load_history(&history_path).unwrap_or_default();

    println!("parlo repl");
    println!("commands: {COMMANDS}");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "parlo> " } else { "...> " };
        print!("{prompt}");
        io::stdout()
            .flush()
            .map_err(|e| format!("failed to flush stdout: {e}"))?;

        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .map_err(|e| format!("failed to read input: {e}"))?;
        if read == 0 {
            break;
        }

        if buffer.is_empty() && line.trim().is_empty() {
            continue;
        }

        buffer.push_str(&line);
        if buffer.trim_end().ends_with('\\') {
            let cut = buffer.trim_end().len() - 1;
            buffer.truncate(cut);
            buffer.push('\n');
            continue;
        }

        let src = buffer.trim_end().to_string();
        buffer.clear();
        if src.is_empty() {
            continue;
        }

        if !history.last().map(|s| s == &src).unwrap_or(false) {
            history.push(src.clone());
        }

        if src.starts_with(':') {
            if handle_command(&mut executor, &pending_output, &src)? {
                break;
            }
            drain_output(&pending_output);
            continue;
        }

        eval_source(&mut executor, &pending_output, &src, true);
    }

    save_history(&history_path, &history)?;
    Ok(())
}

fn eval_source(
    executor: &mut Executor,
    pending_output: &OutputQueue,
    source: &str,
    echo_result: bool,
) {
    let mut parser = Parser::new(source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    match executor.execute_repl(&program) {
        Ok(last) => {
            drain_output(pending_output);
            if echo_result {
                if let Some(value) = last {
                    println!("{value}");
                }
            }
        }
        Err(err) => {
            drain_output(pending_output);
            eprintln!("{err}");
        }
    }
}

/// Returns true when the REPL should quit.
fn handle_command(
    executor: &mut Executor,
    pending_output: &OutputQueue,
    line: &str,
) -> Result<bool, String> {
    let rest = line.trim_start_matches(':').trim();
    let mut parts = rest.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match cmd {
        "help" => println!("commands: {COMMANDS}"),
        "quit" | "q" | "exit" => return Ok(true),
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            io::stdout()
                .flush()
                .map_err(|e| format!("failed to flush stdout: {e}"))?;
        }
        "vars" => {
            let vars = executor.list_globals();
            if vars.is_empty() {
                println!("no globals");
            } else {
                for (name, value) in vars {
                    println!("{name} = {value}");
                }
            }
        }
        "load" => {
            if arg.is_empty() {
                eprintln!("usage: :load <file>");
            } else {
                match fs::read_to_string(arg) {
                    Ok(src) => eval_source(executor, pending_output, &src, false),
                    Err(err) => eprintln!("failed to read {arg}: {err}"),
                }
            }
        }
        "ast" => {
            if arg.is_empty() {
                eprintln!("usage: :ast <code>");
            } else {
                let mut parser = Parser::new(arg);
                match parser.parse_program() {
                    Ok(program) => match serde_json::to_string_pretty(&program) {
                        Ok(json) => println!("{json}"),
                        Err(err) => eprintln!("failed to render AST: {err}"),
                    },
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
        "tokens" => {
            if arg.is_empty() {
                eprintln!("usage: :tokens <code>");
            } else {
                let mut lexer = Lexer::new(arg);
                loop {
                    match lexer.next() {
                        Ok(token) => {
                            if token.kind == TokenKind::Eof {
                                break;
                            }
                            println!(
                                "{}:{} {} \"{}\"",
                                token.line, token.column, token.kind, token.literal
                            );
                        }
                        Err(err) => {
                            eprintln!("{err}");
                            break;
                        }
                    }
                }
            }
        }
        _ => eprintln!("unknown command: :{cmd}"),
    }

    Ok(false)
}

fn drain_output(pending_output: &OutputQueue) {
    let lines = if let Ok(mut out) = pending_output.lock() {
        std::mem::take(&mut *out)
    } else {
        Vec::new()
    };
    for line in lines {
        println!("{line}");
    }
}

fn history_path() -> PathBuf {
    if let Ok(cwd) = std::env::current_dir() {
        return cwd.join(".parlo_history");
    }
    PathBuf::from(".parlo_history")
}

fn load_history(path: &Path) -> Result<Vec<String>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)
        .map_err(|e| format!("failed to read history {}: {e}", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn save_history(path: &Path, history: &[String]) -> Result<(), String> {
    fs::write(path, history.join("\n"))
        .map_err(|e| format!("failed to write history {}: {e}", path.display()))
}
