use std::env;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: CliCommand,
    pub script_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Interpret a script.
    Run,
    /// Pretty-print the parsed AST as JSON.
    Ast,
    Repl,
}

impl CliArgs {
    pub fn parse() -> Self {
        let mut args = env::args().skip(1);
        let first = args.next();
        match first.as_deref() {
            Some("repl") => CliArgs {
                command: CliCommand::Repl,
                script_path: None,
            },
            Some("ast") => CliArgs {
                command: CliCommand::Ast,
                script_path: args.next(),
            },
            _ => CliArgs {
                command: CliCommand::Run,
                script_path: first,
            },
        }
    }
}
