use std::fs;
use std::io::{self, Read};

use super::args::CliArgs;

/// Returns the source text and a display name for it. With no script path
/// the source is read from stdin.
pub fn load_source(args: &CliArgs) -> Result<(String, String), String> {
    if let Some(path) = &args.script_path {
        let source =
            fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
        return Ok((source, path.clone()));
    }

    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;

    Ok((buf, "<stdin>".to_string()))
}
