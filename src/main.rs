//! CLI entry point: run a script file, or drop into an interactive REPL
//! when none is given.

use clap::Parser as ClapParser;
use mathscript::config;
use mathscript::env::Context;
use mathscript::lexer::Lexer;
use mathscript::parser::Parser as MathScriptParser;
use mathscript::value::Value;
use mathscript::{global_environment, run_in_statements};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(name = config::PRODUCT_NAME, version = config::version_string(), about = config::PRODUCT_DESCRIPTION)]
struct CliArgs {
    /// Script to run. Starts the REPL if omitted.
    file: Option<PathBuf>,

    /// Dump lexer/parser output before running (see DEBUG_MODES).
    #[arg(long)]
    debug: Option<String>,
}

fn main() {
    let args = CliArgs::parse();

    let debug_mode = match args.debug {
        Some(mode) => match validate_debug_mode(&mode) {
            Ok(mode) => Some(mode),
            Err(message) => {
                eprintln!("{message}");
                std::process::exit(1);
            }
        },
        None => None,
    };

    match args.file {
        Some(path) => run_script(&path, debug_mode.as_deref()),
        None => run_repl(debug_mode.as_deref()),
    }
}

fn validate_debug_mode(mode: &str) -> Result<String, String> {
    if config::DEBUG_MODES.contains(&mode) {
        return Ok(mode.to_string());
    }

    let suggestion = config::DEBUG_MODES.iter().min_by_key(|candidate| levenshtein(mode, candidate));
    match suggestion {
        Some(s) => Err(format!("Unknown debug mode '{mode}'. Did you mean '{s}'?")),
        None => Err(format!("Unknown debug mode '{mode}'.")),
    }
}

/// Classic edit-distance, used only to suggest the nearest valid
/// `--debug` mode on a typo.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let above = row[j];
            row[j] = (row[j] + 1).min(row[j - 1] + 1).min(prev_diag + cost);
            prev_diag = above;
        }
    }

    row[b.len()]
}

fn dump_debug(mode: &str, filename: &str, source: &str) {
    let show_lexer = mode == "lexer" || mode == "lexer-parser" || mode == "all";
    let show_parser = mode == "parser" || mode == "lexer-parser" || mode == "all";

    if !show_lexer && !show_parser {
        return;
    }

    let tokens = match Lexer::new(filename, source).make_tokens() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", mathscript::error::MathScriptError::from(e));
            return;
        }
    };

    if show_lexer {
        eprintln!("-- tokens --");
        for token in &tokens {
            eprintln!("{token}");
        }
    }

    if show_parser {
        match MathScriptParser::new(tokens).parse() {
            Ok(ast) => {
                eprintln!("-- ast --");
                eprintln!("{:#?}", ast.kind);
            }
            Err(e) => eprintln!("{}", mathscript::error::MathScriptError::from(e)),
        }
    }
}

fn run_script(path: &PathBuf, debug_mode: Option<&str>) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not read '{}': {e}", path.display());
            std::process::exit(1);
        }
    };

    let filename = path.display().to_string();
    if let Some(mode) = debug_mode {
        dump_debug(mode, &filename, &source);
    }

    // "lexer"/"parser"/"lexer-parser" dump only; "all" dumps and runs.
    let dump_only = matches!(debug_mode, Some("lexer") | Some("parser") | Some("lexer-parser"));
    if dump_only {
        return;
    }

    let env = global_environment();
    let context = Context::root("<program>");
    let (_, error) = run_in_statements(&filename, &source, env, context);

    if let Some(e) = error {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn banner() -> String {
    let tag = option_env!("MATHSCRIPT_GIT_TAG").unwrap_or("unknown");
    let hash = option_env!("MATHSCRIPT_GIT_HASH").unwrap_or("unknown");
    let date = option_env!("MATHSCRIPT_GIT_DATE");

    let build_info = match date {
        Some(d) => format!("(tags/{tag}:{hash}, {d})"),
        None => format!("(tags/{tag}:{hash})"),
    };

    format!("{} {} {build_info} on {}", config::PRODUCT_NAME, config::version_string(), std::env::consts::OS)
}

fn run_repl(debug_mode: Option<&str>) {
    let mut line = banner();
    if let Some(mode) = debug_mode {
        line.push_str(&format!(" [DEBUG:{mode}]"));
    }
    println!("{line}");

    let env = global_environment();
    let context = Context::root("<repl>");

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Could not start the line editor: {e}");
            std::process::exit(1);
        }
    };

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        match editor.readline(prompt) {
            Ok(input) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&input);
                let _ = editor.add_history_entry(input.as_str());

                if let Some(mode) = debug_mode {
                    dump_debug(mode, "<repl>", &buffer);
                }

                let (statements, error) = run_in_statements("<repl>", &buffer, env.clone(), context.clone());

                match error {
                    Some(e) if awaits_more_input(&e) => continue,
                    Some(e) => {
                        eprintln!("{e}");
                        buffer.clear();
                    }
                    None => {
                        echo_results(statements.unwrap_or_default());
                        buffer.clear();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Readline error: {e}");
                break;
            }
        }
    }
}

fn awaits_more_input(error: &mathscript::error::MathScriptError) -> bool {
    error.as_string().contains("Expected 'end'")
}

fn echo_results(values: Vec<Value>) {
    for value in values {
        if !matches!(value, Value::Null(_)) {
            println!("{value}");
        }
    }
}
