//! CLI tool to dump and check JavaScript/TypeScript token streams.

use std::fs;
use std::process::ExitCode;

use jslex_rs::{TokenKind, tokenize};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: jslex <command> [files...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  dump   Print one line per token");
        eprintln!("  check  Report lexical errors");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  jslex dump app.ts");
        eprintln!("  jslex check app.ts lib.js");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let files = &args[2..];

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match command {
            "dump" => {
                for token in tokenize(&content) {
                    println!(
                        "{}:{}\t{}\t{:?}\t{:?}",
                        token.line, token.column, token.depth, token.kind, token.text
                    );
                }
            }
            "check" => {
                let tokens = tokenize(&content);
                let mut errors = 0usize;
                for token in &tokens {
                    if token.kind == TokenKind::Error {
                        errors += 1;
                        if token.text.is_empty() {
                            eprintln!(
                                "{path}:{}:{}: {} structure(s) left open",
                                token.line, token.column, token.depth
                            );
                        } else {
                            eprintln!(
                                "{path}:{}:{}: invalid token {:?}",
                                token.line, token.column, token.text
                            );
                        }
                    }
                }
                if errors == 0 {
                    eprintln!("{path}: ok ({} token(s))", tokens.len());
                } else {
                    eprintln!("{path}: {errors} error(s)");
                    had_error = true;
                }
            }
            _ => {
                eprintln!("Unknown command: {command}");
                return ExitCode::from(2);
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
