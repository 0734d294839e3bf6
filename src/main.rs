//! tinysql CLI - an embeddable SQL engine, driven interactively.
//!
//! This binary provides a command-line interface for running statements
//! against a single in-memory session.

use std::io::{self, BufRead, Write};

use tinysql::{QueryResult, Session, SessionConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut session = Session::with_config(SessionConfig::new().with_statement_logging(true));

    if args.len() > 1 {
        let sql = args[1..].join(" ");
        run_and_print(&mut session, &sql);
    } else {
        run_repl(&mut session);
    }
}

fn run_repl(session: &mut Session) {
    println!("tinysql v{}", env!("CARGO_PKG_VERSION"));
    println!("Enter SQL statements (Ctrl+D to exit):\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("sql> ");
        stdout.flush().unwrap();

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {
                let sql = input.trim();
                if sql.is_empty() {
                    continue;
                }
                if sql.eq_ignore_ascii_case("quit") || sql.eq_ignore_ascii_case("exit") {
                    break;
                }
                run_and_print(session, sql);
            }
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }
    }
}

fn run_and_print(session: &mut Session, sql: &str) {
    for result in session.execute(sql) {
        print_result(&result);
    }
}

fn print_result(result: &QueryResult) {
    match &result.kind {
        tinysql::QueryResultKind::Error { error } => {
            eprintln!("Error [{}]: {}", error.kind, error.message);
        }
        tinysql::QueryResultKind::Select { rows, row_count } => {
            println!("{row_count} row(s)");
            for row in rows {
                println!("  {row:?}");
            }
        }
        other => println!("{other:?}"),
    }
    println!("  ({:.3}ms)", result.execution_time_ms);
}
