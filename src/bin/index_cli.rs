//! Simple CLI for exercising the ordered index.
//!
//! Usage:
//!   index_cli [--degree N] [--json] <op>...
//!
//! Ops:
//!   +K   insert key K
//!   -K   delete key K
//!   ?K   search for key K
//!
//! With no ops the demo sequence 1, 4, 7, ..., 31 is inserted at degree 3.
//! Set `RUST_LOG=ordered_index=debug` to trace splits and merges.

use ordered_index::{IndexConfig, OrderedIndex};
use std::env;
use std::process::exit;
use tracing_subscriber::EnvFilter;

const DEMO_KEYS: [i64; 11] = [1, 4, 7, 10, 13, 16, 19, 22, 25, 28, 31];

enum Op {
    Insert(i64),
    Delete(i64),
    Search(i64),
}

fn parse_op(arg: &str) -> Option<Op> {
    let tag = arg.get(..1)?;
    let key: i64 = arg.get(1..)?.parse().ok()?;
    match tag {
        "+" => Some(Op::Insert(key)),
        "-" => Some(Op::Delete(key)),
        "?" => Some(Op::Search(key)),
        _ => None,
    }
}

fn usage() -> ! {
    eprintln!("Usage: index_cli [--degree N] [--json] <op>...");
    eprintln!("Ops:");
    eprintln!("  +K  - Insert key K");
    eprintln!("  -K  - Delete key K");
    eprintln!("  ?K  - Search for key K");
    exit(1);
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = IndexConfig::default();
    let mut json = false;
    let mut ops = Vec::new();
    let mut degree_given = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--degree" => {
                i += 1;
                match args.get(i).and_then(|s| s.parse().ok()) {
                    Some(degree) => {
                        config = config.degree(degree);
                        degree_given = true;
                    }
                    None => {
                        eprintln!("ERROR: --degree needs a number");
                        usage();
                    }
                }
            }
            "--json" => json = true,
            "-h" | "--help" => usage(),
            arg => match parse_op(arg) {
                Some(op) => ops.push(op),
                None => {
                    eprintln!("ERROR: Unknown argument: {}", arg);
                    usage();
                }
            },
        }
        i += 1;
    }

    if ops.is_empty() {
        if !degree_given {
            config = config.degree(3);
        }
        ops.extend(DEMO_KEYS.iter().map(|&k| Op::Insert(k)));
    }

    let mut index = match OrderedIndex::with_config(&config) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(1);
        }
    };

    let mut failed = false;
    for op in ops {
        let result = match op {
            Op::Insert(key) => index.insert(key),
            Op::Delete(key) => index.delete(&key),
            Op::Search(key) => {
                match index.search(&key) {
                    Some(leaf) => println!("FOUND {} in leaf {:?}", key, leaf.keys()),
                    None => println!("NOT_FOUND {}", key),
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("ERROR: {}", e);
            failed = true;
        }
    }

    if json {
        match serde_json::to_string_pretty(&index.export()) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                exit(1);
            }
        }
    } else {
        print!("{}", index.render());
    }

    if failed {
        exit(1);
    }
}
