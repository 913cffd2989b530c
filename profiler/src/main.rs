use std::fs;

use jsontree::{Arena, ParseOptions};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

struct Args {
    iterations: usize,
    file: String,
    method: String,
    pretty: bool,
}

const USAGE: &str = "\
Usage: jsontree-profiler --file <PATH> --method <parse|parse-comments|print|minify|duplicate> [--iterations N] [--pretty]";

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    Ok(Args {
        iterations: args.opt_value_from_str("--iterations")?.unwrap_or(10_000),
        file: args.value_from_str("--file")?,
        method: args.value_from_str("--method")?,
        pretty: args.contains("--pretty"),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("{error}\n{USAGE}");
            return Err(error.into());
        }
    };
    let input = fs::read(&args.file)?;

    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let mut arena = Arena::with_capacity(1024);
    match args.method.as_str() {
        "parse" => {
            for _ in 0..args.iterations {
                let root = arena.parse_bytes(&input)?;
                arena.delete(root);
            }
        }
        "parse-comments" => {
            let options = ParseOptions::new().allow_comments(true);
            for _ in 0..args.iterations {
                let (root, _) = arena.parse_with_opts(&input, &options)?;
                arena.delete(root);
            }
        }
        "print" => {
            let root = arena.parse_bytes(&input)?;
            for _ in 0..args.iterations {
                let _ = arena.print_buffered(root, 256, true, args.pretty)?;
            }
        }
        "minify" => {
            for _ in 0..args.iterations {
                let mut buffer = input.clone();
                jsontree::minify_vec(&mut buffer);
            }
        }
        "duplicate" => {
            let root = arena.parse_bytes(&input)?;
            for _ in 0..args.iterations {
                if let Some(copy) = arena.duplicate(root, true) {
                    arena.delete(copy);
                }
            }
        }
        other => {
            eprintln!("Unknown method: {other}\n{USAGE}");
        }
    }
    Ok(())
}
