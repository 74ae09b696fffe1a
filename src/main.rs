#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use minish::config::{Config, ErrorFormat};
use minish::{CommandNode, Executor};
use std::env;
use std::fs;
use std::io::{self, Read};

const USAGE: &str = "usage: minish [--json-errors] [--dump] (-c <json> | <file> | -)";

/// Where the serialized command tree comes from
enum Source {
    Inline(String),
    File(String),
    Stdin,
}

struct Options {
    source: Source,
    dump: bool,
    json_errors: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut source = None;
    let mut dump = false;
    let mut json_errors = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dump" => dump = true,
            "--json-errors" => json_errors = true,
            "-c" if i + 1 < args.len() => {
                source = Some(Source::Inline(args[i + 1].clone()));
                i += 1;
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            "-" => source = Some(Source::Stdin),
            arg if !arg.starts_with('-') => source = Some(Source::File(arg.to_string())),
            arg => bail!("unknown option: {}", arg),
        }
        i += 1;
    }

    let Some(source) = source else {
        bail!("no command tree given");
    };

    Ok(Options {
        source,
        dump,
        json_errors,
    })
}

fn read_tree(source: &Source) -> Result<Option<CommandNode>> {
    let text = match source {
        Source::Inline(text) => text.clone(),
        Source::File(path) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path))?
        }
        Source::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("cannot read command tree from stdin")?;
            text
        }
    };

    // `null` is a tree the parser failed to build
    serde_json::from_str(&text).context("invalid command tree")
}

fn main() {
    env_logger::init();

    // Reset SIGPIPE to default so piped commands stop when their reader exits
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("minish: {}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let tree = match read_tree(&options.source) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("minish: {:#}", e);
            std::process::exit(2);
        }
    };

    if options.dump {
        match &tree {
            Some(tree) => println!("{}", tree),
            None => println!("exit"),
        }
        return;
    }

    let mut config = Config::load();
    if options.json_errors {
        config.error_format = ErrorFormat::Json;
    }

    let status = Executor::with_config(config).run(tree.as_ref());
    log::debug!("finished with {:?}", status);

    std::process::exit(status.process_code());
}
