use kitbash_core::{AppConfig, FileMedium, PreviewController, SnippetStore};
use kitbash_core::snippet::FragmentSet;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

enum Op {
    Event {
        event: String,
        selector: String,
        value: Option<String>,
    },
    Tick(u64),
}

struct CliOptions {
    config_path: String,
    snippet_id: Option<String>,
    files: Vec<String>,
    ops: Vec<Op>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("✗ {}", message);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(message) = run(options) {
        eprintln!("✗ {}", message);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage: kitbash-preview <markup-file> [style-file] [script-file] [options]");
    eprintln!("       kitbash-preview --snippet <id> [options]");
    eprintln!();
    eprintln!("Renders a snippet preview headlessly and writes the HTML to stdout.");
    eprintln!("Script print output and fault diagnostics go to stderr.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>              Config file (default: kitbash.yaml)");
    eprintln!("  --snippet <id>               Preview a stored snippet instead of files");
    eprintln!("  --event <type:sel[:value]>   Dispatch an event after activation (repeatable)");
    eprintln!("  --tick <ms>                  Advance the preview clock by ms (repeatable)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  kitbash-preview card.html card.css card.luau");
    eprintln!("  kitbash-preview --snippet btn-group --event click:#seg-week");
    eprintln!("  kitbash-preview --snippet slider-range --event input:#volumeSlider:72 --tick 250");
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        config_path: "kitbash.yaml".to_string(),
        snippet_id: None,
        files: Vec::new(),
        ops: Vec::new(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                options.config_path = take_value(args, &mut i, "--config")?;
            }
            "--snippet" => {
                options.snippet_id = Some(take_value(args, &mut i, "--snippet")?);
            }
            "--event" => {
                let spec = take_value(args, &mut i, "--event")?;
                options.ops.push(parse_event(&spec)?);
            }
            "--tick" => {
                let spec = take_value(args, &mut i, "--tick")?;
                let ms = spec
                    .parse::<u64>()
                    .map_err(|_| format!("--tick expects a duration in ms, got '{}'", spec))?;
                options.ops.push(Op::Tick(ms));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option '{}'", flag));
            }
            _ => {
                options.files.push(args[i].clone());
            }
        }
        i += 1;
    }

    if options.snippet_id.is_none() && options.files.is_empty() {
        return Err("a markup file or --snippet <id> is required".to_string());
    }
    if options.snippet_id.is_some() && !options.files.is_empty() {
        return Err("pass fragment files or --snippet, not both".to_string());
    }
    if options.files.len() > 3 {
        return Err("at most three fragment files: markup, style, script".to_string());
    }

    Ok(options)
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("missing value for {}", flag))
}

fn parse_event(spec: &str) -> Result<Op, String> {
    let mut parts = spec.splitn(3, ':');
    let event = parts.next().unwrap_or_default().to_string();
    let selector = parts.next().unwrap_or_default().to_string();
    let value = parts.next().map(str::to_string);
    if event.is_empty() || selector.is_empty() {
        return Err(format!("--event expects type:selector[:value], got '{}'", spec));
    }
    Ok(Op::Event { event, selector, value })
}

fn run(options: CliOptions) -> Result<(), String> {
    let config = AppConfig::load(Path::new(&options.config_path)).map_err(|e| e.to_string())?;
    let fragments = load_fragments(&options, &config)?;

    let mut preview = PreviewController::new(config.limits);
    let status = preview.activate(&fragments);
    if !status.is_ok() {
        print_output(&preview);
        return Err(status.to_string());
    }

    for op in &options.ops {
        match op {
            Op::Event { event, selector, value } => {
                preview
                    .dispatch(event, selector, value.as_deref())
                    .map_err(|e| format!("event '{}' on '{}': {}", event, selector, e))?;
            }
            Op::Tick(ms) => {
                preview.tick(*ms);
            }
        }
    }

    print_output(&preview);
    for diagnostic in preview.diagnostics() {
        eprintln!("⚠ {:?} fault: {}", diagnostic.phase, diagnostic.message);
    }
    match preview.html() {
        Some(html) => println!("{}", html),
        None => return Err("nothing to render".to_string()),
    }
    Ok(())
}

fn print_output(preview: &PreviewController) {
    for line in preview.output() {
        eprintln!("print: {}", line);
    }
}

fn load_fragments(options: &CliOptions, config: &AppConfig) -> Result<FragmentSet, String> {
    if let Some(id) = &options.snippet_id {
        let store = SnippetStore::open(Box::new(FileMedium::new(&config.data_dir)));
        return match store.get(id) {
            Some(snippet) => Ok(snippet.fragments.clone()),
            None => Err(format!("unknown snippet id '{}'", id)),
        };
    }

    let mut files = options.files.iter();
    let markup_path = files.next().ok_or("a markup file is required")?;
    let markup = read_fragment(markup_path)?;
    let style = match files.next() {
        Some(path) => read_fragment(path)?,
        None => String::new(),
    };
    let script = match files.next() {
        Some(path) => read_fragment(path)?,
        None => String::new(),
    };
    Ok(FragmentSet { markup, style, script })
}

fn read_fragment(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))
}
