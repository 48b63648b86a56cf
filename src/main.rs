//! soli-dispatch CLI: inspect controller routing of a Soli application.

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use soli_dispatch::config::Environment;
use soli_dispatch::controller::{ControllerDescriptor, ControllerSource};
use soli_dispatch::plugin::PluginManager;
use soli_dispatch::resolver::{ControllerResolver, FeatureId};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// List registered controllers, highest priority first
    Routes { folder: String, dev_mode: bool },
    /// Resolve one URI (or JSON feature) to its controller
    Resolve {
        folder: String,
        feature: String,
        plugin: Option<String>,
        namespace: Option<String>,
        dev_mode: bool,
    },
}

fn print_usage() {
    eprintln!("soli-dispatch {} - controller routing inspector", VERSION);
    eprintln!();
    eprintln!("Usage: soli-dispatch routes <folder> [--dev]");
    eprintln!("       soli-dispatch resolve <folder> <uri> [--plugin NAME] [--namespace NS] [--dev]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  routes <folder>        List controllers in priority order");
    eprintln!("  resolve <folder> <uri> Print the controller serving <uri>");
    eprintln!("                         <uri> may also be a JSON feature:");
    eprintln!("                         '{{\"uri\": \"/posts\", \"pluginName\": \"blog\"}}'");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --plugin NAME    Only match controllers owned by plugin NAME");
    eprintln!("  --namespace NS   Only match controllers in namespace NS");
    eprintln!("  --dev            Development mode (no lookup caching)");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  APP_ENV          Application environment (default: production)");
    eprintln!("  RUST_LOG         Log filter (default: warn)");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    process::exit(64);
}

fn parse_args() -> Command {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        process::exit(if args.is_empty() { 64 } else { 0 });
    }

    let mut positional = Vec::new();
    let mut plugin = None;
    let mut namespace = None;
    let mut dev_mode = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dev" => dev_mode = true,
            "--plugin" => {
                i += 1;
                if i >= args.len() {
                    usage_error("--plugin requires a plugin name");
                }
                plugin = Some(args[i].clone());
            }
            "--namespace" => {
                i += 1;
                if i >= args.len() {
                    usage_error("--namespace requires a namespace");
                }
                namespace = Some(args[i].clone());
            }
            arg if arg.starts_with("--") => {
                usage_error(&format!("Unknown option: {}", arg));
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    match args[0].as_str() {
        "routes" => {
            if positional.len() != 1 {
                usage_error("routes command requires a folder argument");
            }
            if plugin.is_some() || namespace.is_some() {
                usage_error("--plugin and --namespace only apply to resolve");
            }
            Command::Routes {
                folder: positional.remove(0),
                dev_mode,
            }
        }
        "resolve" => {
            if positional.len() != 2 {
                usage_error("resolve command requires a folder and a uri");
            }
            let feature = positional.remove(1);
            Command::Resolve {
                folder: positional.remove(0),
                feature,
                plugin,
                namespace,
                dev_mode,
            }
        }
        other => usage_error(&format!("Unknown command: {}", other)),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    match parse_args() {
        Command::Routes { folder, dev_mode } => run_routes(&folder, dev_mode),
        Command::Resolve {
            folder,
            feature,
            plugin,
            namespace,
            dev_mode,
        } => run_resolve(
            &folder,
            &feature,
            plugin.as_deref(),
            namespace.as_deref(),
            dev_mode,
        ),
    }
}

/// Load the application folder or exit with the error.
fn load_resolver(folder: &str, dev_mode: bool) -> Arc<ControllerResolver> {
    let path = Path::new(folder);
    if !path.is_dir() {
        eprintln!("{} folder not found: {}", "Error:".red().bold(), folder);
        process::exit(1);
    }

    let environment = if dev_mode {
        Environment::Development
    } else {
        Environment::current()
    };

    match soli_dispatch::load_artefacts(path, environment) {
        Ok((artefacts, _watcher)) => artefacts.current(),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn owning_plugin(resolver: &ControllerResolver, controller: &ControllerDescriptor) -> Option<String> {
    resolver
        .plugin_manager()
        .and_then(|plugins| plugins.plugin_for_class(controller.class_ref()))
        .map(|plugin| plugin.name().to_string())
}

fn run_routes(folder: &str, dev_mode: bool) {
    let resolver = load_resolver(folder, dev_mode);
    let controllers = resolver.source().controllers();

    if controllers.is_empty() {
        println!("{}", "No controllers found".yellow());
        return;
    }

    println!(
        "{} controllers ({})",
        controllers.len().to_string().bold(),
        resolver.config().environment
    );
    println!();

    for (priority, controller) in controllers.iter().enumerate().rev() {
        let mut origin = String::new();
        if let Some(plugin) = owning_plugin(&resolver, controller) {
            origin.push_str(&format!(" plugin={}", plugin));
        }
        if let Some(namespace) = controller.namespace() {
            origin.push_str(&format!(" namespace={}", namespace));
        }

        println!(
            "{:>4}  {}{}",
            priority,
            controller.class_ref().green(),
            origin.dimmed()
        );
        for pattern in controller.uri_patterns() {
            println!("        {}", pattern);
        }
    }
}

fn run_resolve(
    folder: &str,
    feature: &str,
    plugin: Option<&str>,
    namespace: Option<&str>,
    dev_mode: bool,
) {
    let resolver = load_resolver(folder, dev_mode);

    let found = if feature.trim_start().starts_with('{') {
        if plugin.is_some() || namespace.is_some() {
            usage_error("--plugin and --namespace cannot be combined with a JSON feature");
        }
        let value: serde_json::Value = match serde_json::from_str(feature) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("{} invalid JSON feature: {}", "Error:".red().bold(), e);
                process::exit(64);
            }
        };
        match resolver.try_resolve_json(&value) {
            Ok(found) => found,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                process::exit(64);
            }
        }
    } else {
        resolver.resolve(&FeatureId::qualified(feature, plugin, namespace))
    };

    match found {
        Some(controller) => {
            println!("{}", controller.class_ref().green().bold());
            println!("  logical name: {}", controller.logical_name());
            if let Some(namespace) = controller.namespace() {
                println!("  namespace:    {}", namespace);
            }
            if let Some(plugin) = owning_plugin(&resolver, &controller) {
                println!("  plugin:       {}", plugin);
            }
            if !controller.actions().is_empty() {
                println!("  actions:      {}", controller.actions().join(", "));
            }
        }
        None => {
            println!("{} {}", "not found:".red(), feature);
            process::exit(1);
        }
    }
}
