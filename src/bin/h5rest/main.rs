//! h5rest CLI - Inspect REST store responses saved as files.

use std::env;
use std::fs;
use std::process;
use std::sync::Arc;

use h5rest::catalog::{
    build_attribute_table, build_link_table, build_link_table_recursive, traverse_attributes, traverse_links,
    IndexType, IterOrder, LinkClass, VisitControl,
};
use h5rest::config::{CodecOptions, Settings};
use h5rest::creation::{decode_creation_properties, encode_creation_properties};
use h5rest::dataspace::{decode_shape, encode_selection, shape_to_json, Dataspace, RegularBlock, Selection};
use h5rest::datatype::{decode_type, decode_type_value, encode_type_with};
use h5rest::reference::decode_object_refs;
use h5rest::resolve::PathResolver;
use h5rest::transport::{MemoryTransport, Request, Transport};
use h5rest::util::encode_component;
use h5rest::{Error, ObjectKind, ObjectRef, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

/// Effective options for one invocation.
struct Context {
    settings: Settings,
    codec: CodecOptions,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let global = match parse_global_args(&args) {
        Ok(g) => g,
        Err(msg) => fail(&msg),
    };
    if global.show_version {
        print_version();
        return;
    }
    let GlobalArgs {
        verbosity,
        server_version,
        rest: filtered_args,
        ..
    } = global;

    init_logging(verbosity);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let mut settings = Settings::load();
    if let Some(v) = server_version {
        settings.server_version = v;
    }
    let codec = match settings.codec_options() {
        Ok(c) => c,
        Err(e) => fail(&format!("invalid server version '{}': {}", settings.server_version, e)),
    };
    tracing::debug!(server = %codec.server_version, "codec options");
    let ctx = Context { settings, codec };

    let command = filtered_args[0];
    let rest = &filtered_args[1..];
    let result = match command {
        "type" | "ty" => with_file(rest, "type <file.json>", |text| cmd_type(text, &ctx)),
        "shape" | "sh" => with_file(rest, "shape <file.json>", cmd_shape),
        "select" | "sel" => cmd_select(rest),
        "links" | "l" => with_file(rest, "links <file.json> [--creation] [--decreasing] [--start N]", |text| {
            cmd_links(text, &rest[1..], &ctx)
        }),
        "attrs" | "a" => with_file(rest, "attrs <file.json> [--creation] [--decreasing]", |text| {
            cmd_attrs(text, &rest[1..], &ctx)
        }),
        "tree" | "t" => cmd_tree(rest, &ctx),
        "resolve" | "r" => cmd_resolve(rest),
        "creation" | "c" => with_file(rest, "creation <file.json>", cmd_creation),
        "refs" => cmd_refs(rest),
        "config" => cmd_config(rest, &ctx),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'h5rest-cli help' for usage");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Global flags, taken from anywhere on the command line.
struct GlobalArgs<'a> {
    verbosity: Verbosity,
    server_version: Option<String>,
    show_version: bool,
    /// Command and its arguments
    rest: Vec<&'a str>,
}

fn parse_global_args(args: &[String]) -> std::result::Result<GlobalArgs<'_>, String> {
    let mut global = GlobalArgs {
        verbosity: Verbosity::Info,
        server_version: None,
        show_version: false,
        rest: Vec::new(),
    };
    // argv[0] is the program name, when present at all
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => global.verbosity = Verbosity::Debug,
            "-vv" | "--trace" => global.verbosity = Verbosity::Trace,
            "-q" | "--quiet" => global.verbosity = Verbosity::Quiet,
            "--server-version" => match iter.next() {
                Some(v) => global.server_version = Some(v.clone()),
                None => return Err("--server-version needs a value, e.g. 0.8.5".to_string()),
            },
            "--version" | "-V" => {
                global.show_version = true;
                break;
            }
            _ => global.rest.push(arg),
        }
    }
    Ok(global)
}

fn init_logging(verbosity: Verbosity) {
    // RUST_LOG wins over the command-line level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn print_version() {
    println!(
        "h5rest-cli {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("H5REST_BUILD_DATE"),
        env!("H5REST_BUILD_TIME")
    );
}

fn print_help() {
    println!("h5rest - HDF5 REST store JSON toolkit");
    println!();
    println!("USAGE:");
    println!("    h5rest-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    ty, type     <file>                 Decode a type document and re-encode it");
    println!("    sh, shape    <file>                 Decode a shape document and re-encode it");
    println!("    sel, select  <dims> <blocks> [--url] Print a hyperslab selection");
    println!("    l, links     <file> [flags]         Print a link listing in traversal order");
    println!("    a, attrs     <file> [flags]         Print an attribute listing");
    println!("    t, tree      <store> <domain>       Print the full link tree of a domain");
    println!("    r, resolve   <store> <domain> <path> [--kind K]");
    println!("                                        Resolve a path from the domain root");
    println!("    c, creation  <file>                 Decode dataset creation properties");
    println!("    refs         <file>                 Decode a binary object reference buffer");
    println!("    config       [--save]               Show (or save) the effective settings");
    println!("    h, help                             Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose              Show debug output");
    println!("    -vv, --trace               Show trace output (very verbose)");
    println!("    -q, --quiet                Only show errors");
    println!("    --server-version X.Y.Z     Assume this store version when encoding");
    println!("    -V, --version              Show version and build date");
    println!();
    println!("LISTING FLAGS:");
    println!("    --creation                 Order by creation time instead of name");
    println!("    --decreasing               Iterate in decreasing order");
    println!("    --start N                  Resume at index N");
    println!();
    println!("EXAMPLES:");
    println!("    h5rest-cli type dset.json                  # Show a dataset's type");
    println!("    h5rest-cli select 10,20 2:3:4:2,0:1:5:1    # Hyperslab as JSON");
    println!("    h5rest-cli select 10,20 2:3:4:2,0:1:5:1 --url");
    println!("    h5rest-cli links root_links.json --creation");
    println!("    h5rest-cli resolve store.json /home/f.h5 g1/g2/d1");
    println!();
    println!("NOTES:");
    println!("    - A store file maps domains to endpoints to response bodies:");
    println!("      {{\"/home/f.h5\": {{\"/\": {{\"root\": \"g-1\"}}, \"/groups/g-1/links\": ...}}}}");
    println!("    - Settings live in the user config directory under h5rest/settings.json");
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn with_file<F>(args: &[&str], usage: &str, run: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<()>,
{
    let Some(path) = args.first() else {
        eprintln!("Error: missing file argument");
        eprintln!("Usage: h5rest-cli {}", usage);
        process::exit(1);
    };
    tracing::info!("Reading {}", path);
    let text = fs::read_to_string(path)?;
    run(&text)
}

fn has_flag(args: &[&str], flag: &str) -> bool {
    args.iter().any(|&a| a == flag)
}

fn flag_value<'a>(args: &[&'a str], flag: &str) -> Option<&'a str> {
    args.iter().position(|&a| a == flag).and_then(|i| args.get(i + 1).copied())
}

fn listing_order(args: &[&str], ctx: &Context) -> Result<(IndexType, IterOrder)> {
    let index = if has_flag(args, "--creation") {
        IndexType::CreationOrder
    } else {
        ctx.settings.index_type()?
    };
    let order = if has_flag(args, "--decreasing") {
        IterOrder::Decreasing
    } else {
        ctx.settings.iter_order()?
    };
    Ok((index, order))
}

fn cmd_type(text: &str, ctx: &Context) -> Result<()> {
    let ty = match decode_type(text) {
        Err(Error::Parse(_)) => decode_type_value(text)?,
        other => other?,
    };
    println!("Type:  {}", ty);
    println!("Class: {}", ty.class_name());
    match ty.size() {
        Some(size) => println!("Size:  {} bytes", size),
        None => println!("Size:  (resolved by the store)"),
    }
    println!("JSON:  {}", encode_type_with(&ty, &ctx.codec)?);
    Ok(())
}

fn cmd_shape(text: &str) -> Result<()> {
    let space = decode_shape(text)?;
    println!("Shape:    {}", space);
    println!("Class:    {}", space.class_name());
    println!("Elements: {}", space.num_elements());
    println!("JSON:     {}", shape_to_json(&space).to_document());
    Ok(())
}

fn parse_list<T: std::str::FromStr>(text: &str, what: &str) -> Result<Vec<T>> {
    text.split(',')
        .map(|part| {
            part.trim()
                .parse()
                .map_err(|_| Error::invalid(format!("invalid {} '{}'", what, part)))
        })
        .collect()
}

fn cmd_select(args: &[&str]) -> Result<()> {
    if args.len() < 2 {
        eprintln!("Error: missing arguments");
        eprintln!("Usage: h5rest-cli select <d0,d1,...> <start:stride:count:block,...> [--url]");
        process::exit(1);
    }
    let dims: Vec<u64> = parse_list(args[0], "dimension")?;
    let space = Dataspace::simple(dims)?;

    let blocks = args[1]
        .split(',')
        .map(|dim| {
            let v: Vec<u64> = dim
                .split(':')
                .map(|n| n.parse().map_err(|_| Error::invalid(format!("invalid block '{}'", dim))))
                .collect::<Result<_>>()?;
            match v.as_slice() {
                [start, stride, count, block] => Ok(RegularBlock::new(*start, *stride, *count, *block)),
                [start, stride, count] => Ok(RegularBlock::new(*start, *stride, *count, 1)),
                _ => Err(Error::invalid(format!("expected start:stride:count[:block], got '{}'", dim))),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let selection = Selection::regular_hyperslab(&blocks)?;
    println!("{}", encode_selection(&space, &selection, has_flag(args, "--url"))?);
    Ok(())
}

fn link_target(class: &LinkClass) -> String {
    match class {
        LinkClass::Hard { target_uri, collection } => format!("{} {}", collection, target_uri),
        LinkClass::Soft { path } => format!("-> {}", path),
        LinkClass::External { domain, path } => format!("-> {}:{}", domain, path),
        LinkClass::UserDefined => "(user-defined)".to_string(),
    }
}

fn cmd_links(text: &str, args: &[&str], ctx: &Context) -> Result<()> {
    let (index, order) = listing_order(args, ctx)?;
    let start = flag_value(args, "--start")
        .map(|s| s.parse::<usize>().map_err(|_| Error::invalid(format!("invalid start index '{}'", s))))
        .transpose()?;

    let table = build_link_table(text, index)?;
    tracing::debug!("{} links", table.len());
    let outcome = traverse_links(&table, order, start, |path, entry| {
        println!("{:<24} {:<18} {:>14.3}  {}", path, entry.class.wire_name(), entry.created, link_target(&entry.class));
        Ok(VisitControl::Continue)
    })?;
    if let Some(last) = outcome.last_index {
        tracing::debug!("last index {}", last);
    }
    Ok(())
}

fn cmd_attrs(text: &str, args: &[&str], ctx: &Context) -> Result<()> {
    let (index, order) = listing_order(args, ctx)?;
    let table = build_attribute_table(text, index)?;
    traverse_attributes(&table, order, None, |name, entry| {
        let ty = entry.info.datatype.as_ref().map_or("?".to_string(), |t| t.to_string());
        let space = entry.info.dataspace.as_ref().map_or("?".to_string(), |s| s.to_string());
        let size = entry.info.data_size().map_or("-".to_string(), |s| format!("{} B", s));
        println!("{:<20} {:<28} {:<14} {:>10}", name, ty, space, size);
        Ok(VisitControl::Continue)
    })?;
    Ok(())
}

fn load_store(path: &str) -> Result<MemoryTransport> {
    tracing::info!("Loading store {}", path);
    MemoryTransport::from_store_json(&fs::read_to_string(path)?)
}

fn cmd_tree(args: &[&str], ctx: &Context) -> Result<()> {
    let [store, domain, ..] = args else {
        eprintln!("Error: missing arguments");
        eprintln!("Usage: h5rest-cli tree <store.json> <domain>");
        process::exit(1);
    };
    let transport = load_store(store)?;
    let opened = PathResolver::new(&transport).open_domain(domain)?;

    let request = Request::new(format!("/groups/{}/links", encode_component(&opened.root_uri)), *domain);
    let listing = transport.fetch(&request)?;
    let (index, order) = listing_order(args, ctx)?;
    let table = build_link_table_recursive(&listing, index, &transport, domain, &opened.root_uri)?;

    println!("/ ({})", opened.root_uri);
    traverse_links(&table, order, None, |path, entry| {
        let depth = path.matches('/').count();
        let name = path.rsplit('/').next().unwrap_or(path);
        println!("{}{}  {}", "  ".repeat(depth + 1), name, link_target(&entry.class));
        Ok(VisitControl::Continue)
    })?;
    tracing::info!("{} requests", transport.request_count());
    Ok(())
}

fn cmd_resolve(args: &[&str]) -> Result<()> {
    let [store, domain, path, ..] = args else {
        eprintln!("Error: missing arguments");
        eprintln!("Usage: h5rest-cli resolve <store.json> <domain> <path> [--kind group|dataset|datatype]");
        process::exit(1);
    };
    let known = match flag_value(args, "--kind") {
        None => None,
        Some("group") => Some(ObjectKind::Group),
        Some("dataset") => Some(ObjectKind::Dataset),
        Some("datatype") => Some(ObjectKind::Datatype),
        Some(other) => return Err(Error::invalid(format!("unknown kind '{}'", other))),
    };

    let transport = load_store(store)?;
    let resolver = PathResolver::new(&transport);
    let root = ObjectRef::root(Arc::new(resolver.open_domain(domain)?));
    let target = resolver.resolve(&root, path, known)?;

    println!("{} {} in {}", target.kind, target.uri, target.domain_path);
    tracing::info!("{} requests", transport.request_count());
    Ok(())
}

fn cmd_creation(text: &str) -> Result<()> {
    let props = decode_creation_properties(text)?;
    if let Some(layout) = &props.layout {
        println!("Layout:     {:?}", layout);
    }
    if let Some(t) = props.alloc_time {
        println!("Alloc time: {}", t.wire_name());
    }
    if let Some(t) = props.fill_time {
        println!("Fill time:  {}", t.wire_name());
    }
    if let Some(v) = &props.fill_value {
        println!("Fill value: {}", v);
    }
    for filter in &props.filters {
        println!("Filter:     {} ({}) {:?}", filter.class_name(), filter.id(), filter);
    }
    println!("JSON:       {}", encode_creation_properties(&props));
    Ok(())
}

fn cmd_refs(args: &[&str]) -> Result<()> {
    let Some(path) = args.first() else {
        eprintln!("Error: missing file argument");
        eprintln!("Usage: h5rest-cli refs <buffer.bin>");
        process::exit(1);
    };
    let refs = decode_object_refs(&fs::read(path)?)?;
    for (i, r) in refs.iter().enumerate() {
        match r {
            Some(r) => println!("[{}] {} {}", i, r.kind, r.uri),
            None => println!("[{}] (null)", i),
        }
    }
    Ok(())
}

fn cmd_config(args: &[&str], ctx: &Context) -> Result<()> {
    if let Some(path) = Settings::path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
    if has_flag(args, "--save") {
        ctx.settings.save();
        tracing::info!("Settings saved");
    }
    Ok(())
}
