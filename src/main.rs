// mind-loom: command-line editor over the persisted mind map state
// Build with: cargo build --features cli --bin mind-loom

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use mind_loom::graph_utils::graph::{EdgeStyle, LayoutKind, LineStyle, NodeDataPatch, NodeKind, ROOT_ID};
use mind_loom::graph_utils::store::GraphStore;
use mind_loom::persistence::exchange::{self, ExportDocument};
use mind_loom::persistence::persist;
use mind_loom::persistence::settings::AppSettings;
use mind_loom::shell::session::Session;

fn id_arg(name: &'static str) -> Arg {
    Arg::new(name).required(true).value_name("ID")
}

fn cli() -> Command {
    Command::new("mind-loom")
        .about("Mind-Loom: edit mind maps stored in the autosave directory")
        .arg(
            Arg::new("state_dir")
                .long("state-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Directory holding state.json (defaults to the configured autosave dir)"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Print the open map as a tree"))
        .subcommand(
            Command::new("add")
                .about("Add a node (loose, or under --parent)")
                .arg(Arg::new("parent").long("parent").value_name("ID"))
                .arg(Arg::new("stacked").long("stacked").action(ArgAction::SetTrue).help("Append to the parent's stacked list"))
                .arg(Arg::new("image").long("image").action(ArgAction::SetTrue).help("Create an image node"))
                .arg(Arg::new("label").long("label").value_name("TEXT")),
        )
        .subcommand(Command::new("sibling").about("Add a sibling next to a node").arg(id_arg("id")))
        .subcommand(
            Command::new("label")
                .about("Set a node's label")
                .arg(id_arg("id"))
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(Command::new("delete").about("Delete a node and its edges").arg(id_arg("id")))
        .subcommand(Command::new("connect").about("Connect two nodes").arg(id_arg("source")).arg(id_arg("target")))
        .subcommand(Command::new("collapse").about("Toggle collapse on a node").arg(id_arg("id")))
        .subcommand(
            Command::new("topic")
                .about("Attach a topic to a node")
                .arg(id_arg("id"))
                .arg(Arg::new("label").required(true)),
        )
        .subcommand(
            Command::new("edge-style")
                .about("Set the map-wide edge style")
                .arg(Arg::new("style").required(true).help("default | straight | step | smoothstep | simplebezier"))
                .arg(Arg::new("color").long("color").value_name("COLOR"))
                .arg(Arg::new("dashed").long("dashed").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("rename").about("Rename the open map").arg(Arg::new("name").required(true)))
        .subcommand(
            Command::new("export")
                .about("Export the open map as JSON")
                .arg(Arg::new("path").value_parser(value_parser!(PathBuf)).help("Defaults to <export dir>/<map name>.json")),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the open map with an exported JSON file")
                .arg(Arg::new("path").required(true).value_parser(value_parser!(PathBuf))),
        )
        .subcommand(Command::new("maps").about("List saved maps"))
        .subcommand(Command::new("save").about("Save the open map into the saved-map list"))
        .subcommand(Command::new("load").about("Open a saved map").arg(id_arg("id")))
        .subcommand(Command::new("delete-map").about("Remove a saved map").arg(id_arg("id")))
        .subcommand(Command::new("new").about("Start a new map (backs up the current one)"))
        .subcommand(Command::new("versions").about("List state backups, newest first"))
}

fn arg<'a>(m: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{}>", name))
}

fn parse_edge_style(s: &str) -> anyhow::Result<EdgeStyle> {
    let style: EdgeStyle = serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
        .map_err(|_| anyhow!("unknown edge style '{}'", s))?;
    if !style.is_map_default_choice() {
        bail!("'{}' is reserved for stacked children", s);
    }
    Ok(style)
}

fn print_tree(store: &GraphStore) {
    println!("{} [{}]", store.map_name(), store.map_id());
    let mut seen = HashSet::new();
    print_subtree(store, ROOT_ID, 0, &mut seen);
    for node in store.nodes() {
        if !seen.contains(node.id.as_str()) && store.graph().incoming_edge(&node.id).is_none() {
            print_subtree(store, &node.id, 0, &mut seen);
        }
    }
}

fn print_subtree<'a>(store: &'a GraphStore, id: &'a str, depth: usize, seen: &mut HashSet<&'a str>) {
    let Some(node) = store.node(id) else { return };
    if !seen.insert(node.id.as_str()) {
        return;
    }
    let mut flags = Vec::new();
    if let Some(o) = node.data.order { flags.push(format!("#{}", o)); }
    if node.data.is_collapsed() { flags.push("collapsed".to_string()); }
    if node.hidden { flags.push("hidden".to_string()); }
    if node.kind == NodeKind::Image { flags.push("image".to_string()); }
    let flags = if flags.is_empty() { String::new() } else { format!(" ({})", flags.join(", ")) };
    println!("{}- {} [{}]{}", "  ".repeat(depth), node.data.label, node.id, flags);
    for topic in node.data.topics.iter().flatten() {
        println!("{}  * {}", "  ".repeat(depth), topic.label);
    }
    for child in store.children_of(&node.id) {
        print_subtree(store, &child.id, depth + 1, seen);
    }
}

fn run(session: &mut Session, matches: &ArgMatches) -> anyhow::Result<()> {
    let Some((name, sub)) = matches.subcommand() else { bail!("no command given") };
    let store = session.store_mut();
    match name {
        "show" => print_tree(store),
        "add" => {
            let parent = sub.get_one::<String>("parent").map(String::as_str);
            let kind = if sub.get_flag("image") { NodeKind::Image } else { NodeKind::Text };
            let layout = if sub.get_flag("stacked") { LayoutKind::Stacked } else { LayoutKind::Default };
            let id = store.add_node(parent, kind, layout).ok_or_else(|| anyhow!("unknown parent"))?;
            if let Some(label) = sub.get_one::<String>("label") {
                store.update_node_data(&id, &NodeDataPatch::label(label.clone()));
            }
            println!("{}", id);
        }
        "sibling" => {
            let id = store.add_sibling(arg(sub, "id")?).ok_or_else(|| anyhow!("no sibling added"))?;
            println!("{}", id);
        }
        "label" => {
            if !store.update_node_data(arg(sub, "id")?, &NodeDataPatch::label(arg(sub, "text")?)) {
                bail!("unknown node");
            }
        }
        "delete" => {
            if !store.delete_node(arg(sub, "id")?) {
                bail!("nothing deleted (unknown node or root)");
            }
        }
        "connect" => {
            let id = store
                .connect(arg(sub, "source")?, arg(sub, "target")?)
                .ok_or_else(|| anyhow!("both nodes must exist"))?;
            println!("{}", id);
        }
        "collapse" => {
            if !store.toggle_collapse(arg(sub, "id")?) {
                bail!("unknown node");
            }
        }
        "topic" => {
            let id = store.add_topic(arg(sub, "id")?, arg(sub, "label")?).ok_or_else(|| anyhow!("unknown node"))?;
            println!("{}", id);
        }
        "edge-style" => {
            store.set_edge_style(parse_edge_style(arg(sub, "style")?)?);
            if let Some(color) = sub.get_one::<String>("color") {
                store.set_edge_color(color.clone());
            }
            if sub.get_flag("dashed") {
                store.set_edge_line_style(LineStyle::Dashed);
            }
        }
        "rename" => store.rename_map(arg(sub, "name")?),
        "export" => {
            let path = match sub.get_one::<PathBuf>("path") {
                Some(p) => p.clone(),
                None => session.settings().export_dir().join(format!("{}.json", session.store().map_name())),
            };
            exchange::export_to_path(session.store(), &path)?;
            println!("Exported to {}", path.display());
        }
        "import" => {
            let path = sub.get_one::<PathBuf>("path").ok_or_else(|| anyhow!("missing path"))?;
            let doc: ExportDocument = exchange::read_document(path)?;
            if !store.apply_import(doc) {
                bail!("{} has duplicate node ids", path.display());
            }
        }
        "maps" => {
            for m in store.saved_maps() {
                println!("{}  {}  (updated {}, {} nodes)", m.id, m.name, m.updated_at, m.nodes.len());
            }
        }
        "save" => store.save_current_map(),
        "load" => {
            if !store.load_map(arg(sub, "id")?) {
                bail!("no saved map with that id");
            }
        }
        "delete-map" => {
            if !store.delete_map(arg(sub, "id")?) {
                bail!("no saved map with that id");
            }
        }
        "new" => session.new_map(),
        "versions" => {
            for p in persist::list_versions(session.state_dir())? {
                println!("{}", p.display());
            }
        }
        other => bail!("unknown command '{}'", other),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let matches = cli().get_matches();
    if let Some(dir) = matches.get_one::<PathBuf>("state_dir") {
        persist::set_state_dir_override(dir.clone());
    }
    let settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("settings unreadable, using defaults: {:#}", e);
        AppSettings::default()
    });
    let mut session = Session::open(settings, persist::state_dir());
    run(&mut session, &matches)?;
    if session.is_dirty() {
        let path = session.save_now()?;
        log::info!("state written to {}", path.display());
    }
    Ok(())
}
