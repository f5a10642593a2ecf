use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use glam::DVec3;
use waypoint_core::{ActorId, Position, ProxyId, WaypointConfig, WorldId};
use waypoint_engine::test_harness::{ScriptedPrompt, TestActors};
use waypoint_engine::{CommandError, MemoryStore, WaypointService};
use waypoint_render::{EntityLink, Metadata, MetadataKey, MetadataValue, ProxySpawn, RenderBackend};

/// Backend that logs what each viewer's client would receive.
struct LoggingBackend;

impl RenderBackend for LoggingBackend {
    fn spawn(&self, viewer: ActorId, spawn: ProxySpawn) {
        log::info!(
            "[{}] spawn {} {:?} at ({:.2}, {:.2}, {:.2}) with {} link(s)",
            viewer,
            spawn.proxy,
            spawn.kind,
            spawn.position.x,
            spawn.position.y,
            spawn.position.z,
            spawn.links.len()
        );
    }

    fn despawn(&self, viewer: ActorId, proxy: ProxyId) {
        log::info!("[{}] despawn {}", viewer, proxy);
    }

    fn set_metadata(&self, viewer: ActorId, proxy: ProxyId, metadata: Metadata) {
        for (key, value) in metadata {
            match (key, value) {
                (MetadataKey::Nametag, MetadataValue::String(label)) => {
                    log::info!("[{}] {} label '{}'", viewer, proxy, label);
                }
                (key, value) => log::debug!("[{}] {} {:?} = {:?}", viewer, proxy, key, value),
            }
        }
    }

    fn send_link(&self, viewer: ActorId, link: EntityLink) {
        log::info!(
            "[{}] link {:?} {:?} -> {:?}",
            viewer,
            link.kind,
            link.parent,
            link.child
        );
    }
}

fn load_config(path: Option<PathBuf>) -> WaypointConfig {
    let Some(path) = path else {
        return WaypointConfig::default();
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    match WaypointConfig::from_ron_str(&text) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn report<T: std::fmt::Display>(command: &str, result: Result<T, CommandError>) {
    match result {
        Ok(message) => println!("> {command}: {message}"),
        Err(e) => println!("> {command}: {e}"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--config needs a path");
                        process::exit(1);
                    }
                }
            }
            "--help" | "-h" => {
                eprintln!("Usage: waypoint-demo [OPTIONS]");
                eprintln!("  --config <path>   Load a RON waypoint config");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = load_config(config_path);
    let actors = Arc::new(TestActors::new());
    let prompt = Arc::new(ScriptedPrompt::new());
    let service = WaypointService::builder(
        Arc::new(MemoryStore::new()),
        Arc::new(LoggingBackend),
        actors.clone(),
        prompt.clone(),
    )
    .config(config)
    .build();

    let world = WorldId::new("overworld");
    let spawn = Position::new(world.clone(), DVec3::new(0.5, 64.0, 0.5));
    let actor = actors.join(spawn.clone());
    if let Err(e) = service.on_actor_join(actor).await {
        log::error!("join failed: {}", e);
    }

    prompt.accept_defaults();
    report(
        "set home",
        service
            .set_waypoint(actor, "home", "&aHome", DVec3::new(120.0, 70.0, -45.0), true)
            .await,
    );
    report("sethere camp", service.set_waypoint_here(actor, "camp", None).await);

    match service.list(actor, 1).await {
        Ok(page) => {
            println!("> list: page {}/{} ({} total)", page.page, page.pages, page.total);
            for entry in page.entries {
                let marker = if entry.selected { "*" } else { " " };
                println!("  {}{}. {} ({})", marker, entry.index, entry.name, entry.waypoint.title);
            }
        }
        Err(e) => println!("> list: {e}"),
    }

    let walked = Position::new(world.clone(), DVec3::new(20.5, 64.0, 0.5));
    actors.move_to(actor, walked.clone());
    service.on_actor_move(actor, &spawn, &walked);

    let far = Position::new(world.clone(), DVec3::new(500.0, 64.0, 500.0));
    actors.move_to(actor, far.clone());
    service.on_actor_teleport(actor, &walked, &far);
    let settled = Position::new(world, DVec3::new(502.0, 64.0, 500.0));
    actors.move_to(actor, settled.clone());
    service.on_actor_move(actor, &far, &settled);

    report("rename camp", service.rename(actor, "camp", "&eCamp").await);
    match service.toggle(actor, Some("home")).await {
        Ok(outcomes) => {
            for outcome in outcomes {
                println!("> toggle home: {outcome}");
            }
        }
        Err(e) => println!("> toggle home: {e}"),
    }
    match service.face(actor, "home").await {
        Ok(face) => println!("> face home: yaw {:.1}, pitch {:.1}", face.yaw, face.pitch),
        Err(e) => println!("> face home: {e}"),
    }
    report("delete camp", service.delete_waypoint(actor, "camp").await);

    service.on_actor_respawn(actor);
    service.on_actor_quit(actor);
    actors.disconnect(actor);
    log::info!("session finished with {} renderer(s) left", service.renderer_count(actor));
}
