//! In-memory stand-in for the Todoist Sync API.
//!
//! `POST /sync` takes a JSON array of commands and applies them in order
//! under a single write lock. A rejected command does not stop the ones after
//! it; the response reports a status per command uuid and the real ids
//! assigned to temp ids.

pub mod store;

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub use store::{Item, Project, Store, WireCommand};

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    pub sync_status: BTreeMap<String, Value>,
    pub temp_id_mapping: HashMap<String, String>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/sync", post(sync))
        .route("/items", get(list_items))
        .route("/projects", get(list_projects))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock sync server started");
    axum::serve(listener, app()).await
}

async fn sync(State(db): State<Db>, Json(commands): Json<Vec<WireCommand>>) -> Json<SyncResponse> {
    let mut store = db.write().await;
    let mut response = SyncResponse::default();

    for cmd in commands {
        let status = match store.apply(&cmd, &response.temp_id_mapping) {
            Ok(created) => {
                if let (Some(temp_id), Some(id)) = (cmd.temp_id, created) {
                    response.temp_id_mapping.insert(temp_id, id);
                }
                json!("ok")
            }
            Err(err) => {
                debug!(command = %cmd.command_type, code = err.code, "command rejected");
                json!({
                    "error_code": err.code,
                    "error": err.message,
                    "http_code": err.http_code,
                })
            }
        };
        response.sync_status.insert(cmd.uuid, status);
    }

    Json(response)
}

async fn list_items(State(db): State<Db>) -> Json<Vec<Item>> {
    Json(db.read().await.items.values().cloned().collect())
}

async fn list_projects(State(db): State<Db>) -> Json<Vec<Project>> {
    Json(db.read().await.projects.values().cloned().collect())
}
