//! End-to-end tests against the live mock sync server.
//!
//! # Design
//! Starts the mock server on a random port and drives the executor over real
//! HTTP. The transport wraps a blocking `ureq` agent in `spawn_blocking`, the
//! same way a host application would plug in its own HTTP stack.

use async_trait::async_trait;
use todoist_core::items::{self, AddItem, MoveItem, MoveTarget, ReorderEntry, UpdateItem};
use todoist_core::projects::{self, AddProject};
use todoist_core::{
    ApiError, CommandBatch, CommandExecutor, ComplexId, HttpMethod, HttpRequest, HttpResponse,
    TempId, TodoistClient, Transport, TransportError,
};

struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.path)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
    }?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn items_on_server(base_url: &str) -> Vec<mock_server::Item> {
    let agent = UreqTransport::new().agent;
    let response = execute(
        &agent,
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{base_url}/items"),
            headers: Vec::new(),
            body: None,
        },
    )
    .unwrap();
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_lifecycle() {
    let base_url = start_server();
    let executor = CommandExecutor::new(TodoistClient::new(&base_url), UreqTransport::new());

    // Step 1: project and two tasks in one batch, tasks referencing the
    // project through its temp id.
    let project = TempId::new("p1");
    let milk = TempId::new("t1");
    let bread = TempId::new("t2");
    let mut batch = CommandBatch::new();
    batch
        .add(projects::add(project.clone(), &AddProject::new("Groceries")).unwrap())
        .unwrap()
        .add(items::add(milk.clone(), &AddItem::new("Milk").in_project(project.clone())).unwrap())
        .unwrap()
        .add(items::add(bread.clone(), &AddItem::new("Bread").in_project(project.clone())).unwrap())
        .unwrap();
    let report = executor.execute(batch).await.unwrap();

    let project_id = report.resolve(&project).unwrap().to_string();
    let milk_id = report.resolve(&milk).unwrap().to_string();
    let bread_id = report.resolve(&bread).unwrap().to_string();
    assert_eq!(report.applied_count(), 3);

    let on_server = items_on_server(&base_url);
    assert_eq!(on_server.len(), 2);
    assert!(on_server.iter().all(|item| item.project_id == project_id));

    // Step 2: a batch with one bad command. The good ones are still applied.
    let extra = TempId::new("t3");
    let err = executor
        .submit(vec![
            items::add(extra.clone(), &AddItem::new("Eggs")).unwrap(),
            items::close(&ComplexId::real("does-not-exist")).unwrap(),
            items::close(&ComplexId::real(milk_id.clone())).unwrap(),
        ])
        .await
        .unwrap_err();
    let ApiError::Batch(batch_err) = err else {
        panic!("expected a batch error");
    };
    assert_eq!(batch_err.failures().len(), 1);
    assert_eq!(batch_err.failures()[0].code, 22);
    assert_eq!(batch_err.failures()[0].message, "Item not found");
    let extra_id = batch_err.report().resolve(&extra).unwrap().to_string();

    let on_server = items_on_server(&base_url);
    assert_eq!(on_server.len(), 3);
    assert!(on_server.iter().find(|i| i.id == milk_id).unwrap().checked);
    assert!(on_server.iter().any(|i| i.id == extra_id));

    // Step 3: services on resolved ids.
    let service = executor.items();
    let mut update = UpdateItem::new(bread_id.as_str());
    update.content = Some("Sourdough".to_string());
    update.priority = Some(3);
    service.update(&update).await.unwrap();
    service
        .move_item(&MoveItem {
            id: ComplexId::real(extra_id.clone()),
            target: MoveTarget::Project(ComplexId::real(project_id.clone())),
        })
        .await
        .unwrap();
    service
        .reorder(&[
            ReorderEntry {
                id: ComplexId::real(bread_id.clone()),
                child_order: 1,
            },
            ReorderEntry {
                id: ComplexId::real(extra_id.clone()),
                child_order: 2,
            },
        ])
        .await
        .unwrap();

    let on_server = items_on_server(&base_url);
    let bread_item = on_server.iter().find(|i| i.id == bread_id).unwrap();
    assert_eq!(bread_item.content, "Sourdough");
    assert_eq!(bread_item.priority, 3);
    assert_eq!(bread_item.child_order, 1);
    let extra_item = on_server.iter().find(|i| i.id == extra_id).unwrap();
    assert_eq!(extra_item.project_id, project_id);

    // Step 4: delete the project; its tasks go with it.
    executor.projects().delete(project_id.as_str()).await.unwrap();
    assert!(items_on_server(&base_url).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn services_return_real_ids() {
    let base_url = start_server();
    let executor = CommandExecutor::new(TodoistClient::new(&base_url), UreqTransport::new());

    let project_id = executor.projects().add(&AddProject::new("Work")).await.unwrap();
    let item_id = executor
        .items()
        .add(&AddItem::new("Write report").in_project(project_id.as_str()))
        .await
        .unwrap();
    assert_ne!(project_id, item_id);

    executor.items().close(item_id.as_str()).await.unwrap();
    executor.items().uncomplete(item_id.as_str()).await.unwrap();
    let on_server = items_on_server(&base_url);
    assert!(!on_server[0].checked);

    let err = executor.items().delete("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::Batch(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let executor = CommandExecutor::new(
        TodoistClient::new(&format!("http://{addr}")),
        UreqTransport::new(),
    );

    let temp = TempId::new("t1");
    let err = executor
        .submit(vec![items::add(temp, &AddItem::new("Lost")).unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Connection(_))));
}
