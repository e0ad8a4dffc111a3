//! Integration tests for the RPC template backend
//!
//! A mock template server runs in-process on a Unix socket and speaks the
//! real codec. It answers `render_template` by pushing the first result
//! *before* the reply, which exercises early-notification buffering.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chipdeck_core::{
    BackendErrorKind, ChipConfig, ChipField, ResultCache, TemplateBackend, TemplateChip,
    TemplateRequest, TemplateResult, Unsubscribe,
};
use chipdeck_rpc::{
    ClientError, Message, Notification, RENDER_TEMPLATE, RenderTemplateParams, Request,
    RequestId, Response, RpcClient, RpcError, RpcTemplateBackend, TEMPLATE_RESULT,
    TemplateEvent, TemplateResultParams, UNSUBSCRIBE, UnsubscribeParams,
};
use chipdeck_rpc::transport::JsonRpcCodec;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

/// Commands the test sends to the running server
enum ServerCommand {
    Push(TemplateResultParams),
    Close,
}

struct MockServer {
    _dir: TempDir,
    path: PathBuf,
    commands: mpsc::UnboundedSender<ServerCommand>,
    received: Arc<Mutex<Vec<Request>>>,
}

impl MockServer {
    fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chipdeck.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let (commands, rx) = mpsc::unbounded_channel();
        let received = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn(serve(listener, rx, Arc::clone(&received)));

        Self {
            _dir: dir,
            path,
            commands,
            received,
        }
    }

    fn push(&self, subscription: u64, event: TemplateEvent) {
        let _ = self.commands.send(ServerCommand::Push(TemplateResultParams {
            subscription,
            event,
        }));
    }

    fn close(&self) {
        let _ = self.commands.send(ServerCommand::Close);
    }

    fn methods(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.method.clone())
            .collect()
    }

    fn requests(&self) -> Vec<Request> {
        self.received.lock().unwrap().clone()
    }
}

fn notification(params: &TemplateResultParams) -> Message {
    Message::Notification(Notification::new(
        TEMPLATE_RESULT,
        Some(serde_json::to_value(params).unwrap()),
    ))
}

async fn serve(
    listener: UnixListener,
    mut commands: mpsc::UnboundedReceiver<ServerCommand>,
    received: Arc<Mutex<Vec<Request>>>,
) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut framed = Framed::new(stream, JsonRpcCodec::new());
    let mut live: Vec<u64> = Vec::new();
    let mut next_subscription = 100;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ServerCommand::Push(params)) => {
                    framed.send(notification(&params)).await.unwrap();
                }
                Some(ServerCommand::Close) | None => return,
            },
            message = framed.next() => {
                let Some(Ok(Message::Request(request))) = message else {
                    return;
                };
                received.lock().unwrap().push(request.clone());
                let Some(id) = request.id.clone() else {
                    continue;
                };

                let reply = match request.method.as_str() {
                    RENDER_TEMPLATE => {
                        let params: RenderTemplateParams =
                            serde_json::from_value(request.params.unwrap_or_default()).unwrap();
                        if params.template.contains("fail") {
                            Response::error(id, RpcError::template_error("TemplateSyntaxError"))
                        } else if params.template.contains("slow") {
                            continue;
                        } else {
                            next_subscription += 1;
                            let subscription = next_subscription;
                            live.push(subscription);
                            let first = TemplateResultParams {
                                subscription,
                                event: TemplateEvent::Rendered(TemplateResult::literal(format!(
                                    "rendered {}",
                                    params.template
                                ))),
                            };
                            framed.send(notification(&first)).await.unwrap();
                            Response::success(id, json!({ "subscription": subscription }))
                        }
                    }
                    UNSUBSCRIBE => {
                        let params: UnsubscribeParams =
                            serde_json::from_value(request.params.unwrap_or_default()).unwrap();
                        if let Some(index) = live.iter().position(|s| *s == params.subscription) {
                            live.remove(index);
                            Response::success(id, serde_json::Value::Null)
                        } else {
                            Response::error(id, RpcError::subscription_not_found(params.subscription))
                        }
                    }
                    _ => Response::error(id, RpcError::method_not_found()),
                };
                framed.send(Message::Response(reply)).await.unwrap();
            }
        }
    }
}

fn template_request(template: &str) -> TemplateRequest {
    TemplateRequest {
        template: template.to_string(),
        entity_ids: Some(vec!["sensor.outside".to_string()]),
        variables: json!({ "config": {}, "user": null, "entity": "sensor.outside" }),
        strict: true,
    }
}

async fn connect(server: &MockServer) -> Arc<RpcClient> {
    Arc::new(RpcClient::connect_to(&server.path).await.unwrap())
}

async fn recv_event(events: &mut mpsc::UnboundedReceiver<TemplateEvent>) -> TemplateEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_render_template_replays_early_result() {
    let server = MockServer::start();
    let client = connect(&server).await;

    let (subscription, mut events) = client
        .render_template(template_request("{{ states('sensor.outside') }}").into())
        .await
        .unwrap();

    assert_eq!(subscription, 101);
    assert_eq!(
        recv_event(&mut events).await,
        TemplateEvent::Rendered(TemplateResult::literal(
            "rendered {{ states('sensor.outside') }}"
        ))
    );

    let sent = server.requests();
    let params = sent[0].params.clone().unwrap();
    assert_eq!(params["entity_ids"], json!(["sensor.outside"]));
    assert_eq!(params["strict"], json!(true));
}

#[tokio::test]
async fn test_pushed_results_reach_subscription() {
    let server = MockServer::start();
    let client = connect(&server).await;
    let (subscription, mut events) = client
        .render_template(template_request("{{ now() }}").into())
        .await
        .unwrap();
    let _first = recv_event(&mut events).await;

    server.push(
        subscription,
        TemplateEvent::Rendered(TemplateResult::literal("12:00")),
    );
    server.push(
        subscription,
        TemplateEvent::Failed {
            error: "UndefinedError".to_string(),
            level: Some("ERROR".to_string()),
        },
    );

    assert_eq!(
        recv_event(&mut events).await,
        TemplateEvent::Rendered(TemplateResult::literal("12:00"))
    );
    assert!(matches!(
        recv_event(&mut events).await,
        TemplateEvent::Failed { .. }
    ));
}

#[tokio::test]
async fn test_template_error_reply() {
    let server = MockServer::start();
    let client = connect(&server).await;

    let err = client
        .render_template(template_request("{{ fail").into())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Rpc {
            code: chipdeck_rpc::TEMPLATE_ERROR,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unsubscribe_and_unknown_subscription() {
    let server = MockServer::start();
    let client = connect(&server).await;
    let (subscription, _events) = client
        .render_template(template_request("{{ 1 }}").into())
        .await
        .unwrap();

    client.unsubscribe(subscription).await.unwrap();
    let err = client.unsubscribe(subscription).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Rpc {
            code: chipdeck_rpc::NOT_FOUND,
            ..
        }
    ));
    assert_eq!(
        server.methods(),
        vec![RENDER_TEMPLATE, UNSUBSCRIBE, UNSUBSCRIBE]
    );
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start();
    let client = RpcClient::connect_to(&server.path)
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(50));

    let err = client
        .render_template(template_request("{{ slow }}").into())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
}

#[tokio::test]
async fn test_connection_close_ends_streams_and_requests() {
    let server = MockServer::start();
    let client = connect(&server).await;
    let (_subscription, mut events) = client
        .render_template(template_request("{{ 2 }}").into())
        .await
        .unwrap();
    let _first = recv_event(&mut events).await;

    server.close();

    let closed = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
    assert!(!client.is_connected());

    let err = client
        .render_template(template_request("{{ 3 }}").into())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ConnectionClosed));
}

#[tokio::test]
async fn test_backend_subscribe_delivers_results() {
    let server = MockServer::start();
    let backend = RpcTemplateBackend::new(connect(&server).await);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let unsubscribe: Unsubscribe = backend
        .subscribe(
            template_request("{{ 4 }}"),
            Arc::new(move |result: TemplateResult| {
                let _ = tx.send(result);
            }),
        )
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.result, "rendered {{ 4 }}");

    unsubscribe.call().await.unwrap();
    assert_eq!(server.methods().last().map(String::as_str), Some(UNSUBSCRIBE));
}

#[tokio::test]
async fn test_backend_maps_template_error() {
    let server = MockServer::start();
    let backend = RpcTemplateBackend::new(connect(&server).await);

    let err = backend
        .subscribe(template_request("{{ fail }}"), Arc::new(|_: TemplateResult| {}))
        .await
        .unwrap_err();

    assert_eq!(err.kind, BackendErrorKind::TemplateError);
}

#[tokio::test]
async fn test_chip_end_to_end() {
    let server = MockServer::start();
    let backend: Arc<dyn TemplateBackend> =
        Arc::new(RpcTemplateBackend::new(connect(&server).await));
    let cache = ResultCache::default();
    let (tx, mut updates) = mpsc::unbounded_channel();

    let config = ChipConfig {
        entity: Some("sensor.outside".to_string()),
        ..Default::default()
    }
    .with_field(ChipField::Primary, "{{ states(entity) }} [mdi:thermometer]")
    .with_field(ChipField::Icon, "mdi:weather-sunny");

    let mut chip = TemplateChip::with_updates(cache.clone(), tx);
    chip.set_config(config.clone()).await.unwrap();
    chip.set_backend(Arc::clone(&backend), None);
    chip.mount();

    let field = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .unwrap();
    assert_eq!(field, Some(ChipField::Primary));

    let view = chip.render().unwrap();
    assert_eq!(view.icon.as_deref(), Some("mdi:weather-sunny"));
    assert_eq!(view.primary.len(), 2);

    chip.unmount().await.unwrap();
    assert_eq!(cache.len(), 1);

    // Same config on a new chip shows the cached value right away
    let mut again = TemplateChip::new(cache);
    again.set_config(config).await.unwrap();
    assert_eq!(
        again.value(ChipField::Primary).as_deref(),
        Some("rendered {{ states(entity) }} [mdi:thermometer]")
    );

    let sent = server.requests();
    assert_eq!(sent[0].id, Some(RequestId::Number(1)));
}
