use std::time::Duration;

use futures::StreamExt;
use mapsync::Config;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsRead = futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

fn reserve_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

async fn next_state_frame(read: &mut WsRead) -> Value {
    timeout(Duration::from_secs(3), async {
        while let Some(msg) = read.next().await {
            if let Ok(Message::Text(text)) = msg {
                let value: Value = serde_json::from_str(text.as_str()).expect("frame json");
                if value["type"] == json!("state") {
                    return value;
                }
            }
        }
        panic!("connection closed before a state frame arrived");
    })
    .await
    .expect("timed out waiting for state frame")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn broadcast_fans_out_and_survives_disconnects() {
    let temp_dir = TempDir::new().unwrap();
    let port = reserve_port().unwrap();

    let config = Config {
        bind_addr: format!("127.0.0.1:{port}"),
        db_path: temp_dir.path().join("state.db"),
        admin_password: "fanout-secret".into(),
        static_dir: temp_dir.path().join("static"),
    };

    let server = tokio::spawn(async move {
        let _ = mapsync::server::start(config).await;
    });

    sleep(Duration::from_millis(200)).await;

    let url = format!("ws://127.0.0.1:{port}/ws");

    // Two viewers, each synced on connect
    let (ws_a, _) = tokio_tungstenite::connect_async(url.clone()).await.expect("ws A");
    let (ws_b, _) = tokio_tungstenite::connect_async(url.clone()).await.expect("ws B");
    let (_write_a, mut read_a) = ws_a.split();
    let (write_b, mut read_b) = ws_b.split();

    assert_eq!(next_state_frame(&mut read_a).await["state"]["version"], json!(1));
    assert_eq!(next_state_frame(&mut read_b).await["state"]["version"], json!(1));

    // One write reaches both viewers
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/state"))
        .header("x-admin-password", "fanout-secret")
        .json(&json!({ "objects": [{ "type": "marker", "lat": 3, "lng": 4 }] }))
        .send()
        .await
        .expect("first write");
    assert_eq!(resp.status(), 200);

    assert_eq!(next_state_frame(&mut read_a).await["state"]["version"], json!(2));
    assert_eq!(next_state_frame(&mut read_b).await["state"]["version"], json!(2));

    // Viewer B goes away; the next write must still reach A
    drop(write_b);
    drop(read_b);
    sleep(Duration::from_millis(100)).await;

    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/state"))
        .header("x-admin-password", "fanout-secret")
        .json(&json!({ "objects": [] }))
        .send()
        .await
        .expect("second write");
    assert_eq!(resp.status(), 200);

    let frame = next_state_frame(&mut read_a).await;
    assert_eq!(frame["state"]["version"], json!(3));
    assert_eq!(frame["state"]["objects"], json!([]));

    // A late joiner catches up through the connect-time frame
    let (ws_c, _) = tokio_tungstenite::connect_async(url).await.expect("ws C");
    let (_write_c, mut read_c) = ws_c.split();
    let frame = next_state_frame(&mut read_c).await;
    assert_eq!(frame["state"]["version"], json!(3));

    server.abort();
}
