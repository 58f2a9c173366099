use actix_web::web::Bytes;
use awc::{ws, Client};
use futures_util::SinkExt;
use serde_json::{json, Value};

use super::support::{loopback_dispatcher, next_json, start_relay_server};

#[actix_rt::test]
async fn chat_scenario_over_websocket() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");
    let client = Client::new();

    let (_resp, mut a) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect client a");
    assert_eq!(
        next_json(&mut a).await,
        json!({"type": "client_id", "client_id": "c1"})
    );
    assert_eq!(
        next_json(&mut a).await,
        json!({"type": "clients", "clients": ["c1"]})
    );

    let (_resp, mut b) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect client b");
    let both = json!({"type": "clients", "clients": ["c1", "c2"]});
    assert_eq!(
        next_json(&mut b).await,
        json!({"type": "client_id", "client_id": "c2"})
    );
    assert_eq!(next_json(&mut b).await, both);
    assert_eq!(next_json(&mut a).await, both);

    a.send(ws::Message::Text("hello".into()))
        .await
        .expect("send hello");
    let hello = json!({"type": "message", "content": "hello"});
    assert_eq!(next_json(&mut a).await, hello);
    assert_eq!(next_json(&mut b).await, hello);

    b.send(ws::Message::Close(None)).await.expect("close b");
    assert_eq!(
        next_json(&mut a).await,
        json!({"type": "clients", "clients": ["c1"]})
    );

    handle.stop(false).await;
}

#[actix_rt::test]
async fn utf8_binary_frames_are_relayed_as_text() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");

    let (_resp, mut conn) = Client::new()
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect");
    next_json(&mut conn).await;
    next_json(&mut conn).await;

    conn.send(ws::Message::Binary(Bytes::from_static(b"raw bytes")))
        .await
        .expect("send binary");
    assert_eq!(
        next_json(&mut conn).await,
        json!({"type": "message", "content": "raw bytes"})
    );

    handle.stop(false).await;
}

#[actix_rt::test]
async fn non_utf8_binary_frames_are_dropped() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");

    let (_resp, mut conn) = Client::new()
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect");
    next_json(&mut conn).await;
    next_json(&mut conn).await;

    conn.send(ws::Message::Binary(Bytes::from_static(&[0xff, 0xfe, 0xfd])))
        .await
        .expect("send binary");
    conn.send(ws::Message::Text("still here".into()))
        .await
        .expect("send text");

    // the bad frame is skipped and the session stays open
    assert_eq!(
        next_json(&mut conn).await,
        json!({"type": "message", "content": "still here"})
    );

    handle.stop(false).await;
}

#[actix_rt::test]
async fn reconnect_after_last_client_left_gets_fresh_identity() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");
    let client = Client::new();

    let (_resp, mut first) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect first");
    next_json(&mut first).await;
    next_json(&mut first).await;
    first.send(ws::Message::Close(None)).await.expect("close");
    drop(first);

    let (_resp, mut second) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect second");
    assert_eq!(
        next_json(&mut second).await,
        json!({"type": "client_id", "client_id": "c2"})
    );
    // the departed client may or may not still be listed depending on how fast
    // its close was processed, but the newcomer always is
    let roster = next_json(&mut second).await;
    assert_eq!(roster["type"], "clients");
    assert!(roster["clients"]
        .as_array()
        .expect("client list")
        .contains(&Value::from("c2")));

    handle.stop(false).await;
}

#[actix_rt::test]
async fn health_reports_connected_clients() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");
    let client = Client::new();

    let (_resp, mut conn) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect");
    next_json(&mut conn).await;

    let mut resp = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health request");
    assert!(resp.status().is_success());
    let body: Value = serde_json::from_slice(&resp.body().await.expect("body")).expect("json");
    assert_eq!(body, json!({"status": "ok", "clients": 1}));

    handle.stop(false).await;
}

#[actix_rt::test]
async fn landing_page_and_script_are_served() {
    let (addr, handle) = start_relay_server(loopback_dispatcher())
        .await
        .expect("start relay server");
    let client = Client::new();

    let mut page = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("index request");
    assert!(page.status().is_success());
    let html = page.body().await.expect("index body");
    assert!(String::from_utf8_lossy(&html).contains("/static/script.js"));

    let mut script = client
        .get(format!("http://{addr}/static/script.js"))
        .send()
        .await
        .expect("script request");
    assert!(script.status().is_success());
    let js = script.body().await.expect("script body");
    assert!(String::from_utf8_lossy(&js).contains("new WebSocket"));

    handle.stop(false).await;
}
