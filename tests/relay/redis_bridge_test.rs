//! Round trips through a real redis. Requires docker:
//! `cargo test --test relay -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use actix::Actor;
use awc::{ws, Client};
use chat_relay_service::redis_client::{Publisher, RedisClient};
use chat_relay_service::websocket::bridge::ChannelBridge;
use chat_relay_service::websocket::Dispatcher;
use futures_util::SinkExt;
use serde_json::json;
use testcontainers::{core::WaitFor, runners::AsyncRunner, GenericImage};

use super::support::{next_json, start_relay_server};

const CHANNEL: &str = "chat_channel";

async fn wait_for_subscriber(redis_url: &str) {
    let client = redis::Client::open(redis_url).expect("redis client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("redis connection");
    for _ in 0..100 {
        let (_, subscribers): (String, usize) = redis::cmd("PUBSUB")
            .arg("NUMSUB")
            .arg(CHANNEL)
            .query_async(&mut conn)
            .await
            .expect("PUBSUB NUMSUB");
        if subscribers > 0 {
            return;
        }
        actix_rt::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("bridge never subscribed to {CHANNEL}");
}

#[actix_rt::test]
#[ignore = "requires docker"]
async fn messages_round_trip_through_redis() {
    let container = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379)
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .expect("start redis container");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("redis host port");
    let redis_url = format!("redis://127.0.0.1:{port}");

    let redis = RedisClient::connect(&redis_url).await.expect("connect redis");
    redis.ping().await.expect("ping redis");

    let dispatcher = Dispatcher::new(Arc::new(redis.clone()), CHANNEL).start();
    let _bridge_failed = ChannelBridge::new(redis.client(), CHANNEL, dispatcher.clone().recipient())
        .spawn()
        .expect("spawn bridge");
    wait_for_subscriber(&redis_url).await;

    let (addr, handle) = start_relay_server(dispatcher).await.expect("start relay server");
    let client = Client::new();
    let (_resp, mut a) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect a");
    next_json(&mut a).await;
    next_json(&mut a).await;
    let (_resp, mut b) = client
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("connect b");
    next_json(&mut b).await;
    next_json(&mut b).await;
    next_json(&mut a).await;

    // client -> redis -> bridge -> every client, sender included
    a.send(ws::Message::Text("hello".into()))
        .await
        .expect("send hello");
    let hello = json!({"type": "message", "content": "hello"});
    assert_eq!(next_json(&mut a).await, hello);
    assert_eq!(next_json(&mut b).await, hello);

    // a publisher in another process reaches every client too
    let receivers = redis
        .publish(CHANNEL, "from elsewhere".to_string())
        .await
        .expect("external publish");
    assert_eq!(receivers, 1);
    let elsewhere = json!({"type": "message", "content": "from elsewhere"});
    assert_eq!(next_json(&mut a).await, elsewhere);
    assert_eq!(next_json(&mut b).await, elsewhere);

    // bytes that are not UTF-8 are relayed with replacement characters and the
    // subscription survives them
    let raw = redis::Client::open(redis_url.as_str()).expect("redis client");
    let mut conn = raw
        .get_multiplexed_async_connection()
        .await
        .expect("redis connection");
    let _: usize = redis::cmd("PUBLISH")
        .arg(CHANNEL)
        .arg(&[0xffu8, 0xfe][..])
        .query_async(&mut conn)
        .await
        .expect("publish raw bytes");
    redis
        .publish(CHANNEL, "after".to_string())
        .await
        .expect("publish after");
    let replaced = json!({"type": "message", "content": "\u{fffd}\u{fffd}"});
    assert_eq!(next_json(&mut a).await, replaced);
    assert_eq!(next_json(&mut a).await, json!({"type": "message", "content": "after"}));

    handle.stop(false).await;
}
