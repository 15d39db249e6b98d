//! End-to-end tests for the static and event relays.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;

use analytics_relay::relay::headers::is_allowlisted;

mod common;

#[tokio::test]
async fn test_event_get_strips_cookie_and_keeps_query() {
    let assets = common::start_ok_upstream().await;
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &events.origin())).await;

    let response = common::send_raw(
        relay.addr,
        "GET /t/e?token=abc&distinct_id=xyz HTTP/1.1\r\n\
         Host: app.example.com\r\n\
         Cookie: session=1\r\n\
         User-Agent: test-agent\r\n\
         Connection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {}", response);

    let seen = events.last();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/e");
    assert_eq!(seen.query.as_deref(), Some("token=abc&distinct_id=xyz"));
    assert_eq!(seen.header("user-agent"), Some("test-agent"));
    assert!(seen.header("cookie").is_none());
    assert!(seen.body.is_empty());
    for name in seen.headers.keys() {
        assert!(
            name == "host" || is_allowlisted(name.as_str()),
            "{} reached the event origin",
            name
        );
    }
    assert!(assets.requests().is_empty());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_forwarded_headers_equal_allowlisted_subset() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    common::send_raw(
        relay.addr,
        "GET /t/decide/ HTTP/1.1\r\n\
         Host: app.example.com\r\n\
         Accept: application/json\r\n\
         Accept-Encoding: identity\r\n\
         Origin: https://app.example.com\r\n\
         User-Agent: test-agent\r\n\
         Authorization: Bearer secret\r\n\
         Cookie: ph_session=abc\r\n\
         X-Forwarded-For: 10.0.0.1\r\n\
         Referer: https://app.example.com/pricing\r\n\
         Connection: close\r\n\r\n",
    )
    .await;

    let seen = events.last();
    let mut names: Vec<_> = seen
        .headers
        .keys()
        .map(|n| n.as_str().to_string())
        .filter(|n| n != "host")
        .collect();
    names.sort();
    assert_eq!(names, vec!["accept", "accept-encoding", "origin", "user-agent"]);
    assert_eq!(seen.header("accept"), Some("application/json"));
    assert_eq!(seen.header("accept-encoding"), Some("identity"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_event_post_forwards_raw_body() {
    let events = common::start_recording_upstream(|_| {
        (
            StatusCode::OK,
            [("content-type", "application/json"), ("x-upstream", "1")],
            r#"{"status":1}"#,
        )
            .into_response()
    })
    .await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::client()
        .post(relay.url("/t/capture/"))
        .header("content-type", "application/json")
        .header("authorization", "Bearer secret")
        .body(r#"{"event":"x"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().get("x-upstream").is_none());
    assert_eq!(response.text().await.unwrap(), r#"{"status":1}"#);

    let seen = events.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/capture/");
    assert_eq!(&seen.body[..], br#"{"event":"x"}"#);
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert_eq!(seen.header("content-length"), Some("13"));
    assert!(seen.header("authorization").is_none());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_get_body_not_forwarded() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    common::send_raw(
        relay.addr,
        "GET /t/flags/ HTTP/1.1\r\n\
         Host: app.example.com\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: 5\r\n\
         Connection: close\r\n\r\n\
         hello",
    )
    .await;

    let seen = events.last();
    assert!(seen.body.is_empty());
    assert!(seen.header("content-length").is_none());
    assert_eq!(seen.header("content-type"), Some("text/plain"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_only_content_type_mirrored() {
    let events = common::start_recording_upstream(|_| {
        (
            StatusCode::OK,
            [
                ("content-type", "text/javascript"),
                ("set-cookie", "tracker=1"),
                ("cache-control", "max-age=60"),
                ("access-control-allow-origin", "*"),
            ],
            "ok",
        )
            .into_response()
    })
    .await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::client().get(relay.url("/t/array/phc_key/config.js")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "text/javascript");
    assert!(headers.get("set-cookie").is_none());
    assert!(headers.get("cache-control").is_none());
    assert!(headers.get("access-control-allow-origin").is_none());
    assert!(headers.get("x-request-id").is_some());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_content_type_not_invented() {
    let events = common::start_recording_upstream(|_| StatusCode::NO_CONTENT.into_response()).await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::client().get(relay.url("/t/e/")).send().await.unwrap();
    assert_eq!(response.status(), 204);
    assert!(response.headers().get("content-type").is_none());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_query_keys_round_trip() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    common::client()
        .get(relay.url("/t/decide/?v=3&ip=1&v=4&_=1700000000000&v=3"))
        .send()
        .await
        .unwrap();

    let seen = events.last();
    assert_eq!(seen.path, "/decide/");
    assert_eq!(seen.query.as_deref(), Some("v=3&ip=1&v=4&_=1700000000000&v=3"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_non_success_status_passed_through() {
    let events = common::start_recording_upstream(|_| {
        (StatusCode::SERVICE_UNAVAILABLE, [("content-type", "text/plain")], "busy").into_response()
    })
    .await;
    let assets = common::start_recording_upstream(|_| (StatusCode::NOT_FOUND, "missing").into_response()).await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &events.origin())).await;

    let response = common::client().post(relay.url("/t/e/")).body("{}").send().await.unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "busy");

    let response = common::client().get(relay.url("/t/static/nope.js")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "missing");

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_origin_is_bad_gateway() {
    let dead = format!("http://{}", common::closed_addr().await);
    let relay = common::start_relay(common::relay_config(&dead, &dead)).await;

    let response = common::client().get(relay.url("/t/e/")).send().await.unwrap();
    assert_eq!(response.status(), 502);

    let response = common::client().get(relay.url("/t/static/array.js")).send().await.unwrap();
    assert_eq!(response.status(), 502);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_static_relay_is_transparent() {
    let assets = common::start_recording_upstream(|_| {
        (
            StatusCode::OK,
            [
                ("content-type", "application/javascript"),
                ("cache-control", "public, max-age=3600"),
                ("etag", "\"abc\""),
                ("x-upstream", "assets"),
            ],
            "console.log('sdk')",
        )
            .into_response()
    })
    .await;
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &events.origin())).await;

    let response = common::client()
        .get(relay.url("/t/static/array.js?v=1.2.3"))
        .header("cookie", "session=1")
        .header("x-custom", "kept")
        .header("user-agent", "test-agent")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "application/javascript");
    assert_eq!(headers["cache-control"], "public, max-age=3600");
    assert_eq!(headers["etag"], "\"abc\"");
    assert_eq!(headers["x-upstream"], "assets");
    assert!(headers.get("x-request-id").is_some());
    assert_eq!(response.text().await.unwrap(), "console.log('sdk')");

    let seen = assets.last();
    assert_eq!(seen.path, "/static/array.js");
    assert_eq!(seen.query.as_deref(), Some("v=1.2.3"));
    assert_eq!(seen.header("cookie"), Some("session=1"));
    assert_eq!(seen.header("x-custom"), Some("kept"));
    assert_eq!(seen.header("user-agent"), Some("test-agent"));
    // The relay's own request ID stays on our side
    assert!(seen.header("x-request-id").is_none());
    // Host names the upstream, not the first-party domain
    assert_eq!(seen.header("host"), Some(assets.addr.to_string().as_str()));
    assert!(events.requests().is_empty());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_static_relay_forwards_body() {
    let assets = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &assets.origin())).await;

    common::client()
        .put(relay.url("/t/static/upload"))
        .body("payload")
        .send()
        .await
        .unwrap();

    let seen = assets.last();
    assert_eq!(seen.method, "PUT");
    assert_eq!(&seen.body[..], b"payload");

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_static_prefix_on_event_route_uses_asset_origin() {
    let assets = common::start_ok_upstream().await;
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &events.origin())).await;

    // An empty remainder misses the dedicated static route
    common::send_raw(
        relay.addr,
        "GET /t/static/ HTTP/1.1\r\n\
         Host: app.example.com\r\n\
         Cookie: session=1\r\n\
         Connection: close\r\n\r\n",
    )
    .await;

    let seen = assets.last();
    assert_eq!(seen.path, "/static/");
    assert!(seen.header("cookie").is_none());
    assert!(events.requests().is_empty());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_paths_outside_mount_not_relayed() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::client().get(relay.url("/e/")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    assert!(events.requests().is_empty());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_custom_mount_path() {
    let events = common::start_ok_upstream().await;
    let mut config = common::relay_config(&events.origin(), &events.origin());
    config.relay.mount_path = "/ingest".into();
    let relay = common::start_relay(config).await;

    let response = common::client().get(relay.url("/ingest/e/?ip=1")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(events.last().path, "/e/");

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_preserved() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::client()
        .get(relay.url("/t/e/"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
    // Correlation IDs stay on our side of the relay
    assert!(events.last().header("x-request-id").is_none());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_switches_event_origin() {
    let first = common::start_ok_upstream().await;
    let second = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&first.origin(), &first.origin())).await;

    common::client().get(relay.url("/t/e/")).send().await.unwrap();
    assert_eq!(first.requests().len(), 1);

    relay
        .updates
        .send(common::relay_config(&first.origin(), &second.origin()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    common::client().get(relay.url("/t/e/")).send().await.unwrap();
    assert_eq!(first.requests().len(), 1);
    assert_eq!(second.requests().len(), 1);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_static_relay_forwards_caller_request_id() {
    let assets = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&assets.origin(), &assets.origin())).await;

    common::client()
        .get(relay.url("/t/static/array.js"))
        .header("x-request-id", "caller-7")
        .send()
        .await
        .unwrap();
    assert_eq!(assets.last().header("x-request-id"), Some("caller-7"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_undecodable_encoding_never_requested() {
    // Answers in an encoding the relay cannot decode whenever it is offered
    let events = common::start_recording_upstream(|seen| {
        let offered = seen.header("accept-encoding").unwrap_or_default();
        if offered.contains("compress") || offered.contains("dcz") {
            (
                StatusCode::OK,
                [("content-type", "application/json"), ("content-encoding", "compress")],
                vec![0x1f_u8, 0x9d, 0x90, 0x7b],
            )
                .into_response()
        } else {
            (StatusCode::OK, [("content-type", "application/json")], r#"{"status":1}"#).into_response()
        }
    })
    .await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let response = common::send_raw(
        relay.addr,
        "GET /t/decide/ HTTP/1.1\r\n\
         Host: app.example.com\r\n\
         Accept-Encoding: gzip, compress, dcz\r\n\
         Connection: close\r\n\r\n",
    )
    .await;

    assert_eq!(events.last().header("accept-encoding"), Some("gzip"));
    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {}", response);
    assert!(!response.to_ascii_lowercase().contains("content-encoding"));
    assert!(response.contains(r#"{"status":1}"#), "unexpected body: {}", response);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_mount_with_trailing_slash_relayed() {
    let events = common::start_ok_upstream().await;
    let relay = common::start_relay(common::relay_config(&events.origin(), &events.origin())).await;

    let bare = common::client().get(relay.url("/t?ip=1")).send().await.unwrap();
    assert_eq!(bare.status(), 200);
    let slash = common::client().get(relay.url("/t/?ip=1")).send().await.unwrap();
    assert_eq!(slash.status(), 200);

    let seen = events.requests();
    assert_eq!(seen.len(), 2);
    for request in seen {
        assert_eq!(request.path, "/");
        assert_eq!(request.query.as_deref(), Some("ip=1"));
    }

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_declared_oversized_body_rejected() {
    let events = common::start_ok_upstream().await;
    let mut config = common::relay_config(&events.origin(), &events.origin());
    config.relay.max_body_size = 16;
    let relay = common::start_relay(config).await;

    let response = common::client()
        .post(relay.url("/t/capture/"))
        .header("content-type", "application/json")
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);
    assert!(events.requests().is_empty());

    let response = common::client()
        .post(relay.url("/t/capture/"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    relay.shutdown.trigger();
}
