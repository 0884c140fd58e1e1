//! Beacon integration test harness.
//!
//! Each test boots the real API router on an ephemeral localhost port,
//! backed by its own registry instance, and drives it over HTTP with
//! reqwest. No shared state between tests; no real daemon process.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::{json, Value};

use beacon_api::ApiState;
use beacon_registry::{Registry, RetentionPolicy};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Bind the router on 127.0.0.1:0 and return its base URL plus a handle
/// to the registry behind it (for asserting on unfiltered state).
async fn spawn_api(policy: RetentionPolicy) -> Result<(String, Arc<Registry>)> {
    let registry = Arc::new(Registry::new(policy));
    let app = beacon_api::router(ApiState {
        registry: registry.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    Ok((format!("http://{addr}"), registry))
}

async fn announce(base: &str, body: Value) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("{base}/announce"))
        .json(&body)
        .send()
        .await?)
}

async fn available(base: &str) -> Result<Value> {
    Ok(reqwest::get(format!("{base}/available")).await?.json().await?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn announce_then_available_roundtrip() -> Result<()> {
    let (base, _registry) = spawn_api(RetentionPolicy::default()).await?;

    let resp = announce(
        &base,
        json!({
            "system_id": "render-1",
            "ip_address": "10.1.2.3",
            "port": 9000,
            "system_name": "Render Node 1"
        }),
    )
    .await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "System render-1 announced as available");

    let avail = available(&base).await?;
    assert_eq!(avail["count"], 1);
    let entry = &avail["systems"]["render-1"];
    assert_eq!(entry["ip_address"], "10.1.2.3");
    assert_eq!(entry["port"], 9000);
    assert_eq!(entry["system_name"], "Render Node 1");
    assert_eq!(entry["last_seen_secs"], 0);

    Ok(())
}

#[tokio::test]
async fn missing_required_fields_are_rejected() -> Result<()> {
    let (base, registry) = spawn_api(RetentionPolicy::default()).await?;

    // No port.
    let resp = announce(&base, json!({ "system_id": "render-1" })).await?;
    assert_eq!(resp.status(), 400);

    // No system_id.
    let resp = announce(&base, json!({ "port": 9000 })).await?;
    assert_eq!(resp.status(), 400);

    // Empty system_id counts as missing.
    let resp = announce(&base, json!({ "system_id": "", "port": 9000 })).await?;
    assert_eq!(resp.status(), 400);

    // Rejections must leave the table unchanged.
    assert!(registry.is_empty());
    let avail = available(&base).await?;
    assert_eq!(avail["count"], 0);

    Ok(())
}

#[tokio::test]
async fn omitted_ip_address_is_inferred_from_peer() -> Result<()> {
    let (base, registry) = spawn_api(RetentionPolicy::default()).await?;

    let resp = announce(&base, json!({ "system_id": "local", "port": 7000 })).await?;
    assert!(resp.status().is_success());

    // Connection came over loopback, so that is what gets recorded.
    let all = registry.list_all();
    assert_eq!(all["local"].address, "127.0.0.1");

    let avail = available(&base).await?;
    assert_eq!(avail["systems"]["local"]["ip_address"], "127.0.0.1");
    // And the placeholder name applies.
    assert_eq!(avail["systems"]["local"]["system_name"], "Unknown System");

    Ok(())
}

#[tokio::test]
async fn reannounce_fully_overwrites_previous_entry() -> Result<()> {
    let (base, _registry) = spawn_api(RetentionPolicy::default()).await?;

    announce(
        &base,
        json!({ "system_id": "node", "ip_address": "10.0.0.1", "port": 9000, "system_name": "Old" }),
    )
    .await?;
    announce(
        &base,
        json!({ "system_id": "node", "ip_address": "10.0.0.2", "port": 9100, "system_name": "New" }),
    )
    .await?;

    let avail = available(&base).await?;
    assert_eq!(avail["count"], 1);
    let entry = &avail["systems"]["node"];
    assert_eq!(entry["ip_address"], "10.0.0.2");
    assert_eq!(entry["port"], 9100);
    assert_eq!(entry["system_name"], "New");

    Ok(())
}

#[tokio::test]
async fn remove_reports_found_as_boolean() -> Result<()> {
    let (base, _registry) = spawn_api(RetentionPolicy::default()).await?;

    announce(&base, json!({ "system_id": "gone-soon", "port": 9000 })).await?;

    let client = reqwest::Client::new();

    let resp = client.delete(format!("{base}/remove/gone-soon")).send().await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["removed"], true);
    assert_eq!(body["system_id"], "gone-soon");

    // Second removal: same route, removed=false, still not an error.
    let resp = client.delete(format!("{base}/remove/gone-soon")).send().await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["removed"], false);

    let avail = available(&base).await?;
    assert_eq!(avail["count"], 0);

    Ok(())
}

#[tokio::test]
async fn stale_entries_drop_out_of_available_before_eviction() -> Result<()> {
    // Tiny window, long TTL: entries go invisible fast but stay in the table.
    let policy = RetentionPolicy {
        sweep_interval: Duration::from_secs(60),
        entry_ttl: Duration::from_secs(60),
        availability_window: Duration::from_millis(50),
    };
    let (base, registry) = spawn_api(policy).await?;

    announce(&base, json!({ "system_id": "flash", "port": 9000 })).await?;
    let avail = available(&base).await?;
    assert_eq!(avail["count"], 1);

    tokio::time::sleep(Duration::from_millis(120)).await;

    let avail = available(&base).await?;
    assert_eq!(avail["count"], 0);
    // Not yet swept — the entry itself is still there.
    assert_eq!(registry.list_all().len(), 1);

    Ok(())
}

#[tokio::test]
async fn concurrent_announces_from_distinct_systems_all_land() -> Result<()> {
    let (base, registry) = spawn_api(RetentionPolicy::default()).await?;

    let mut handles = Vec::new();
    for i in 0..10 {
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            announce(
                &base,
                json!({ "system_id": format!("sys-{i}"), "port": 9000 + i }),
            )
            .await
        }));
    }
    for h in handles {
        let resp = h.await??;
        assert!(resp.status().is_success());
    }

    assert_eq!(registry.len(), 10);
    let avail = available(&base).await?;
    assert_eq!(avail["count"], 10);

    Ok(())
}
