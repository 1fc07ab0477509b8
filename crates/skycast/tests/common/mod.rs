//! Test helpers: a stand-in sensor endpoint and reading builders

#![allow(dead_code)]

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use skycast::Reading;

/// How the fake weather station answers `/weather`.
#[derive(Clone, Copy)]
pub enum StationBehavior {
    /// 200 with a valid JSON body.
    Healthy { temp: f64, humidity: f64, pressure: f64 },
    /// 500 "Failed to read from sensor", like the firmware does on NaN reads.
    SensorFault,
    /// 200 with a body that is not JSON.
    Garbage,
    /// Sleep before answering.
    Slow(std::time::Duration),
}

/// Handle to a running fake station.
pub struct FakeStation {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl FakeStation {
    /// Bind on an ephemeral port and serve in the background.
    pub async fn start(behavior: StationBehavior) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new()
            .route("/", get(|| async { "API is online. Use /weather" }))
            .route(
                "/weather",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        respond(behavior).await
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, hits }
    }

    pub fn url(&self) -> String {
        format!("http://{}/weather", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn respond(behavior: StationBehavior) -> (StatusCode, String) {
    match behavior {
        StationBehavior::Healthy {
            temp,
            humidity,
            pressure,
        } => (
            StatusCode::OK,
            json!({"temp": temp, "humidity": humidity, "pressure": pressure}).to_string(),
        ),
        StationBehavior::SensorFault => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read from sensor".to_string(),
        ),
        StationBehavior::Garbage => (StatusCode::OK, "{\"temp\": 21.0,".to_string()),
        StationBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, r#"{"temp":1,"humidity":2,"pressure":3}"#.to_string())
        }
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 9, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// Reading at `minute` past [`base_time`].
pub fn reading_at(minute: i64, temp: f64, humidity: f64, pressure: f64) -> Reading {
    Reading::new(
        base_time() + Duration::minutes(minute),
        temp,
        humidity,
        pressure,
        54.6872,
        25.2797,
    )
}
