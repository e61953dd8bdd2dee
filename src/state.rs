use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::models::delivery::ProofRecord;
use crate::models::notification::NotificationEvent;
use crate::models::position::LivePosition;
use crate::models::route::RouteBook;
use crate::models::user::UserAccount;
use crate::notify::channel::NotificationChannel;
use crate::observability::metrics::Metrics;
use crate::store::{self, JsonStore};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub tracking_base_url: String,
    pub average_speed_kmh: f64,
    pub strict_statuses: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            tracking_base_url: "http://localhost:3000".to_string(),
            average_speed_kmh: 40.0,
            strict_statuses: false,
        }
    }
}

pub struct AppState {
    pub settings: TrackerSettings,
    pub store: JsonStore,
    pub routes: RwLock<RouteBook>,
    pub stop_index: DashMap<String, String>,
    pub live_positions: RwLock<HashMap<String, LivePosition>>,
    pub notifications: RwLock<Vec<NotificationEvent>>,
    pub proofs: RwLock<Vec<ProofRecord>>,
    pub users: RwLock<Vec<UserAccount>>,
    pub channel: Arc<dyn NotificationChannel>,
    pub metrics: Metrics,
}

impl AppState {
    pub async fn load(
        settings: TrackerSettings,
        store: JsonStore,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        let routes: RouteBook = store.load(store::ROUTES, RouteBook::default).await;
        let live_positions: HashMap<String, LivePosition> =
            store.load(store::POSITIONS, HashMap::new).await;
        let notifications: Vec<NotificationEvent> =
            store.load(store::NOTIFICATIONS, Vec::new).await;
        let proofs: Vec<ProofRecord> = store.load(store::DELIVERIES, Vec::new).await;
        let users: Vec<UserAccount> = store.load(store::USERS, Vec::new).await;

        let stop_index = DashMap::new();
        index_routes(&stop_index, &routes);

        Self {
            settings,
            store,
            routes: RwLock::new(routes),
            stop_index,
            live_positions: RwLock::new(live_positions),
            notifications: RwLock::new(notifications),
            proofs: RwLock::new(proofs),
            users: RwLock::new(users),
            channel,
            metrics: Metrics::new(),
        }
    }
}

/// Maps stop id to route id. Rebuilt at load and whenever dispatch replaces
/// the book; status changes never move a stop, so they leave it alone.
pub fn index_routes(index: &DashMap<String, String>, book: &RouteBook) {
    index.clear();
    for route in &book.routes {
        for stop in &route.stops {
            index.insert(stop.id.clone(), route.id.clone());
        }
    }
}
