use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::position::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
}

/// Recognized labels are the delivery state machine; `Other` carries ad hoc
/// labels from the field, accepted as-is unless strict mode rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopStatus {
    Assigned,
    OutForDelivery,
    Delivered,
    Failed,
    Unable,
    Other(String),
}

impl StopStatus {
    pub fn parse(label: &str) -> Self {
        match label {
            "Assigned" => Self::Assigned,
            "OutForDelivery" => Self::OutForDelivery,
            "Delivered" => Self::Delivered,
            "Failed" => Self::Failed,
            "Unable" => Self::Unable,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Assigned => "Assigned",
            Self::OutForDelivery => "OutForDelivery",
            Self::Delivered => "Delivered",
            Self::Failed => "Failed",
            Self::Unable => "Unable",
            Self::Other(label) => label,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Unable)
    }
}

impl Default for StopStatus {
    fn default() -> Self {
        Self::Assigned
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StopStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StopStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub patient: String,
    pub facility: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub status: StopStatus,
    #[serde(default)]
    pub proof_file: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub driver_id: String,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteBook {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteBook {
    pub fn driver(&self, driver_id: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == driver_id)
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == route_id)
    }

    pub fn stop_count(&self) -> usize {
        self.routes.iter().map(|r| r.stops.len()).sum()
    }

    pub fn find_stop(&self, stop_id: &str) -> Option<(&Route, &Stop)> {
        for route in &self.routes {
            if let Some(stop) = route.stops.iter().find(|s| s.id == stop_id) {
                return Some((route, stop));
            }
        }
        None
    }

    pub fn find_stop_mut(&mut self, stop_id: &str) -> Option<(&str, &str, &mut Stop)> {
        for route in &mut self.routes {
            let Route {
                id,
                driver_id,
                stops,
            } = route;
            if let Some(stop) = stops.iter_mut().find(|s| s.id == stop_id) {
                return Some((id.as_str(), driver_id.as_str(), stop));
            }
        }
        None
    }

    /// Stop ids are the global lookup key: unique across every route, and
    /// every route must reference a known driver.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for route in &self.routes {
            if route.id.trim().is_empty() {
                return Err("route id cannot be empty".to_string());
            }
            if self.driver(&route.driver_id).is_none() {
                return Err(format!(
                    "route {} references unknown driver {}",
                    route.id, route.driver_id
                ));
            }
            for stop in &route.stops {
                if stop.id.trim().is_empty() {
                    return Err(format!("route {} contains a stop with an empty id", route.id));
                }
                if !seen.insert(stop.id.as_str()) {
                    return Err(format!("stop id {} appears more than once", stop.id));
                }
            }
        }
        Ok(())
    }
}
