//! Upstream CAD payloads.
//!
//! Only the fields the gateway acts on are typed; everything else the
//! upstream sends is kept in `extra` so it survives a trip through the cache.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Dispatched call/vessel as reported by the CAD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallServiceRecord {
    /// Upstream identity of the call service.
    #[serde(
        default,
        alias = "callServiceGUID",
        alias = "guid",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_service_guid: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_phone: Option<String>,

    /// Region whose geofences apply to this call.
    #[serde(
        default,
        alias = "regionId",
        deserialize_with = "lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub region_id: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A point on a geofence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// One geofence polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub points: Vec<LatLng>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All geofences of a region.
///
/// The upstream answers either with a bare array or with the array wrapped
/// in a `geofences`/`data` field; both decode to the same set, which always
/// serializes back as a bare array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeofenceSetRepr", into = "Vec<Geofence>")]
pub struct GeofenceSet {
    pub geofences: Vec<Geofence>,
}

impl GeofenceSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.geofences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geofences.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeofenceSetRepr {
    List(Vec<Geofence>),
    Wrapped {
        #[serde(alias = "data")]
        geofences: Vec<Geofence>,
    },
}

impl From<GeofenceSetRepr> for GeofenceSet {
    fn from(repr: GeofenceSetRepr) -> Self {
        match repr {
            GeofenceSetRepr::List(geofences) | GeofenceSetRepr::Wrapped { geofences } => {
                Self { geofences }
            }
        }
    }
}

impl From<GeofenceSet> for Vec<Geofence> {
    fn from(set: GeofenceSet) -> Self {
        set.geofences
    }
}

/// Guest position reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy in meters.
    pub accuracy: Option<f64>,
}

/// Body of the upstream location request.
#[derive(Debug, Serialize)]
pub(crate) struct LocationRequestBody<'a> {
    pub token: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_service_decodes_known_and_extra_fields() {
        let record: CallServiceRecord = serde_json::from_value(json!({
            "callServiceGUID": "cs-1",
            "call_number": 1234,
            "call_status": "En Route",
            "company_name": "TowBoat",
            "regionId": "7",
            "destination": {"lat": 26.1, "lng": -80.1}
        }))
        .unwrap();

        assert_eq!(record.call_service_guid.as_deref(), Some("cs-1"));
        assert_eq!(record.call_number.as_deref(), Some("1234"));
        assert_eq!(record.region_id, Some(7));
        assert!(record.extra.contains_key("destination"));
    }

    #[test]
    fn test_call_service_survives_cache_round_trip() {
        let record: CallServiceRecord = serde_json::from_value(json!({
            "guid": "cs-9",
            "region_id": 3,
            "eta": "10 min"
        }))
        .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let back: CallServiceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_geofence_set_accepts_both_shapes() {
        let bare: GeofenceSet = serde_json::from_value(json!([
            {"id": 1, "name": "Marina", "type": "polygon", "points": [{"lat": 1.0, "lng": 2.0}]}
        ]))
        .unwrap();
        let wrapped: GeofenceSet = serde_json::from_value(json!({
            "data": [{"id": 1, "name": "Marina", "type": "polygon", "points": [{"lat": 1.0, "lng": 2.0}]}]
        }))
        .unwrap();

        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 1);
        assert_eq!(bare.geofences[0].kind.as_deref(), Some("polygon"));

        let serialized = serde_json::to_value(&bare).unwrap();
        assert!(serialized.is_array());
    }
}
