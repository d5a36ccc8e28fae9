//! Records exchanged with the REST backend.
//!
//! Field names follow the backend's JSON contract. Records the client only
//! passes through keep unknown fields in an `extra` map so that an
//! "update profile" round trip never drops data the client does not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation;
use crate::Result;

/// User record as returned by the backend.
///
/// Treated as opaque apart from the handful of fields the client branches on.
/// Updates always replace the whole record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Numeric user id.
    #[serde(rename = "iD_Usuario")]
    pub id: i64,
    /// Numeric role id, resolved through the role list.
    #[serde(rename = "iD_RolUsuario")]
    pub role_id: i64,
    /// Approval / active flag.
    #[serde(rename = "estado", alias = "aprobado", default)]
    pub approved: Option<bool>,
    /// Reason given by an administrator when the account was rejected.
    #[serde(rename = "motivoRechazo", default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Everything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Minimal profile, mostly useful in tests.
    pub fn new(id: i64, role_id: i64) -> Self {
        Self {
            id,
            role_id,
            approved: None,
            rejection_reason: None,
            extra: Map::new(),
        }
    }

    /// Builder-style approval flag.
    pub fn with_approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    /// True when the backend marked the account as approved/active.
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(false)
    }

    /// Look up a field the client does not model explicitly.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Display name, if the backend sent one.
    pub fn display_name(&self) -> Option<&str> {
        ["nombreUsuario", "nombre", "email"]
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(Value::as_str))
    }
}

/// Entry of `GET /api/RolesUsuario/listado`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Numeric role id.
    #[serde(rename = "iD_RolUsuario")]
    pub id: i64,
    /// Human readable description (e.g., "Administrador").
    #[serde(rename = "descripcion")]
    pub description: String,
}

impl RoleRecord {
    /// Create a role record.
    pub fn new(id: i64, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

/// Body of a successful sign-in or registration exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub jwt_token: String,
    /// The signed-in user.
    pub usuario: UserProfile,
}

/// Bar or nightclub.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Numeric venue id.
    #[serde(rename = "iD_Comercio")]
    pub id: i64,
    /// Venue name.
    #[serde(rename = "nombre", default)]
    pub name: String,
    /// Street address.
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    /// Owner user id.
    #[serde(rename = "iD_Usuario", default)]
    pub owner_id: Option<i64>,
    /// Approval flag set by administrators.
    #[serde(rename = "estado", default)]
    pub approved: Option<bool>,
    /// Everything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Review left by a user on a venue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Numeric review id.
    #[serde(rename = "iD_Resenia")]
    pub id: i64,
    /// Reviewed venue.
    #[serde(rename = "iD_Comercio")]
    pub venue_id: i64,
    /// Author.
    #[serde(rename = "iD_Usuario", default)]
    pub user_id: Option<i64>,
    /// Free text.
    #[serde(rename = "comentario", default)]
    pub comment: String,
    /// Score from 1 to 5.
    #[serde(rename = "puntuacion", default)]
    pub rating: u8,
    /// Everything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Review about to be submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    /// Reviewed venue.
    #[serde(rename = "iD_Comercio")]
    pub venue_id: i64,
    /// Author.
    #[serde(rename = "iD_Usuario")]
    pub user_id: i64,
    /// Free text.
    #[serde(rename = "comentario")]
    pub comment: String,
    /// Score from 1 to 5.
    #[serde(rename = "puntuacion")]
    pub rating: u8,
}

impl NewReview {
    /// Reject incomplete reviews before any request is made.
    pub fn validate(&self) -> Result<()> {
        validation::require_field("comentario", &self.comment)?;
        validation::validate_rating(self.rating)
    }
}

/// Reservation record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Numeric reservation id.
    #[serde(rename = "iD_Reserva")]
    pub id: i64,
    /// Venue reserved at.
    #[serde(rename = "iD_Comercio")]
    pub venue_id: i64,
    /// User who reserved.
    #[serde(rename = "iD_Usuario")]
    pub user_id: i64,
    /// Date, `YYYY-MM-DD`.
    #[serde(rename = "fechaReserva", default)]
    pub date: String,
    /// Time, `HH:MM`.
    #[serde(rename = "horario", default)]
    pub time: String,
    /// Party size.
    #[serde(rename = "comensales", default)]
    pub party_size: u32,
    /// Everything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reservation about to be submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    /// Venue reserved at.
    #[serde(rename = "iD_Comercio")]
    pub venue_id: i64,
    /// User who reserves.
    #[serde(rename = "iD_Usuario")]
    pub user_id: i64,
    /// Date, `YYYY-MM-DD`.
    #[serde(rename = "fechaReserva")]
    pub date: String,
    /// Time, `HH:MM`.
    #[serde(rename = "horario")]
    pub time: String,
    /// Party size.
    #[serde(rename = "comensales")]
    pub party_size: u32,
}

impl NewReservation {
    /// Reject malformed reservations before any request is made.
    pub fn validate(&self) -> Result<()> {
        validation::validate_date(&self.date)?;
        validation::validate_time_hhmm(&self.time)?;
        validation::validate_party_size(self.party_size)
    }
}

/// Paid advertising slot for a venue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Numeric advertisement id.
    #[serde(rename = "iD_Publicidad")]
    pub id: i64,
    /// Advertised venue.
    #[serde(rename = "iD_Comercio", default)]
    pub venue_id: Option<i64>,
    /// Whether the slot has been paid.
    #[serde(rename = "pago", default)]
    pub paid: bool,
    /// Whether the slot is currently shown.
    #[serde(rename = "estado", default)]
    pub active: bool,
    /// Everything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Advertisement {
    /// True once the backend has recorded the payment.
    pub fn is_paid(&self) -> bool {
        self.paid
    }
}

/// Checkout created at the payment provider for an advertisement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreference {
    /// Provider preference id.
    pub preference_id: String,
    /// URL of the external checkout page.
    #[serde(alias = "init_point")]
    pub init_point: String,
}

/// Result of `verify and activate payment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    /// True when the backend confirmed the payment and activated the slot.
    pub success: bool,
    /// Optional explanation.
    #[serde(default, alias = "mensaje", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Geocoded coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    #[serde(alias = "latitud")]
    pub lat: f64,
    /// Longitude in degrees.
    #[serde(alias = "longitud")]
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_profile_keeps_unknown_fields() {
        let raw = json!({
            "iD_Usuario": 1,
            "iD_RolUsuario": 2,
            "estado": true,
            "nombreUsuario": "lucia",
            "telefono": "123"
        });
        let profile: UserProfile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.role_id, 2);
        assert!(profile.is_approved());
        assert_eq!(profile.display_name(), Some("lucia"));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["telefono"], "123");
        assert_eq!(back["iD_RolUsuario"], 2);
    }

    #[test]
    fn test_profile_without_flag_is_not_approved() {
        let profile: UserProfile =
            serde_json::from_value(json!({"iD_Usuario": 1, "iD_RolUsuario": 2})).unwrap();
        assert!(!profile.is_approved());
        assert_eq!(profile.rejection_reason, None);
    }

    #[test]
    fn test_payment_preference_accepts_snake_case_init_point() {
        let pref: PaymentPreference = serde_json::from_value(json!({
            "preferenceId": "pr1",
            "init_point": "https://checkout.example/pr1"
        }))
        .unwrap();
        assert_eq!(pref.preference_id, "pr1");
        assert!(pref.init_point.ends_with("pr1"));
    }

    #[test]
    fn test_new_reservation_validation() {
        let mut reservation = NewReservation {
            venue_id: 3,
            user_id: 1,
            date: "2026-10-31".into(),
            time: "23:30".into(),
            party_size: 4,
        };
        assert!(reservation.validate().is_ok());

        reservation.time = "25:00".into();
        assert!(reservation.validate().is_err());
    }
}
