use serde::{Deserialize, Serialize};

pub const NOT_FOUND_NAME: &str = "Linha não encontrada na base de dados";
pub const NOT_FOUND_OPERATOR: &str = "Consulte a empresa de transporte local";
pub const NOT_FOUND_FARE: &str = "Consulte valor atual";
pub const NOT_FOUND_SCHEDULE: &str = "Consulte horários no terminal";
pub const NOT_FOUND_WAYPOINTS: &str = "Informações não disponíveis";

/// Fares are numeric for registered lines and a free-text hint otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fare {
    Amount(f64),
    Note(String),
}

/// Reference data for one transit line. Field names on the wire match the
/// mobile client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "numero")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "empresa")]
    pub operator: String,
    #[serde(rename = "tarifa")]
    pub fare: Fare,
    #[serde(rename = "horarios")]
    pub schedule: Vec<String>,
    #[serde(rename = "pontos_principais")]
    pub waypoints: Vec<String>,
    #[serde(default = "registered", skip_serializing)]
    pub found: bool,
    #[serde(
        rename = "qr_data_original",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_payload: Option<String>,
}

fn registered() -> bool {
    true
}

impl RouteRecord {
    /// Placeholder returned for identifiers missing from the reference table.
    pub fn not_found(id: impl Into<String>, raw_payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: NOT_FOUND_NAME.to_string(),
            operator: NOT_FOUND_OPERATOR.to_string(),
            fare: Fare::Note(NOT_FOUND_FARE.to_string()),
            schedule: vec![NOT_FOUND_SCHEDULE.to_string()],
            waypoints: vec![NOT_FOUND_WAYPOINTS.to_string()],
            found: false,
            raw_payload: Some(raw_payload.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_record_deserializes_from_client_field_names() {
        let record: RouteRecord = serde_json::from_str(
            r#"{"numero":"3","nome":"Carlos Luz - Fafich","empresa":"UFMG","tarifa":0.0,
                "horarios":["07:00"],"pontos_principais":["Fafich"]}"#,
        )
        .unwrap();
        assert!(record.found);
        assert_eq!(record.fare, Fare::Amount(0.0));
        assert_eq!(record.raw_payload, None);
    }

    #[test]
    fn fallback_keeps_raw_payload_on_the_wire() {
        let record = RouteRecord::not_found("999", "999");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["numero"], "999");
        assert_eq!(value["nome"], NOT_FOUND_NAME);
        assert_eq!(value["tarifa"], NOT_FOUND_FARE);
        assert_eq!(value["qr_data_original"], "999");
        assert!(value.get("found").is_none());
    }
}
