use crate::common::RouteRecord;
use crate::intake::payload::CodePayload;
use crate::pipeline::services::routes::RouteTable;
use tracing::debug;

/// Maps decoded code text to route records. Never fails: codes that match
/// nothing in the table yield a "not found" record carrying the raw text, so a
/// camera picking up an unrelated code still produces something renderable.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    table: RouteTable,
}

impl RouteResolver {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn resolve(&self, raw: &str) -> RouteRecord {
        let payload = CodePayload::classify(raw);
        let key = payload.lookup_key();
        if let Some(record) = self.table.get(&key) {
            return record.clone();
        }

        debug!("No route registered for {:?} ({:?})", key, payload);
        let id = if key.is_empty() { raw.to_string() } else { key };
        RouteRecord::not_found(id, raw)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::route::{NOT_FOUND_NAME, NOT_FOUND_SCHEDULE};

    fn resolver() -> RouteResolver {
        RouteResolver::new(RouteTable::bundled().unwrap())
    }

    #[test]
    fn registered_line_resolves_to_its_record() {
        let record = resolver().resolve("3");
        assert!(record.found);
        assert_eq!(record.name, "Carlos Luz - Fafich");
        assert_eq!(record.raw_payload, None);
    }

    #[test]
    fn unknown_line_resolves_to_fallback() {
        let record = resolver().resolve("999");
        assert!(!record.found);
        assert_eq!(record.id, "999");
        assert_eq!(record.name, NOT_FOUND_NAME);
        assert_eq!(record.schedule, vec![NOT_FOUND_SCHEDULE.to_string()]);
        assert_eq!(record.raw_payload.as_deref(), Some("999"));
    }

    #[test]
    fn every_payload_shape_reaches_the_table() {
        let resolver = resolver();
        for raw in [
            r#"{"linha": "3", "universidade": "UFMG"}"#,
            "https://onibus.example/info?linha=3",
            " 3 ",
        ] {
            assert_eq!(resolver.resolve(raw).name, "Carlos Luz - Fafich", "{raw}");
        }
    }

    #[test]
    fn fallback_identifier_is_the_extracted_candidate() {
        let raw = r#"{"linha": "77"}"#;
        let record = resolver().resolve(raw);
        assert_eq!(record.id, "77");
        assert_eq!(record.raw_payload.as_deref(), Some(raw));
    }

    #[test]
    fn resolve_is_total() {
        let resolver = resolver();
        let garbage = String::from_utf8_lossy(&[0xff, 0x00, 0xfe, b'{', b'"']).to_string();
        for raw in ["", "   ", "{", r#"{"linha": }"#, "linha=", "😀😀", garbage.as_str()] {
            let record = resolver.resolve(raw);
            assert!(!record.found, "{raw:?}");
            assert!(!record.schedule.is_empty());
            assert!(!record.waypoints.is_empty());
            assert_eq!(record.raw_payload.as_deref(), Some(raw));
        }
    }

    #[test]
    fn empty_input_keeps_raw_text_as_identifier() {
        let record = resolver().resolve("   ");
        assert_eq!(record.id, "   ");
    }
}
