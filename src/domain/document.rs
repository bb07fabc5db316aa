//! Conversion between stored JSON documents and typed records.
//!
//! Documents are stored without their id (the id is the document key), so
//! decoding takes the id separately. This is the only place stored data is
//! turned back into a [`VaccinationRecord`].

use crate::domain::model::VaccinationRecord;
use crate::utils::error::{ChronicleError, Result};
use serde_json::Value;

pub fn decode_record(id: &str, document: &Value) -> Result<VaccinationRecord> {
    let Value::Object(fields) = document else {
        return Err(ChronicleError::DocumentError {
            id: id.to_string(),
            reason: "document is not an object".to_string(),
        });
    };

    let mut fields = fields.clone();
    fields.insert("id".to_string(), Value::String(id.to_string()));

    let record: VaccinationRecord =
        serde_json::from_value(Value::Object(fields)).map_err(|e| ChronicleError::DocumentError {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    if record.dose_number == 0 {
        return Err(ChronicleError::DocumentError {
            id: id.to_string(),
            reason: "doseNumber must be at least 1".to_string(),
        });
    }

    Ok(record)
}

pub fn encode_record(record: &VaccinationRecord) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        fields.remove("id");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::VaccinationStatus;
    use serde_json::json;

    fn stored_document() -> Value {
        json!({
            "childId": "child-1",
            "vaccineId": "dtp",
            "vaccineName": "DTP",
            "doseNumber": 2,
            "scheduledDate": "2024-03-16T00:00:00Z",
            "status": "scheduled",
            "createdAt": "2024-01-01T09:00:00Z",
            "updatedAt": "2024-01-01T09:00:00Z"
        })
    }

    #[test]
    fn test_decode_valid_document() {
        let record = decode_record("rec-7", &stored_document()).unwrap();
        assert_eq!(record.id, "rec-7");
        assert_eq!(record.dose_number, 2);
        assert_eq!(record.status, VaccinationStatus::Scheduled);
        assert!(record.administered_date.is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_status() {
        let mut doc = stored_document();
        doc["status"] = json!("pending");
        let err = decode_record("rec-7", &doc).unwrap_err();
        assert!(matches!(err, ChronicleError::DocumentError { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let mut doc = stored_document();
        doc.as_object_mut().unwrap().remove("scheduledDate");
        assert!(decode_record("rec-7", &doc).is_err());
    }

    #[test]
    fn test_decode_rejects_zero_dose() {
        let mut doc = stored_document();
        doc["doseNumber"] = json!(0);
        assert!(decode_record("rec-7", &doc).is_err());
    }

    #[test]
    fn test_encode_drops_id() {
        let record = decode_record("rec-7", &stored_document()).unwrap();
        let encoded = encode_record(&record).unwrap();
        assert!(encoded.get("id").is_none());
        assert_eq!(encoded["vaccineId"], json!("dtp"));
        assert!(encoded.get("administeredDate").is_none());
    }
}
