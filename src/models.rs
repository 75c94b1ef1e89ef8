use serde::{Deserialize, Serialize};

/// A (neighborhood, district) pair from the scraped lookup table.
/// Stored as scraped; no normalization is applied at rest. Duplicate
/// pairs are legitimate (same name can appear in several districts)
/// and are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodRecord {
    pub neighborhood: String,
    pub district: String,
}

impl NeighborhoodRecord {
    /// Canonical rendering used when a suggestion is picked:
    /// "{neighborhood} Mh. - {district}".
    pub fn label(&self) -> String {
        format!("{} Mh. - {}", self.neighborhood, self.district)
    }
}

/// Per-field validation failure returned to the form.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            message: "Bu alanı doldurunuz".to_string(),
        }
    }
}

/// A lead submission, keyed by service type. Each variant carries only
/// the fields that service actually collects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "service_type")]
pub enum Lead {
    Kurye {
        /// Pickup neighborhood ("Teslim Alınacak Semt").
        pickup: String,
        /// Delivery neighborhood ("Teslim Edilecek Semt").
        dropoff: String,
        package_size: String,
        vehicle: String,
        package_type: String,
        #[serde(default)]
        source: String,
    },
    Pharmacy {
        service: String,
        #[serde(default)]
        source: String,
    },
    Valet {
        service: String,
        #[serde(default)]
        source: String,
    },
}

impl Lead {
    pub fn service_label(&self) -> &str {
        match self {
            Lead::Kurye { .. } => "Kurye",
            Lead::Pharmacy { service, .. } | Lead::Valet { service, .. } => {
                if service.is_empty() {
                    match self {
                        Lead::Pharmacy { .. } => "Eczane Kuryesi",
                        _ => "Vale",
                    }
                } else {
                    service.as_str()
                }
            }
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Lead::Kurye { source, .. }
            | Lead::Pharmacy { source, .. }
            | Lead::Valet { source, .. } => source,
        }
    }

    /// Check required fields. Empty result means the lead is valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match self {
            Lead::Kurye {
                pickup,
                dropoff,
                package_size,
                vehicle,
                package_type,
                ..
            } => {
                if pickup.trim().is_empty() {
                    errors.push(FieldError::required("pickup"));
                }
                if dropoff.trim().is_empty() {
                    errors.push(FieldError::required("dropoff"));
                }
                if package_size.trim().is_empty() {
                    errors.push(FieldError::required("package_size"));
                }
                if vehicle.trim().is_empty() {
                    errors.push(FieldError::required("vehicle"));
                }
                if package_type.trim().is_empty() {
                    errors.push(FieldError::required("package_type"));
                }
            }
            Lead::Pharmacy { service, .. } | Lead::Valet { service, .. } => {
                if service.trim().is_empty() {
                    errors.push(FieldError::required("service"));
                }
            }
        }
        errors
    }

    /// Pre-filled WhatsApp message text, one labelled line per field.
    pub fn whatsapp_message(&self) -> String {
        match self {
            Lead::Kurye {
                pickup,
                dropoff,
                package_size,
                vehicle,
                package_type,
                ..
            } => format!(
                "Merhaba! Kurye hizmeti almak istiyorum.\n\n\
                 Teslim Alınacak Semt: {}\n\
                 Teslim Edilecek Semt: {}\n\
                 Paket Boyutu: {}\n\
                 Araç Türü: {}\n\
                 Paket Türü: {}",
                pickup, dropoff, package_size, vehicle, package_type
            ),
            Lead::Pharmacy { .. } | Lead::Valet { .. } => {
                format!("Merhaba! {} hizmeti almak istiyorum.", self.service_label())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub root_url: String,
    /// WhatsApp number the deep link points at, digits only with country code.
    #[serde(default)]
    pub whatsapp_number: String,
    /// Path to the scraped neighborhoods JSON artifact.
    #[serde(default)]
    pub neighborhoods_file: String,
    #[serde(default)]
    pub enable_leads: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet webhook (Apps Script web app) URL. Empty disables logging.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub url: String,
    /// id attribute of the table holding the (neighborhood, district) rows.
    #[serde(default)]
    pub table_id: String,
    #[serde(default)]
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_label_is_canonical() {
        let r = NeighborhoodRecord {
            neighborhood: "Acıbadem".to_string(),
            district: "Üsküdar".to_string(),
        };
        assert_eq!(r.label(), "Acıbadem Mh. - Üsküdar");
    }

    #[test]
    fn kurye_lead_requires_all_fields() {
        let lead = Lead::Kurye {
            pickup: "Acıbadem Mh. - Üsküdar".to_string(),
            dropoff: String::new(),
            package_size: "Orta".to_string(),
            vehicle: " ".to_string(),
            package_type: "Standart".to_string(),
            source: "Courier Form".to_string(),
        };
        let errors = lead.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["dropoff", "vehicle"]);
    }

    #[test]
    fn service_lead_requires_only_service() {
        let lead = Lead::Valet {
            service: String::new(),
            source: "Services Page".to_string(),
        };
        assert_eq!(lead.validate().len(), 1);

        let lead = Lead::Pharmacy {
            service: "Eczane Kuryesi".to_string(),
            source: "Services Page".to_string(),
        };
        assert!(lead.validate().is_empty());
    }

    #[test]
    fn lead_deserializes_by_service_type_tag() {
        let json = r#"{
            "service_type": "Kurye",
            "pickup": "Moda Mh. - Kadıköy",
            "dropoff": "Acıbadem Mh. - Üsküdar",
            "package_size": "Küçük",
            "vehicle": "Motor",
            "package_type": "Express"
        }"#;
        let lead: Lead = serde_json::from_str(json).unwrap();
        assert!(matches!(lead, Lead::Kurye { .. }));
        assert!(lead.validate().is_empty());
        assert_eq!(lead.source(), "");
    }

    #[test]
    fn whatsapp_message_labels_every_field() {
        let lead = Lead::Kurye {
            pickup: "Moda Mh. - Kadıköy".to_string(),
            dropoff: "Acıbadem Mh. - Üsküdar".to_string(),
            package_size: "Orta".to_string(),
            vehicle: "Motor".to_string(),
            package_type: "VIP".to_string(),
            source: "Courier Form".to_string(),
        };
        let msg = lead.whatsapp_message();
        assert!(msg.starts_with("Merhaba! Kurye hizmeti almak istiyorum."));
        assert!(msg.contains("Teslim Alınacak Semt: Moda Mh. - Kadıköy"));
        assert!(msg.contains("Paket Türü: VIP"));
    }
}
