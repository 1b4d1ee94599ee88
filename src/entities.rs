// Entity Splitter - project enriched records into customers, emails, phones
// All three share the fiscal id as linking key

use crate::features::Enriched;
use serde::{Serialize, Serializer};
use tracing::info;

// ============================================================================
// ENTITY ROWS
// ============================================================================

/// One row per surviving input record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub fiscal_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub age: i64,
    pub age_group: Option<String>,
    pub due_date: Option<String>,
    pub delinquency: Option<i64>,
    pub due_balance: Option<i64>,
    pub address: Option<String>,
    #[serde(rename = "ocupation")]
    pub occupation: Option<String>,
    #[serde(rename = "best_contact_ocupation", serialize_with = "flag_as_int")]
    pub best_contact_occupation: bool,
}

/// Flags are stored as 0/1 in every output
fn flag_as_int<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

/// Email channel; only records with a non-empty email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub fiscal_id: String,
    pub email: String,
    pub status: Option<String>,
    pub priority: Option<i64>,
}

/// Phone channel; only records with phone > 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone {
    pub fiscal_id: String,
    pub phone: i64,
    pub status: Option<String>,
    pub priority: Option<i64>,
}

/// The three finalized tables handed to the sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub customers: Vec<Customer>,
    pub emails: Vec<Email>,
    pub phones: Vec<Phone>,
}

// ============================================================================
// PROJECTIONS
// ============================================================================

impl From<&Enriched> for Customer {
    fn from(e: &Enriched) -> Self {
        let r = &e.record;
        Customer {
            fiscal_id: e.fiscal_id.clone(),
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            gender: r.gender.clone(),
            birth_date: r.birth_date.clone(),
            age: e.age,
            age_group: e.age_group.map(str::to_string),
            due_date: r.due_date.clone(),
            delinquency: e.delinquency,
            due_balance: r.due_balance,
            address: r.address.clone(),
            occupation: r.occupation.clone(),
            best_contact_occupation: e.best_contact_occupation,
        }
    }
}

impl Email {
    pub fn project(e: &Enriched) -> Option<Email> {
        let email = e.record.email.as_deref().filter(|v| !v.is_empty())?;
        Some(Email {
            fiscal_id: e.fiscal_id.clone(),
            email: email.to_string(),
            status: e.record.contact_status.clone(),
            priority: e.record.priority,
        })
    }
}

impl Phone {
    pub fn project(e: &Enriched) -> Option<Phone> {
        let phone = e.record.phone.filter(|p| *p > 0)?;
        Some(Phone {
            fiscal_id: e.fiscal_id.clone(),
            phone,
            status: e.record.contact_status.clone(),
            priority: e.record.priority,
        })
    }
}

/// Split into the three linked entities
pub fn split(rows: &[Enriched]) -> Entities {
    let entities = Entities {
        customers: rows.iter().map(Customer::from).collect(),
        emails: rows.iter().filter_map(Email::project).collect(),
        phones: rows.iter().filter_map(Phone::project).collect(),
    };

    info!(
        customers = entities.customers.len(),
        emails = entities.emails.len(),
        phones = entities.phones.len(),
        "split entities"
    );

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use pretty_assertions::assert_eq;

    fn enriched(email: Option<&str>, phone: Option<i64>) -> Enriched {
        Enriched {
            record: Record {
                rut: Some(1234567),
                dv: Some("8".to_string()),
                occupation: Some("CHEF".to_string()),
                email: email.map(str::to_string),
                phone,
                contact_status: Some("VALIDO".to_string()),
                priority: Some(1),
                ..Default::default()
            },
            fiscal_id: "12345678".to_string(),
            age: 34,
            age_group: Some("3"),
            delinquency: Some(10),
            best_contact_occupation: true,
        }
    }

    #[test]
    fn test_customer_projection() {
        let customer = Customer::from(&enriched(None, None));

        assert_eq!(customer.fiscal_id, "12345678");
        assert_eq!(customer.age, 34);
        assert_eq!(customer.age_group.as_deref(), Some("3"));
        assert_eq!(customer.delinquency, Some(10));
        assert_eq!(customer.occupation.as_deref(), Some("CHEF"));
        assert!(customer.best_contact_occupation);
    }

    #[test]
    fn test_customer_flag_serializes_as_int() {
        let mut customer = Customer::from(&enriched(None, None));
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["best_contact_ocupation"], serde_json::json!(1));
        assert_eq!(json["ocupation"], serde_json::json!("CHEF"));

        customer.best_contact_occupation = false;
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["best_contact_ocupation"], serde_json::json!(0));
    }

    #[test]
    fn test_email_filter() {
        assert!(Email::project(&enriched(None, None)).is_none());
        assert!(Email::project(&enriched(Some(""), None)).is_none());

        let email = Email::project(&enriched(Some("A@B.COM"), None)).unwrap();
        assert_eq!(
            email,
            Email {
                fiscal_id: "12345678".to_string(),
                email: "A@B.COM".to_string(),
                status: Some("VALIDO".to_string()),
                priority: Some(1),
            }
        );
    }

    #[test]
    fn test_phone_filter() {
        assert!(Phone::project(&enriched(None, None)).is_none());
        assert!(Phone::project(&enriched(None, Some(0))).is_none());
        assert!(Phone::project(&enriched(None, Some(-5))).is_none());
        assert_eq!(
            Phone::project(&enriched(None, Some(912345678))).map(|p| p.phone),
            Some(912345678)
        );
    }

    #[test]
    fn test_split_keeps_every_customer() {
        let rows = vec![
            enriched(Some("A@B.COM"), Some(912345678)),
            enriched(None, Some(0)),
            enriched(Some("C@D.CL"), None),
        ];
        let entities = split(&rows);

        assert_eq!(entities.customers.len(), 3);
        assert_eq!(entities.emails.len(), 2);
        assert_eq!(entities.phones.len(), 1);
        assert!(entities.phones.iter().all(|p| p.phone > 0));
    }
}
