//! Patient records, as managed by their doctor.

use crate::ValidationError;
use serde_derive::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Everything the backend knows about a patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PatientRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A doctor registering one of their patients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub gender: String,
    pub phone_number: String,
    pub address: String,
    pub medical_history: String,
    /// Defaults to the doctor creating the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<String>,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("dateOfBirth", &self.date_of_birth),
            ("gender", &self.gender),
            ("phoneNumber", &self.phone_number),
            ("address", &self.address),
        ];

        for &(name, value) in required.iter() {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { name });
            }
        }

        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PatientSort {
    /// Alphabetical by full name.
    Name,
    /// Whatever order the server returned.
    Recent,
}

impl Default for PatientSort {
    fn default() -> Self { PatientSort::Name }
}

/// Search by name, email, or phone number.
pub fn filter_patients<'a>(
    patients: &'a [PatientRecord],
    search: &str,
    sort: PatientSort,
) -> Vec<&'a PatientRecord> {
    let needle = search.trim().to_lowercase();

    let mut matches: Vec<&PatientRecord> = patients
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.full_name().to_lowercase().contains(&needle)
                || p.email.to_lowercase().contains(&needle)
                || p.phone_number.contains(search.trim())
        })
        .collect();

    if sort == PatientSort::Name {
        matches.sort_by(|a, b| by_name(a, b));
    }

    matches
}

fn by_name(left: &PatientRecord, right: &PatientRecord) -> Ordering {
    left.full_name()
        .to_lowercase()
        .cmp(&right.full_name().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(
        id: &str,
        first: &str,
        last: &str,
        phone: &str,
    ) -> PatientRecord {
        PatientRecord {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            phone_number: phone.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<PatientRecord> {
        vec![
            patient("1", "zoe", "Adams", "555-0101"),
            patient("2", "Adam", "Young", "555-0202"),
            patient("3", "Mary", "Smith", "555-0303"),
        ]
    }

    fn ids(patients: &[&PatientRecord]) -> Vec<String> {
        patients.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn parse_a_patient_record() {
        let src = r#"{
            "_id": "p1",
            "id": "p1",
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "password": "$2b$10$hash",
            "dateOfBirth": "1990-04-01",
            "gender": "female",
            "phoneNumber": "555-0100",
            "address": "1 Main St",
            "medicalHistory": "Asthma",
            "assignedDoctor": "d1"
        }"#;

        let got: PatientRecord = serde_json::from_str(src).unwrap();

        assert_eq!(got.id, "p1");
        assert_eq!(got.full_name(), "Jane Doe");
        assert_eq!(got.assigned_doctor.as_deref(), Some("d1"));
        assert_eq!(got.notes, None);
    }

    #[test]
    fn sort_by_name_ignores_case() {
        let patients = sample();

        let got = filter_patients(&patients, "", PatientSort::Name);

        assert_eq!(ids(&got), vec!["2", "3", "1"]);
    }

    #[test]
    fn recent_keeps_server_order() {
        let patients = sample();

        let got = filter_patients(&patients, "", PatientSort::Recent);

        assert_eq!(ids(&got), vec!["1", "2", "3"]);
    }

    #[test]
    fn search_by_name_email_or_phone() {
        let patients = sample();

        let by_name = filter_patients(&patients, "ADAM", PatientSort::Name);
        assert_eq!(ids(&by_name), vec!["2", "1"]);

        let by_email = filter_patients(&patients, "mary@", PatientSort::Name);
        assert_eq!(ids(&by_email), vec!["3"]);

        let by_phone = filter_patients(&patients, "0202", PatientSort::Name);
        assert_eq!(ids(&by_phone), vec!["2"]);
    }

    #[test]
    fn new_patients_need_the_basics() {
        let mut patient = NewPatient {
            first_name: String::from("Jane"),
            last_name: String::from("Doe"),
            email: String::from("jane@example.com"),
            date_of_birth: String::from("1990-04-01"),
            gender: String::from("female"),
            phone_number: String::from("555-0100"),
            address: String::from("1 Main St"),
            ..Default::default()
        };
        assert_eq!(patient.validate(), Ok(()));

        patient.address.clear();
        assert_eq!(
            patient.validate(),
            Err(ValidationError::MissingField { name: "address" })
        );

        patient.address = String::from("1 Main St");
        patient.email = String::from("not-an-email");
        assert_eq!(
            patient.validate(),
            Err(ValidationError::InvalidEmail(String::from("not-an-email")))
        );
    }
}
