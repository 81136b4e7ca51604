//! Hard-coded demo data used as initial store state and test fixtures.
//!
//! Everything in this module is fictional. No real patient identifiers or
//! PHI are present. In a production deployment these arrays would be
//! replaced by a real clinical data source.

use chrono::{Duration, Utc};

use crate::models::{
    Appointment, AppointmentStatus, Patient, Prescription, PrescriptionStatus, RefillRequest,
    RefillStatus, Visit, Vitals,
};

fn patient(
    id: &str,
    first: &str,
    last: &str,
    dob: &str,
    gender: &str,
    pronouns: &str,
    email: &str,
    phone: &str,
    address: &str,
    history: &[&str],
    provider: &str,
) -> Patient {
    Patient {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        name: None,
        date_of_birth: dob.to_string(),
        gender: gender.to_string(),
        pronouns: Some(pronouns.to_string()),
        email: email.to_string(),
        phone: phone.to_string(),
        address: address.to_string(),
        medical_history: history.iter().map(|s| s.to_string()).collect(),
        active: true,
        provider: provider.to_string(),
    }
}

/// Five demo patients, ids `p1`..`p5`.
pub fn seed_patients() -> Vec<Patient> {
    vec![
        patient(
            "p1",
            "June",
            "Okafor",
            "1984-03-22",
            "female",
            "she/her",
            "june.okafor@example.com",
            "555-0132",
            "12 Birch Lane, Riverton",
            &["hypertension", "iron deficiency anemia"],
            "Dr. Patel",
        ),
        patient(
            "p2",
            "Marcus",
            "Leroy",
            "1957-11-04",
            "male",
            "he/him",
            "m.leroy@example.com",
            "555-0174",
            "88 Harbor St, Riverton",
            &["type 2 diabetes", "essential hypertension"],
            "Dr. Rivera",
        ),
        patient(
            "p3",
            "Anja",
            "Lindqvist",
            "1992-07-15",
            "female",
            "she/her",
            "anja.l@example.com",
            "555-0119",
            "3 Fell Court, Riverton",
            &["asthma"],
            "Dr. Patel",
        ),
        patient(
            "p4",
            "Tomas",
            "Ferreira",
            "1978-01-30",
            "male",
            "he/him",
            "tferreira@example.com",
            "555-0163",
            "240 Quarry Rd, Riverton",
            &["hyperlipidemia", "GERD"],
            "Dr. Chen",
        ),
        patient(
            "p5",
            "Priya",
            "Raman",
            "2001-09-08",
            "nonbinary",
            "they/them",
            "priya.raman@example.com",
            "555-0187",
            "7 Alder Walk, Riverton",
            &[],
            "Dr. Rivera",
        ),
    ]
}

/// Demo appointments, ids `a1`..`a5`, scheduled relative to now so the
/// calendar views always have upcoming entries.
pub fn seed_appointments() -> Vec<Appointment> {
    let now = Utc::now();
    let slot = |days: i64, hour: i64| (now + Duration::days(days) + Duration::hours(hour)).to_rfc3339();

    vec![
        Appointment {
            id: "a1".to_string(),
            patient_id: "p1".to_string(),
            time: slot(1, 0),
            duration_minutes: 30,
            status: AppointmentStatus::Booked,
            provider: "Dr. Patel".to_string(),
            reason: "Follow-up: anemia labs".to_string(),
        },
        Appointment {
            id: "a2".to_string(),
            patient_id: "p2".to_string(),
            time: slot(1, 3),
            duration_minutes: 45,
            status: AppointmentStatus::Booked,
            provider: "Dr. Rivera".to_string(),
            reason: "Diabetes management review".to_string(),
        },
        Appointment {
            id: "a3".to_string(),
            patient_id: "p3".to_string(),
            time: slot(2, 0),
            duration_minutes: 20,
            status: AppointmentStatus::Pending,
            provider: "Dr. Patel".to_string(),
            reason: "Inhaler technique check".to_string(),
        },
        Appointment {
            id: "a4".to_string(),
            patient_id: "p4".to_string(),
            time: slot(-7, 0),
            duration_minutes: 30,
            status: AppointmentStatus::Completed,
            provider: "Dr. Chen".to_string(),
            reason: "Annual physical".to_string(),
        },
        Appointment {
            id: "a5".to_string(),
            patient_id: "p5".to_string(),
            time: slot(3, 2),
            duration_minutes: 30,
            status: AppointmentStatus::Cancelled,
            provider: "Dr. Rivera".to_string(),
            reason: "New patient intake".to_string(),
        },
    ]
}

/// Demo e-prescribing drafts. Rendered only; never persisted.
pub fn seed_prescriptions() -> Vec<Prescription> {
    vec![
        Prescription {
            id: "rx1".to_string(),
            patient_id: "p1".to_string(),
            medication: "Ferrous sulfate".to_string(),
            dosage: "325 mg".to_string(),
            frequency: "once daily".to_string(),
            status: PrescriptionStatus::Sent,
        },
        Prescription {
            id: "rx2".to_string(),
            patient_id: "p2".to_string(),
            medication: "Metformin".to_string(),
            dosage: "500 mg".to_string(),
            frequency: "twice daily".to_string(),
            status: PrescriptionStatus::Ready,
        },
        Prescription {
            id: "rx3".to_string(),
            patient_id: "p3".to_string(),
            medication: "Albuterol HFA".to_string(),
            dosage: "90 mcg".to_string(),
            frequency: "2 puffs as needed".to_string(),
            status: PrescriptionStatus::Draft,
        },
    ]
}

/// Demo refill queue. Rendered only; never persisted.
pub fn seed_refill_requests() -> Vec<RefillRequest> {
    let now = Utc::now();
    vec![
        RefillRequest {
            id: "rf1".to_string(),
            patient_id: "p2".to_string(),
            medication: "Metformin 500 mg".to_string(),
            requested_at: (now - Duration::days(2)).to_rfc3339(),
            status: RefillStatus::Pending,
        },
        RefillRequest {
            id: "rf2".to_string(),
            patient_id: "p4".to_string(),
            medication: "Atorvastatin 20 mg".to_string(),
            requested_at: (now - Duration::days(5)).to_rfc3339(),
            status: RefillStatus::Approved,
        },
        RefillRequest {
            id: "rf3".to_string(),
            patient_id: "p1".to_string(),
            medication: "Lisinopril 10 mg".to_string(),
            requested_at: (now - Duration::days(9)).to_rfc3339(),
            status: RefillStatus::Completed,
        },
    ]
}

/// Demo visits for the SQLite side, ids `v1`..`v3`. `v1` has no transcript
/// yet, which makes it the natural target for transcription demos.
pub fn seed_visits() -> Vec<Visit> {
    let now = Utc::now();
    vec![
        Visit {
            id: "v1".to_string(),
            patient_id: "p1".to_string(),
            subjective: Some("Fatigue and mild dyspnea on exertion for three weeks.".to_string()),
            objective: Some("Lungs clear bilaterally. EKG normal sinus rhythm.".to_string()),
            assessment: Some("Mild anemia, iron studies pending.".to_string()),
            plan: Some("Start oral iron, recheck CBC in four weeks.".to_string()),
            vitals: Some(Vitals {
                blood_pressure: Some("138/88".to_string()),
                heart_rate: Some(82),
                temperature_c: Some(36.8),
                oxygen_saturation: Some(97),
            }),
            medications: vec!["Ferrous sulfate 325 mg".to_string()],
            audio_url: None,
            transcript: None,
            generated_summary: None,
            created_at: (now - Duration::days(1)).to_rfc3339(),
        },
        Visit {
            id: "v2".to_string(),
            patient_id: "p2".to_string(),
            subjective: Some("Reports improved morning glucose readings.".to_string()),
            objective: Some("A1c 7.1%, down from 7.8%.".to_string()),
            assessment: Some("Type 2 diabetes, improving control.".to_string()),
            plan: Some("Continue metformin, repeat A1c in three months.".to_string()),
            vitals: Some(Vitals {
                blood_pressure: Some("142/90".to_string()),
                heart_rate: Some(76),
                temperature_c: None,
                oxygen_saturation: Some(98),
            }),
            medications: vec!["Metformin 500 mg".to_string(), "Lisinopril 10 mg".to_string()],
            audio_url: None,
            transcript: None,
            generated_summary: None,
            created_at: (now - Duration::days(3)).to_rfc3339(),
        },
        Visit {
            id: "v3".to_string(),
            patient_id: "p3".to_string(),
            subjective: None,
            objective: None,
            assessment: None,
            plan: None,
            vitals: None,
            medications: vec![],
            audio_url: None,
            transcript: None,
            generated_summary: None,
            created_at: now.to_rfc3339(),
        },
    ]
}
