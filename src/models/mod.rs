pub mod appointment;
pub mod enums;
pub mod patient;
pub mod prescription;
pub mod visit;

pub use appointment::{Appointment, AppointmentUpdate};
pub use enums::{AppointmentStatus, PrescriptionStatus, RefillStatus};
pub use patient::{Patient, PatientUpdate};
pub use prescription::{Prescription, RefillRequest};
pub use visit::{Visit, Vitals};
