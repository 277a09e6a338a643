//! CSV-file storage backend.
//!
//! Each user owns a directory under the data directory. Bills are kept in a
//! `bills.csv` collection and the profile in a `profile.yaml` record. Writes
//! go through a temp file and a rename so a crash never leaves a half-written
//! collection behind.

pub mod bill_repository;
pub mod connection;
pub mod profile_repository;

#[cfg(test)]
pub mod test_utils;

pub use bill_repository::CsvBillRepository;
pub use connection::CsvConnection;
pub use profile_repository::CsvProfileRepository;
