/// Annual payment allocation
pub mod annual;
/// Attendance sessions, records and monthly grid
pub mod attendance;
/// Member categories and age-based classification
pub mod category;
/// CSV import of payment and attendance history
pub mod import;
/// Year initialization of payment slots
pub mod initializer;
/// Member registry
pub mod member;
/// Payment ledger
pub mod payment;
/// Stored settings and rate presets
pub mod settings;
