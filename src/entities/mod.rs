//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance_record;
pub mod attendance_session;
pub mod category;
pub mod member;
pub mod payment;
pub mod payment_rate_preset;
pub mod payment_setting;
pub mod session_type;

// Re-export specific types to avoid conflicts
pub use attendance_record::{
    Column as AttendanceRecordColumn, Entity as AttendanceRecord, Model as AttendanceRecordModel,
};
pub use attendance_session::{
    Column as AttendanceSessionColumn, Entity as AttendanceSession,
    Model as AttendanceSessionModel,
};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use payment_rate_preset::{
    Column as PaymentRatePresetColumn, Entity as PaymentRatePreset,
    Model as PaymentRatePresetModel,
};
pub use payment_setting::{
    Column as PaymentSettingColumn, Entity as PaymentSetting, Model as PaymentSettingModel,
};
pub use session_type::{
    Column as SessionTypeColumn, Entity as SessionType, Model as SessionTypeModel,
};
