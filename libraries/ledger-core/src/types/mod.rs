mod collection;
mod documents;
mod expense;
mod ids;
mod record;
mod settings;
mod snapshot;
mod user;
mod work_order;

pub use collection::Collection;
pub use documents::{
    backup_filename, categories_filename, data_filename, info_filename, CategoriesDocument,
    RemoteUser, UserDataDocument, UserInfoDocument, UserInfoSettings,
};
pub use expense::{Expense, PaymentMethod};
pub use ids::{RecordId, UserId};
pub use record::OwnedRecord;
pub use settings::{Activation, CompanyInfo, CustomCategories, SettingsBundle, Theme};
pub use snapshot::{
    LegacySnapshot, Snapshot, SnapshotData, SnapshotFormat, SnapshotStats, SnapshotUser,
    CURRENT_FORMAT_VERSION, LEGACY_FORMAT_VERSION, SNAPSHOT_VERSION,
};
pub use user::{NewUser, User};
pub use work_order::{WorkOrder, WorkOrderStatus};
