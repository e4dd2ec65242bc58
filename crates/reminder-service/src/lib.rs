//! Service layer: user account operations and the notification scheduler
//! on top of the entity store.

pub mod error;
pub mod files;
pub mod scheduler;
pub mod sink;
pub mod users;

pub use error::{ServiceError, ServiceResult};
pub use files::LocalFileStore;
pub use scheduler::NotificationScheduler;
pub use sink::LoggingPushSink;
pub use users::UserService;
