pub mod vacation_request;

pub use vacation_request::VacationRequestService;

use crate::store::mysql::{MySqlEmployeeDirectory, MySqlRequestStore};

/// The concrete service wired in `main` and injected into handlers.
pub type AppService = VacationRequestService<MySqlRequestStore, MySqlEmployeeDirectory>;
