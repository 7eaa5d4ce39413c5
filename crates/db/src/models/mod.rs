//! Domain model structs and DTOs.
//!
//! Entity structs derive `FromRow` + `Serialize` and match a database row
//! (or a joined read). Create DTOs are `Deserialize`; update DTOs carry
//! only `Option` fields and patch what is present.

pub mod execution;
pub mod machine;
pub mod session;
pub mod snapshot;
pub mod task;
pub mod user;
