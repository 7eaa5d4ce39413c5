//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or any Postgres executor) as the first argument.

pub mod execution_repo;
pub mod import_repo;
pub mod machine_repo;
pub mod session_repo;
pub mod snapshot_repo;
pub mod task_repo;
pub mod user_repo;

pub use execution_repo::ExecutionRepo;
pub use import_repo::ImportRepo;
pub use machine_repo::MachineRepo;
pub use session_repo::SessionRepo;
pub use snapshot_repo::SnapshotRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
