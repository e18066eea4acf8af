pub mod archive;
pub mod dashboard;

pub use archive::ArchiveWriter;
pub use dashboard::Dashboard;
