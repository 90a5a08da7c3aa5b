pub mod download_writer;
pub mod problem_api;

pub use download_writer::DownloadWriter;
pub use problem_api::ProblemApi;
