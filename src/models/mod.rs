pub mod analysis;
pub mod difficulty;
pub mod generated;
pub mod job;
pub mod lenient;
pub mod loaders;
pub mod operation;

pub use analysis::{AnalysisPayload, AnalysisResult, AnalyzeRequest, AnalyzeResponse};
pub use difficulty::Difficulty;
pub use generated::{
    parse_count_input, DownloadRequest, GenerateRequest, GenerateResponse, GeneratedProblem,
    GeneratedSet, GenerationSettings, Metadata, ProblemList,
};
pub use job::{DownloadFormat, ProblemJob};
pub use loaders::{load_all_toml_files, load_toml_to_problem_job};
pub use operation::Operation;
