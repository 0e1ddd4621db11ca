mod load;
mod metrics;
mod plot;
mod report;
mod run;
#[cfg(test)]
mod tests;

pub use load::discover_artifact_files;
pub use run::run;
