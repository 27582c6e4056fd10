mod dataframe;
mod describe;

pub use dataframe::DataFrame;
pub use describe::{STATISTICS, SUMMARY_COLUMN};
