pub mod init;
pub mod merge;
pub mod run;
pub mod scan;
pub mod stats;
pub mod strip;
