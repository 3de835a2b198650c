//! Folder-to-folder comparison of line-oriented text files.
//!
//! Every file of one folder is checked against the files of the other:
//! 12-digit ID presence, missing lines, or a strict position-by-position
//! diff. Results are written as flat report files per source and per pass.
pub mod builders;
pub mod core;
pub mod utils;
