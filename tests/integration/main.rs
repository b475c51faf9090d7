//! Integration tests for bamchunk.
//!
//! Each test writes a real BAM and BAI into a temporary directory and runs either the
//! `bamchunk` binary or the library entry points against it.

mod helpers;
mod test_chunk_command;
mod test_error_paths;
mod test_stats_command;
