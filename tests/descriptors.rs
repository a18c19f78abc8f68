//! Descriptor-table audit: once a pipeline has been fully collected, no
//! channel end may remain open anywhere in the parent.

#![cfg(target_os = "linux")]

use std::fs::File;
use std::io::Read;
use std::os::fd::{AsFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd;

use plumb::{exec, parser};

fn open_descriptors() -> Vec<RawFd> {
	let mut fds = vec![];
	for entry in std::fs::read_dir("/proc/self/fd").unwrap() {
		if let Ok(fd) = entry.unwrap().file_name().to_string_lossy().parse::<RawFd>() {
			fds.push(fd);
		}
	}
	fds.sort_unstable();
	fds
}

// Sole test in this binary: nothing else may touch the descriptor table
// between the two snapshots.
#[test]
fn descriptor_table_is_unchanged_after_runs() {
	let pipeline = parser::parse(b"echo pipes | tr -d e | tr -d i").unwrap();
	let before = open_descriptors();

	// two back-to-back runs over the same command list: independent
	// pipelines, no collisions, and nothing left open afterwards
	for _ in 0..2 {
		let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).unwrap();
		let job = exec::run_io(&pipeline, None, Some(write_end.as_fd())).unwrap();
		drop(write_end);

		let mut output = String::new();
		File::from(read_end).read_to_string(&mut output).unwrap();
		assert_eq!(output, "pps\n");
		assert_eq!(job.len(), 3);
	}

	assert_eq!(open_descriptors(), before);
}
