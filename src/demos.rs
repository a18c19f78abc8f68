//! The fixed-arity demonstrations: single-pipe warm-ups and hand-wired two-
//! and three-stage pipelines. Each function is self-contained and collects
//! every process it forks. The general N-stage form lives in [`crate::exec`].

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};

use crate::exec::{exec_stage, ExecError};
use crate::job::JobBuilder;
use crate::types::Command;

/// Example 1: one channel, one process. Write into the channel's write end,
/// read it back from the read end.
pub fn simplest_pipe() -> Result<(), ExecError> {
	println!("The simplest possible pipe: write one end, read the other.\n");

	let (read_end, write_end) = unistd::pipe()?;

	let mut writer = File::from(write_end);
	writer.write_all(b"through the pipe")?;
	// the reader only sees end-of-stream once every write end is closed
	drop(writer);

	let mut buffer = String::new();
	File::from(read_end).read_to_string(&mut buffer)?;
	println!("read back: {}\n", buffer);
	Ok(())
}

/// Example 2: same result, but writing through a rebound standard-output
/// slot. The real stdout is saved with dup and restored afterwards.
pub fn pipe_via_dup2() -> Result<(), ExecError> {
	println!("The same pipe, written through a rebound standard output.\n");
	io::stdout().flush()?;

	let saved = unsafe { OwnedFd::from_raw_fd(unistd::dup(libc::STDOUT_FILENO)?) };
	let (read_end, write_end) = unistd::pipe()?;

	unistd::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO)?;
	drop(write_end);
	print!("through a rebound standard output");
	io::stdout().flush()?;

	// restoring the slot closes the pipe's last write end
	unistd::dup2(saved.as_raw_fd(), libc::STDOUT_FILENO)?;
	drop(saved);

	let mut buffer = String::new();
	File::from(read_end).read_to_string(&mut buffer)?;
	println!("read back: {}\n", buffer);
	Ok(())
}

/// Example 3: `ls -l | wc -l` with two forks from the same parent.
pub fn two_stage_sequential() -> Result<(), ExecError> {
	println!("ls -l | wc -l, both stages forked from the same parent.\n");

	let producer = Command::new("ls", ["-l"]);
	let consumer = Command::new("wc", ["-l"]);

	let mut jobs = JobBuilder::new(2);
	let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC)?;

	match jobs.push_fork()? {
		ForkResult::Parent { .. } => {}
		ForkResult::Child => exec_stage(&producer, None, Some(write_end.as_raw_fd())),
	}
	// once this copy is gone the producer holds the only write end, so the
	// consumer sees end-of-stream as soon as the producer exits
	drop(write_end);

	match jobs.push_fork()? {
		ForkResult::Parent { .. } => {}
		ForkResult::Child => exec_stage(&consumer, Some(read_end.as_raw_fd()), None),
	}
	drop(read_end);

	jobs.build().wait()?;
	println!();
	Ok(())
}

/// Example 4: the same pipeline, but the consumer's process forks the
/// producer itself: parent -> consumer -> producer.
pub fn two_stage_nested() -> Result<(), ExecError> {
	println!("ls -l | wc -l again, with the producer forked by the middle process.\n");

	let producer = Command::new("ls", ["-l"]);
	let consumer = Command::new("wc", ["-l"]);

	let mut jobs = JobBuilder::new(1);
	match jobs.push_fork()? {
		ForkResult::Parent { .. } => {}
		ForkResult::Child => {
			let (read_end, write_end) = match unistd::pipe2(OFlag::O_CLOEXEC) {
				Ok(pair) => pair,
				Err(e) => fail_in_child(&e),
			};
			let mut inner = JobBuilder::new(1);
			match inner.push_fork() {
				Ok(ForkResult::Parent { .. }) => {
					drop(write_end);
					// the producer is this process's child; collect it
					// before replacing this image with the consumer
					let mut grandchild = inner.build();
					if let Err(e) = grandchild.wait() {
						fail_in_child(&e);
					}
					exec_stage(&consumer, Some(read_end.as_raw_fd()), None)
				}
				Ok(ForkResult::Child) => {
					exec_stage(&producer, None, Some(write_end.as_raw_fd()))
				}
				Err(e) => fail_in_child(&e),
			}
		}
	}

	jobs.build().wait()?;
	println!();
	Ok(())
}

/// Example 5: `echo pipes | tr -d e | tr -d i` with both channels created up
/// front and an index loop, the shape the recursive constructor generalizes.
pub fn three_stage_two_pipes() -> Result<(), ExecError> {
	println!("echo pipes | tr -d e | tr -d i, with both channels made up front.\n");

	let commands = [
		Command::new("echo", ["pipes"]),
		Command::new("tr", ["-d", "e"]),
		Command::new("tr", ["-d", "i"]),
	];

	let (first_read, first_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
	let (second_read, second_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
	let stage_io: [(Option<&OwnedFd>, Option<&OwnedFd>); 3] = [
		(None, Some(&first_write)),
		(Some(&first_read), Some(&second_write)),
		(Some(&second_read), None),
	];

	let mut jobs = JobBuilder::new(commands.len());
	for (command, (stdin_fd, stdout_fd)) in commands.iter().zip(stage_io) {
		match jobs.push_fork()? {
			ForkResult::Parent { .. } => {}
			ForkResult::Child => exec_stage(
				command,
				stdin_fd.map(|fd| fd.as_raw_fd()),
				stdout_fd.map(|fd| fd.as_raw_fd()),
			),
		}
	}

	// each stage's slots hold the only surviving copies; without releasing
	// the originals here the second tr never sees end-of-stream
	drop(first_read);
	drop(first_write);
	drop(second_read);
	drop(second_write);

	// waiting inside the launch loop is the classic deadlock: a stage blocks
	// reading until upstream data or end-of-stream arrives, so everything is
	// launched first and collected only afterwards
	jobs.build().wait()?;
	println!();
	Ok(())
}

/// The sorted descriptor table of the calling process, for before/after leak
/// audits.
#[cfg(target_os = "linux")]
pub fn open_descriptors() -> io::Result<Vec<RawFd>> {
	let mut fds = vec![];
	for entry in std::fs::read_dir("/proc/self/fd")? {
		if let Ok(fd) = entry?.file_name().to_string_lossy().parse::<RawFd>() {
			fds.push(fd);
		}
	}
	fds.sort_unstable();
	Ok(fds)
}

fn fail_in_child(e: &nix::Error) -> ! {
	let _ = writeln!(io::stderr(), "plumb: {}", e);
	// a forked demonstration process must not unwind into the caller's state
	unsafe { libc::_exit(126) }
}
