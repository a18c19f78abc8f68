//! The recursive pipeline constructor.
//!
//! One recursion level per stage: every level but the last creates one
//! channel, launches one process, releases the parent-side copies of the
//! descriptors it handed over, and recurses with the channel's read end as
//! the next stage's input. Nothing is waited on until every stage has been
//! launched.

use std::env;
use std::ffi::{self, CString};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};
use thiserror::Error;

use crate::job::{Job, JobBuilder};
use crate::search;
use crate::types::{Command, Pipeline};

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("system call failed: {0}")]
	Sys(#[from] nix::Error),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("nul byte in command token: {0}")]
	Nul(#[from] ffi::NulError),
}

/// Where a stage's standard input comes from.
enum Source<'a> {
	/// The caller's stream. Borrowed: this module never closes it.
	Initial(Option<BorrowedFd<'a>>),
	/// Read end of the channel created one level up. Closed on drop.
	Channel(OwnedFd),
}

impl Source<'_> {
	fn fd(&self) -> Option<RawFd> {
		match self {
			Source::Initial(fd) => fd.as_ref().map(|fd| fd.as_raw_fd()),
			Source::Channel(fd) => Some(fd.as_raw_fd()),
		}
	}
}

/// Run a pipeline with both outer streams inherited from this process.
pub fn run(pipeline: &Pipeline) -> Result<Job, ExecError> {
	run_io(pipeline, None, None)
}

/// Run a pipeline. Stage 0 reads from `input` (or inherits standard input),
/// the terminal stage writes to `output` (or inherits standard output), and
/// every adjacent pair in between is connected by a fresh channel.
///
/// Returns once every stage has been launched and collected, with one
/// termination status recorded per stage.
pub fn run_io(
	pipeline: &Pipeline,
	input: Option<BorrowedFd<'_>>,
	output: Option<BorrowedFd<'_>>,
) -> Result<Job, ExecError> {
	assert!(!pipeline.is_empty());

	let mut jobs = JobBuilder::new(pipeline.len());
	let wired = wire(&pipeline.commands, 0, Source::Initial(input), output, &mut jobs);

	// Launch everything first, then wait on everything: collecting a stage
	// before its downstream stages are launched risks deadlock, because each
	// stage blocks reading until upstream data or end-of-stream arrives.
	// When wiring failed partway, every channel end has already dropped, so
	// the stages that did launch run to end-of-stream and are collected all
	// the same before the error surfaces.
	let mut job = jobs.build();
	job.wait()?;
	wired?;
	Ok(job)
}

fn wire(
	commands: &[Command],
	pos: usize,
	input: Source<'_>,
	output: Option<BorrowedFd<'_>>,
	jobs: &mut JobBuilder,
) -> Result<(), ExecError> {
	if pos + 1 == commands.len() {
		// terminal stage: no channel, stdout goes to the caller's binding
		match jobs.push_fork()? {
			ForkResult::Parent { .. } => {}
			ForkResult::Child => {
				exec_stage(&commands[pos], input.fd(), output.map(|fd| fd.as_raw_fd()))
			}
		}
		// a Channel input is this frame's to release; an Initial one is not
		drop(input);
		Ok(())
	} else {
		let (chan_read, chan_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
		tracing::debug!(
			stage = pos,
			read = chan_read.as_raw_fd(),
			write = chan_write.as_raw_fd(),
			"channel created"
		);
		match jobs.push_fork()? {
			ForkResult::Parent { .. } => {}
			ForkResult::Child => {
				exec_stage(&commands[pos], input.fd(), Some(chan_write.as_raw_fd()))
			}
		}
		// the duplicates sitting in the child's stream slots are the only
		// copies that survive its image replacement; the parent-side
		// originals end here, and the read end ends when the next level
		// finishes with it
		drop(chan_write);
		drop(input);
		wire(commands, pos + 1, Source::Channel(chan_read), output, jobs)
	}
}

/// Child side of a fork: bind the standard stream slots, then replace the
/// image. Never returns; a failure is reported to stderr and turns into a
/// non-zero exit of this process alone.
pub(crate) fn exec_stage(command: &Command, stdin: Option<RawFd>, stdout: Option<RawFd>) -> ! {
	let status = do_exec_stage(command, stdin, stdout).unwrap_or_else(|e| {
		let _ = writeln!(io::stderr(), "plumb: {}: {}", command.display_name(), e);
		126
	});
	// forked image: leave without unwinding into state shared with the parent
	unsafe { libc::_exit(status) }
}

fn do_exec_stage(
	command: &Command,
	stdin: Option<RawFd>,
	stdout: Option<RawFd>,
) -> Result<libc::c_int, ExecError> {
	use std::os::unix::ffi::OsStringExt;

	if let Some(fd) = stdin {
		unistd::dup2(fd, libc::STDIN_FILENO)?;
	}
	if let Some(fd) = stdout {
		unistd::dup2(fd, libc::STDOUT_FILENO)?;
	}
	let path = match search::resolve(command.name()) {
		Some(path) => path,
		None => {
			let mut stderr = io::stderr();
			let _ = stderr.write_all(b"plumb: command not found: ");
			let _ = stderr.write_all(command.name());
			let _ = stderr.write_all(b"\n");
			let _ = stderr.flush();
			return Ok(127);
		}
	};
	let argv = command.argv()?;
	let envp: Result<Vec<CString>, ffi::NulError> = env::vars_os()
		.map(|(mut key, value)| {
			key.push("=");
			key.push(value);
			CString::new(key.into_vec())
		})
		.collect();
	let envp = envp?;
	unistd::execve(&path, &argv, &envp)?;
	unreachable!()
}
