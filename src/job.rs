use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

pub trait WaitStatusExt {
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
	pub pid: Pid,
	pub status: Option<WaitStatus>,
}

/// The launched stages of one pipeline. Every process recorded here is
/// collected exactly once by [`Job::wait`].
#[derive(Debug)]
pub struct Job {
	processes: Vec<Process>,
}

impl Job {
	/// Collect one termination per launched process. Processes already
	/// collected are not waited on again, so calling this twice is harmless.
	pub fn wait(&mut self) -> nix::Result<()> {
		for process in &mut self.processes {
			if process.status.is_none() {
				let status = waitpid(process.pid, None)?;
				tracing::debug!(pid = process.pid.as_raw(), ?status, "stage collected");
				process.status = Some(status);
			}
		}
		Ok(())
	}

	pub fn processes(&self) -> &[Process] {
		&self.processes
	}

	pub fn len(&self) -> usize {
		self.processes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
	}

	/// Exit code of the terminal stage, once collected.
	pub fn exit_code(&self) -> Option<i32> {
		self.processes.last().and_then(|pr| pr.status).and_then(WaitStatusExt::code)
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) },
		}
	}

	/// Fork once and record the child. The caller decides what the child
	/// does; the record only exists in the parent.
	pub fn push_fork(&mut self) -> nix::Result<ForkResult> {
		let r = unsafe { unistd::fork() }?;
		if let ForkResult::Parent { child } = r {
			tracing::debug!(pid = child.as_raw(), "stage launched");
			self.imp.processes.push(Process { pid: child, status: None });
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}
