use std::borrow::Cow;
use std::ffi::{CString, NulError};

/// One pipeline stage: an executable name plus its invocation arguments.
/// Tokens are byte strings; nothing here assumes UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	name: Vec<u8>,
	arguments: Vec<Vec<u8>>,
}

impl Command {
	pub fn new<N, A, I>(name: N, arguments: I) -> Command
	where
		N: Into<Vec<u8>>,
		A: Into<Vec<u8>>,
		I: IntoIterator<Item = A>,
	{
		Command {
			name: name.into(),
			arguments: arguments.into_iter().map(Into::into).collect(),
		}
	}

	pub fn name(&self) -> &[u8] {
		&self.name
	}

	pub fn arguments(&self) -> &[Vec<u8>] {
		&self.arguments
	}

	/// argv for image replacement: the name in slot 0, arguments after it.
	pub fn argv(&self) -> Result<Vec<CString>, NulError> {
		let mut argv = Vec::with_capacity(self.arguments.len() + 1);
		argv.push(CString::new(self.name.clone())?);
		for argument in &self.arguments {
			argv.push(CString::new(argument.clone())?);
		}
		Ok(argv)
	}

	pub fn display_name(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	pub commands: Vec<Command>,
}

impl Pipeline {
	pub fn new(commands: Vec<Command>) -> Pipeline {
		Pipeline { commands }
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}
}
