use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// An external program invocation on one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub argv: Vec<OsString>,
}

impl Launch {
    /// Split a configured command line on whitespace and append `path`.
    ///
    /// Returns `None` for a blank command line.
    pub fn new(command_line: &str, path: &Path) -> Option<Self> {
        let mut argv: Vec<OsString> = command_line.split_whitespace().map(OsString::from).collect();
        if argv.is_empty() {
            return None;
        }
        argv.push(path.as_os_str().to_os_string());
        Some(Self { argv })
    }

    pub fn program(&self) -> &OsString {
        &self.argv[0]
    }
}

/// Run the program in the foreground and wait for it to exit.
pub fn launch(launch: &Launch) -> io::Result<ExitStatus> {
    let (program, args) = launch
        .argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
    Command::new(program).args(args).status()
}
