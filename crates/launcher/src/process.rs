use crate::{AddressResolutionMode, Error};
use nix::{
    sys::{
        ptrace,
        signal::Signal,
        wait::{WaitStatus, waitpid},
    },
    unistd::Pid,
};
use std::{
    ffi::OsString,
    fmt, fs, io,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Launched,
    StoppedAtEntry,
    Running,
    Exited,
}

/// How a traced process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    Exited(i32),
    Signaled(Signal),
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit status {code}"),
            Self::Signaled(signal) => write!(f, "killed by {signal}"),
        }
    }
}

/// A child process started under `ptrace` control.
///
/// The child is never killed from here: on any failure it is left to run or
/// fail on its own.
#[derive(Debug)]
pub struct TracedProcess {
    pid: Pid,
    image: PathBuf,
    load_base: Option<u64>,
    state: LifecycleState,
}

impl TracedProcess {
    /// Start `image` traced by the calling process and block until it is
    /// stopped at its first instruction, before any of its own code ran.
    ///
    /// `image` is a path, never a name to look up on `PATH`.
    pub fn spawn(image: &Path, args: &[OsString]) -> Result<Self, Error> {
        let program = image;
        let image = executable_path(program)?;
        let mut command = Command::new(&image);
        // multi-call binaries dispatch on the name they were started by
        command.arg0(program).args(args);
        // SAFETY: runs in the forked child before exec and only issues the
        // PTRACE_TRACEME request, which is async-signal-safe.
        unsafe {
            command.pre_exec(|| ptrace::traceme().map_err(io::Error::from));
        }

        // Spawn reports exec failures of the child back to us through its
        // close-on-exec pipe. The child is reaped by `wait`.
        #[allow(clippy::zombie_processes)]
        let child = command.spawn().map_err(|source| Error::LaunchFailed {
            path: image.clone(),
            source,
        })?;

        let mut process = Self {
            pid: Pid::from_raw(child.id() as i32),
            image,
            load_base: None,
            state: LifecycleState::Launched,
        };
        process.wait_for_entry()?;
        info!(pid = %process.pid, "target program loaded");
        Ok(process)
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn load_base(&self) -> Option<u64> {
        self.load_base
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn wait_for_entry(&mut self) -> Result<(), Error> {
        match self.waitpid()? {
            WaitStatus::Stopped(_, Signal::SIGTRAP) => {
                self.state = LifecycleState::StoppedAtEntry;
                Ok(())
            }
            WaitStatus::Exited(_, code) => {
                self.state = LifecycleState::Exited;
                Err(self.protocol_failure(format!(
                    "exited with status {code} before reaching its entry point"
                )))
            }
            WaitStatus::Signaled(_, signal, _) => {
                self.state = LifecycleState::Exited;
                Err(self.protocol_failure(format!(
                    "killed by {signal} before reaching its entry point"
                )))
            }
            other => Err(self.protocol_failure(format!("unexpected stop at entry: {other:?}"))),
        }
    }

    /// Determine and remember the load base while stopped at entry.
    pub fn resolve_load_base(&mut self, mode: AddressResolutionMode) -> Result<Option<u64>, Error> {
        self.expect_state(LifecycleState::StoppedAtEntry, "resolve the load base")?;
        let base = mode.load_base(&self.image)?;
        match base {
            Some(base) => info!(pid = %self.pid, base = format_args!("{base:#x}"), "runtime base address"),
            None => debug!(pid = %self.pid, "fixed-address image, no load base"),
        }
        self.load_base = base;
        Ok(base)
    }

    /// Let the stopped process continue normal execution.
    pub fn resume(&mut self) -> Result<(), Error> {
        self.expect_state(LifecycleState::StoppedAtEntry, "resume")?;
        self.cont(None)?;
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Block until the process terminates.
    ///
    /// Signals that stop the tracee on their way in are passed on to it.
    pub fn wait(&mut self) -> Result<ProcessExit, Error> {
        self.expect_state(LifecycleState::Running, "wait for exit")?;
        loop {
            match self.waitpid()? {
                WaitStatus::Exited(_, code) => {
                    self.state = LifecycleState::Exited;
                    return Ok(ProcessExit::Exited(code));
                }
                WaitStatus::Signaled(_, signal, _) => {
                    self.state = LifecycleState::Exited;
                    return Ok(ProcessExit::Signaled(signal));
                }
                WaitStatus::Stopped(_, signal) => {
                    debug!(pid = %self.pid, %signal, "forwarding signal");
                    self.cont(Some(signal))?;
                }
                WaitStatus::PtraceEvent(..) | WaitStatus::PtraceSyscall(_) => self.cont(None)?,
                WaitStatus::Continued(_) | WaitStatus::StillAlive => {}
            }
        }
    }

    fn waitpid(&self) -> Result<WaitStatus, Error> {
        waitpid(self.pid, None).map_err(|source| Error::Ptrace {
            pid: self.pid.as_raw(),
            source,
        })
    }

    fn cont(&self, signal: Option<Signal>) -> Result<(), Error> {
        ptrace::cont(self.pid, signal).map_err(|source| Error::Ptrace {
            pid: self.pid.as_raw(),
            source,
        })
    }

    fn expect_state(&self, expected: LifecycleState, action: &str) -> Result<(), Error> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.protocol_failure(format!(
                "cannot {action} in state {:?}, expected {expected:?}",
                self.state
            )))
        }
    }

    fn protocol_failure(&self, reason: String) -> Error {
        Error::TraceProtocolFailed {
            pid: self.pid.as_raw(),
            reason,
        }
    }
}

/// The canonical path of `image`, taken literally: a bare name refers to the
/// current directory and is never searched for on `PATH`.
pub fn executable_path(image: &Path) -> Result<PathBuf, Error> {
    fs::canonicalize(image).map_err(|source| Error::LaunchFailed {
        path: image.to_owned(),
        source,
    })
}
