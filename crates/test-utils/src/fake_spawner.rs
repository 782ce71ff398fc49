use std::io;
use std::process::{Command, Stdio};

use nix::unistd::Pid;
use watchcron::exec::{SpawnError, Spawner};

use crate::journal::{Journal, Op};

/// A spawner that:
/// - records every spawn request in the journal
/// - runs the command as the *current* user (no credential switch), or
///   fails every request when built with [`FakeSpawner::failing`].
#[derive(Debug, Clone)]
pub struct FakeSpawner {
    journal: Journal,
    fail: bool,
}

impl FakeSpawner {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail: false,
        }
    }

    pub fn failing(journal: Journal) -> Self {
        Self {
            journal,
            fail: true,
        }
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, user: &str, argv: &[String]) -> Result<Pid, SpawnError> {
        self.journal.push(Op::Spawned {
            user: user.to_string(),
            argv: argv.to_vec(),
        });

        let (program, args) = argv.split_first().ok_or(SpawnError::NoProgram)?;
        let exec_err = |source: io::Error| SpawnError::Exec {
            program: program.clone(),
            user: user.to_string(),
            source,
        };

        if self.fail {
            return Err(exec_err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "fork refused by fake spawner",
            )));
        }

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(exec_err)?;
        Ok(Pid::from_raw(child.id() as i32))
    }
}
