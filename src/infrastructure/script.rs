//! Where session commands come from.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use tracing::debug;

use crate::infrastructure::{InfraError, InfraResult};

/// Source of session command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Stdin,
    File(PathBuf),
}

impl ScriptSource {
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) if p.as_os_str() != "-" => ScriptSource::File(p),
            _ => ScriptSource::Stdin,
        }
    }

    /// Open the source for line-wise reading.
    pub fn open(&self) -> InfraResult<Box<dyn BufRead>> {
        match self {
            ScriptSource::Stdin => {
                debug!("reading session commands from stdin");
                Ok(Box::new(BufReader::new(io::stdin())))
            }
            ScriptSource::File(path) => {
                debug!("reading session commands from {}", path.display());
                let file = File::open(path)
                    .map_err(|e| InfraError::io(format!("open script {}", path.display()), e))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}
