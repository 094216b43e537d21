use std::{
    fmt::Debug,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use super::Progress;

pub trait Logger: Debug {
    fn epoch_loss(&mut self, epoch: usize, loss: f64);

    fn chunk(&mut self, progress: &Progress);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockLogger;

impl Logger for MockLogger {
    fn epoch_loss(&mut self, _epoch: usize, _loss: f64) {}

    fn chunk(&mut self, _progress: &Progress) {}
}

/// Writes the loss of every epoch to a file, one value per line.
#[derive(Debug)]
pub struct LogFile {
    file: PathBuf,
    writer: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self {
            file: path.as_ref().to_owned(),
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl Logger for LogFile {
    fn epoch_loss(&mut self, _epoch: usize, loss: f64) {
        if let Err(e) = writeln!(self.writer, "{}", loss) {
            log::error!(
                "Error while logging loss to file: {}\nError: {}",
                self.file.display(),
                e
            );
        }
    }

    fn chunk(&mut self, _progress: &Progress) {
        if let Err(e) = self.writer.flush() {
            log::error!("Error while flushing {}: {}", self.file.display(), e);
        }
    }
}

/// Forwards the loss of every epoch to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrate;

impl Logger for LogCrate {
    fn epoch_loss(&mut self, epoch: usize, loss: f64) {
        log::debug!("Epoch {} loss: {}", epoch, loss);
    }

    fn chunk(&mut self, _progress: &Progress) {}
}
