//! Local snapshot history: one JSON file per run plus a CSV index.

use crate::domain::error::FeedError;
use crate::domain::snapshot::Snapshot;
use crate::ports::publisher::SnapshotArchive;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.csv";
const INDEX_HEADER: [&str; 5] = ["generated_at", "symbol", "finalBias", "biasReason", "price"];

pub struct FileArchive {
    dir: PathBuf,
}

impl FileArchive {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, snapshot: &Snapshot) -> PathBuf {
        // ':' is not portable in file names.
        let stem = snapshot.generated_at.replace(':', "-");
        self.dir.join(format!("{stem}.json"))
    }

    fn append_index(&self, snapshot: &Snapshot) -> Result<(), FeedError> {
        let path = self.dir.join(INDEX_FILE);
        let write_header = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let csv_err = |e: csv::Error| FeedError::Io(std::io::Error::other(e));
        if write_header {
            writer.write_record(INDEX_HEADER).map_err(csv_err)?;
        }
        writer
            .write_record([
                snapshot.generated_at.clone(),
                snapshot.symbol.clone(),
                snapshot.final_bias.to_string(),
                snapshot.bias_reason.to_string(),
                snapshot.price.map(|p| p.to_string()).unwrap_or_default(),
            ])
            .map_err(csv_err)?;
        writer.flush()?;
        Ok(())
    }
}

impl SnapshotArchive for FileArchive {
    fn append(&self, snapshot: &Snapshot) -> Result<(), FeedError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.snapshot_path(snapshot);
        // An existing file means a run with the same generated_at; fail before the index grows.
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(&serde_json::to_vec(snapshot)?)?;
        self.append_index(snapshot)?;
        tracing::info!(path = %path.display(), "archived snapshot");
        Ok(())
    }
}
