use crate::app::normalize_use_case::JobPostRecord;
use crate::app::ports::SalaryOutputPort;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::info;

/// Writes one JSON object per line to a file or stdout
pub struct NdjsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl NdjsonOutput {
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        info!("Writing job post records to {}", path.display());
        Ok(Self::from_writer(Box::new(BufWriter::new(file))))
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(std::io::stdout()))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub async fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().await.flush()
    }
}

#[async_trait]
impl SalaryOutputPort for NdjsonOutput {
    async fn write_record(&self, record: &JobPostRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)?;
        Ok(())
    }
}
