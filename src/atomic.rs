//! Write-to-temp-then-rename persistence.
//!
//! The temporary file lives in the destination directory so the final rename
//! never crosses filesystems. If the writer closure fails, the temporary file
//! is removed on drop and the destination keeps its previous content.

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::Serialize;

pub fn write_atomic<F>(dest: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Creating directory {dir:?}"))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".tmp_")
        .tempfile_in(dir)
        .with_context(|| format!("Creating temporary file in {dir:?}"))?;

    let outcome = (|| -> Result<()> {
        let mut buffered = BufWriter::new(temp.as_file_mut());
        write(&mut buffered)?;
        buffered.flush().context("Flushing temporary file")?;
        drop(buffered);
        temp.as_file().sync_all().context("Syncing temporary file")?;
        Ok(())
    })();

    if let Err(err) = outcome {
        error!("write_atomic: failed to write {dest:?}: {err:#}");
        return Err(err.context(format!("Writing {dest:?}")));
    }

    temp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("Replacing {dest:?}"))?;
    debug!("write_atomic: wrote {dest:?}");
    Ok(())
}

pub fn write_json_atomic<T>(value: &T, dest: &Path) -> Result<()>
where
    T: Serialize + ?Sized,
{
    write_atomic(dest, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value).context("Serializing JSON")?;
        writer.write_all(b"\n")?;
        Ok(())
    })
}

pub fn write_text_atomic(text: &str, dest: &Path) -> Result<()> {
    write_atomic(dest, |writer| {
        writer.write_all(text.as_bytes())?;
        Ok(())
    })
}
