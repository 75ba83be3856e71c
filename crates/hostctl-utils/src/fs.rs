use std::fs;
use std::io;
use std::path::Path;

/// Write `bytes` to a sibling temp file and rename it over `path`, so readers
/// only ever see the old or the new content.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path {} has no parent directory", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    if let Err(err) = fs::write(tmp_path, bytes) {
        let _ = fs::remove_file(tmp_path);
        return Err(err);
    }
    if let Ok(meta) = fs::metadata(path) {
        // keep the mode of the file being replaced
        let _ = fs::set_permissions(tmp_path, meta.permissions());
    }

    fs::rename(tmp_path, path)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
