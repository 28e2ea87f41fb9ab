use super::catalog::ResultsStore;
use super::{io_error, ResultsError};
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn archive_file_name(run_id: &str) -> String {
    format!("{run_id}_results.zip")
}

/// Regular files directly inside the run directory, sorted by name. Names
/// that are not valid UTF-8 cannot become zip entries and are left out.
pub fn collect_result_files(
    store: &ResultsStore,
    run_id: &str,
) -> Result<Vec<(String, PathBuf)>, ResultsError> {
    let dir = store.existing_run_dir(run_id)?;
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|err| io_error(&dir, err))? {
        let entry = entry.map_err(|err| io_error(&dir, err))?;
        let file_type = entry.file_type().map_err(|err| io_error(&entry.path(), err))?;
        if !file_type.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            files.push((name, entry.path()));
        }
    }
    if files.is_empty() {
        return Err(ResultsError::NotFound {
            run_id: run_id.to_string(),
            what: "result files",
        });
    }
    files.sort();
    Ok(files)
}

/// Deflate-compressed zip of the run's result files, flat, one entry per file.
pub fn build_archive(store: &ResultsStore, run_id: &str) -> Result<Vec<u8>, ResultsError> {
    let files = collect_result_files(store, run_id)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, path) in &files {
        let mut source = File::open(path).map_err(|err| io_error(path, err))?;
        writer.start_file(name.as_str(), options)?;
        io::copy(&mut source, &mut writer).map_err(|err| io_error(path, err))?;
    }
    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    const RUN: &str = "shop__stress-20260101120000";

    #[test]
    fn archive_holds_flat_byte_identical_entries() {
        let dir = tempdir().expect("tempdir");
        let store = ResultsStore::new(dir.path());
        let run_dir = store.run_dir(RUN).expect("dir");
        fs::create_dir_all(run_dir.join("nested")).expect("mkdir");
        fs::write(run_dir.join("b.csv"), "col\n1\n").expect("csv");
        fs::write(run_dir.join("a.txt"), "hello").expect("txt");
        fs::write(run_dir.join("nested/skip.txt"), "no").expect("nested");

        let bytes = build_archive(&store, RUN).expect("archive");
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open zip");
        let names = archive.file_names().map(str::to_string).collect::<Vec<_>>();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a.txt", "b.csv"]);

        let mut body = String::new();
        archive
            .by_name("b.csv")
            .expect("entry")
            .read_to_string(&mut body)
            .expect("read");
        assert_eq!(body, "col\n1\n");
        assert_eq!(
            archive.by_name("a.txt").expect("entry").compression(),
            CompressionMethod::Deflated
        );
    }

    #[test]
    fn empty_or_missing_run_directory_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = ResultsStore::new(dir.path());
        assert!(matches!(
            build_archive(&store, RUN),
            Err(ResultsError::NotFound { .. })
        ));
        fs::create_dir_all(store.run_dir(RUN).expect("dir")).expect("mkdir");
        assert!(matches!(
            build_archive(&store, RUN),
            Err(ResultsError::NotFound { what: "result files", .. })
        ));
        assert_eq!(archive_file_name(RUN), "shop__stress-20260101120000_results.zip");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn directory_with_only_non_utf8_names_is_not_found() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().expect("tempdir");
        let store = ResultsStore::new(dir.path());
        let run_dir = store.run_dir(RUN).expect("dir");
        fs::create_dir_all(&run_dir).expect("mkdir");
        fs::write(run_dir.join(OsStr::from_bytes(b"stats\xff.csv")), "x").expect("write");

        assert!(matches!(
            build_archive(&store, RUN),
            Err(ResultsError::NotFound { what: "result files", .. })
        ));
    }
}
