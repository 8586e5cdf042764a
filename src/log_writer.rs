use std::{
    fs::File,
    io::{BufWriter, Seek, SeekFrom, Write},
};

/// Append-only buffered log file. Created if absent, appended to if present.
pub struct LogFile {
    file: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self, std::io::Error> {
        let mut file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.seek(SeekFrom::End(0))?;
        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    pub fn regular(&mut self, line: &str) {
        writeln!(self.file, "{line}").unwrap()
    }

    pub fn flush(&mut self) {
        self.file.flush().unwrap();
    }
}

#[test]
fn test_log_file_appends_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_log_file.log");
    let mut log_file = LogFile::new(&path).unwrap();
    log_file.regular("Hello, world!");
    log_file.regular("rust is awesome !");
    log_file.flush();
    let mut log_file = LogFile::new(&path).unwrap();
    log_file.regular("test");
    log_file.flush();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "Hello, world!\nrust is awesome !\ntest\n"
    );
}
