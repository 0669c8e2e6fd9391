//! Append-only command log.
//!
//! Each logged request is written as its arguments joined by single spaces and terminated by
//! `\r\n`. An argument that is empty or contains a space, a double quote, CR or LF is written in
//! double quotes with `\\`, `\"`, `\r` and `\n` escapes, so every argument reads back unchanged.
//!
//! A snapshot rotates the log: what was logged so far moves to `<log>.1` and new commands go to
//! an empty log. The rotated file is removed once the snapshot covering it is on disk; until then
//! replay reads it before the live log.

use bytes::Bytes;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Commands that are never written to the log: they carry secrets, only make sense on a live
/// connection, or control persistence itself.
const UNLOGGED: &[&str] = &[
    "auth",
    "config",
    "quit",
    "save",
    "bgsave",
    "subscribe",
    "unsubscribe",
];

pub fn is_logged(command: &[u8]) -> bool {
    !UNLOGGED
        .iter()
        .any(|name| name.as_bytes().eq_ignore_ascii_case(command))
}

pub struct AppendOnlyFile {
    path: PathBuf,
    rotated_path: PathBuf,
    file: Option<File>,
}

impl AppendOnlyFile {
    /// The file is opened lazily on the first append.
    pub fn new(path: impl Into<PathBuf>) -> AppendOnlyFile {
        let path = path.into();
        let mut rotated_path = path.clone().into_os_string();
        rotated_path.push(".1");

        AppendOnlyFile {
            path,
            rotated_path: rotated_path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rotated_path(&self) -> &Path {
        &self.rotated_path
    }

    pub fn append(&mut self, args: &[Bytes]) -> io::Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        };

        self.file.insert(file).write_all(&format_line(args))
    }

    /// Moves everything logged so far into the rotated file and starts an empty log. A rotated
    /// file left over from a failed snapshot is kept and the current log is appended to it.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if !self.rotated_path.exists() {
            return match fs::rename(&self.path, &self.rotated_path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                res => res,
            };
        }

        let pending = match fs::read(&self.path) {
            Ok(pending) => pending,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        OpenOptions::new()
            .append(true)
            .open(&self.rotated_path)?
            .write_all(&pending)?;
        fs::remove_file(&self.path)
    }

    /// Drops the rotated file once a snapshot holds everything it recorded.
    pub fn discard_rotated(&self) -> io::Result<()> {
        match fs::remove_file(&self.rotated_path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            res => res,
        }
    }
}

pub fn format_line(args: &[Bytes]) -> Vec<u8> {
    let mut line = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(b' ');
        }
        write_arg(&mut line, arg);
    }
    line.extend_from_slice(b"\r\n");
    line
}

fn needs_quotes(arg: &[u8]) -> bool {
    arg.is_empty()
        || arg
            .iter()
            .any(|b| matches!(b, b' ' | b'"' | b'\r' | b'\n'))
}

fn write_arg(line: &mut Vec<u8>, arg: &[u8]) {
    if !needs_quotes(arg) {
        line.extend_from_slice(arg);
        return;
    }

    line.push(b'"');
    for b in arg {
        match b {
            b'"' => line.extend_from_slice(b"\\\""),
            b'\\' => line.extend_from_slice(b"\\\\"),
            b'\r' => line.extend_from_slice(b"\\r"),
            b'\n' => line.extend_from_slice(b"\\n"),
            b => line.push(*b),
        }
    }
    line.push(b'"');
}

/// Splits a log line into arguments. Unquoted arguments are taken as written; quoted ones are
/// unescaped.
pub fn parse_line(line: &[u8]) -> Vec<Bytes> {
    let mut args = Vec::new();
    let mut bytes = line.iter().copied().peekable();

    while let Some(b) = bytes.next() {
        match b {
            b' ' => continue,
            b'"' => {
                let mut arg = Vec::new();
                while let Some(b) = bytes.next() {
                    match b {
                        b'"' => break,
                        b'\\' => match bytes.next() {
                            Some(b'r') => arg.push(b'\r'),
                            Some(b'n') => arg.push(b'\n'),
                            Some(escaped) => arg.push(escaped),
                            None => break,
                        },
                        b => arg.push(b),
                    }
                }
                args.push(Bytes::from(arg));
            }
            b => {
                let mut arg = vec![b];
                while let Some(b) = bytes.next_if(|b| *b != b' ') {
                    arg.push(b);
                }
                args.push(Bytes::from(arg));
            }
        }
    }

    args
}

/// Reads every command in the log at `path`. A missing log reads as empty.
pub fn read_commands(path: &Path) -> io::Result<Vec<Vec<Bytes>>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let commands = contents
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .map(parse_line)
        .filter(|args| !args.is_empty())
        .collect();

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&'static str]) -> Vec<Bytes> {
        parts.iter().map(|part| Bytes::from(*part)).collect()
    }

    #[test]
    fn unlogged_commands() {
        assert!(is_logged(b"SET"));
        assert!(is_logged(b"publish"));
        assert!(!is_logged(b"AUTH"));
        assert!(!is_logged(b"Config"));
        assert!(!is_logged(b"bgsave"));
    }

    #[test]
    fn append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = AppendOnlyFile::new(dir.path().join("appendonly.aof"));

        aof.append(&args(&["SET", "greeting", "hello", "world"]))
            .unwrap();
        aof.append(&args(&["INCR", "counter"])).unwrap();

        assert_eq!(
            fs::read(aof.path()).unwrap(),
            b"SET greeting hello world\r\nINCR counter\r\n"
        );
        assert_eq!(
            read_commands(aof.path()).unwrap(),
            vec![
                args(&["SET", "greeting", "hello", "world"]),
                args(&["INCR", "counter"])
            ]
        );
    }

    #[test]
    fn awkward_arguments_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = AppendOnlyFile::new(dir.path().join("appendonly.aof"));
        let command = args(&[
            "MSET",
            "k1",
            "hello world",
            "k2",
            "",
            "k3",
            "a  b",
            "k4",
            "say \"hi\"\r\n",
            "k5",
            "C:\\tmp",
        ]);

        aof.append(&command).unwrap();

        assert_eq!(
            fs::read(aof.path()).unwrap(),
            b"MSET k1 \"hello world\" k2 \"\" k3 \"a  b\" k4 \"say \\\"hi\\\"\\r\\n\" k5 C:\\tmp\r\n"
        );
        assert_eq!(read_commands(aof.path()).unwrap(), vec![command]);
    }

    #[test]
    fn rotate_moves_the_log_aside() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = AppendOnlyFile::new(dir.path().join("appendonly.aof"));

        aof.append(&args(&["DEL", "a"])).unwrap();
        aof.rotate().unwrap();
        aof.append(&args(&["DEL", "b"])).unwrap();

        assert_eq!(aof.rotated_path(), dir.path().join("appendonly.aof.1"));
        assert_eq!(read_commands(aof.rotated_path()).unwrap(), vec![args(&["DEL", "a"])]);
        assert_eq!(read_commands(aof.path()).unwrap(), vec![args(&["DEL", "b"])]);

        // A second rotation before the first was discarded keeps both in order.
        aof.rotate().unwrap();
        aof.append(&args(&["DEL", "c"])).unwrap();
        assert_eq!(
            read_commands(aof.rotated_path()).unwrap(),
            vec![args(&["DEL", "a"]), args(&["DEL", "b"])]
        );

        aof.discard_rotated().unwrap();
        assert!(!aof.rotated_path().exists());
        assert_eq!(read_commands(aof.path()).unwrap(), vec![args(&["DEL", "c"])]);
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        assert!(read_commands(&dir.path().join("nope.aof")).unwrap().is_empty());
        let mut aof = AppendOnlyFile::new(dir.path().join("nope.aof"));
        assert!(aof.rotate().is_ok());
        assert!(aof.discard_rotated().is_ok());
    }
}
