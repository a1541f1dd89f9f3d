use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

pub trait Logger: Send + Sync {
    fn log(&mut self, message: &str);
    fn debug_log(&mut self, message: &str);

    /// User-facing warnings (expired certificates, missing tools).
    fn warn(&mut self, message: &str) {
        self.log(&format!("[WARNING] {}", message));
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: String,
    debug: bool,
}

impl FileLogger {
    pub fn new(log_file: &str, debug: bool) -> std::io::Result<Self> {
        // Create log directory if it doesn't exist
        if let Some(parent) = Path::new(log_file).parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(FileLogger {
            log_file: log_file.to_string(),
            debug,
        })
    }

    fn write_to_file(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}: {}", timestamp(), message)
    }
}

impl Logger for FileLogger {
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write_to_file(message) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&format!("[DEBUG] {}", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

/// Writes to stderr with the same line format as [`FileLogger`].
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    debug: bool,
}

impl ConsoleLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for ConsoleLogger {
    fn log(&mut self, message: &str) {
        eprintln!("{}: {}", timestamp(), message);
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            eprintln!("{}: [DEBUG] {}", timestamp(), message);
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("! {}", message);
    }
}

// MultiLogger allows logging to multiple destinations
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new(loggers: Vec<Box<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl Logger for MultiLogger {
    fn log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.debug_log(message);
        }
    }

    fn warn(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.warn(message);
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    pub lines: Vec<String>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }

    fn debug_log(&mut self, message: &str) {
        self.lines.push(format!("DEBUG: {}", message));
    }

    fn warn(&mut self, message: &str) {
        self.lines.push(format!("WARNING: {}", message));
    }
}
