use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "/var/log/apex-installer/install.log";

/// Send logs to `log_file` (default [`DEFAULT_LOG_FILE`]), or to stderr when
/// the file cannot be opened. `RUST_LOG` overrides the `info` default.
pub fn init_with(log_file: Option<PathBuf>) {
    use env_logger::Target;
    use std::fs;
    use std::io;

    let path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let target = (|| -> io::Result<Target> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(target)
        .try_init();
}
