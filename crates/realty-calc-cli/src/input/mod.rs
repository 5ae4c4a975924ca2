pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command's input record: `--input` wins, then piped stdin.
pub fn load<T: DeserializeOwned>(path: &Option<String>) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_input(path);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err("No input provided (use --input <file> or pipe JSON/YAML on stdin)".into()),
    }
}
