use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directories unpacked when neither `--all`, explicit directories nor
/// `--list-dirs` were requested.
pub const DEFAULT_DIRECTORIES: [&str; 4] = ["arts", "chararts", "skinpack", "ui"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnpackOptions {
    pub input_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub directories: Vec<String>,
    pub all: bool,
    pub force: bool,
    pub debug: bool,
    pub list_dirs: bool,
}

impl UnpackOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_default_directories(mut self) -> Self {
        if !self.all && !self.list_dirs && self.directories.is_empty() {
            self.directories = DEFAULT_DIRECTORIES.iter().map(|dir| dir.to_string()).collect();
        }
        self
    }

    /// `-i <in> [-o <out>] [-d d1 d2 ... | --all] [-f] [--debug] [--list-dirs]`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-i".to_string(), self.input_dir.display().to_string()];
        if let Some(output_dir) = &self.output_dir {
            args.push("-o".to_string());
            args.push(output_dir.display().to_string());
        }
        if self.all {
            args.push("--all".to_string());
        } else if !self.directories.is_empty() {
            args.push("-d".to_string());
            args.extend(self.directories.iter().cloned());
        }
        if self.force {
            args.push("-f".to_string());
        }
        if self.debug {
            args.push("--debug".to_string());
        }
        if self.list_dirs {
            args.push("--list-dirs".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_wins_over_directories() {
        let options = UnpackOptions {
            all: true,
            directories: vec!["arts".to_string()],
            ..UnpackOptions::new("downloads")
        };
        assert_eq!(options.to_args(), vec!["-i", "downloads", "--all"]);
    }

    #[test]
    fn defaults_only_fill_an_empty_selection() {
        let listing = UnpackOptions {
            list_dirs: true,
            ..UnpackOptions::new("in")
        }
        .with_default_directories();
        assert!(listing.directories.is_empty());

        let plain = UnpackOptions::new("in").with_default_directories();
        assert_eq!(plain.directories, DEFAULT_DIRECTORIES);
    }
}
