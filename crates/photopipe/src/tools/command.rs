use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::ToolsConfig;
use crate::sanitize;

use super::{MediaTools, ProbeError, ProbeTool};

/// [`MediaTools`] backed by the real binaries.
///
/// Output is redirected into an anonymous temp file instead of a pipe:
/// exiftool and ffprobe can emit megabytes of JSON for large files and a
/// pipe would stall the child once its buffer fills.
#[derive(Debug, Clone)]
pub struct CommandTools {
    exiftool: PathBuf,
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
}

impl Default for CommandTools {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

impl CommandTools {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            exiftool: PathBuf::from(&config.exiftool),
            ffprobe: PathBuf::from(&config.ffprobe),
            ffmpeg: PathBuf::from(&config.ffmpeg),
        }
    }

    fn probe_command(&self, tool: ProbeTool, path: &Path) -> Command {
        match tool {
            ProbeTool::Exiftool => {
                let mut cmd = Command::new(&self.exiftool);
                cmd.args(["-groupNames", "-json", "-sort"]).arg(path);
                cmd
            }
            ProbeTool::Ffprobe => {
                let mut cmd = Command::new(&self.ffprobe);
                cmd.args([
                    "-hide_banner",
                    "-v",
                    "quiet",
                    "-print_format",
                    "json",
                    "-show_error",
                    "-show_format",
                    "-show_streams",
                ])
                .arg(path);
                cmd
            }
        }
    }
}

/// Runs `cmd` to completion and returns everything it wrote to stdout.
fn run_buffered(mut cmd: Command, name: &str) -> Result<Vec<u8>, ProbeError> {
    let io_err = |source| ProbeError::Io {
        command: name.to_string(),
        source,
    };

    let mut out = tempfile::tempfile().map_err(io_err)?;
    let stdout = out.try_clone().map_err(io_err)?;

    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::null())
        .status()
        .map_err(|source| ProbeError::Spawn {
            command: name.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(ProbeError::ExitStatus {
            command: name.to_string(),
            status: status.to_string(),
        });
    }

    out.seek(SeekFrom::Start(0)).map_err(io_err)?;
    let mut buf = Vec::new();
    out.read_to_end(&mut buf).map_err(io_err)?;
    Ok(buf)
}

impl MediaTools for CommandTools {
    fn run_probe(&self, tool: ProbeTool, path: &Path) -> Result<serde_json::Value, ProbeError> {
        debug!(tool = tool.name(), file = %sanitize::redact_path(path), "probing");
        let raw = run_buffered(self.probe_command(tool, path), tool.name())?;
        let parsed: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|source| ProbeError::Json {
                command: tool.name().to_string(),
                source,
            })?;

        match tool {
            // One entry per input file.
            ProbeTool::Exiftool => match parsed {
                serde_json::Value::Array(mut entries) if !entries.is_empty() => {
                    Ok(entries.swap_remove(0))
                }
                _ => Err(ProbeError::EmptyOutput {
                    command: tool.name().to_string(),
                }),
            },
            ProbeTool::Ffprobe => Ok(parsed),
        }
    }

    fn extract_embedded(&self, path: &Path, resource: &str) -> Result<Vec<u8>, ProbeError> {
        let mut cmd = Command::new(&self.exiftool);
        cmd.arg("-b").arg(format!("-{}", resource)).arg(path);
        let bytes = run_buffered(cmd, "exiftool")?;
        if bytes.is_empty() {
            return Err(ProbeError::EmptyOutput {
                command: format!("exiftool -b -{}", resource),
            });
        }
        Ok(bytes)
    }

    fn screenshot(&self, path: &Path, offset_seconds: u32) -> Result<Vec<u8>, ProbeError> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-v", "quiet", "-ss"])
            .arg(offset_seconds.to_string())
            .arg("-i")
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2", "-c:v", "mjpeg", "pipe:1"]);
        let bytes = run_buffered(cmd, "ffmpeg")?;
        if bytes.is_empty() {
            return Err(ProbeError::EmptyOutput {
                command: "ffmpeg".to_string(),
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_buffered_captures_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf '[{\"File:MIMEType\": \"image/jpeg\"}]'"]);
        let out = run_buffered(cmd, "sh").unwrap();
        assert_eq!(out, br#"[{"File:MIMEType": "image/jpeg"}]"#);
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo partial; exit 3"]);
        let err = run_buffered(cmd, "sh").unwrap_err();
        assert!(matches!(err, ProbeError::ExitStatus { .. }));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let tools = CommandTools {
            exiftool: PathBuf::from("/nonexistent/exiftool"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
        };
        let err = tools
            .run_probe(ProbeTool::Exiftool, Path::new("a.jpg"))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }
}
